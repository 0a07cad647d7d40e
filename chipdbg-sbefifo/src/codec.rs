/// Encoding and parsing of the framed FIFO messages
use bytes::{BufMut, Bytes, BytesMut};

use crate::{
    error::{Error, Result},
    protocol::{RESPONSE_MAGIC, Request, Response},
};

impl Request<'_> {
    /// Encode the request into the framed wire form: big-endian 32-bit
    /// words, word 0 holding the total word count including itself.
    pub fn encode(&self) -> Bytes {
        match self {
            Request::ExecuteIstep { major, minor } => {
                let mut msg = BytesMut::with_capacity(3 * 4);
                msg.put_u32(3);
                msg.put_u32(self.command() as u32);
                msg.put_u32((major & 0xff) << 16 | (minor & 0xff));
                msg.freeze()
            }
            Request::GetMemory { flags, addr, len } => {
                let mut msg = BytesMut::with_capacity(6 * 4);
                msg.put_u32(6);
                msg.put_u32(self.command() as u32);
                msg.put_u32(*flags);
                msg.put_u64(*addr);
                msg.put_u32(*len);
                msg.freeze()
            }
            Request::PutMemory { flags, addr, data } => {
                let mut msg = BytesMut::with_capacity(6 * 4 + data.len());
                msg.put_u32((6 * 4 + data.len() as u32) / 4);
                msg.put_u32(self.command() as u32);
                msg.put_u32(*flags);
                msg.put_u64(*addr);
                msg.put_u32(data.len() as u32);
                msg.put_slice(data);
                msg.freeze()
            }
        }
    }
}

impl<'a> Response<'a> {
    /// Locate and validate the status header in a raw response buffer.
    ///
    /// `command` is the command word that was just sent; the header must
    /// echo it back or the exchange is out of sync. Framing problems (too
    /// short, offset out of range, bad magic, wrong echo) are errors; a
    /// nonzero SBE status is not: it is reported through
    /// [`Response::status`] so the caller can capture the FFDC bytes.
    pub fn parse(buf: &'a [u8], command: u16) -> Result<Response<'a>> {
        let len = buf.len();

        // Header word, status word, trailing offset word at minimum.
        if len < 3 * 4 {
            log::error!("sbefifo: Short read, got {} bytes", len);
            dump_words("DATA:", buf);
            return Err(Error::ShortResponse { len });
        }

        let words = u32::from_be_bytes(buf[len - 4..].try_into().unwrap());
        log::debug!("sbefifo: status header word offset = {}", words);

        // The header and status words must sit before the trailing offset
        // word, so the smallest valid offset is 3 words.
        let header_offset = (words as usize)
            .checked_mul(4)
            .and_then(|off| len.checked_sub(off))
            .filter(|off| off + 3 * 4 <= len)
            .ok_or(Error::BadOffset { words, len })?;

        let header = u32::from_be_bytes(buf[header_offset..header_offset + 4].try_into().unwrap());
        let status =
            u32::from_be_bytes(buf[header_offset + 4..header_offset + 8].try_into().unwrap());
        log::debug!("sbefifo: response {:08x} {:08x}", header, status);

        let magic = (header >> 16) as u16;
        if magic != RESPONSE_MAGIC {
            log::error!("sbefifo: Expected magic 0xc0de, got 0x{:04x}", magic);
            dump_words("DATA:", buf);
            return Err(Error::BadMagic { magic });
        }

        let echo = (header & 0xffff) as u16;
        if echo != command {
            log::error!(
                "sbefifo: Expected command 0x{:04x}, got 0x{:04x}",
                command,
                echo
            );
            dump_words("DATA:", buf);
            return Err(Error::CommandMismatch {
                expected: command,
                got: echo,
            });
        }

        Ok(Response {
            status,
            payload: &buf[..header_offset],
            ffdc: &buf[header_offset + 8..len - 4],
        })
    }
}

/// Dump a buffer word by word for post-mortem analysis of a framing error.
fn dump_words(prefix: &str, buf: &[u8]) {
    for word in buf.chunks_exact(4) {
        log::error!(
            "   {} 0x{:02x}{:02x}{:02x}{:02x}",
            prefix,
            word[0],
            word[1],
            word[2],
            word[3]
        );
    }
}

#[cfg(test)]
mod test {
    use crate::error::Error;
    use crate::protocol::{
        CMD_CLASS_MEMORY, CMD_GET_MEMORY, MEMORY_FLAG_PBA, MEMORY_FLAG_PROC, Request, Response,
    };

    const GETMEM: u16 = CMD_CLASS_MEMORY | CMD_GET_MEMORY;

    fn be_words(words: &[u32]) -> Vec<u8> {
        words.iter().flat_map(|w| w.to_be_bytes()).collect()
    }

    #[test]
    fn encode_istep() {
        let msg = Request::ExecuteIstep { major: 3, minor: 11 }.encode();
        assert_eq!(&msg[..], be_words(&[3, 0xA101, 0x0003_000b]));
    }

    #[test]
    fn encode_istep_masks_step_numbers() {
        let msg = Request::ExecuteIstep {
            major: 0x103,
            minor: 0xf0b,
        }
        .encode();
        assert_eq!(&msg[..], be_words(&[3, 0xA101, 0x0003_000b]));
    }

    #[test]
    fn encode_getmem() {
        let msg = Request::GetMemory {
            flags: MEMORY_FLAG_PBA,
            addr: 0x0000_0001_0800_0000,
            len: 256,
        }
        .encode();
        assert_eq!(
            &msg[..],
            be_words(&[6, 0xA401, 0x0002, 0x0000_0001, 0x0800_0000, 256])
        );
    }

    #[test]
    fn encode_putmem() {
        let data = [0x5a_u8; 8];
        let msg = Request::PutMemory {
            flags: MEMORY_FLAG_PROC,
            addr: 0x8000_0000,
            data: &data,
        }
        .encode();
        let mut expected = be_words(&[8, 0xA402, 0x0001, 0, 0x8000_0000, 8]);
        expected.extend_from_slice(&data);
        assert_eq!(&msg[..], expected);
    }

    // 128 bytes of payload, a count word, the status header and the
    // trailing offset word, exactly as a successful get-memory looks.
    fn getmem_response(status: u32) -> Vec<u8> {
        let mut buf = Vec::new();
        for _ in 0..32 {
            buf.extend_from_slice(&0xDEADBEEF_u32.to_be_bytes());
        }
        buf.extend_from_slice(&128_u32.to_be_bytes());
        buf.extend_from_slice(&0xc0de_a401_u32.to_be_bytes());
        buf.extend_from_slice(&status.to_be_bytes());
        buf.extend_from_slice(&3_u32.to_be_bytes());
        buf
    }

    #[test]
    fn parse_success() {
        let buf = getmem_response(0);
        let response = Response::parse(&buf, GETMEM).unwrap();
        assert!(response.is_success());
        assert_eq!(response.payload.len(), 132);
        assert_eq!(&response.payload[..4], &0xDEADBEEF_u32.to_be_bytes());
        assert!(response.ffdc.is_empty());
    }

    #[test]
    fn parse_is_idempotent() {
        let buf = getmem_response(0);
        let first = Response::parse(&buf, GETMEM).unwrap();
        let second = Response::parse(&buf, GETMEM).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn parse_failure_carries_status() {
        let buf = getmem_response(0x0000_0001);
        let response = Response::parse(&buf, GETMEM).unwrap();
        assert_eq!(response.status, 1);
        assert!(response.ffdc.is_empty());
    }

    #[test]
    fn parse_failure_captures_ffdc() {
        // A failing response: status header, two FFDC words, offset word.
        let mut buf = Vec::new();
        buf.extend_from_slice(&0xc0de_a401_u32.to_be_bytes());
        buf.extend_from_slice(&0x00fe_0007_u32.to_be_bytes());
        buf.extend_from_slice(&0x1122_3344_u32.to_be_bytes());
        buf.extend_from_slice(&0x5566_7788_u32.to_be_bytes());
        buf.extend_from_slice(&5_u32.to_be_bytes());

        let response = Response::parse(&buf, GETMEM).unwrap();
        assert_eq!(response.status, 0x00fe_0007);
        assert!(response.payload.is_empty());
        assert_eq!(
            response.ffdc,
            be_words(&[0x1122_3344, 0x5566_7788]).as_slice()
        );
    }

    #[test]
    fn parse_short_response() {
        let buf = be_words(&[0xc0de_a401, 3]);
        match Response::parse(&buf, GETMEM) {
            Err(Error::ShortResponse { len: 8 }) => {}
            other => panic!("expected ShortResponse, got {:?}", other),
        }
    }

    #[test]
    fn parse_offset_beyond_buffer() {
        let buf = be_words(&[0xc0de_a401, 0, 100]);
        match Response::parse(&buf, GETMEM) {
            Err(Error::BadOffset { words: 100, len: 12 }) => {}
            other => panic!("expected BadOffset, got {:?}", other),
        }
    }

    #[test]
    fn parse_offset_overlapping_trailer() {
        // Offset 2 would put the status word on top of the offset word.
        let buf = be_words(&[0, 0xc0de_a401, 0, 2]);
        match Response::parse(&buf, GETMEM) {
            Err(Error::BadOffset { words: 2, len: 16 }) => {}
            other => panic!("expected BadOffset, got {:?}", other),
        }
    }

    #[test]
    fn parse_bad_magic() {
        let buf = be_words(&[0xbeef_a401, 0, 3]);
        match Response::parse(&buf, GETMEM) {
            Err(Error::BadMagic { magic: 0xbeef }) => {}
            other => panic!("expected BadMagic, got {:?}", other),
        }
    }

    #[test]
    fn parse_command_mismatch() {
        let buf = be_words(&[0xc0de_a402, 0, 3]);
        match Response::parse(&buf, GETMEM) {
            Err(Error::CommandMismatch {
                expected: 0xA401,
                got: 0xA402,
            }) => {}
            other => panic!("expected CommandMismatch, got {:?}", other),
        }
    }
}
