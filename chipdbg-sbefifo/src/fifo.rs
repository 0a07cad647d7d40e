//! # SBE FIFO engine
//!
//! Drives the three protocol operations over an open FIFO transport. The
//! transport only needs to be an ordinary [`Read`] + [`Write`] byte stream:
//! the kernel exposes the hardware FIFO as a character device, and tests
//! substitute an in-memory stream.
//!
//! Every operation is a strict write-then-read exchange. The engine owns
//! the transport for the full duration of an operation, so per-target
//! ordering is total; a multi-threaded host has to serialize access to one
//! engine externally because the protocol has no request identifiers.
use std::io::{Read, Write};

use crate::{
    error::{Error, Result},
    protocol::{
        CI_ALIGN, MAX_FFDC_SIZE, MEMORY_FLAG_CI, MEMORY_FLAG_PBA, MEMORY_FLAG_PROC, PBA_ALIGN,
        Request, Response,
    },
};

/// Diagnostic data captured from the most recent failed operation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Ffdc {
    /// Status word the SBE reported.
    pub status: u32,
    /// Raw FFDC bytes, possibly empty.
    pub data: Vec<u8>,
}

/// Callback reporting `(transferred, total)` after each memory exchange.
pub type ProgressFn = dyn FnMut(u64, u64) + Send;

/// The protocol engine for one SBE FIFO device.
///
/// Holds the open transport and at most one [`Ffdc`] record, which is
/// replaced at the start of every operation. Dropping the engine drops the
/// transport and any captured diagnostics.
pub struct SbeFifo<T> {
    transport: T,
    ffdc: Option<Ffdc>,
    progress: Option<Box<ProgressFn>>,
}

impl<T> SbeFifo<T> {
    pub fn new(transport: T) -> SbeFifo<T> {
        SbeFifo {
            transport,
            ffdc: None,
            progress: None,
        }
    }

    /// Install a progress callback for memory transfers.
    pub fn set_progress(&mut self, callback: impl FnMut(u64, u64) + Send + 'static) {
        self.progress = Some(Box::new(callback));
    }

    /// Status and diagnostic payload of the most recent failed operation,
    /// `(0, empty)` if the last operation succeeded. No side effects.
    pub fn ffdc(&self) -> (u32, &[u8]) {
        match &self.ffdc {
            Some(ffdc) => (ffdc.status, &ffdc.data),
            None => (0, &[]),
        }
    }

    /// Consume the engine and return the transport.
    pub fn into_inner(self) -> T {
        self.transport
    }

    fn progress_tick(&mut self, current: u64, total: u64) {
        if let Some(callback) = self.progress.as_mut() {
            callback(current, total);
        }
    }
}

impl<T: Read + Write> SbeFifo<T> {
    /// Execute one isolation step of the boot sequence.
    pub fn istep(&mut self, major: u32, minor: u32) -> Result<()> {
        log::info!("sbefifo: istep {}.{}", major & 0xff, minor & 0xff);

        let _ = self.submit(&Request::ExecuteIstep { major, minor }, 0)?;
        Ok(())
    }

    /// Read memory into `buf`, starting at `addr`.
    ///
    /// The engine widens the request to the alignment unit of the chosen
    /// addressing mode (8 bytes cache-inhibited, 128 bytes via the PBA) and
    /// copies only the requested window back out of the aligned block, so
    /// the caller's address and length are unconstrained.
    pub fn get_memory(&mut self, addr: u64, buf: &mut [u8], ci: bool) -> Result<()> {
        let align = u64::from(if ci { CI_ALIGN } else { PBA_ALIGN });
        let size = buf.len() as u64;

        let start = addr & !(align - 1);
        let end = addr
            .checked_add(size)
            .and_then(|end| end.checked_add(align - 1))
            .ok_or(Error::TooLarge { len: size })?
            & !(align - 1);
        if end - start > u32::MAX as u64 {
            return Err(Error::TooLarge { len: end - start });
        }

        let offset = (addr - start) as usize;
        let len = (end - start) as u32;

        log::info!("sbefifo: getmem addr=0x{:016x}, len={}", start, len);

        let flags = if ci {
            MEMORY_FLAG_PROC | MEMORY_FLAG_CI
        } else {
            MEMORY_FLAG_PBA
        };
        let request = Request::GetMemory {
            flags,
            addr: start,
            len,
        };

        // The aligned block comes back followed by a transferred-count word.
        let out = self.submit(&request, len as usize + 4)?;
        if out.len() < len as usize + 4 {
            return Err(Error::TruncatedPayload {
                len: out.len(),
                expected: len as usize + 4,
            });
        }

        buf.copy_from_slice(&out[offset..offset + buf.len()]);
        let count = u32::from_be_bytes(out[len as usize..len as usize + 4].try_into().unwrap());

        self.progress_tick(count as u64, len as u64);

        if count != len {
            log::error!("sbefifo: getmem read {} bytes of {}", count, len);
            return Err(Error::ShortTransfer {
                count,
                expected: len,
            });
        }

        Ok(())
    }

    /// Write `data` to memory starting at `addr`.
    ///
    /// Unlike [`get_memory`](Self::get_memory) nothing is widened here: the
    /// address and the data length must already be multiples of the
    /// alignment unit, anything else is a caller error.
    pub fn put_memory(&mut self, addr: u64, data: &[u8], ci: bool) -> Result<()> {
        let align = if ci { CI_ALIGN } else { PBA_ALIGN };

        if addr & (align as u64 - 1) != 0 {
            log::error!("sbefifo: Address must be aligned to {} bytes", align);
            return Err(Error::Unaligned { value: addr, align });
        }
        if data.len() & (align as usize - 1) != 0 {
            log::error!("sbefifo: Data must be a multiple of {} bytes", align);
            return Err(Error::Unaligned {
                value: data.len() as u64,
                align,
            });
        }
        if data.len() as u64 > u32::MAX as u64 {
            return Err(Error::TooLarge {
                len: data.len() as u64,
            });
        }
        let len = data.len() as u32;

        log::info!("sbefifo: putmem addr=0x{:016x}, len={}", addr, len);

        let flags = if ci {
            MEMORY_FLAG_PROC | MEMORY_FLAG_CI
        } else {
            MEMORY_FLAG_PBA
        };
        let request = Request::PutMemory { flags, addr, data };

        // Success response is a single transferred-count word.
        let out = self.submit(&request, 0)?;
        if out.len() < 4 {
            return Err(Error::TruncatedPayload {
                len: out.len(),
                expected: 4,
            });
        }
        let count = u32::from_be_bytes(out[..4].try_into().unwrap());

        self.progress_tick(count as u64, len as u64);

        if count != len {
            log::error!("sbefifo: putmem wrote {} bytes of {}", count, len);
            return Err(Error::ShortTransfer {
                count,
                expected: len,
            });
        }

        Ok(())
    }

    /// Perform one command/response exchange and return the payload.
    ///
    /// Drops the previous FFDC record up front. A nonzero status from the
    /// SBE captures a fresh record and surfaces as
    /// [`Error::OperationFailed`]; the engine stays usable afterwards.
    fn submit(&mut self, request: &Request, expected: usize) -> Result<Vec<u8>> {
        self.ffdc = None;

        let msg = request.encode();
        self.transport.write_all(&msg)?;

        let mut buf = vec![0u8; expected + MAX_FFDC_SIZE];
        let n = self.transport.read(&mut buf)?;

        let response = Response::parse(&buf[..n], request.command())?;
        if !response.is_success() {
            log::error!("sbefifo: Operation failed, response=0x{:08x}", response.status);
            let ffdc = Ffdc {
                status: response.status,
                data: response.ffdc.to_vec(),
            };
            self.ffdc = Some(ffdc);
            return Err(Error::OperationFailed {
                status: response.status,
            });
        }

        Ok(response.payload.to_vec())
    }
}
