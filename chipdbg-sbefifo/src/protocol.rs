/// Command class for boot/control operations.
pub const CMD_CLASS_CONTROL: u16 = 0xA100;
/// Execute a single isolation step.
pub const CMD_EXECUTE_ISTEP: u16 = 0x0001;

/// Command class for memory operations.
pub const CMD_CLASS_MEMORY: u16 = 0xA400;
/// Read a block of memory.
pub const CMD_GET_MEMORY: u16 = 0x0001;
/// Write a block of memory.
pub const CMD_PUT_MEMORY: u16 = 0x0002;

/// Address the memory through the processor with translation applied.
pub const MEMORY_FLAG_PROC: u32 = 0x0001;
/// Address the memory through the PBA bridge.
pub const MEMORY_FLAG_PBA: u32 = 0x0002;
pub const MEMORY_FLAG_AUTO_INCR: u32 = 0x0004;
pub const MEMORY_FLAG_ECC_REQ: u32 = 0x0008;
pub const MEMORY_FLAG_TAG_REQ: u32 = 0x0010;
pub const MEMORY_FLAG_FAST_MODE: u32 = 0x0020;
/// Last-core-offline mode, only valid for put-memory.
pub const MEMORY_FLAG_LCO_MODE: u32 = 0x0040;
/// Cache-inhibited access.
pub const MEMORY_FLAG_CI: u32 = 0x0080;
pub const MEMORY_FLAG_PASSTHRU: u32 = 0x0100;
/// Cache-inject mode, only valid for put-memory.
pub const MEMORY_FLAG_CACHEINJECT: u32 = 0x0200;

/// Upper half of the status header word on every response.
pub const RESPONSE_MAGIC: u16 = 0xc0de;

/// Space reserved at the end of every response buffer for FFDC data.
pub const MAX_FFDC_SIZE: usize = 0x2000;

/// Alignment unit for cache-inhibited memory transfers.
pub const CI_ALIGN: u32 = 8;
/// Alignment unit for PBA memory transfers.
pub const PBA_ALIGN: u32 = 128;

/// A single command sent to the SBE. The host is expected to write the
/// encoded request in one piece and then block reading the response; the
/// FIFO carries no request identifiers, so requests are never pipelined.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Request<'a> {
    /// Run one isolation step of the boot sequence.
    ExecuteIstep { major: u32, minor: u32 },
    /// Read `len` bytes starting at `addr`. Both must already respect the
    /// alignment unit of the chosen addressing mode.
    GetMemory { flags: u32, addr: u64, len: u32 },
    /// Write `data` starting at `addr`. The data travels inline after the
    /// request header.
    PutMemory { flags: u32, addr: u64, data: &'a [u8] },
}

impl Request<'_> {
    /// The 16-bit command word (class | code) this request encodes to, which
    /// the response must echo.
    pub fn command(&self) -> u16 {
        match self {
            Request::ExecuteIstep { .. } => CMD_CLASS_CONTROL | CMD_EXECUTE_ISTEP,
            Request::GetMemory { .. } => CMD_CLASS_MEMORY | CMD_GET_MEMORY,
            Request::PutMemory { .. } => CMD_CLASS_MEMORY | CMD_PUT_MEMORY,
        }
    }
}

/// A parsed view into a raw response buffer.
///
/// Every response ends with a big-endian word telling how far from the end
/// the status header sits (counting the trailing word itself). The header
/// carries the magic value and the echoed command; the word after it is the
/// SBE status. Everything before the header is operation payload, everything
/// between the status word and the trailing offset word is FFDC.
///
/// Parsing borrows from the buffer and has no side effects, so parsing the
/// same buffer twice yields identical results.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Response<'a> {
    /// Status word reported by the SBE; zero means success.
    pub status: u32,
    /// Operation output preceding the status header.
    pub payload: &'a [u8],
    /// Diagnostic data following the status word, empty on success.
    pub ffdc: &'a [u8],
}

impl Response<'_> {
    pub fn is_success(&self) -> bool {
        self.status == 0
    }
}
