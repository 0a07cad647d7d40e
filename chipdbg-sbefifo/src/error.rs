use std::{error::Error as StdError, fmt::Display, io};

/// Errors that may occur while exchanging a command with the SBE.
#[derive(Debug)]
pub enum Error {
    /// The underlying FIFO device failed to transfer the request or response.
    Io(io::Error),
    /// Fewer than the three mandatory status words were read back.
    ShortResponse { len: usize },
    /// The trailing offset word places the status header outside the response.
    BadOffset { words: u32, len: usize },
    /// The status header did not carry the expected magic value.
    BadMagic { magic: u16 },
    /// The status header echoed a different command than the one sent.
    CommandMismatch { expected: u16, got: u16 },
    /// The SBE reported a nonzero status; FFDC has been captured.
    OperationFailed { status: u32 },
    /// A success response carried less payload than the operation requires.
    TruncatedPayload { len: usize, expected: usize },
    /// An address or length violates the operation's alignment unit.
    Unaligned { value: u64, align: u32 },
    /// The (aligned) transfer length does not fit the 32-bit length field.
    TooLarge { len: u64 },
    /// The SBE transferred a different number of bytes than requested.
    ShortTransfer { count: u32, expected: u32 },
}

impl From<io::Error> for Error {
    fn from(value: io::Error) -> Self {
        Error::Io(value)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(error) => write!(f, "{}", error),
            Error::ShortResponse { len } => {
                write!(f, "Short response, expected at least 12 bytes, got {}", len)
            }
            Error::BadOffset { words, len } => {
                write!(
                    f,
                    "Status header offset of {} words is invalid for a {} byte response",
                    words, len
                )
            }
            Error::BadMagic { magic } => {
                write!(f, "Expected magic 0xc0de, got 0x{:04x}", magic)
            }
            Error::CommandMismatch { expected, got } => {
                write!(f, "Expected command 0x{:04x}, got 0x{:04x}", expected, got)
            }
            Error::OperationFailed { status } => {
                write!(f, "Operation failed, status=0x{:08x}", status)
            }
            Error::TruncatedPayload { len, expected } => {
                write!(f, "Response payload too short, expected {}, got {}", expected, len)
            }
            Error::Unaligned { value, align } => {
                write!(f, "0x{:x} is not aligned to {} bytes", value, align)
            }
            Error::TooLarge { len } => {
                write!(f, "Transfer length {} exceeds the 32-bit length field", len)
            }
            Error::ShortTransfer { count, expected } => {
                write!(f, "Transferred {} bytes of {}", count, expected)
            }
        }
    }
}

impl StdError for Error {}

/// Type to represent the result of a FIFO operation
pub type Result<T> = std::result::Result<T, Error>;
