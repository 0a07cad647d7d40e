//! # SBE FIFO Protocol Library
//!
//! This crate implements the command/response protocol spoken by the
//! self-boot engine (SBE) of POWER processors over its FIFO device,
//! enabling a debug host to run boot isolation steps and transfer memory
//! through the service processor.
//!
//! ## Overview
//!
//! The SBE exposes a queue-like character device. The host writes one
//! framed command, then blocks reading the complete response. This library
//! implements the protocol engine on top of any [`std::io::Read`] +
//! [`std::io::Write`] transport, allowing you to:
//!
//! - Encode protocol requests into their framed binary form
//! - Parse and validate framed responses, including the status header
//! - Capture FFDC (first-failure data capture) diagnostics on failure
//! - Run the memory operations with their alignment and chunking rules
//!
//! ## Protocol Features
//!
//! - **Operations**:
//!   - `ExecuteIstep`: run one isolation step of the boot sequence
//!   - `GetMemory`: read an aligned block of memory
//!   - `PutMemory`: write an aligned block of memory
//! - **Framing**: big-endian 32-bit words; requests lead with their total
//!   word count, responses trail with the word offset of their status
//!   header
//! - **Diagnostics**: a nonzero status captures the response's FFDC bytes
//!   for later retrieval via [`SbeFifo::ffdc`]
//!
//! ## Basic Usage
//!
//! ### Encoding Requests
//!
//! ```
//! use chipdbg_sbefifo::Request;
//!
//! let request = Request::ExecuteIstep { major: 3, minor: 11 };
//! let msg = request.encode();
//! // 3 words: count, command, packed step numbers
//! assert_eq!(
//!     &msg[..],
//!     &[0, 0, 0, 3, 0, 0, 0xA1, 0x01, 0, 3, 0, 0x0b][..],
//! );
//! ```
//!
//! ### Parsing Responses
//!
//! ```
//! use chipdbg_sbefifo::{Request, Response};
//!
//! let request = Request::ExecuteIstep { major: 0, minor: 1 };
//! // Minimal success response: header word, status word, offset word.
//! let buf = [
//!     0xc0, 0xde, 0xa1, 0x01, // magic | command echo
//!     0x00, 0x00, 0x00, 0x00, // status: success
//!     0x00, 0x00, 0x00, 0x03, // header sits 3 words from the end
//! ];
//! let response = Response::parse(&buf, request.command()).expect("well-formed");
//! assert!(response.is_success());
//! assert!(response.payload.is_empty());
//! ```
//!
//! ### Driving a Device
//!
//! ```ignore
//! use chipdbg_sbefifo::SbeFifo;
//!
//! let device = std::fs::OpenOptions::new()
//!     .read(true)
//!     .write(true)
//!     .open("/dev/sbefifo1")?;
//! let mut fifo = SbeFifo::new(device);
//!
//! let mut buf = [0u8; 64];
//! if fifo.get_memory(0x0800_0000, &mut buf, false).is_err() {
//!     let (status, ffdc) = fifo.ffdc();
//!     eprintln!("SBE status 0x{status:08x}, {} bytes of FFDC", ffdc.len());
//! }
//! ```
//!
//! ## Error Handling
//!
//! This library uses the [`error::Error`] type. Framing problems (short
//! response, bad offset, bad magic, command echo mismatch) indicate a
//! desynchronized exchange and are distinct from
//! [`error::Error::OperationFailed`], which means the SBE itself rejected
//! the operation and FFDC was captured; the engine stays usable.
//!
//! ## Thread Safety
//!
//! The engine is strictly synchronous and owns its transport for the full
//! duration of an operation. The protocol has no request identifiers, so a
//! multi-threaded host must serialize access per engine.

pub mod protocol;
pub use protocol::*;
pub mod codec;
pub mod error;
pub mod fifo;
pub use fifo::{Ffdc, SbeFifo};
