//! Shared fixtures for the integration tests: an in-memory FIFO device
//! that can be scripted per thread, a hardware unit wrapping the protocol
//! engine around it, and helpers for building wire-format byte buffers.
use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::rc::Rc;

use chipdbg_sbefifo::SbeFifo;
use chipdbg_target::{Hardware, HwUnit, Node, Registry, SbeFifoOps, TargetKind};

/// State of the scripted FIFO device: everything the engine wrote, and
/// the canned responses still queued up (one per read).
#[derive(Default)]
pub struct FifoDeviceState {
    pub written: Vec<u8>,
    pub responses: VecDeque<Vec<u8>>,
}

/// Cloneable handle to a [`FifoDeviceState`], usable both as the engine's
/// transport and as the test's inspection port.
#[derive(Clone, Default)]
pub struct SharedFifoDevice(pub Rc<RefCell<FifoDeviceState>>);

impl SharedFifoDevice {
    pub fn push_response(&self, response: Vec<u8>) {
        self.0.borrow_mut().responses.push_back(response);
    }

    pub fn take_written(&self) -> Vec<u8> {
        std::mem::take(&mut self.0.borrow_mut().written)
    }
}

impl Write for SharedFifoDevice {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Read for SharedFifoDevice {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let response = self.0.borrow_mut().responses.pop_front().unwrap_or_default();
        let n = response.len().min(buf.len());
        buf[..n].copy_from_slice(&response[..n]);
        Ok(n)
    }
}

thread_local! {
    /// The device behind every `test,scripted-sbefifo` target bound on
    /// this thread.
    pub static FIFO_DEVICE: SharedFifoDevice = SharedFifoDevice::default();
}

/// A `sbefifo`-class unit running the real protocol engine over the
/// thread's scripted device.
pub struct ScriptedSbeFifo {
    engine: SbeFifo<SharedFifoDevice>,
}

impl ScriptedSbeFifo {
    pub fn new() -> ScriptedSbeFifo {
        ScriptedSbeFifo {
            engine: SbeFifo::new(FIFO_DEVICE.with(Clone::clone)),
        }
    }
}

impl Default for ScriptedSbeFifo {
    fn default() -> Self {
        ScriptedSbeFifo::new()
    }
}

impl Hardware for ScriptedSbeFifo {
    fn probe(&mut self, _node: &Node) -> io::Result<()> {
        Ok(())
    }
}

impl SbeFifoOps for ScriptedSbeFifo {
    fn istep(&mut self, major: u32, minor: u32) -> chipdbg_sbefifo::error::Result<()> {
        self.engine.istep(major, minor)
    }

    fn get_memory(
        &mut self,
        addr: u64,
        buf: &mut [u8],
        ci: bool,
    ) -> chipdbg_sbefifo::error::Result<()> {
        self.engine.get_memory(addr, buf, ci)
    }

    fn put_memory(
        &mut self,
        addr: u64,
        data: &[u8],
        ci: bool,
    ) -> chipdbg_sbefifo::error::Result<()> {
        self.engine.put_memory(addr, data, ci)
    }

    fn ffdc(&self) -> (u32, &[u8]) {
        self.engine.ffdc()
    }
}

/// All backend units plus the scripted FIFO.
pub fn test_registry() -> Registry {
    let mut registry = Registry::new();
    chipdbg_backends::register_all(&mut registry);
    registry.register(HwUnit {
        name: "Scripted SBE FIFO",
        compatible: "test,scripted-sbefifo",
        build: || TargetKind::SbeFifo(Box::new(ScriptedSbeFifo::new())),
    });
    registry
}

/// Big-endian word sequence as bytes.
pub fn be_words(words: &[u32]) -> Vec<u8> {
    words.iter().flat_map(|w| w.to_be_bytes()).collect()
}

/// Minimal success response for `command`: status header, zero status,
/// trailing offset word.
pub fn success_trailer(command: u16) -> Vec<u8> {
    be_words(&[0xc0de_0000 | command as u32, 0, 3])
}
