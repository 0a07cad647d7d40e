//! # Kernel SBE FIFO Backend
//!
//! Binds the `chipdbg-sbefifo` engine to the character device named by the
//! node's `device-path` property. All protocol work happens in the engine;
//! this backend only owns the open file.
use std::{fs, io, os::unix::fs::OpenOptionsExt};

use chipdbg_sbefifo::{SbeFifo, error::Error};
use chipdbg_target::{Hardware, Node, SbeFifoOps};
use nix::libc;

/// SBE FIFO reached through the kernel driver's character device.
#[derive(Default)]
pub struct KernelSbeFifo {
    fifo: Option<SbeFifo<fs::File>>,
}

impl KernelSbeFifo {
    pub fn new() -> KernelSbeFifo {
        KernelSbeFifo::default()
    }

    fn fifo_mut(&mut self) -> chipdbg_sbefifo::error::Result<&mut SbeFifo<fs::File>> {
        self.fifo.as_mut().ok_or_else(|| {
            Error::Io(io::Error::new(
                io::ErrorKind::NotConnected,
                "sbefifo not probed",
            ))
        })
    }
}

impl Hardware for KernelSbeFifo {
    fn probe(&mut self, node: &Node) -> io::Result<()> {
        let path = node.property_str("device-path").ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                "sbefifo node carries no device-path property",
            )
        })?;

        let file = fs::OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_SYNC)
            .open(path)
            .inspect_err(|error| {
                log::error!("Unable to open sbefifo driver {}: {}", path, error);
            })?;

        self.fifo = Some(SbeFifo::new(file));
        Ok(())
    }
}

impl SbeFifoOps for KernelSbeFifo {
    fn istep(&mut self, major: u32, minor: u32) -> chipdbg_sbefifo::error::Result<()> {
        self.fifo_mut()?.istep(major, minor)
    }

    fn get_memory(
        &mut self,
        addr: u64,
        buf: &mut [u8],
        ci: bool,
    ) -> chipdbg_sbefifo::error::Result<()> {
        self.fifo_mut()?.get_memory(addr, buf, ci)
    }

    fn put_memory(
        &mut self,
        addr: u64,
        data: &[u8],
        ci: bool,
    ) -> chipdbg_sbefifo::error::Result<()> {
        self.fifo_mut()?.put_memory(addr, data, ci)
    }

    fn ffdc(&self) -> (u32, &[u8]) {
        match &self.fifo {
            Some(fifo) => fifo.ffdc(),
            None => (0, &[]),
        }
    }
}
