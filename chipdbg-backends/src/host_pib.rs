//! # Host Debugfs XSCOM Backend
//!
//! For hosts that can reach their own processor bus through the powerpc
//! XSCOM debugfs interface: one `access` file per chip, positioned 8-byte
//! reads and writes.
use std::{fs, io};

use chipdbg_target::{Hardware, Node, PibBus};
use nix::sys::uio::{pread, pwrite};

const XSCOM_BASE_PATH: &str = "/sys/kernel/debug/powerpc/scom";

/// Processor bus reached through the host's XSCOM debugfs files. The node
/// must carry a `chip-id` property selecting the access file.
#[derive(Default)]
pub struct HostPib {
    file: Option<fs::File>,
}

/// Debugfs flattens the address space: the indirect-mode top nibble moves
/// down four bits so it survives the interface, and the whole address is
/// a file offset in 8-byte units.
fn mangle_addr(addr: u64) -> i64 {
    let indirect = (addr & 0xf000_0000_0000_0000) >> 4;
    let addr = (addr & 0x00ff_ffff_ffff_ffff) | indirect;
    (addr << 3) as i64
}

impl HostPib {
    pub fn new() -> HostPib {
        HostPib::default()
    }

    fn file(&self) -> io::Result<&fs::File> {
        self.file
            .as_ref()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "XSCOM not probed"))
    }
}

impl Hardware for HostPib {
    fn probe(&mut self, node: &Node) -> io::Result<()> {
        let chip_id = node.property_u32("chip-id").ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                "pib node carries no chip-id property",
            )
        })?;

        let access = format!("{}/{:08}/access", XSCOM_BASE_PATH, chip_id);
        log::debug!("Opening XSCOM access file {}", access);
        self.file = Some(fs::OpenOptions::new().read(true).write(true).open(access)?);
        Ok(())
    }
}

impl PibBus for HostPib {
    fn read(&mut self, addr: u64) -> io::Result<u64> {
        let file = self.file()?;
        let mut buf = [0u8; 8];
        let n = pread(file, &mut buf, mangle_addr(addr)).map_err(io::Error::from)?;
        if n != 8 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("short XSCOM read of {} bytes", n),
            ));
        }
        // The debugfs interface hands the register back in host byte order.
        Ok(u64::from_ne_bytes(buf))
    }

    fn write(&mut self, addr: u64, data: u64) -> io::Result<()> {
        let file = self.file()?;
        let n = pwrite(file, &data.to_ne_bytes(), mangle_addr(addr)).map_err(io::Error::from)?;
        if n != 8 {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("short XSCOM write of {} bytes", n),
            ));
        }
        Ok(())
    }
}
