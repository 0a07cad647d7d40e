//! # Kernel FSI Backend
//!
//! Drives the FSI CFAM address space through the raw file the Linux FSI
//! bus driver exposes for the first slave. The kernel owns link training;
//! this backend only issues positioned 4-byte accesses and, at probe time,
//! kicks off a rescan when the slave has not shown up yet.
use std::{fs, io, os::unix::fs::OpenOptionsExt, thread, time::Duration};

use chipdbg_target::{FsiBus, Hardware, Node};
use nix::libc;
use nix::sys::uio::{pread, pwrite};

const FSI_SCAN_PATH: &str = "/sys/bus/platform/devices/gpio-fsi/fsi0/rescan";
const FSI_CFAM_PATH: &str = "/sys/devices/platform/gpio-fsi/fsi0/slave@00:00/raw";

const PROBE_ATTEMPTS: usize = 5;

/// FSI master reached through the kernel FSI driver's raw CFAM file.
#[derive(Default)]
pub struct KernelFsi {
    file: Option<fs::File>,
}

/// CFAM addresses are word addresses; the raw file wants the register
/// byte offset folded in below the engine offset.
fn cfam_offset(addr: u32) -> i64 {
    ((addr & 0x7ffc00) | ((addr & 0x3ff) << 2)) as i64
}

fn scan_devices() -> io::Result<()> {
    fs::write(FSI_SCAN_PATH, "1")
}

impl KernelFsi {
    pub fn new() -> KernelFsi {
        KernelFsi::default()
    }

    fn open_raw() -> io::Result<fs::File> {
        fs::OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_SYNC)
            .open(FSI_CFAM_PATH)
    }

    fn file(&self) -> io::Result<&fs::File> {
        self.file
            .as_ref()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "FSI master not probed"))
    }
}

impl Hardware for KernelFsi {
    fn probe(&mut self, _node: &Node) -> io::Result<()> {
        if self.file.is_some() {
            return Ok(());
        }

        let mut attempts = PROBE_ATTEMPTS;
        loop {
            match KernelFsi::open_raw() {
                Ok(file) => {
                    log::info!("Opened {}", FSI_CFAM_PATH);
                    self.file = Some(file);
                    return Ok(());
                }
                Err(error) => {
                    attempts -= 1;
                    if attempts == 0 {
                        log::error!("Unable to open {}: {}", FSI_CFAM_PATH, error);
                        return Err(error);
                    }
                    log::debug!("FSI slave not present ({}), rescanning", error);
                    scan_devices()?;
                    thread::sleep(Duration::from_secs(1));
                }
            }
        }
    }
}

impl FsiBus for KernelFsi {
    fn read(&mut self, addr: u32) -> io::Result<u32> {
        let file = self.file()?;
        let mut buf = [0u8; 4];
        match pread(file, &mut buf, cfam_offset(addr)) {
            Ok(4) => Ok(u32::from_be_bytes(buf)),
            Ok(n) => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("short CFAM read of {} bytes", n),
            )),
            Err(errno) => {
                // Reads of 0xc09 occasionally fail by design: the probing
                // code uses that register to see if anything is present
                // on the link.
                if addr & 0xfff != 0xc09 {
                    log::warn!("Failed to read from 0x{:08x} ({:08x})", cfam_offset(addr), addr);
                }
                Err(io::Error::from(errno))
            }
        }
    }

    fn write(&mut self, addr: u32, data: u32) -> io::Result<()> {
        let file = self.file()?;
        match pwrite(file, &data.to_be_bytes(), cfam_offset(addr)) {
            Ok(4) => Ok(()),
            Ok(n) => Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("short CFAM write of {} bytes", n),
            )),
            Err(errno) => {
                log::warn!("Failed to write to 0x{:08x} ({:08x})", cfam_offset(addr), addr);
                Err(io::Error::from(errno))
            }
        }
    }
}
