//! Fake units returning fixed data, for development without hardware and
//! for exercising the dispatch machinery in tests.
use std::io;

use chipdbg_target::{FsiBus, Hardware, OpbBus, PibBus};

pub struct FakeFsi;

impl Hardware for FakeFsi {}

impl FsiBus for FakeFsi {
    fn read(&mut self, addr: u32) -> io::Result<u32> {
        log::debug!("fake_fsi_read(0x{:04x}, 0x{:04x})", addr, 0xfeed_0cfa_u32);
        Ok(0xfeed_0cfa)
    }

    fn write(&mut self, addr: u32, data: u32) -> io::Result<()> {
        log::debug!("fake_fsi_write(0x{:04x}, 0x{:04x})", addr, data);
        Ok(())
    }
}

pub struct FakePib;

impl Hardware for FakePib {}

impl PibBus for FakePib {
    fn read(&mut self, addr: u64) -> io::Result<u64> {
        log::debug!("fake_pib_read(0x{:08x}, 0x{:08x})", addr, 0xdead_beef_u64);
        Ok(0xdead_beef)
    }

    fn write(&mut self, addr: u64, data: u64) -> io::Result<()> {
        log::debug!("fake_pib_write(0x{:08x}, 0x{:08x})", addr, data);
        Ok(())
    }
}

pub struct FakeOpb;

impl Hardware for FakeOpb {}

impl OpbBus for FakeOpb {
    fn read(&mut self, addr: u32) -> io::Result<u32> {
        log::debug!("fake_opb_read(0x{:04x}, 0x{:04x})", addr, 0xc0ff_ee00_u32);
        Ok(0xc0ff_ee00)
    }

    fn write(&mut self, addr: u32, data: u32) -> io::Result<()> {
        log::debug!("fake_opb_write(0x{:04x}, 0x{:04x})", addr, data);
        Ok(())
    }
}
