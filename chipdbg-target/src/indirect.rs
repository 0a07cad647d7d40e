//! # Indirect SCOM addressing
//!
//! Some processor bus registers sit behind an indirection window: the
//! access is performed by writing an address/command word to a fixed
//! indirect register and polling it until the hardware flags completion.
//! The top address bit selects the indirect form; form 1 (bit 60 set) is
//! a different encoding that is not supported.
use crate::{error::BusError, target::PibBus};

const PIB_IND_MAX_RETRIES: usize = 10;

/// Read command flag in the control word (bit 0, PPC numbering).
const PIB_IND_READ: u64 = 0x8000_0000_0000_0000;
/// Register address field of the control word (bits 12-31).
const PIB_IND_ADDR: u64 = 0x000F_FFFF_0000_0000;
/// Data field of the control word (bits 48-63).
const PIB_IND_DATA: u64 = 0x0000_0000_0000_FFFF;

/// Completion flag in the polled status (bit 32).
const PIB_DATA_IND_COMPLETE: u64 = 0x0000_0000_8000_0000;
/// Error field in the polled status (bits 33-35).
const PIB_DATA_IND_ERR: u64 = 0x0000_0000_7000_0000;
/// Data field in the polled status (bits 48-63).
const PIB_DATA_IND_DATA: u64 = 0x0000_0000_0000_FFFF;

fn indirect_register(addr: u64) -> Result<u64, BusError> {
    if (addr >> 60) & 1 != 0 {
        log::error!("Indirect form 1 not supported");
        return Err(BusError::IndirectUnsupported);
    }
    Ok(addr & 0x7fff_ffff)
}

/// Poll the indirect register until completion. Returns the raw status
/// word of the completing read; at most 10 polls, then a timeout. A
/// completed poll carrying a nonzero error field fails immediately. A
/// transport failure aborts the whole access, it is not one of the 10.
fn wait_complete(pib: &mut dyn PibBus, indirect_addr: u64) -> Result<u64, BusError> {
    for _ in 0..PIB_IND_MAX_RETRIES {
        let data = pib.read(indirect_addr)?;

        if data & PIB_DATA_IND_COMPLETE != 0 {
            let status = ((data & PIB_DATA_IND_ERR) >> 28) as u8;
            if status == 0 {
                return Ok(data);
            }
            log::error!("Indirect access completed with error, status={}", status);
            return Err(BusError::IndirectError { status });
        }
    }

    log::error!("Indirect access did not complete after {} polls", PIB_IND_MAX_RETRIES);
    Err(BusError::IndirectTimeout)
}

pub(crate) fn indirect_read(pib: &mut dyn PibBus, addr: u64) -> Result<u64, BusError> {
    let indirect_addr = indirect_register(addr)?;

    pib.write(indirect_addr, PIB_IND_READ | (addr & PIB_IND_ADDR))?;
    let data = wait_complete(pib, indirect_addr)?;
    Ok(data & PIB_DATA_IND_DATA)
}

pub(crate) fn indirect_write(pib: &mut dyn PibBus, addr: u64, data: u64) -> Result<(), BusError> {
    let indirect_addr = indirect_register(addr)?;

    pib.write(indirect_addr, (data & PIB_IND_DATA) | (addr & PIB_IND_ADDR))?;
    wait_complete(pib, indirect_addr)?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::target::Hardware;
    use std::collections::VecDeque;
    use std::io;

    /// A pib whose reads play back a script and which records every write.
    struct ScriptedPib {
        reads: VecDeque<io::Result<u64>>,
        writes: Vec<(u64, u64)>,
        reads_issued: usize,
    }

    impl ScriptedPib {
        fn new(reads: impl IntoIterator<Item = io::Result<u64>>) -> ScriptedPib {
            ScriptedPib {
                reads: reads.into_iter().collect(),
                writes: Vec::new(),
                reads_issued: 0,
            }
        }
    }

    impl Hardware for ScriptedPib {}

    impl PibBus for ScriptedPib {
        fn read(&mut self, _addr: u64) -> io::Result<u64> {
            self.reads_issued += 1;
            self.reads.pop_front().unwrap_or_else(|| Ok(0))
        }

        fn write(&mut self, addr: u64, data: u64) -> io::Result<()> {
            self.writes.push((addr, data));
            Ok(())
        }
    }

    const ADDR: u64 = 0x8000_0001_0001_2345;
    const COMPLETE: u64 = PIB_DATA_IND_COMPLETE;

    #[test]
    fn read_succeeds_after_exactly_k_polls() {
        for k in 1..=10 {
            let mut polls: Vec<io::Result<u64>> = (1..k).map(|_| Ok(0)).collect();
            polls.push(Ok(COMPLETE | 0xbeef));

            let mut pib = ScriptedPib::new(polls);
            let data = indirect_read(&mut pib, ADDR).unwrap();
            assert_eq!(data, 0xbeef);
            assert_eq!(pib.reads_issued, k);
        }
    }

    #[test]
    fn read_composes_control_word() {
        let mut pib = ScriptedPib::new([Ok(COMPLETE)]);
        indirect_read(&mut pib, ADDR).unwrap();

        // Top bit cleared, low 31 bits of the address select the register.
        assert_eq!(
            pib.writes,
            &[(0x0001_2345, PIB_IND_READ | (ADDR & PIB_IND_ADDR))]
        );
    }

    #[test]
    fn error_field_fails_without_further_polls() {
        let mut pib = ScriptedPib::new([Ok(0), Ok(COMPLETE | 0x3000_0000), Ok(COMPLETE)]);
        match indirect_read(&mut pib, ADDR) {
            Err(BusError::IndirectError { status: 3 }) => {}
            other => panic!("expected IndirectError, got {:?}", other),
        }
        assert_eq!(pib.reads_issued, 2);
    }

    #[test]
    fn never_complete_times_out_after_ten_polls() {
        let mut pib = ScriptedPib::new((0..20).map(|_| Ok(0)));
        match indirect_read(&mut pib, ADDR) {
            Err(BusError::IndirectTimeout) => {}
            other => panic!("expected IndirectTimeout, got {:?}", other),
        }
        assert_eq!(pib.reads_issued, 10);
    }

    #[test]
    fn transport_failure_aborts_immediately() {
        let mut pib = ScriptedPib::new([Ok(0), Err(io::Error::other("scom failed"))]);
        match indirect_read(&mut pib, ADDR) {
            Err(BusError::Io(_)) => {}
            other => panic!("expected Io, got {:?}", other),
        }
        assert_eq!(pib.reads_issued, 2);
    }

    #[test]
    fn form_1_is_rejected_untouched() {
        let mut pib = ScriptedPib::new([]);
        match indirect_read(&mut pib, ADDR | 1 << 60) {
            Err(BusError::IndirectUnsupported) => {}
            other => panic!("expected IndirectUnsupported, got {:?}", other),
        }
        assert!(pib.writes.is_empty());
        assert_eq!(pib.reads_issued, 0);
    }

    #[test]
    fn write_merges_data_and_address_fields() {
        let mut pib = ScriptedPib::new([Ok(COMPLETE)]);
        indirect_write(&mut pib, ADDR, 0x1234_cafe).unwrap();

        assert_eq!(
            pib.writes,
            &[(0x0001_2345, (ADDR & PIB_IND_ADDR) | 0xcafe)]
        );
    }

    #[test]
    fn write_polls_to_completion() {
        let mut pib = ScriptedPib::new([Ok(0), Ok(0), Ok(COMPLETE)]);
        indirect_write(&mut pib, ADDR, 0).unwrap();
        assert_eq!(pib.reads_issued, 3);
    }
}
