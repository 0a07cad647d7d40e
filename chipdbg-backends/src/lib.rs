//! # chipdbg Hardware Unit Backends
//!
//! Linux-specific backend implementations for the chipdbg target model,
//! providing drivers for the hardware interfaces a debug host actually
//! reaches: the kernel FSI driver's raw CFAM file, the powerpc XSCOM
//! debugfs files, the SBE FIFO character device, plus fake units for
//! development without hardware.
//!
//! ## Overview
//!
//! This crate extends `chipdbg-target` with concrete drivers. Call
//! [`register_all`] once at startup, before binding the device tree:
//!
//! ```
//! use chipdbg_target::Registry;
//!
//! let mut registry = Registry::new();
//! chipdbg_backends::register_all(&mut registry);
//! assert!(registry.lookup("ibm,kernel-fsi").is_some());
//! ```
pub mod fake;
pub mod host_pib;
pub mod kernel_fsi;
pub mod kernel_sbefifo;

use chipdbg_target::{HwUnit, Registry, TargetKind};

use crate::fake::{FakeFsi, FakeOpb, FakePib};
use crate::host_pib::HostPib;
use crate::kernel_fsi::KernelFsi;
use crate::kernel_sbefifo::KernelSbeFifo;

/// Register every backend unit. The explicit startup call that populates
/// the registry before the tree is bound.
pub fn register_all(registry: &mut Registry) {
    registry.register(HwUnit {
        name: "Kernel based FSI master",
        compatible: "ibm,kernel-fsi",
        build: || TargetKind::Fsi(Box::new(KernelFsi::new())),
    });
    registry.register(HwUnit {
        name: "Host based debugfs SCOM",
        compatible: "ibm,host-pib",
        build: || TargetKind::Pib(Box::new(HostPib::new())),
    });
    registry.register(HwUnit {
        name: "Kernel based FSI SBE FIFO",
        compatible: "ibm,kernel-sbefifo",
        build: || TargetKind::SbeFifo(Box::new(KernelSbeFifo::new())),
    });
    registry.register(HwUnit {
        name: "Fake FSI",
        compatible: "ibm,fake-fsi",
        build: || TargetKind::Fsi(Box::new(FakeFsi)),
    });
    registry.register(HwUnit {
        name: "Fake PIB",
        compatible: "ibm,fake-pib",
        build: || TargetKind::Pib(Box::new(FakePib)),
    });
    registry.register(HwUnit {
        name: "Fake OPB",
        compatible: "ibm,fake-opb",
        build: || TargetKind::Opb(Box::new(FakeOpb)),
    });
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn registers_every_unit() {
        let mut registry = Registry::new();
        register_all(&mut registry);

        for compatible in [
            "ibm,kernel-fsi",
            "ibm,host-pib",
            "ibm,kernel-sbefifo",
            "ibm,fake-fsi",
            "ibm,fake-pib",
            "ibm,fake-opb",
        ] {
            assert!(registry.lookup(compatible).is_some(), "{}", compatible);
        }
        assert!(registry.lookup("ibm,bmcfsi").is_none());
    }
}
