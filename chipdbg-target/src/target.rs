//! # Target model
//!
//! A [`Target`] is a hardware unit bound to exactly one device-tree node.
//! Its class decides which operation set is valid, so the class is a
//! closed sum type: each variant owns the driver implementing that class's
//! primitives. The drivers behind the traits range from kernel device
//! files to in-memory fakes; the tree-level dispatch code does not care.
use std::{fmt::Display, io};

use crate::tree::Node;

/// The bus classes a target may implement.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum TargetClass {
    /// Processor bus (SCOM) registers, 64-bit data.
    Pib,
    /// On-chip peripheral bus, 32-bit data.
    Opb,
    /// FSI CFAM address space, 32-bit data.
    Fsi,
    /// Self-boot engine command FIFO.
    SbeFifo,
}

impl TargetClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetClass::Pib => "pib",
            TargetClass::Opb => "opb",
            TargetClass::Fsi => "fsi",
            TargetClass::SbeFifo => "sbefifo",
        }
    }
}

impl Display for TargetClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Common behavior of every hardware unit.
///
/// `probe` confirms once, before any operation, that the unit is actually
/// reachable, typically by opening its device file. A unit that does not
/// override it declares no probe and is assumed present.
pub trait Hardware {
    fn probe(&mut self, node: &Node) -> io::Result<()> {
        let _ = node;
        Ok(())
    }
}

/// Processor bus primitives. Addresses passed here are fully translated;
/// errors mean the transport itself failed, retry policy belongs to the
/// caller.
pub trait PibBus: Hardware {
    fn read(&mut self, addr: u64) -> io::Result<u64>;
    fn write(&mut self, addr: u64, data: u64) -> io::Result<()>;
}

/// On-chip peripheral bus primitives.
pub trait OpbBus: Hardware {
    fn read(&mut self, addr: u32) -> io::Result<u32>;
    fn write(&mut self, addr: u32, data: u32) -> io::Result<()>;
}

/// FSI CFAM primitives.
pub trait FsiBus: Hardware {
    fn read(&mut self, addr: u32) -> io::Result<u32>;
    fn write(&mut self, addr: u32, data: u32) -> io::Result<()>;
}

/// Operation set of the SBE FIFO class. Mirrors the engine API of
/// `chipdbg-sbefifo`; errors are that crate's [`chipdbg_sbefifo::error::Error`].
pub trait SbeFifoOps: Hardware {
    fn istep(&mut self, major: u32, minor: u32) -> chipdbg_sbefifo::error::Result<()>;
    fn get_memory(
        &mut self,
        addr: u64,
        buf: &mut [u8],
        ci: bool,
    ) -> chipdbg_sbefifo::error::Result<()>;
    fn put_memory(
        &mut self,
        addr: u64,
        data: &[u8],
        ci: bool,
    ) -> chipdbg_sbefifo::error::Result<()>;
    /// Status and diagnostics of the most recent failed operation.
    fn ffdc(&self) -> (u32, &[u8]);
}

/// The class-specific half of a target: one driver per bus class.
pub enum TargetKind {
    Pib(Box<dyn PibBus>),
    Opb(Box<dyn OpbBus>),
    Fsi(Box<dyn FsiBus>),
    SbeFifo(Box<dyn SbeFifoOps>),
}

impl TargetKind {
    pub fn class(&self) -> TargetClass {
        match self {
            TargetKind::Pib(_) => TargetClass::Pib,
            TargetKind::Opb(_) => TargetClass::Opb,
            TargetKind::Fsi(_) => TargetClass::Fsi,
            TargetKind::SbeFifo(_) => TargetClass::SbeFifo,
        }
    }

    fn hardware_mut(&mut self) -> &mut dyn Hardware {
        match self {
            TargetKind::Pib(unit) => unit.as_mut(),
            TargetKind::Opb(unit) => unit.as_mut(),
            TargetKind::Fsi(unit) => unit.as_mut(),
            TargetKind::SbeFifo(unit) => unit.as_mut(),
        }
    }
}

/// A hardware unit instantiated for one device-tree node.
pub struct Target {
    pub(crate) name: &'static str,
    pub(crate) compatible: String,
    pub(crate) index: Option<u32>,
    pub(crate) kind: TargetKind,
}

impl Target {
    /// Human-readable unit name, e.g. "Kernel based FSI master".
    pub fn name(&self) -> &str {
        self.name
    }

    /// The compatible string this target was bound through.
    pub fn compatible(&self) -> &str {
        &self.compatible
    }

    /// Value of the node's `index` property, if any.
    pub fn index(&self) -> Option<u32> {
        self.index
    }

    pub fn class(&self) -> TargetClass {
        self.kind.class()
    }

    pub fn kind(&self) -> &TargetKind {
        &self.kind
    }

    pub(crate) fn probe(&mut self, node: &Node) -> io::Result<()> {
        self.kind.hardware_mut().probe(node)
    }
}
