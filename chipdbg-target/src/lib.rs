//! # Target and Bus Model Library
//!
//! This crate provides the device-tree driven hardware model used to issue
//! register- and memory-level operations against the on-chip interfaces of
//! POWER processors: the processor bus (PIB/SCOM), the on-chip peripheral
//! bus (OPB), the FSI CFAM space and the self-boot engine FIFO.
//!
//! ## Overview
//!
//! The hardware is described by a device tree. Every node whose
//! `compatible` property matches a registered hardware unit is bound to a
//! [`target::Target`] carrying the driver for that unit's bus class. An
//! operation issued against an arbitrary node walks the ancestor chain,
//! translating the address through each node's `reg` value, until it
//! reaches a target of the class being addressed, so a core register read
//! can transparently travel over a PIB behind an FSI master, depending on
//! nothing but the shape of the tree.
//!
//! ## How It Works
//!
//! 1. Backends register their units into a [`registry::Registry`]
//!    (`chipdbg-backends` provides `register_all`)
//! 2. The tree is built programmatically or expanded from a flattened
//!    device-tree blob (the `fdt` feature)
//! 3. [`tree::DeviceTree::bind_targets`] instantiates a driver for every
//!    matching node
//! 4. [`tree::DeviceTree::probe_targets`] runs once and disables every
//!    subtree whose hardware is absent
//! 5. Bus operations ([`tree::DeviceTree::pib_read`] and friends) resolve
//!    and dispatch
//!
//! ## Basic Usage
//!
//! ```ignore
//! use chipdbg_target::{registry::Registry, tree::DeviceTree};
//!
//! let mut registry = Registry::new();
//! chipdbg_backends::register_all(&mut registry);
//!
//! let mut tree = chipdbg_target::expand::expand(&blob)?;
//! tree.bind_targets(&registry);
//! tree.probe_targets();
//!
//! for &pib in tree.class_targets(chipdbg_target::target::TargetClass::Pib) {
//!     let value = tree.pib_read(pib, 0xf000f)?;
//!     println!("chip id register: {value:016x}");
//! }
//! ```
//!
//! ## Error Handling
//!
//! Operations return [`error::BusError`]. A malformed tree (no target of
//! the requested class up the ancestor chain) is reported as a typed
//! error rather than a crash, but it is a precondition violation: the
//! tree does not describe the hardware the caller believes it does.
//! Transport failures and the indirect-access outcomes are separate
//! variants.
//!
//! ## Concurrency
//!
//! Everything here is synchronous and blocking. Operations on one target
//! are totally ordered because each owns the target's transport for its
//! full duration; hosts with multiple threads must serialize access per
//! target.

pub mod error;
pub mod registry;
pub mod target;
pub mod tree;

mod bus;
mod indirect;
mod probe;

#[cfg(feature = "fdt")]
pub mod expand;

pub use error::BusError;
pub use registry::{HwUnit, Registry};
pub use target::{FsiBus, Hardware, OpbBus, PibBus, SbeFifoOps, Target, TargetClass, TargetKind};
pub use tree::{DeviceTree, Node, NodeId};
