//! # Bus resolution and dispatch
//!
//! Register operations are issued against an arbitrary node and an address
//! local to that node's bus. The resolver walks ancestors, summing each
//! visited node's translation value, until it reaches a target of the
//! wanted class; that target's primitives then carry the access. For the
//! processor bus a resolved address with the top bit set diverts into the
//! indirect SCOM sequence instead of a plain read or write.
use crate::{
    error::BusError,
    indirect::{indirect_read, indirect_write},
    target::{FsiBus, OpbBus, PibBus, SbeFifoOps, TargetClass, TargetKind},
    tree::{DeviceTree, NodeId},
};

/// Indirect form selector on processor bus addresses (bit 0, PPC
/// numbering).
const PIB_INDIRECT: u64 = 0x8000_0000_0000_0000;

impl DeviceTree {
    /// Find the closest ancestor (including `node` itself) bound to a
    /// target of `class`, translating `addr` along the way.
    ///
    /// Every node visited must be bound to a target and the walk must find
    /// the class before running out of parents; anything else means the
    /// device tree does not describe the hardware it claims to and is
    /// reported as [`BusError::MalformedTree`].
    pub fn resolve(
        &self,
        node: NodeId,
        class: TargetClass,
        addr: u64,
    ) -> Result<(NodeId, u64), BusError> {
        let mut current = node;
        let mut addr = addr;

        loop {
            let node = self.node(current);
            let Some(target) = node.target() else {
                return Err(BusError::MalformedTree {
                    node: node.name().to_owned(),
                    class,
                });
            };
            if target.class() == class {
                return Ok((current, addr));
            }

            addr = addr.wrapping_add(self.translation_address(current));
            let Some(parent) = node.parent() else {
                return Err(BusError::MalformedTree {
                    node: node.name().to_owned(),
                    class,
                });
            };
            current = parent;
        }
    }

    /// Read a processor bus register relative to `node`.
    pub fn pib_read(&mut self, node: NodeId, addr: u64) -> Result<u64, BusError> {
        self.check_enabled(node)?;
        let (owner, addr) = self.resolve(node, TargetClass::Pib, addr)?;
        let pib = self.pib_at(owner)?;
        if addr & PIB_INDIRECT != 0 {
            indirect_read(pib, addr)
        } else {
            Ok(pib.read(addr)?)
        }
    }

    /// Write a processor bus register relative to `node`.
    pub fn pib_write(&mut self, node: NodeId, addr: u64, data: u64) -> Result<(), BusError> {
        self.check_enabled(node)?;
        let (owner, addr) = self.resolve(node, TargetClass::Pib, addr)?;
        let pib = self.pib_at(owner)?;
        if addr & PIB_INDIRECT != 0 {
            indirect_write(pib, addr, data)
        } else {
            Ok(pib.write(addr, data)?)
        }
    }

    /// Read an on-chip peripheral bus register relative to `node`.
    pub fn opb_read(&mut self, node: NodeId, addr: u32) -> Result<u32, BusError> {
        self.check_enabled(node)?;
        let (owner, addr) = self.resolve(node, TargetClass::Opb, addr as u64)?;
        let opb = self.opb_at(owner)?;
        Ok(opb.read(addr as u32)?)
    }

    /// Write an on-chip peripheral bus register relative to `node`.
    pub fn opb_write(&mut self, node: NodeId, addr: u32, data: u32) -> Result<(), BusError> {
        self.check_enabled(node)?;
        let (owner, addr) = self.resolve(node, TargetClass::Opb, addr as u64)?;
        let opb = self.opb_at(owner)?;
        Ok(opb.write(addr as u32, data)?)
    }

    /// Read an FSI CFAM register relative to `node`.
    pub fn fsi_read(&mut self, node: NodeId, addr: u32) -> Result<u32, BusError> {
        self.check_enabled(node)?;
        let (owner, addr) = self.resolve(node, TargetClass::Fsi, addr as u64)?;
        let fsi = self.fsi_at(owner)?;
        Ok(fsi.read(addr as u32)?)
    }

    /// Write an FSI CFAM register relative to `node`.
    pub fn fsi_write(&mut self, node: NodeId, addr: u32, data: u32) -> Result<(), BusError> {
        self.check_enabled(node)?;
        let (owner, addr) = self.resolve(node, TargetClass::Fsi, addr as u64)?;
        let fsi = self.fsi_at(owner)?;
        Ok(fsi.write(addr as u32, data)?)
    }

    /// The FIFO operation set of a node bound to an sbefifo target. The
    /// FIFO class defines no address translation, so no resolver walk is
    /// involved.
    pub fn sbefifo(&mut self, node: NodeId) -> Result<&mut dyn SbeFifoOps, BusError> {
        self.check_enabled(node)?;
        let node = self.node_mut(node);
        match node.target.as_mut().map(|target| &mut target.kind) {
            Some(TargetKind::SbeFifo(fifo)) => Ok(fifo.as_mut()),
            _ => Err(BusError::NotFifo {
                node: node.name.clone(),
            }),
        }
    }

    fn check_enabled(&self, node: NodeId) -> Result<(), BusError> {
        if self.is_enabled(node) {
            Ok(())
        } else {
            Err(BusError::Disabled {
                node: self.node(node).name().to_owned(),
            })
        }
    }

    fn pib_at(&mut self, id: NodeId) -> Result<&mut dyn PibBus, BusError> {
        let node = self.node_mut(id);
        match node.target.as_mut().map(|target| &mut target.kind) {
            Some(TargetKind::Pib(pib)) => Ok(pib.as_mut()),
            _ => Err(BusError::MalformedTree {
                node: node.name.clone(),
                class: TargetClass::Pib,
            }),
        }
    }

    fn opb_at(&mut self, id: NodeId) -> Result<&mut dyn OpbBus, BusError> {
        let node = self.node_mut(id);
        match node.target.as_mut().map(|target| &mut target.kind) {
            Some(TargetKind::Opb(opb)) => Ok(opb.as_mut()),
            _ => Err(BusError::MalformedTree {
                node: node.name.clone(),
                class: TargetClass::Opb,
            }),
        }
    }

    fn fsi_at(&mut self, id: NodeId) -> Result<&mut dyn FsiBus, BusError> {
        let node = self.node_mut(id);
        match node.target.as_mut().map(|target| &mut target.kind) {
            Some(TargetKind::Fsi(fsi)) => Ok(fsi.as_mut()),
            _ => Err(BusError::MalformedTree {
                node: node.name.clone(),
                class: TargetClass::Fsi,
            }),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::registry::{HwUnit, Registry};
    use crate::target::Hardware;
    use std::cell::RefCell;
    use std::io;
    use std::rc::Rc;

    type Log = Rc<RefCell<Vec<(TargetClass, u64)>>>;

    /// Records the addresses each class-level driver is asked to access.
    struct RecordingPib(Log);

    impl Hardware for RecordingPib {}

    impl PibBus for RecordingPib {
        fn read(&mut self, addr: u64) -> io::Result<u64> {
            self.0.borrow_mut().push((TargetClass::Pib, addr));
            Ok(0x1122_3344_5566_7788)
        }

        fn write(&mut self, addr: u64, _data: u64) -> io::Result<()> {
            self.0.borrow_mut().push((TargetClass::Pib, addr));
            Ok(())
        }
    }

    struct RecordingFsi(Log);

    impl Hardware for RecordingFsi {}

    impl FsiBus for RecordingFsi {
        fn read(&mut self, addr: u32) -> io::Result<u32> {
            self.0.borrow_mut().push((TargetClass::Fsi, addr as u64));
            Ok(0xfeed_0cfa)
        }

        fn write(&mut self, addr: u32, _data: u32) -> io::Result<()> {
            self.0.borrow_mut().push((TargetClass::Fsi, addr as u64));
            Ok(())
        }
    }

    thread_local! {
        static ACCESS_LOG: Log = Log::default();
    }

    fn registry() -> Registry {
        let mut registry = Registry::new();
        registry.register(HwUnit {
            name: "Recording PIB",
            compatible: "test,pib",
            build: || TargetKind::Pib(Box::new(RecordingPib(ACCESS_LOG.with(Rc::clone)))),
        });
        registry.register(HwUnit {
            name: "Recording FSI",
            compatible: "test,fsi",
            build: || TargetKind::Fsi(Box::new(RecordingFsi(ACCESS_LOG.with(Rc::clone)))),
        });
        registry
    }

    fn take_log() -> Vec<(TargetClass, u64)> {
        ACCESS_LOG.with(|log| log.borrow_mut().drain(..).collect())
    }

    /// fsi master -> pib (reg 0x1000) -> core (reg 0x20, no own class
    /// match for anything).
    fn chained_tree() -> (DeviceTree, NodeId, NodeId, NodeId) {
        let mut tree = DeviceTree::new();
        tree.set_property_str(tree.root(), "compatible", "test,fsi");
        tree.set_property_u32(tree.root(), "#address-cells", 1);

        let pib = tree.add_node(tree.root(), "pib@1000");
        tree.set_property_str(pib, "compatible", "test,pib");
        tree.set_property(pib, "reg", 0x1000_u32.to_be_bytes().to_vec());
        tree.set_property_u32(pib, "#address-cells", 1);

        let core = tree.add_node(pib, "core@20");
        tree.set_property_str(core, "compatible", "test,pib");
        tree.set_property(core, "reg", 0x20_u32.to_be_bytes().to_vec());

        tree.bind_targets(&registry());
        let root = tree.root();
        (tree, root, pib, core)
    }

    #[test]
    fn resolve_finds_node_itself_first() {
        let (tree, _, pib, _) = chained_tree();
        let (owner, addr) = tree.resolve(pib, TargetClass::Pib, 0x42).unwrap();
        assert_eq!(owner, pib);
        assert_eq!(addr, 0x42);
    }

    #[test]
    fn resolve_translates_through_ancestors() {
        let (tree, root, _, core) = chained_tree();
        // The core is itself pib class, so seek fsi: core and pib both
        // contribute their reg addresses before the walk lands on the
        // fsi master at the root.
        let (owner, addr) = tree.resolve(core, TargetClass::Fsi, 0x4).unwrap();
        assert_eq!(owner, root);
        assert_eq!(addr, 0x4 + 0x20 + 0x1000);
    }

    #[test]
    fn resolve_without_matching_ancestor_is_malformed() {
        let (tree, _, _, core) = chained_tree();
        match tree.resolve(core, TargetClass::Opb, 0) {
            Err(BusError::MalformedTree {
                class: TargetClass::Opb,
                ..
            }) => {}
            other => panic!("expected MalformedTree, got {:?}", other),
        }
    }

    #[test]
    fn resolve_through_unbound_node_is_malformed() {
        let mut tree = DeviceTree::new();
        tree.set_property_str(tree.root(), "compatible", "test,fsi");
        let glue = tree.add_node(tree.root(), "glue");
        let leaf = tree.add_node(glue, "leaf");
        tree.set_property_str(leaf, "compatible", "test,pib");
        tree.bind_targets(&registry());

        match tree.resolve(leaf, TargetClass::Fsi, 0) {
            Err(BusError::MalformedTree { node, .. }) => assert_eq!(node, "glue"),
            other => panic!("expected MalformedTree, got {:?}", other),
        }
    }

    #[test]
    fn pib_read_dispatches_translated_address() {
        let (mut tree, _, _, core) = chained_tree();
        let data = tree.pib_read(core, 0x8).unwrap();
        assert_eq!(data, 0x1122_3344_5566_7788);
        // The core node is pib class itself, no translation happens.
        assert_eq!(take_log(), &[(TargetClass::Pib, 0x8)]);
    }

    #[test]
    fn fsi_read_translates_and_truncates() {
        let (mut tree, _, _, core) = chained_tree();
        let data = tree.fsi_read(core, 0xc00).unwrap();
        assert_eq!(data, 0xfeed_0cfa);
        assert_eq!(take_log(), &[(TargetClass::Fsi, 0xc00 + 0x20 + 0x1000)]);
    }

    #[test]
    fn pib_read_top_bit_goes_indirect() {
        let (mut tree, _, pib, _) = chained_tree();
        let addr = 0x8000_0001_0001_2345_u64;
        let _ = tree.pib_read(pib, addr);

        // First access is the control-word write to the indirect register
        // (top bit cleared), then the poll reads the same register.
        let log = take_log();
        assert_eq!(log[0], (TargetClass::Pib, 0x0001_2345));
        assert_eq!(log[1], (TargetClass::Pib, 0x0001_2345));
    }

    #[test]
    fn disabled_node_rejects_operations() {
        let (mut tree, _, pib, _) = chained_tree();
        tree.set_property_str(pib, "status", "disabled");
        match tree.pib_read(pib, 0) {
            Err(BusError::Disabled { node }) => assert_eq!(node, "pib@1000"),
            other => panic!("expected Disabled, got {:?}", other),
        }
        assert!(take_log().is_empty());
    }

    #[test]
    fn sbefifo_accessor_rejects_other_classes() {
        let (mut tree, _, pib, _) = chained_tree();
        match tree.sbefifo(pib) {
            Err(BusError::NotFifo { node }) => assert_eq!(node, "pib@1000"),
            other => panic!("expected NotFifo, got {:?}", other.map(|_| ())),
        }
    }
}
