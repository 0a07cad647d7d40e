//! # Device tree node graph
//!
//! The tree is built once at startup, programmatically or from a
//! flattened device-tree blob, and lives for the process. Nodes are held
//! in an arena owned by [`DeviceTree`] and addressed by [`NodeId`], so the
//! parent back-reference is a plain index rather than a reference cycle.
//! Nodes are never removed; a subtree that turns out to be absent is
//! switched off by stamping a `status = "disabled"` property on it.
use std::collections::HashMap;

use crate::target::{Target, TargetClass};

/// Handle to a node of a [`DeviceTree`]. Only valid for the tree that
/// created it.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct NodeId(pub(crate) usize);

/// One node of the device tree: a name, ordered children, a property map
/// and at most one bound [`Target`].
pub struct Node {
    pub(crate) name: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    properties: HashMap<String, Vec<u8>>,
    pub(crate) target: Option<Target>,
}

impl Node {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn target(&self) -> Option<&Target> {
        self.target.as_ref()
    }

    /// Raw bytes of a property.
    pub fn property(&self, name: &str) -> Option<&[u8]> {
        self.properties.get(name).map(Vec::as_slice)
    }

    /// A property holding a (conventionally NUL-terminated) string.
    pub fn property_str(&self, name: &str) -> Option<&str> {
        let value = self.property(name)?;
        let value = value.strip_suffix(&[0]).unwrap_or(value);
        str::from_utf8(value).ok()
    }

    /// The first big-endian 32-bit cell of a property.
    pub fn property_u32(&self, name: &str) -> Option<u32> {
        let value = self.property(name)?;
        Some(u32::from_be_bytes(value.get(..4)?.try_into().ok()?))
    }
}

/// The process-wide device tree: node arena plus the per-class grouping of
/// bound targets.
pub struct DeviceTree {
    nodes: Vec<Node>,
    pub(crate) classes: HashMap<TargetClass, Vec<NodeId>>,
}

impl DeviceTree {
    /// Create a tree holding only an unnamed root.
    pub fn new() -> DeviceTree {
        DeviceTree {
            nodes: vec![Node {
                name: String::new(),
                parent: None,
                children: Vec::new(),
                properties: HashMap::new(),
                target: None,
            }],
            classes: HashMap::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Append a child node under `parent` and return its handle.
    pub fn add_node(&mut self, parent: NodeId, name: impl Into<String>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            name: name.into(),
            parent: Some(parent),
            children: Vec::new(),
            properties: HashMap::new(),
            target: None,
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    /// All node handles, in creation order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + use<> {
        (0..self.nodes.len()).map(NodeId)
    }

    /// Set (or replace) a property.
    pub fn set_property(&mut self, id: NodeId, name: impl Into<String>, value: impl Into<Vec<u8>>) {
        self.nodes[id.0].properties.insert(name.into(), value.into());
    }

    /// Set a string property, NUL-terminated as device trees store them.
    pub fn set_property_str(&mut self, id: NodeId, name: impl Into<String>, value: &str) {
        let mut bytes = value.as_bytes().to_vec();
        bytes.push(0);
        self.set_property(id, name, bytes);
    }

    /// Set a property holding one big-endian 32-bit cell.
    pub fn set_property_u32(&mut self, id: NodeId, name: impl Into<String>, value: u32) {
        self.set_property(id, name, value.to_be_bytes().to_vec());
    }

    /// Whether the node survived the probe pass.
    pub fn is_enabled(&self, id: NodeId) -> bool {
        self.node(id).property_str("status") != Some("disabled")
    }

    /// Nodes whose bound target belongs to `class`, in binding order.
    pub fn class_targets(&self, class: TargetClass) -> &[NodeId] {
        self.classes.get(&class).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The address-translation value a node contributes when the resolver
    /// walks past it: the first address of its `reg` property, read as the
    /// parent's `#address-cells` (default 2) big-endian cells. A node with
    /// no `reg` translates by zero.
    pub(crate) fn translation_address(&self, id: NodeId) -> u64 {
        let node = self.node(id);
        let Some(reg) = node.property("reg") else {
            return 0;
        };
        let cells = node
            .parent()
            .and_then(|parent| self.node(parent).property_u32("#address-cells"))
            .unwrap_or(2) as usize;
        let Some(bytes) = cells.checked_mul(4).and_then(|len| reg.get(..len)) else {
            log::warn!("reg property of {} is shorter than #address-cells", node.name());
            return 0;
        };
        let mut addr = 0u64;
        for cell in bytes.chunks_exact(4) {
            addr = addr << 32 | u32::from_be_bytes(cell.try_into().unwrap()) as u64;
        }
        addr
    }
}

impl Default for DeviceTree {
    fn default() -> Self {
        DeviceTree::new()
    }
}
