//! # Flattened device-tree expansion
//!
//! Expands a flattened device-tree blob into the [`DeviceTree`] node graph
//! using the `fdt` parser. Expansion copies names and raw property bytes
//! only; binding targets against a [`crate::registry::Registry`] is a
//! separate step.
use std::{error::Error as StdError, fmt::Display};

use crate::tree::{DeviceTree, NodeId};

/// The blob could not be parsed as a flattened device tree.
#[derive(Debug)]
pub struct ExpandError(String);

impl Display for ExpandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invalid device tree blob: {}", self.0)
    }
}

impl StdError for ExpandError {}

/// Expand `blob` into a fresh tree.
pub fn expand(blob: &[u8]) -> Result<DeviceTree, ExpandError> {
    let fdt = fdt::Fdt::new(blob).map_err(|error| ExpandError(error.to_string()))?;
    let root = fdt
        .find_node("/")
        .ok_or_else(|| ExpandError("missing root node".to_string()))?;

    let mut tree = DeviceTree::new();
    let root_id = tree.root();
    copy_node(&mut tree, root_id, &root);
    Ok(tree)
}

fn copy_node(tree: &mut DeviceTree, id: NodeId, node: &fdt::node::FdtNode) {
    for property in node.properties() {
        tree.set_property(id, property.name, property.value);
    }
    for child in node.children() {
        let child_id = tree.add_node(id, child.name);
        copy_node(tree, child_id, &child);
    }
}
