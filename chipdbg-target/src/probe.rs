//! # Probe and enable pass
//!
//! Runs once between binding and the first bus operation. Hardware that a
//! tree describes is not necessarily present, so each bound target gets
//! one chance to confirm its transport; a node that was disabled in the
//! tree, or whose target cannot be reached, takes its whole subtree out
//! of service.
use crate::tree::{DeviceTree, NodeId};

impl DeviceTree {
    /// Walk the tree from the root, depth-first pre-order, probing every
    /// bound target. A node without a bound target ends the descent there
    /// (its children have no target context either). A node carrying
    /// `status = "disabled"`, or whose probe fails, is disabled together
    /// with every descendant.
    pub fn probe_targets(&mut self) {
        self.probe_node(self.root());
    }

    fn probe_node(&mut self, id: NodeId) {
        if self.node(id).target().is_none() {
            log::debug!("Probe {} - target not found", self.node(id).name());
            return;
        }

        let mut failed = false;
        if self.is_enabled(id) {
            // Move the target out so the probe can read its node's
            // properties while holding the driver mutably.
            let Some(mut target) = self.node_mut(id).target.take() else {
                return;
            };
            if let Err(error) = target.probe(self.node(id)) {
                log::debug!("Probe {} - not found: {}", self.node(id).name(), error);
                failed = true;
            }
            self.node_mut(id).target = Some(target);
        } else {
            log::debug!("Probe {} - disabled", self.node(id).name());
            self.disable_node(id);
            return;
        }

        if failed {
            self.disable_node(id);
        } else {
            log::debug!("Probe {} - success", self.node(id).name());
            for child in self.node(id).children().to_vec() {
                self.probe_node(child);
            }
        }
    }

    /// Disable a node and all its children.
    fn disable_node(&mut self, id: NodeId) {
        self.set_property_str(id, "status", "disabled");
        for child in self.node(id).children().to_vec() {
            self.disable_node(child);
        }
    }
}
