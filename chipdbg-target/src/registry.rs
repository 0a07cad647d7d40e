//! # Hardware unit registry
//!
//! Backends register a prototype per compatible string before the tree is
//! bound; binding then instantiates a fresh driver for every node whose
//! `compatible` property matches. Registration is an explicit startup call
//! (`chipdbg-backends` provides `register_all`), ordinary process state
//! with ordinary initialization.
use std::collections::HashMap;

use crate::{
    target::{Target, TargetKind},
    tree::DeviceTree,
};

/// A registrable hardware unit: the template a matching node is bound
/// from.
pub struct HwUnit {
    /// Human-readable unit name.
    pub name: &'static str,
    /// The `compatible` string this unit binds to.
    pub compatible: &'static str,
    /// Constructs a fresh driver instance for one node.
    pub build: fn() -> TargetKind,
}

/// Lookup table from compatible string to hardware unit.
#[derive(Default)]
pub struct Registry {
    units: HashMap<&'static str, HwUnit>,
}

impl Registry {
    pub fn new() -> Registry {
        Registry::default()
    }

    /// Register a unit. A later registration for the same compatible
    /// string replaces the earlier one.
    pub fn register(&mut self, unit: HwUnit) {
        log::debug!("Registering hardware unit {}", unit.compatible);
        self.units.insert(unit.compatible, unit);
    }

    /// Find the unit for a compatible string.
    pub fn lookup(&self, compatible: &str) -> Option<&HwUnit> {
        self.units.get(compatible)
    }
}

impl DeviceTree {
    /// Walk every node and bind a target wherever the node's `compatible`
    /// property matches a registered unit. Bound targets are also entered
    /// into the per-class grouping for enumeration.
    pub fn bind_targets(&mut self, registry: &Registry) {
        for id in self.nodes().collect::<Vec<_>>() {
            let node = self.node(id);
            let Some(compatible) = node.property_str("compatible").map(str::to_owned) else {
                continue;
            };
            let Some(unit) = registry.lookup(&compatible) else {
                log::debug!("No target found for {}", node.name());
                continue;
            };

            log::debug!("Found target {} for {}", unit.name, node.name());
            let target = Target {
                name: unit.name,
                compatible,
                index: node.property_u32("index"),
                kind: (unit.build)(),
            };
            let class = target.class();
            self.node_mut(id).target = Some(target);
            self.classes.entry(class).or_default().push(id);
        }
    }
}
