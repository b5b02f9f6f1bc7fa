//! Turning a consistent resolver map into committed wiring.

use std::collections::HashSet;

use log::debug;

use super::graph::ResolverMap;
use crate::module::{ModuleId, Wire};
use crate::registry::Registry;

/// Wires per newly resolved module, in depth-first discovery order.
#[derive(Debug, Default)]
pub struct WireMap {
    entries: Vec<(ModuleId, Vec<Wire>)>,
    seen: HashSet<ModuleId>,
}

impl WireMap {
    pub fn contains(&self, module: ModuleId) -> bool {
        self.seen.contains(&module)
    }

    pub fn wires(&self, module: ModuleId) -> Option<&[Wire]> {
        self.entries
            .iter()
            .find(|(m, _)| *m == module)
            .map(|(_, wires)| wires.as_slice())
    }

    pub fn modules(&self) -> impl Iterator<Item = ModuleId> + '_ {
        self.entries.iter().map(|(m, _)| *m)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Build wires for `root` and every unresolved module its selected
/// candidates reach.
pub fn create_wires(registry: &Registry, map: &ResolverMap, root: ModuleId) -> WireMap {
    let mut wire_map = WireMap::default();
    populate_wire_map(registry, map, root, &mut wire_map);
    wire_map
}

fn populate_wire_map(
    registry: &Registry,
    map: &ResolverMap,
    importer: ModuleId,
    wire_map: &mut WireMap,
) {
    if registry.is_resolved(importer) || !wire_map.seen.insert(importer) {
        return;
    }
    // Reserve the slot first so cycles see the importer as handled.
    let slot = wire_map.entries.len();
    wire_map.entries.push((importer, Vec::new()));

    let mut wires = Vec::new();
    for node in map.nodes(importer).unwrap_or(&[]) {
        let exporter = node.selected_candidate();
        if let Some(export) = registry.module(exporter).export(&node.requirement.name) {
            wires.push(Wire::new(export.clone(), exporter));
        }
        populate_wire_map(registry, map, exporter, wire_map);
    }
    wire_map.entries[slot].1 = wires;
}

/// Mark every module in `wire_map` resolved and move wired exports from
/// available to in use. Returns the newly resolved modules.
pub fn commit_wires(registry: &mut Registry, wire_map: WireMap) -> Vec<ModuleId> {
    let mut resolved = Vec::with_capacity(wire_map.len());

    for (importer, wires) in wire_map.entries {
        for wire in &wires {
            debug!("WIRE: [{}] {}", registry.module(importer), wire);
            let package = wire.package_name();
            let index = registry.index_mut();
            index.remove_available(package, wire.exporter);
            // An export shadowed by an import from elsewhere is no longer
            // independently available.
            if wire.exporter != importer {
                index.remove_available(package, importer);
            }
            index.add_in_use(package, wire.exporter);
        }
        registry.mark_resolved(importer, wires);
        resolved.push(importer);
    }

    resolved
}
