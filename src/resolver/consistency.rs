//! Class space consistency: no package may reach a module from two providers.

use std::collections::{HashMap, HashSet};

use log::trace;

use super::graph::ResolverMap;
use crate::module::ModuleId;
use crate::package::ExportedPackage;
use crate::registry::Registry;

/// Package name to the module providing it.
pub type UsesMap = HashMap<String, ModuleId>;

/// Collect into `uses` the provider of `export` and, transitively, of every
/// package reachable through its `uses` set.
///
/// Modules still under resolution are followed through their currently
/// selected candidates; resolved modules through their committed wiring.
/// Either way a module falls back to its own export of a used package. A
/// package name already present in `uses` is not visited again, whichever
/// module it came from.
pub fn calculate_uses_dependencies(
    registry: &Registry,
    map: &ResolverMap,
    module: ModuleId,
    export: &ExportedPackage,
    uses: &mut UsesMap,
) {
    if uses.contains_key(&export.name) {
        return;
    }
    uses.insert(export.name.clone(), module);

    for used in &export.uses {
        let provider = match map.nodes(module) {
            None => registry.wire_for(module, used).map(|wire| wire.exporter),
            Some(nodes) => nodes
                .iter()
                .find(|node| node.requirement.name == *used)
                .map(|node| node.selected_candidate()),
        };
        let provider = provider.or_else(|| registry.module(module).export(used).map(|_| module));

        let Some(provider) = provider else {
            continue;
        };
        if let Some(used_export) = registry.module(provider).export(used) {
            calculate_uses_dependencies(registry, map, provider, used_export, uses);
        }
    }
}

/// Check that `root`'s class space, under the currently selected candidates,
/// never sees two providers for the same package.
///
/// Resolved modules and modules already in `visited` count as consistent, so
/// cycles are accepted optimistically.
pub fn is_class_space_consistent(
    registry: &Registry,
    map: &ResolverMap,
    root: ModuleId,
    visited: &mut HashSet<ModuleId>,
) -> bool {
    if registry.is_resolved(root) || !visited.insert(root) {
        return true;
    }

    // Exports that are also imported get checked through the import instead.
    let module = registry.module(root);
    let mut uses_map: UsesMap = module
        .exports()
        .iter()
        .filter(|export| !module.imports_package(&export.name))
        .map(|export| (export.name.clone(), root))
        .collect();

    for node in map.nodes(root).unwrap_or(&[]) {
        let candidate = node.selected_candidate();
        if !is_class_space_consistent(registry, map, candidate, visited) {
            return false;
        }

        let Some(export) = registry.module(candidate).export(&node.requirement.name) else {
            continue;
        };
        let mut candidate_uses = UsesMap::new();
        calculate_uses_dependencies(registry, map, candidate, export, &mut candidate_uses);

        for (package, provider) in candidate_uses {
            match uses_map.get(&package) {
                Some(&existing) if existing != provider => {
                    trace!("Conflict in {module} for {package}: {existing} vs {provider}");
                    return false;
                }
                _ => {
                    uses_map.insert(package, provider);
                }
            }
        }
    }

    true
}
