//! Resolver map: candidate lists for every module touched by one resolve.

use std::collections::HashMap;

use log::debug;

use crate::error::{ResolveError, ResolveResult};
use crate::module::ModuleId;
use crate::package::PackageRequirement;
use crate::registry::Registry;

/// One import of one module together with the providers it could wire to.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolverNode {
    pub importer: ModuleId,
    pub requirement: PackageRequirement,
    pub candidates: Vec<ModuleId>,
    pub selected: usize,
}

impl ResolverNode {
    pub fn new(
        importer: ModuleId,
        requirement: PackageRequirement,
        candidates: Vec<ModuleId>,
    ) -> Self {
        Self {
            importer,
            requirement,
            candidates,
            selected: 0,
        }
    }

    /// The candidate this node currently points at.
    pub fn selected_candidate(&self) -> ModuleId {
        self.candidates[self.selected]
    }
}

/// Position of a node inside a [`ResolverMap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeRef {
    slot: usize,
    node: usize,
}

/// Modules under resolution and their resolver nodes, in insertion order.
#[derive(Debug, Default)]
pub struct ResolverMap {
    slots: Vec<(ModuleId, Vec<ResolverNode>)>,
    positions: HashMap<ModuleId, usize>,
    failed: HashMap<ModuleId, ResolveError>,
}

impl ResolverMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, module: ModuleId) -> bool {
        self.positions.contains_key(&module)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Nodes of `module`, or `None` if it is not part of this resolution.
    pub fn nodes(&self, module: ModuleId) -> Option<&[ResolverNode]> {
        self.positions
            .get(&module)
            .map(|&slot| self.slots[slot].1.as_slice())
    }

    pub fn modules(&self) -> impl Iterator<Item = ModuleId> + '_ {
        self.slots.iter().map(|(module, _)| *module)
    }

    pub fn failure(&self, module: ModuleId) -> Option<&ResolveError> {
        self.failed.get(&module)
    }

    fn reserve(&mut self, module: ModuleId) -> usize {
        let slot = self.slots.len();
        self.slots.push((module, Vec::new()));
        self.positions.insert(module, slot);
        slot
    }

    fn mark_failed(&mut self, module: ModuleId, error: ResolveError) {
        if let Some(&slot) = self.positions.get(&module) {
            self.slots[slot].1.clear();
        }
        self.failed.insert(module, error);
    }

    /// Flattened node order used as the digits of the search odometer.
    pub fn node_order(&self) -> Vec<NodeRef> {
        self.slots
            .iter()
            .enumerate()
            .flat_map(|(slot, (_, nodes))| {
                (0..nodes.len()).map(move |node| NodeRef { slot, node })
            })
            .collect()
    }

    pub fn node(&self, at: NodeRef) -> &ResolverNode {
        &self.slots[at.slot].1[at.node]
    }

    pub fn node_mut(&mut self, at: NodeRef) -> &mut ResolverNode {
        &mut self.slots[at.slot].1[at.node]
    }

    /// Drop failed modules from every candidate list.
    ///
    /// A module can be accepted as a candidate while its own population is
    /// still in progress (cyclic imports) and fail afterwards. Pruning repeats
    /// until stable since emptying a mandatory node fails its importer too.
    fn prune_failed(&mut self, registry: &Registry) {
        loop {
            let mut newly_failed = Vec::new();
            for (module, nodes) in &mut self.slots {
                if self.failed.contains_key(module) {
                    continue;
                }
                for node in nodes.iter_mut() {
                    node.candidates.retain(|c| !self.failed.contains_key(c));
                }
                if let Some(node) = nodes
                    .iter()
                    .find(|n| n.candidates.is_empty() && !n.requirement.optional)
                {
                    let error = ResolveError::UnresolvablePackage {
                        module: registry.module(*module).to_string(),
                        requirement: node.requirement.clone(),
                    };
                    newly_failed.push((*module, error));
                }
                nodes.retain(|n| !n.candidates.is_empty());
            }

            if newly_failed.is_empty() {
                return;
            }
            for (module, error) in newly_failed {
                debug!("Pruning module {}: {}", module, error);
                self.mark_failed(module, error);
            }
        }
    }
}

/// Populate `map` with resolver nodes for `root` and everything it may pull
/// in, then discard candidates whose population failed.
pub fn build_resolver_map(registry: &Registry, root: ModuleId) -> ResolveResult<ResolverMap> {
    let mut map = ResolverMap::new();
    populate_resolver_map(registry, &mut map, root)?;
    map.prune_failed(registry);
    match map.failure(root) {
        Some(error) => Err(error.clone()),
        None => Ok(map),
    }
}

/// Recursively add `module` and its unresolved candidates to `map`.
///
/// A module already present returns immediately, which terminates cycles.
/// Candidates that fail to populate are dropped; the import only fails once
/// it runs out of candidates.
pub fn populate_resolver_map(
    registry: &Registry,
    map: &mut ResolverMap,
    module: ModuleId,
) -> ResolveResult<()> {
    if let Some(error) = map.failure(module) {
        return Err(error.clone());
    }
    if map.contains(module) {
        return Ok(());
    }

    let slot = map.reserve(module);
    match build_nodes(registry, map, module) {
        Ok(nodes) => {
            map.slots[slot].1 = nodes;
            Ok(())
        }
        Err(error) => {
            map.mark_failed(module, error.clone());
            Err(error)
        }
    }
}

fn build_nodes(
    registry: &Registry,
    map: &mut ResolverMap,
    module: ModuleId,
) -> ResolveResult<Vec<ResolverNode>> {
    let target = registry.module(module);
    let mut nodes = Vec::new();

    for requirement in target.imports() {
        let mut last_error = None;
        let mut candidates = registry.candidates(requirement);
        candidates.retain(|&candidate| {
            if registry.is_resolved(candidate) {
                return true;
            }
            match populate_resolver_map(registry, map, candidate) {
                Ok(()) => true,
                Err(error) => {
                    debug!("Dropping candidate {} for {}: {}", candidate, requirement.name, error);
                    last_error = Some(error);
                    false
                }
            }
        });

        if candidates.is_empty() {
            if requirement.optional {
                continue;
            }
            return Err(last_error.unwrap_or_else(|| ResolveError::UnresolvablePackage {
                module: target.to_string(),
                requirement: requirement.clone(),
            }));
        }
        nodes.push(ResolverNode::new(module, requirement.clone(), candidates));
    }

    Ok(nodes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::ModuleDescriptor;
    use crate::package::{ExportedPackage, PackageRequirement};
    use crate::test_utils::{exporter, importer, v};

    #[test]
    fn test_populate_single_import() {
        let mut registry = Registry::new();
        let core = registry.add_module(exporter("core", "api", "1.0.0"));
        let app = registry.add_module(importer("app", "api"));

        let map = build_resolver_map(&registry, app).unwrap();

        assert_eq!(map.modules().collect::<Vec<_>>(), vec![app, core]);
        let nodes = map.nodes(app).unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].candidates, vec![core]);
        assert_eq!(nodes[0].selected_candidate(), core);
        assert!(map.nodes(core).unwrap().is_empty());
    }

    #[test]
    fn test_populate_missing_mandatory_import() {
        let mut registry = Registry::new();
        let app = registry.add_module(importer("app", "api"));

        let err = build_resolver_map(&registry, app).unwrap_err();
        match err {
            ResolveError::UnresolvablePackage { requirement, .. } => {
                assert_eq!(requirement.name, "api")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_populate_optional_import_without_candidates() {
        let mut registry = Registry::new();
        let app = registry.add_module(
            ModuleDescriptor::new("app").import(PackageRequirement::new("api").optional()),
        );

        let map = build_resolver_map(&registry, app).unwrap();
        assert!(map.nodes(app).unwrap().is_empty());
    }

    #[test]
    fn test_populate_cycle_terminates() {
        let mut registry = Registry::new();
        let a = registry.add_module(
            ModuleDescriptor::new("a")
                .export(ExportedPackage::new("a.api", v("1.0.0")))
                .import(PackageRequirement::new("b.api")),
        );
        let b = registry.add_module(
            ModuleDescriptor::new("b")
                .export(ExportedPackage::new("b.api", v("1.0.0")))
                .import(PackageRequirement::new("a.api")),
        );

        let map = build_resolver_map(&registry, a).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.nodes(a).unwrap()[0].candidates, vec![b]);
        assert_eq!(map.nodes(b).unwrap()[0].candidates, vec![a]);
    }

    #[test]
    fn test_populate_drops_unresolvable_candidate() {
        let mut registry = Registry::new();
        // Newer exporter has an import nobody can satisfy
        let broken = registry.add_module(
            ModuleDescriptor::new("broken")
                .export(ExportedPackage::new("api", v("2.0.0")))
                .import(PackageRequirement::new("missing")),
        );
        let good = registry.add_module(exporter("good", "api", "1.0.0"));
        let app = registry.add_module(importer("app", "api"));

        assert_eq!(registry.index().available("api"), &[broken, good]);

        let map = build_resolver_map(&registry, app).unwrap();
        assert_eq!(map.nodes(app).unwrap()[0].candidates, vec![good]);
        assert!(map.failure(broken).is_some());
    }

    #[test]
    fn test_populate_reports_deepest_error() {
        let mut registry = Registry::new();
        registry.add_module(
            ModuleDescriptor::new("broken")
                .export(ExportedPackage::new("api", v("1.0.0")))
                .import(PackageRequirement::new("missing")),
        );
        let app = registry.add_module(importer("app", "api"));

        match build_resolver_map(&registry, app).unwrap_err() {
            ResolveError::UnresolvablePackage { module, requirement } => {
                assert!(module.starts_with("broken"));
                assert_eq!(requirement.name, "missing");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_prune_removes_candidate_failing_after_cycle() {
        let mut registry = Registry::new();
        // b accepts a while a is still being populated; a then fails on
        // its missing import.
        let a = registry.add_module(
            ModuleDescriptor::new("a")
                .export(ExportedPackage::new("a.api", v("1.0.0")))
                .export(ExportedPackage::new("x.api", v("1.0.0")))
                .import(PackageRequirement::new("b.api"))
                .import(PackageRequirement::new("missing")),
        );
        let a2 = registry.add_module(exporter("a2", "a.api", "1.0.0"));
        let b = registry.add_module(
            ModuleDescriptor::new("b")
                .export(ExportedPackage::new("b.api", v("1.0.0")))
                .import(PackageRequirement::new("a.api")),
        );
        let root = registry.add_module(
            ModuleDescriptor::new("root")
                .import(PackageRequirement::new("x.api").optional())
                .import(PackageRequirement::new("b.api")),
        );

        let map = build_resolver_map(&registry, root).unwrap();

        assert!(map.failure(a).is_some());
        assert_eq!(map.nodes(b).unwrap()[0].candidates, vec![a2]);
        assert_eq!(map.nodes(root).unwrap().len(), 1);
        assert_eq!(map.nodes(root).unwrap()[0].candidates, vec![b]);
    }

    #[test]
    fn test_node_order_is_insertion_order() {
        let mut registry = Registry::new();
        let core = registry.add_module(exporter("core", "api", "1.0.0"));
        let other = registry.add_module(exporter("other", "spi", "1.0.0"));
        let app = registry.add_module(
            ModuleDescriptor::new("app")
                .import(PackageRequirement::new("api"))
                .import(PackageRequirement::new("spi")),
        );

        let map = build_resolver_map(&registry, app).unwrap();
        let order = map.node_order();
        assert_eq!(order.len(), 2);
        assert_eq!(map.node(order[0]).candidates, vec![core]);
        assert_eq!(map.node(order[1]).candidates, vec![other]);
    }
}
