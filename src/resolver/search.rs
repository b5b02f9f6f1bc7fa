//! Backtracking search over candidate configurations.

use std::collections::HashSet;

use log::debug;

use super::consistency::is_class_space_consistent;
use super::graph::{NodeRef, ResolverMap};
use crate::error::{ResolveError, ResolveResult};
use crate::module::ModuleId;
use crate::registry::Registry;

/// Step the candidate selections until `root`'s class space is consistent.
///
/// Every resolver node is a digit of a mixed-radix counter. The digit order
/// is frozen once before the first step and reused for the whole search.
#[tracing::instrument(skip(registry, map))]
pub fn find_consistent_class_space(
    registry: &Registry,
    map: &mut ResolverMap,
    root: ModuleId,
) -> ResolveResult<()> {
    let order = map.node_order();
    let mut steps: u64 = 0;

    while !is_class_space_consistent(registry, map, root, &mut HashSet::new()) {
        if !increment_candidate_configuration(map, &order) {
            debug!("Search exhausted for {} after {} steps", root, steps);
            return Err(ResolveError::SearchExhausted {
                module: registry.module(root).to_string(),
            });
        }
        steps += 1;
    }

    if steps > 0 {
        debug!("Consistent configuration for {} after {} steps", root, steps);
    }
    Ok(())
}

/// Advance the first node that still has an untried candidate, resetting
/// every node before it to its first candidate.
///
/// Returns false once every combination has been tried.
pub fn increment_candidate_configuration(map: &mut ResolverMap, order: &[NodeRef]) -> bool {
    for &at in order {
        let node = map.node_mut(at);
        if node.selected + 1 < node.candidates.len() {
            node.selected += 1;
            return true;
        }
        node.selected = 0;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::ModuleDescriptor;
    use crate::package::{ExportedPackage, PackageRequirement, VersionRange};
    use crate::resolver::graph::build_resolver_map;
    use crate::test_utils::{exporter, v};

    fn two_by_two() -> (Registry, ModuleId) {
        let mut registry = Registry::new();
        registry.add_module(exporter("p2", "p", "2.0.0"));
        registry.add_module(exporter("p1", "p", "1.0.0"));
        registry.add_module(exporter("q2", "q", "2.0.0"));
        registry.add_module(exporter("q1", "q", "1.0.0"));
        let app = registry.add_module(
            ModuleDescriptor::new("app")
                .import(PackageRequirement::new("p"))
                .import(PackageRequirement::new("q")),
        );
        (registry, app)
    }

    fn selections(map: &ResolverMap, order: &[NodeRef]) -> Vec<usize> {
        order.iter().map(|&at| map.node(at).selected).collect()
    }

    #[test]
    fn test_increment_odometer_carry() {
        let (registry, app) = two_by_two();
        let mut map = build_resolver_map(&registry, app).unwrap();
        let order = map.node_order();

        assert_eq!(selections(&map, &order), vec![0, 0]);
        assert!(increment_candidate_configuration(&mut map, &order));
        assert_eq!(selections(&map, &order), vec![1, 0]);
        assert!(increment_candidate_configuration(&mut map, &order));
        assert_eq!(selections(&map, &order), vec![0, 1]);
        assert!(increment_candidate_configuration(&mut map, &order));
        assert_eq!(selections(&map, &order), vec![1, 1]);
        assert!(!increment_candidate_configuration(&mut map, &order));
        assert_eq!(selections(&map, &order), vec![0, 0]);
    }

    #[test]
    fn test_increment_with_no_nodes_is_exhausted() {
        let mut map = ResolverMap::new();
        assert!(!increment_candidate_configuration(&mut map, &[]));
    }

    #[test]
    fn test_find_consistent_keeps_first_choice_when_valid() {
        let (registry, app) = two_by_two();
        let mut map = build_resolver_map(&registry, app).unwrap();

        find_consistent_class_space(&registry, &mut map, app).unwrap();
        let order = map.node_order();
        assert_eq!(selections(&map, &order), vec![0, 0]);
    }

    #[test]
    fn test_find_consistent_backtracks_to_compatible_provider() {
        let mut registry = Registry::new();
        let q2 = registry.add_module(exporter("q2", "q", "2.0.0"));
        let q1 = registry.add_module(exporter("q1", "q", "1.0.0"));
        registry.add_module(
            ModuleDescriptor::new("x")
                .export(ExportedPackage::new("p", v("1.0.0")).uses("q"))
                .import(PackageRequirement::new("q").range(VersionRange::exact(v("1.0.0")))),
        );
        let app = registry.add_module(
            ModuleDescriptor::new("app")
                .import(PackageRequirement::new("q"))
                .import(PackageRequirement::new("p")),
        );

        let mut map = build_resolver_map(&registry, app).unwrap();
        assert_eq!(map.nodes(app).unwrap()[0].candidates, vec![q2, q1]);

        find_consistent_class_space(&registry, &mut map, app).unwrap();
        assert_eq!(map.nodes(app).unwrap()[0].selected_candidate(), q1);
    }

    #[test]
    fn test_find_consistent_exhausted() {
        let mut registry = Registry::new();
        registry.add_module(exporter("q2", "q", "2.0.0"));
        registry.add_module(exporter("q1", "q", "1.0.0"));
        registry.add_module(
            ModuleDescriptor::new("x")
                .export(ExportedPackage::new("p", v("1.0.0")).uses("q"))
                .import(PackageRequirement::new("q").range(VersionRange::exact(v("1.0.0")))),
        );
        let app = registry.add_module(
            ModuleDescriptor::new("app")
                .import(PackageRequirement::new("q").range(VersionRange::exact(v("2.0.0"))))
                .import(PackageRequirement::new("p")),
        );

        let mut map = build_resolver_map(&registry, app).unwrap();
        let err = find_consistent_class_space(&registry, &mut map, app).unwrap_err();
        assert!(matches!(err, ResolveError::SearchExhausted { .. }));
    }
}
