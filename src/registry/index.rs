//! Available / in-use exporter indices.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::module::ModuleId;

/// Per-package lists of exporting modules.
///
/// `available[p]` holds modules whose export of `p` is unclaimed, `in_use[p]`
/// holds modules with at least one wire pointing at their export of `p`.
/// Neither list ever holds the same module twice.
#[derive(Debug, Default, Clone)]
pub struct PackageIndex {
    available: HashMap<String, Vec<ModuleId>>,
    in_use: HashMap<String, Vec<ModuleId>>,
}

impl PackageIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Exporters of `package` not yet wired to anyone, in preference order.
    pub fn available(&self, package: &str) -> &[ModuleId] {
        self.available.get(package).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Exporters of `package` already wired, in the order they were claimed.
    pub fn in_use(&self, package: &str) -> &[ModuleId] {
        self.in_use.get(package).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Insert `module` into `available[package]` before the first entry that
    /// `order` ranks after it. No-op if already present.
    pub fn insert_available_by<F>(&mut self, package: &str, module: ModuleId, order: F)
    where
        F: Fn(ModuleId, ModuleId) -> Ordering,
    {
        let list = self.available.entry(package.to_string()).or_default();
        if list.contains(&module) {
            return;
        }
        let pos = list
            .iter()
            .position(|&existing| order(module, existing) == Ordering::Less)
            .unwrap_or(list.len());
        list.insert(pos, module);
    }

    /// Returns true if `module` was listed.
    pub fn remove_available(&mut self, package: &str, module: ModuleId) -> bool {
        remove_from(&mut self.available, package, module)
    }

    /// Append `module` to `in_use[package]`. No-op if already present.
    pub fn add_in_use(&mut self, package: &str, module: ModuleId) {
        let list = self.in_use.entry(package.to_string()).or_default();
        if !list.contains(&module) {
            list.push(module);
        }
    }

    /// Drop `module` from the in-use list of `package`. Returns whether it was there.
    pub fn remove_in_use(&mut self, package: &str, module: ModuleId) -> bool {
        remove_from(&mut self.in_use, package, module)
    }

    /// Drop `module` from both indices for every package in `packages`.
    pub fn strip<'a, I>(&mut self, packages: I, module: ModuleId)
    where
        I: IntoIterator<Item = &'a str>,
    {
        for package in packages {
            self.remove_available(package, module);
            self.remove_in_use(package, module);
        }
    }

    /// Package names with at least one available exporter.
    pub fn available_packages(&self) -> impl Iterator<Item = &str> {
        self.available.keys().map(String::as_str)
    }

    /// Package names with at least one in-use exporter.
    pub fn in_use_packages(&self) -> impl Iterator<Item = &str> {
        self.in_use.keys().map(String::as_str)
    }
}

fn remove_from(
    map: &mut HashMap<String, Vec<ModuleId>>,
    package: &str,
    module: ModuleId,
) -> bool {
    let Some(list) = map.get_mut(package) else {
        return false;
    };
    let before = list.len();
    list.retain(|&m| m != module);
    let removed = list.len() != before;
    if list.is_empty() {
        map.remove(package);
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: usize) -> ModuleId {
        ModuleId(n)
    }

    #[test]
    fn test_empty_lookups() {
        let index = PackageIndex::new();
        assert!(index.available("p").is_empty());
        assert!(index.in_use("p").is_empty());
    }

    #[test]
    fn test_insert_available_sorted() {
        let mut index = PackageIndex::new();
        // Descending by id for this test
        let order = |a: ModuleId, b: ModuleId| b.cmp(&a);
        index.insert_available_by("p", id(1), order);
        index.insert_available_by("p", id(3), order);
        index.insert_available_by("p", id(2), order);

        assert_eq!(index.available("p"), &[id(3), id(2), id(1)]);
    }

    #[test]
    fn test_insert_available_equal_keeps_insertion_order() {
        let mut index = PackageIndex::new();
        let order = |_: ModuleId, _: ModuleId| Ordering::Equal;
        index.insert_available_by("p", id(5), order);
        index.insert_available_by("p", id(1), order);

        assert_eq!(index.available("p"), &[id(5), id(1)]);
    }

    #[test]
    fn test_insert_available_dedup() {
        let mut index = PackageIndex::new();
        let order = |a: ModuleId, b: ModuleId| a.cmp(&b);
        index.insert_available_by("p", id(1), order);
        index.insert_available_by("p", id(1), order);

        assert_eq!(index.available("p").len(), 1);
    }

    #[test]
    fn test_add_in_use_dedup_and_order() {
        let mut index = PackageIndex::new();
        index.add_in_use("p", id(2));
        index.add_in_use("p", id(1));
        index.add_in_use("p", id(2));

        assert_eq!(index.in_use("p"), &[id(2), id(1)]);
    }

    #[test]
    fn test_remove_drops_empty_keys() {
        let mut index = PackageIndex::new();
        index.add_in_use("p", id(1));

        assert!(index.remove_in_use("p", id(1)));
        assert!(!index.remove_in_use("p", id(1)));
        assert_eq!(index.in_use_packages().count(), 0);
    }

    #[test]
    fn test_strip() {
        let mut index = PackageIndex::new();
        let order = |a: ModuleId, b: ModuleId| a.cmp(&b);
        index.insert_available_by("p", id(1), order);
        index.insert_available_by("q", id(1), order);
        index.insert_available_by("q", id(2), order);
        index.add_in_use("p", id(1));

        index.strip(["p", "q"], id(1));

        assert!(index.available("p").is_empty());
        assert!(index.in_use("p").is_empty());
        assert_eq!(index.available("q"), &[id(2)]);
    }
}
