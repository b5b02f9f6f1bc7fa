//! Module registry: the universe of modules and their resolution state.
//!
//! The registry owns every registered [`Module`], its mutable state
//! (`resolved` flag and committed wiring) and the [`PackageIndex`] of
//! available and in-use exporters. It carries no locking of its own; the
//! [`Resolver`](crate::resolver::Resolver) keeps it behind a single mutex.

mod index;
mod selector;

use std::cmp::Ordering;
use std::sync::Arc;

use log::debug;

use crate::error::{ResolveError, ResolveResult};
use crate::module::{Module, ModuleDescriptor, ModuleId, Wire};

pub use index::PackageIndex;

/// Mutable state the registry keeps for each module.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleEntry {
    pub module: Arc<Module>,
    pub resolved: bool,
    pub wiring: Vec<Wire>,
    pub removed: bool,
}

#[derive(Debug, Default)]
pub struct Registry {
    entries: Vec<ModuleEntry>,
    index: PackageIndex,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module and index its exports as available.
    pub fn add_module(&mut self, descriptor: ModuleDescriptor) -> ModuleId {
        let id = ModuleId(self.entries.len());
        let module = Arc::new(Module::new(id, descriptor));
        self.entries.push(ModuleEntry {
            module: Arc::clone(&module),
            resolved: false,
            wiring: Vec::new(),
            removed: false,
        });

        let entries = &self.entries;
        for export in module.exports() {
            let name = export.name.as_str();
            self.index
                .insert_available_by(name, id, |a, b| export_order(entries, name, a, b));
        }
        debug!("Module added: {}", module);
        id
    }

    /// Unregister a module, stripping its exports from both indices.
    ///
    /// Modules wired to it keep their wires. Returns whether the module was
    /// resolved.
    pub fn remove_module(&mut self, id: ModuleId) -> ResolveResult<bool> {
        self.strip_exports(id)?;
        let entry = &mut self.entries[id.0];
        entry.removed = true;
        debug!("Module removed: {}", entry.module);
        Ok(entry.resolved)
    }

    /// Strip a module's exports from both indices and clear its resolution
    /// state. Returns whether the module was resolved.
    pub fn reset_module(&mut self, id: ModuleId) -> ResolveResult<bool> {
        self.strip_exports(id)?;
        let entry = &mut self.entries[id.0];
        let was_resolved = entry.resolved;
        entry.resolved = false;
        entry.wiring.clear();
        debug!("Module reset: {}", entry.module);
        Ok(was_resolved)
    }

    fn strip_exports(&mut self, id: ModuleId) -> ResolveResult<()> {
        let module = Arc::clone(&self.entry(id)?.module);
        self.index
            .strip(module.exports().iter().map(|e| e.name.as_str()), id);
        Ok(())
    }

    /// Look up a live module's entry.
    pub fn entry(&self, id: ModuleId) -> ResolveResult<&ModuleEntry> {
        match self.entries.get(id.0) {
            Some(entry) if !entry.removed => Ok(entry),
            _ => Err(ResolveError::UnknownModule(id)),
        }
    }

    /// Look up any registered module, removed ones included.
    pub fn get(&self, id: ModuleId) -> Option<&Arc<Module>> {
        self.entries.get(id.0).map(|e| &e.module)
    }

    /// Module for an id handed out by this registry.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not issued by this registry.
    pub(crate) fn module(&self, id: ModuleId) -> &Module {
        &self.entries[id.0].module
    }

    /// Whether the module has been resolved. False for unknown ids.
    pub fn is_resolved(&self, id: ModuleId) -> bool {
        self.entries.get(id.0).is_some_and(|e| e.resolved)
    }

    /// Wires committed for the module; empty for unknown ids.
    pub fn wiring(&self, id: ModuleId) -> &[Wire] {
        self.entries
            .get(id.0)
            .map(|e| e.wiring.as_slice())
            .unwrap_or(&[])
    }

    /// The module's wire for `package`, if it has one.
    pub fn wire_for(&self, id: ModuleId, package: &str) -> Option<&Wire> {
        self.wiring(id).iter().find(|w| w.package_name() == package)
    }

    pub(crate) fn mark_resolved(&mut self, id: ModuleId, wiring: Vec<Wire>) {
        let entry = &mut self.entries[id.0];
        entry.resolved = true;
        if !wiring.is_empty() {
            entry.wiring = wiring;
        }
    }

    pub(crate) fn push_wire(&mut self, id: ModuleId, wire: Wire) {
        self.entries[id.0].wiring.push(wire);
    }

    /// Available and in-use exporter lists.
    pub fn index(&self) -> &PackageIndex {
        &self.index
    }

    pub(crate) fn index_mut(&mut self) -> &mut PackageIndex {
        &mut self.index
    }

    /// Ids of all live modules, in registration order.
    pub fn module_ids(&self) -> impl Iterator<Item = ModuleId> + '_ {
        self.entries
            .iter()
            .filter(|e| !e.removed)
            .map(|e| e.module.id())
    }
}

/// Ordering of `available` lists: descending export version, then ascending
/// module id.
fn export_order(entries: &[ModuleEntry], package: &str, a: ModuleId, b: ModuleId) -> Ordering {
    let version_of = |id: ModuleId| entries[id.0].module.export(package).map(|e| &e.version);
    version_of(b).cmp(&version_of(a)).then(a.cmp(&b))
}
