//! The resolver: one registry, one lock, listeners notified outside it.
//!
//! A resolve runs in four steps while holding the registry lock:
//! 1. [`graph`] builds candidate lists for the root and everything it may
//!    pull in
//! 2. [`search`] steps through candidate combinations until
//!    [`consistency`] accepts one
//! 3. [`wires`] turns the accepted combination into wires and commits them
//! 4. listeners hear about newly resolved modules after the lock is released

pub mod consistency;
pub mod dynamic;
pub mod graph;
pub mod search;
pub mod wires;

use std::sync::{Arc, Mutex, MutexGuard};

use log::info;

use crate::config::ResolverConfig;
use crate::error::ResolveResult;
use crate::listener::{ListenerList, ResolverEvent, ResolverListener};
use crate::module::{Module, ModuleDescriptor, ModuleId, Wire};
use crate::package::PackageRequirement;
use crate::registry::Registry;

use self::dynamic::attempt_dynamic_import_locked;
use self::graph::build_resolver_map;
use self::search::find_consistent_class_space;
use self::wires::{commit_wires, create_wires};

/// Resolve `root` against `registry`, committing wires for every module the
/// accepted configuration pulls in. Returns the newly resolved modules,
/// root first; empty if `root` was already resolved.
pub(crate) fn resolve_locked(
    registry: &mut Registry,
    root: ModuleId,
) -> ResolveResult<Vec<ModuleId>> {
    if registry.entry(root)?.resolved {
        return Ok(Vec::new());
    }

    let mut map = build_resolver_map(registry, root)?;
    find_consistent_class_space(registry, &mut map, root)?;
    let wire_map = create_wires(registry, &map, root);
    Ok(commit_wires(registry, wire_map))
}

/// Shared entry point for resolution.
///
/// Owns the module registry behind a single mutex; every operation that
/// reads or changes resolution state takes it once. Share it as
/// `Arc<Resolver>`.
pub struct Resolver {
    registry: Mutex<Registry>,
    listeners: ListenerList,
    config: ResolverConfig,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(ResolverConfig::default())
    }
}

impl Resolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self {
            registry: Mutex::new(Registry::new()),
            listeners: ListenerList::new(),
            config,
        }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().expect("module registry lock poisoned")
    }

    /// Run `f` against the registry while holding the lock.
    pub fn with_registry<T>(&self, f: impl FnOnce(&Registry) -> T) -> T {
        f(&self.lock())
    }

    /// Register a module; its exports become available.
    pub fn module_added(&self, descriptor: ModuleDescriptor) -> ModuleId {
        self.lock().add_module(descriptor)
    }

    /// Unregister a module and strip its exports from both indices.
    ///
    /// Modules already wired to it keep their wires.
    #[tracing::instrument(skip(self))]
    pub fn module_removed(&self, id: ModuleId) -> ResolveResult<()> {
        let unresolved = {
            let mut registry = self.lock();
            let was_resolved = registry.remove_module(id)?;
            unresolved_event(&registry, id, was_resolved)
        };
        self.fire(ResolverEvent::Unresolved, &unresolved);
        Ok(())
    }

    /// Strip a module's exports like [`Self::module_removed`] and clear its
    /// resolution state; the module itself stays registered.
    #[tracing::instrument(skip(self))]
    pub fn module_reset(&self, id: ModuleId) -> ResolveResult<()> {
        let unresolved = {
            let mut registry = self.lock();
            let was_resolved = registry.reset_module(id)?;
            unresolved_event(&registry, id, was_resolved)
        };
        self.fire(ResolverEvent::Unresolved, &unresolved);
        Ok(())
    }

    /// Resolve a module and whatever it pulls in. No-op if already resolved.
    #[tracing::instrument(skip(self))]
    pub fn resolve(&self, id: ModuleId) -> ResolveResult<()> {
        let resolved = {
            let mut registry = self.lock();
            let ids = resolve_locked(&mut registry, id)?;
            modules_of(&registry, &ids)
        };

        if let Some(root) = resolved.first() {
            info!("Resolved {} ({} modules)", root, resolved.len());
        }
        self.fire(ResolverEvent::Resolved, &resolved);
        Ok(())
    }

    /// Wire `id` to an exporter of `package` through its dynamic imports.
    ///
    /// Returns the exporter, or `None` if no dynamic import covers the
    /// package, it is already wired, or nothing can provide it.
    #[tracing::instrument(skip(self))]
    pub fn attempt_dynamic_import(
        &self,
        id: ModuleId,
        package: &str,
    ) -> ResolveResult<Option<ModuleId>> {
        let mut resolved_ids = Vec::new();
        let (exporter, resolved) = {
            let mut registry = self.lock();
            let exporter =
                attempt_dynamic_import_locked(&mut registry, id, package, &mut resolved_ids)?;
            (exporter, modules_of(&registry, &resolved_ids))
        };

        self.fire(ResolverEvent::Resolved, &resolved);
        Ok(exporter)
    }

    /// Available exporters able to satisfy `requirement`.
    pub fn get_available_exporters(&self, requirement: &PackageRequirement) -> Vec<ModuleId> {
        self.lock().available_exporters(requirement)
    }

    /// In-use exporters able to satisfy `requirement`.
    pub fn get_in_use_exporters(&self, requirement: &PackageRequirement) -> Vec<ModuleId> {
        self.lock().in_use_exporters(requirement)
    }

    pub fn add_resolver_listener(&self, listener: Arc<dyn ResolverListener>) {
        self.listeners.add(listener);
    }

    pub fn remove_resolver_listener(&self, listener: &Arc<dyn ResolverListener>) -> bool {
        self.listeners.remove(listener)
    }

    /// Any registered module, removed ones included.
    pub fn module(&self, id: ModuleId) -> Option<Arc<Module>> {
        self.lock().get(id).cloned()
    }

    pub fn is_resolved(&self, id: ModuleId) -> bool {
        self.lock().is_resolved(id)
    }

    pub fn wiring(&self, id: ModuleId) -> Vec<Wire> {
        self.lock().wiring(id).to_vec()
    }

    pub fn wire_for(&self, id: ModuleId, package: &str) -> Option<Wire> {
        self.lock().wire_for(id, package).cloned()
    }

    fn fire(&self, event: ResolverEvent, modules: &[Arc<Module>]) {
        self.listeners
            .dispatch(event, modules, self.config.isolate_listener_panics);
    }
}

fn modules_of(registry: &Registry, ids: &[ModuleId]) -> Vec<Arc<Module>> {
    ids.iter().filter_map(|&id| registry.get(id).cloned()).collect()
}

fn unresolved_event(registry: &Registry, id: ModuleId, was_resolved: bool) -> Vec<Arc<Module>> {
    if was_resolved {
        modules_of(registry, &[id])
    } else {
        Vec::new()
    }
}
