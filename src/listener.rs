//! Resolver listeners and their copy-on-write registration list.

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex};

use log::warn;

use crate::module::Module;

/// Receives resolution state changes.
///
/// Callbacks run after the registry lock is released.
#[cfg_attr(test, mockall::automock)]
pub trait ResolverListener: Send + Sync {
    fn on_module_resolved(&self, module: &Module);

    fn on_module_unresolved(&self, module: &Module);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolverEvent {
    Resolved,
    Unresolved,
}

type Listeners = Arc<Vec<Arc<dyn ResolverListener>>>;

/// Listener registrations.
///
/// Every change swaps in a fresh list, so a dispatch iterating an older
/// snapshot is never disturbed and never sees listeners added after it began.
#[derive(Default)]
pub struct ListenerList {
    listeners: Mutex<Listeners>,
}

impl ListenerList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, listener: Arc<dyn ResolverListener>) {
        let mut current = self.listeners.lock().unwrap();
        let mut next = Vec::with_capacity(current.len() + 1);
        next.extend(current.iter().cloned());
        next.push(listener);
        *current = Arc::new(next);
    }

    /// Remove a listener by identity. Returns whether it was registered.
    pub fn remove(&self, listener: &Arc<dyn ResolverListener>) -> bool {
        let mut current = self.listeners.lock().unwrap();
        let Some(pos) = current.iter().position(|l| Arc::ptr_eq(l, listener)) else {
            return false;
        };
        let mut next: Vec<_> = current.iter().cloned().collect();
        next.remove(pos);
        *current = Arc::new(next);
        true
    }

    pub fn snapshot(&self) -> Listeners {
        Arc::clone(&self.listeners.lock().unwrap())
    }

    pub fn len(&self) -> usize {
        self.listeners.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver `event` for each module to every listener in a snapshot.
    ///
    /// With `isolate_panics`, a panicking listener is logged and dispatch
    /// moves on to the next one.
    pub fn dispatch(&self, event: ResolverEvent, modules: &[Arc<Module>], isolate_panics: bool) {
        if modules.is_empty() {
            return;
        }
        let listeners = self.snapshot();
        for module in modules {
            for listener in listeners.iter() {
                let notify = || match event {
                    ResolverEvent::Resolved => listener.on_module_resolved(module),
                    ResolverEvent::Unresolved => listener.on_module_unresolved(module),
                };
                if !isolate_panics {
                    notify();
                } else if panic::catch_unwind(AssertUnwindSafe(notify)).is_err() {
                    warn!("Resolver listener panicked on {:?} for {}", event, module);
                }
            }
        }
    }
}
