//! Class and resource lookup delegation over the resolver's wiring.
//!
//! Lookup order for a module: boot-delegated packages go to the parent;
//! a wired package goes to its exporter; otherwise the module's own
//! content; finally a dynamic import.

use std::any::Any;
use std::sync::Arc;

use log::debug;

use crate::error::LoadError;
use crate::module::{Module, ModuleId};
use crate::resolver::Resolver;

/// A loaded class, opaque to the resolver.
pub type Class = Arc<dyn Any + Send + Sync>;

/// Fetches content from modules and from the parent loader.
///
/// Resources are returned as URL strings.
#[cfg_attr(test, mockall::automock)]
pub trait ContentLoader: Send + Sync {
    fn load_class_from_module(&self, module: &Module, class: &str) -> Option<Class>;

    fn get_resource_from_module(&self, module: &Module, resource: &str) -> Option<String>;

    fn load_class_from_parent(&self, class: &str) -> Option<Class>;

    fn get_resource_from_parent(&self, resource: &str) -> Option<String>;
}

/// Package of a fully qualified class name: `com.acme.Widget` -> `com.acme`.
pub fn class_package(class: &str) -> &str {
    class.rsplit_once('.').map_or("", |(package, _)| package)
}

/// Package of a `/`-separated resource path:
/// `/com/acme/res/config.xml` -> `com.acme.res`.
pub fn resource_package(resource: &str) -> String {
    let path = resource.trim_start_matches('/');
    path.rsplit_once('/')
        .map_or(String::new(), |(dir, _)| dir.replace('/', "."))
}

pub struct SearchPolicy<L> {
    resolver: Arc<Resolver>,
    loader: L,
}

impl<L: ContentLoader> SearchPolicy<L> {
    pub fn new(resolver: Arc<Resolver>, loader: L) -> Self {
        Self { resolver, loader }
    }

    pub fn resolver(&self) -> &Arc<Resolver> {
        &self.resolver
    }

    /// Full lookup of `class` on behalf of `module`.
    pub fn load_class(&self, module: ModuleId, class: &str) -> Result<Class, LoadError> {
        if let Some(found) = self.find_class_before_module(module, class)? {
            return Ok(found);
        }
        if let Some(own) = self.resolver.module(module)
            && let Some(found) = self.loader.load_class_from_module(&own, class)
        {
            return Ok(found);
        }
        self.find_class_after_module(module, class)
    }

    /// Full lookup of `resource` on behalf of `module`.
    pub fn get_resource(&self, module: ModuleId, resource: &str) -> Result<String, LoadError> {
        if let Some(found) = self.find_resource_before_module(module, resource)? {
            return Ok(found);
        }
        if let Some(own) = self.resolver.module(module)
            && let Some(found) = self.loader.get_resource_from_module(&own, resource)
        {
            return Ok(found);
        }
        self.find_resource_after_module(module, resource)
    }

    /// Lookup before the module's own content.
    ///
    /// Resolves the module first. `Ok(None)` means the package is not wired
    /// and the caller should search the module itself.
    pub fn find_class_before_module(
        &self,
        module: ModuleId,
        class: &str,
    ) -> Result<Option<Class>, LoadError> {
        let not_found = || LoadError::ClassNotFound(class.to_string());
        let package = class_package(class);

        if let Err(e) = self.resolver.resolve(module) {
            debug!("Cannot load {} from {}: {}", class, module, e);
            return Err(not_found());
        }
        if self.resolver.config().is_boot_delegated(package) {
            return self
                .loader
                .load_class_from_parent(class)
                .map(Some)
                .ok_or_else(not_found);
        }

        let Some(exporter) = self.wired_exporter(module, package) else {
            return Ok(None);
        };
        self.loader
            .load_class_from_module(&exporter, class)
            .map(Some)
            .ok_or_else(not_found)
    }

    /// Lookup after the module's own content came up empty: try a dynamic
    /// import of the class's package.
    pub fn find_class_after_module(
        &self,
        module: ModuleId,
        class: &str,
    ) -> Result<Class, LoadError> {
        let exporter = self.dynamic_exporter(module, class_package(class));
        exporter
            .and_then(|exporter| self.loader.load_class_from_module(&exporter, class))
            .ok_or_else(|| LoadError::ClassNotFound(class.to_string()))
    }

    pub fn find_resource_before_module(
        &self,
        module: ModuleId,
        resource: &str,
    ) -> Result<Option<String>, LoadError> {
        let not_found = || LoadError::ResourceNotFound(resource.to_string());
        let package = resource_package(resource);

        if let Err(e) = self.resolver.resolve(module) {
            debug!("Cannot get {} from {}: {}", resource, module, e);
            return Err(not_found());
        }
        if self.resolver.config().is_boot_delegated(&package) {
            return self
                .loader
                .get_resource_from_parent(resource)
                .map(Some)
                .ok_or_else(not_found);
        }

        let Some(exporter) = self.wired_exporter(module, &package) else {
            return Ok(None);
        };
        self.loader
            .get_resource_from_module(&exporter, resource)
            .map(Some)
            .ok_or_else(not_found)
    }

    pub fn find_resource_after_module(
        &self,
        module: ModuleId,
        resource: &str,
    ) -> Result<String, LoadError> {
        let exporter = self.dynamic_exporter(module, &resource_package(resource));
        exporter
            .and_then(|exporter| self.loader.get_resource_from_module(&exporter, resource))
            .ok_or_else(|| LoadError::ResourceNotFound(resource.to_string()))
    }

    fn wired_exporter(&self, module: ModuleId, package: &str) -> Option<Arc<Module>> {
        let wire = self.resolver.wire_for(module, package)?;
        self.resolver.module(wire.exporter)
    }

    fn dynamic_exporter(&self, module: ModuleId, package: &str) -> Option<Arc<Module>> {
        match self.resolver.attempt_dynamic_import(module, package) {
            Ok(exporter) => exporter.and_then(|id| self.resolver.module(id)),
            Err(e) => {
                debug!("Dynamic import of {} for {} failed: {}", package, module, e);
                None
            }
        }
    }
}
