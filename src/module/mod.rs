//! Modules: the unit of resolution, and the wires connecting them.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::package::{ExportedPackage, PackageRequirement};

/// Stable identity of a registered module.
///
/// Assigned by the registry at registration time and never reused, so two
/// modules with identical declarations remain distinct participants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(pub(crate) usize);

impl ModuleId {
    /// Position of the module in its registry.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Declarations of a module before it is registered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleDescriptor {
    pub name: String,
    #[serde(default)]
    pub exports: Vec<ExportedPackage>,
    #[serde(default)]
    pub imports: Vec<PackageRequirement>,
    #[serde(default)]
    pub dynamic_imports: Vec<PackageRequirement>,
}

impl ModuleDescriptor {
    /// Descriptor with no exports or imports.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Add an exported package.
    pub fn export(mut self, package: ExportedPackage) -> Self {
        self.exports.push(package);
        self
    }

    /// Add a static import.
    pub fn import(mut self, requirement: PackageRequirement) -> Self {
        self.imports.push(requirement);
        self
    }

    /// Add a dynamic-import spec such as `com.acme.*`.
    pub fn dynamic_import(mut self, requirement: PackageRequirement) -> Self {
        self.dynamic_imports.push(requirement);
        self
    }
}

/// A registered module. Its declarations never change after registration.
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    id: ModuleId,
    descriptor: ModuleDescriptor,
}

impl Module {
    pub(crate) fn new(id: ModuleId, descriptor: ModuleDescriptor) -> Self {
        Self { id, descriptor }
    }

    /// Id assigned at registration.
    pub fn id(&self) -> ModuleId {
        self.id
    }

    /// Name from the descriptor; not unique.
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    /// Exported packages in declaration order.
    pub fn exports(&self) -> &[ExportedPackage] {
        &self.descriptor.exports
    }

    /// Static imports in declaration order.
    pub fn imports(&self) -> &[PackageRequirement] {
        &self.descriptor.imports
    }

    /// Dynamic-import specs, tried in declaration order.
    pub fn dynamic_imports(&self) -> &[PackageRequirement] {
        &self.descriptor.dynamic_imports
    }

    /// This module's export of `package`, if any.
    pub fn export(&self, package: &str) -> Option<&ExportedPackage> {
        self.exports().iter().find(|e| e.name == package)
    }

    /// Whether any static import names `package`.
    pub fn imports_package(&self, package: &str) -> bool {
        self.imports().iter().any(|i| i.name == package)
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.descriptor.name, self.id)
    }
}

/// A committed edge: an import satisfied by `exporter`'s export of `package`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wire {
    pub package: ExportedPackage,
    pub exporter: ModuleId,
}

impl Wire {
    /// Wire to `exporter` for its export `package`.
    pub fn new(package: ExportedPackage, exporter: ModuleId) -> Self {
        Self { package, exporter }
    }

    /// Name of the wired package.
    pub fn package_name(&self) -> &str {
        &self.package.name
    }
}

impl fmt::Display for Wire {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.package, self.exporter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use semver::Version;

    #[test]
    fn test_descriptor_builder() {
        let descriptor = ModuleDescriptor::new("app")
            .export(ExportedPackage::new("app.api", Version::new(1, 0, 0)))
            .import(PackageRequirement::new("core.api"))
            .dynamic_import(PackageRequirement::new("plugins.*"));

        assert_eq!(descriptor.name, "app");
        assert_eq!(descriptor.exports.len(), 1);
        assert_eq!(descriptor.imports[0].name, "core.api");
        assert_eq!(descriptor.dynamic_imports[0].name, "plugins.*");
    }

    #[test]
    fn test_module_lookups() {
        let module = Module::new(
            ModuleId(3),
            ModuleDescriptor::new("app")
                .export(ExportedPackage::new("app.api", Version::new(1, 0, 0)))
                .import(PackageRequirement::new("core.api")),
        );

        assert!(module.export("app.api").is_some());
        assert!(module.export("core.api").is_none());
        assert!(module.imports_package("core.api"));
        assert!(!module.imports_package("app.api"));
        assert_eq!(module.to_string(), "app#3");
    }

    #[test]
    fn test_identical_descriptors_are_distinct_modules() {
        let descriptor = ModuleDescriptor::new("twin");
        let a = Module::new(ModuleId(0), descriptor.clone());
        let b = Module::new(ModuleId(1), descriptor);
        assert_ne!(a, b);
        assert_ne!(a.id(), b.id());
    }
}
