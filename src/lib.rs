//! Import/export wiring for versioned modules.
//!
//! Modules declare the packages they export and the packages they import.
//! [`Resolver`] picks one exporter per import so that every module sees a
//! single consistent version of each package, then records the choice as
//! [`Wire`]s. [`SearchPolicy`] uses that wiring to route class and resource
//! lookups.

pub mod config;
pub mod error;
pub mod listener;
pub mod loader;
pub mod module;
pub mod package;
pub mod registry;
pub mod resolver;

pub use config::ResolverConfig;
pub use error::{LoadError, ResolveError, ResolveResult};
pub use listener::{ResolverEvent, ResolverListener};
pub use loader::{Class, ContentLoader, SearchPolicy};
pub use module::{Module, ModuleDescriptor, ModuleId, Wire};
pub use package::{ExportedPackage, PackageRequirement, VersionRange};
pub use resolver::Resolver;

/// Shorthand constructors for test universes.
#[cfg(test)]
pub mod test_utils {
    use crate::module::ModuleDescriptor;
    use crate::package::{ExportedPackage, PackageRequirement};
    use semver::Version;

    /// Parse a version literal.
    pub fn v(version: &str) -> Version {
        Version::parse(version).unwrap()
    }

    /// A module exporting a single package.
    pub fn exporter(name: &str, package: &str, version: &str) -> ModuleDescriptor {
        ModuleDescriptor::new(name).export(ExportedPackage::new(package, v(version)))
    }

    /// A module with one mandatory, unconstrained import.
    pub fn importer(name: &str, package: &str) -> ModuleDescriptor {
        ModuleDescriptor::new(name).import(PackageRequirement::new(package))
    }
}
