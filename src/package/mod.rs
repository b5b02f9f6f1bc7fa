//! Package descriptors: what modules export and what they require.

mod version;

use semver::Version;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

pub use version::VersionRange;

/// Directive on an export listing attributes an importer must name.
pub const MANDATORY_DIRECTIVE: &str = "mandatory";

/// A package exported by a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedPackage {
    pub name: String,
    pub version: Version,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub directives: BTreeMap<String, String>,
    /// Packages whose provider must be shared with anyone importing this one.
    #[serde(default)]
    pub uses: BTreeSet<String>,
}

impl ExportedPackage {
    pub fn new(name: impl Into<String>, version: Version) -> Self {
        Self {
            name: name.into(),
            version,
            attributes: BTreeMap::new(),
            directives: BTreeMap::new(),
            uses: BTreeSet::new(),
        }
    }

    /// Add a package name to the `uses` set.
    pub fn uses(mut self, package: impl Into<String>) -> Self {
        self.uses.insert(package.into());
        self
    }

    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn directive(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.directives.insert(key.into(), value.into());
        self
    }

    /// Attributes an importer has to name explicitly to match this export.
    pub fn mandatory_attributes(&self) -> impl Iterator<Item = &str> {
        self.directives
            .get(MANDATORY_DIRECTIVE)
            .into_iter()
            .flat_map(|list| list.split(','))
            .map(str::trim)
            .filter(|attr| !attr.is_empty())
    }

    /// Check whether this export can satisfy `requirement`.
    ///
    /// Matches on name, version range and attributes. Every attribute the
    /// requirement names must be present with an equal value, and every
    /// mandatory attribute of the export must be named by the requirement.
    pub fn satisfies(&self, requirement: &PackageRequirement) -> bool {
        if self.name != requirement.name || !requirement.range.contains(&self.version) {
            return false;
        }

        let attributes_match = requirement
            .attributes
            .iter()
            .all(|(key, value)| self.attributes.get(key) == Some(value));

        attributes_match
            && self
                .mandatory_attributes()
                .all(|attr| requirement.attributes.contains_key(attr))
    }
}

impl fmt::Display for ExportedPackage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}; version={}", self.name, self.version)
    }
}

/// An import (static or dynamic) declared by a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRequirement {
    pub name: String,
    #[serde(default)]
    pub range: VersionRange,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub directives: BTreeMap<String, String>,
    /// Absence of a provider does not fail resolution.
    #[serde(default)]
    pub optional: bool,
}

impl PackageRequirement {
    /// Requirement on any version of `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            range: VersionRange::any(),
            attributes: BTreeMap::new(),
            directives: BTreeMap::new(),
            optional: false,
        }
    }

    pub fn range(mut self, range: VersionRange) -> Self {
        self.range = range;
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Copy of this requirement naming a concrete package instead.
    ///
    /// Used to turn a wildcard dynamic import into a real requirement.
    pub fn with_name(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            optional: false,
            ..self.clone()
        }
    }

    /// Check whether this dynamic-import spec covers `package`.
    ///
    /// Matches the exact name, `*`, or `prefix.*` by plain prefix.
    pub fn matches_dynamic(&self, package: &str) -> bool {
        if self.name == "*" || self.name == package {
            return true;
        }
        match self.name.strip_suffix(".*") {
            Some(prefix) => package.starts_with(prefix),
            None => false,
        }
    }
}

impl fmt::Display for PackageRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}; version={}", self.name, self.range)?;
        if self.optional {
            write!(f, "; resolution:=optional")?;
        }
        Ok(())
    }
}
