//! Version ranges for package requirements.
//!
//! Ranges arrive already structured; this module only answers whether a
//! concrete export version falls inside one.

use semver::Version;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Version range a requirement places on an exported package.
///
/// The default range is `[0.0.0, ∞)`, which accepts every version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRange {
    pub floor: Version,
    #[serde(default = "inclusive")]
    pub floor_inclusive: bool,
    #[serde(default)]
    pub ceiling: Option<Version>,
    #[serde(default)]
    pub ceiling_inclusive: bool,
}

fn inclusive() -> bool {
    true
}

impl Default for VersionRange {
    fn default() -> Self {
        Self::any()
    }
}

impl VersionRange {
    pub fn new(
        floor: Version,
        floor_inclusive: bool,
        ceiling: Option<Version>,
        ceiling_inclusive: bool,
    ) -> Self {
        Self {
            floor,
            floor_inclusive,
            ceiling,
            ceiling_inclusive,
        }
    }

    /// Range accepting every version.
    pub fn any() -> Self {
        Self::at_least(Version::new(0, 0, 0))
    }

    /// `[floor, ∞)`
    pub fn at_least(floor: Version) -> Self {
        Self::new(floor, true, None, false)
    }

    /// `[version, version]`
    pub fn exact(version: Version) -> Self {
        Self::new(version.clone(), true, Some(version), true)
    }

    /// `[floor, ceiling)`
    pub fn between(floor: Version, ceiling: Version) -> Self {
        Self::new(floor, true, Some(ceiling), false)
    }

    /// Check whether `version` lies inside the range.
    pub fn contains(&self, version: &Version) -> bool {
        let above_floor = if self.floor_inclusive {
            *version >= self.floor
        } else {
            *version > self.floor
        };
        if !above_floor {
            return false;
        }

        match &self.ceiling {
            None => true,
            Some(ceiling) if self.ceiling_inclusive => version <= ceiling,
            Some(ceiling) => version < ceiling,
        }
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let open = if self.floor_inclusive { '[' } else { '(' };
        match &self.ceiling {
            Some(ceiling) => {
                let close = if self.ceiling_inclusive { ']' } else { ')' };
                write!(f, "{}{}, {}{}", open, self.floor, ceiling, close)
            }
            None => write!(f, "{}{}, ∞)", open, self.floor),
        }
    }
}
