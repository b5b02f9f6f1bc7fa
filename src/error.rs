use thiserror::Error;

use crate::module::ModuleId;
use crate::package::PackageRequirement;

/// Why a module could not be resolved.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolveError {
    /// A mandatory import has no candidate left after recursive population.
    #[error("Unable to resolve module {module}: missing requirement [{requirement}]")]
    UnresolvablePackage {
        module: String,
        requirement: PackageRequirement,
    },

    /// Every candidate combination violates a uses constraint.
    #[error("Unable to resolve module {module} due to constraint violation")]
    SearchExhausted { module: String },

    #[error("Unknown module: {0}")]
    UnknownModule(ModuleId),
}

pub type ResolveResult<T> = Result<T, ResolveError>;

/// Lookup failures reported by the search policy.
///
/// These carry only the requested name; resolution details stay internal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("Class not found: {0}")]
    ClassNotFound(String),

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),
}
