//! Candidate selection for package requirements.

use super::Registry;
use crate::module::ModuleId;
use crate::package::PackageRequirement;

impl Registry {
    /// Filter `modules` down to those whose export of `requirement.name`
    /// satisfies `requirement`. Input order is preserved.
    pub fn compatible_exporters(
        &self,
        modules: &[ModuleId],
        requirement: &PackageRequirement,
    ) -> Vec<ModuleId> {
        modules
            .iter()
            .copied()
            .filter(|&id| {
                self.module(id)
                    .export(&requirement.name)
                    .is_some_and(|export| export.satisfies(requirement))
            })
            .collect()
    }

    /// Available exporters able to satisfy `requirement`.
    pub fn available_exporters(&self, requirement: &PackageRequirement) -> Vec<ModuleId> {
        self.compatible_exporters(self.index().available(&requirement.name), requirement)
    }

    /// In-use exporters able to satisfy `requirement`.
    pub fn in_use_exporters(&self, requirement: &PackageRequirement) -> Vec<ModuleId> {
        self.compatible_exporters(self.index().in_use(&requirement.name), requirement)
    }

    /// Candidates for a resolver node: in-use matches first, then available.
    pub fn candidates(&self, requirement: &PackageRequirement) -> Vec<ModuleId> {
        let mut candidates = self.in_use_exporters(requirement);
        candidates.extend(self.available_exporters(requirement));
        candidates
    }
}
