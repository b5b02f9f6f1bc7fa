//! Lazy wiring of single packages through dynamic-import specs.
//!
//! Assumes a package is never split across several exporting modules.

use std::sync::Arc;

use log::debug;

use super::resolve_locked;
use crate::error::ResolveResult;
use crate::module::{Module, ModuleId, Wire};
use crate::package::PackageRequirement;
use crate::registry::Registry;

/// Concrete requirement for `package` built from the first dynamic-import
/// spec of `module` that covers it.
pub fn match_dynamic_import(module: &Module, package: &str) -> Option<PackageRequirement> {
    module
        .dynamic_imports()
        .iter()
        .find(|spec| spec.matches_dynamic(package))
        .map(|spec| spec.with_name(package))
}

/// Wire `importer` to an exporter of `package` if a dynamic import allows it.
///
/// In-use exporters win outright. Otherwise each available exporter is only
/// accepted once a full resolve of the importer succeeds and leaves the
/// package unwired. Modules resolved on the way are appended to `resolved`.
pub(crate) fn attempt_dynamic_import_locked(
    registry: &mut Registry,
    importer: ModuleId,
    package: &str,
    resolved: &mut Vec<ModuleId>,
) -> ResolveResult<Option<ModuleId>> {
    let module = Arc::clone(&registry.entry(importer)?.module);
    let Some(requirement) = match_dynamic_import(&module, package) else {
        return Ok(None);
    };
    if registry.wire_for(importer, package).is_some() {
        return Ok(None);
    }

    let mut candidate = registry.in_use_exporters(&requirement).first().copied();
    if candidate.is_none() {
        for available in registry.available_exporters(&requirement) {
            match resolve_locked(registry, importer) {
                Ok(newly_resolved) => {
                    resolved.extend(newly_resolved);
                    // The resolve may have wired the package through a
                    // static import.
                    if registry.wire_for(importer, package).is_some() {
                        return Ok(None);
                    }
                    if registry.candidates(&requirement).contains(&available) {
                        candidate = Some(available);
                        break;
                    }
                }
                Err(e) => {
                    debug!("Dynamic import of {} via {} failed: {}", package, available, e)
                }
            }
        }
    }

    let Some(exporter) = candidate else {
        return Ok(None);
    };
    let Some(export) = registry.module(exporter).export(package).cloned() else {
        return Ok(None);
    };

    let wire = Wire::new(export, exporter);
    debug!("WIRE: [{}] {} (dynamic)", module, wire);
    let index = registry.index_mut();
    index.remove_available(package, exporter);
    index.add_in_use(package, exporter);
    registry.push_wire(importer, wire);

    Ok(Some(exporter))
}
