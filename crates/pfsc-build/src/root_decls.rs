//! Extraction of a repo root module's reserved top-level assignments:
//! `dependencies` (a libpath -> version-string object, read by the loader as
//! `root_dependencies`) and `change_log` (whose mere presence is all the
//! Build phase checks — its content is opaque to this layer).

use crate::error::{BuildError, Result};
use indexmap::IndexMap;
use pfsc_core::{Libpath, Version};
use pfsc_model::{ItemRef, Module};
use pfsc_syntax::json_literal::JsonValue;

const DEPENDENCIES_LHS: &str = "dependencies";
const CHANGE_LOG_LHS: &str = "change_log";

/// Reads `root.dependencies` into the `(repopath, version)` table the loader
/// needs to resolve cross-repo imports. Absent entirely is fine — a repo
/// with no cross-repo imports needn't declare it; a malformed value is not.
pub fn read_dependencies(root: &Module) -> Result<IndexMap<Libpath, Version>> {
    let Some(ItemRef::Asgn(id)) = root.items.get(DEPENDENCIES_LHS) else {
        return Ok(IndexMap::new());
    };
    let asgn = root.asgns.get(*id);
    let JsonValue::Object(entries) = &asgn.value else {
        return Err(BuildError::Pfsc(pfsc_core::PfscError::new(
            pfsc_core::PECode::ManifestBadForm,
            format!("{DEPENDENCIES_LHS} must be an object mapping repopaths to version strings"),
        )));
    };

    let mut out = IndexMap::new();
    for (repopath, value) in entries {
        let JsonValue::String(version_str) = value else {
            return Err(BuildError::Pfsc(pfsc_core::PfscError::new(
                pfsc_core::PECode::ManifestBadForm,
                format!("dependency version for {repopath} must be a string"),
            )));
        };
        let version = Version::parse(version_str).map_err(BuildError::Pfsc)?;
        out.insert(Libpath::new(repopath), version);
    }
    Ok(out)
}

/// Whether `root` declares a `change_log`, required of a repo root module
/// whenever a release build bumps the major version (spec.md §4.4).
pub fn has_change_log(root: &Module) -> bool {
    matches!(root.items.get(CHANGE_LOG_LHS), Some(ItemRef::Asgn(_)))
}

/// Checks the root-declaration invariants for a release build: a major-version
/// bump requires a change log, and no declared dependency may be pinned to
/// WIP.
pub fn check_root_declarations_for_release(
    root: &Module,
    repopath: &Libpath,
    version: Version,
    is_major_bump: bool,
) -> Result<()> {
    if is_major_bump && !has_change_log(root) {
        return Err(BuildError::MissingChangeLog { repopath: repopath.clone(), version });
    }
    let deps = read_dependencies(root)?;
    for (dep_repopath, dep_version) in &deps {
        if matches!(dep_version, Version::Wip) {
            return Err(BuildError::WipDependencyInRelease {
                repopath: repopath.clone(),
                dependency: dep_repopath.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pfsc_syntax::parse_module_text;

    fn build(src: &str) -> Module {
        let parsed = parse_module_text(src).unwrap();
        pfsc_model::build_module_from_parsed(&Libpath::new("a.b.c"), parsed, Version::Wip).unwrap()
    }

    #[test]
    fn reads_declared_dependencies() {
        let module = build("dependencies := {\n    \"x.y.z\": \"v2.0.0\"\n}\n");
        let deps = read_dependencies(&module).unwrap();
        assert_eq!(
            deps.get(&Libpath::new("x.y.z")),
            Some(&Version::Numbered { major: 2, minor: 0, patch: 0 })
        );
    }

    #[test]
    fn absent_dependencies_is_empty() {
        let module = build("x := 1\n");
        assert!(read_dependencies(&module).unwrap().is_empty());
    }

    #[test]
    fn major_bump_without_change_log_is_rejected() {
        let module = build("x := 1\n");
        let err = check_root_declarations_for_release(
            &module,
            &Libpath::new("a.b.c"),
            Version::Numbered { major: 2, minor: 0, patch: 0 },
            true,
        )
        .unwrap_err();
        assert!(matches!(err, BuildError::MissingChangeLog { .. }));
    }

    #[test]
    fn wip_dependency_in_release_is_rejected() {
        let module = build("dependencies := {\n    \"x.y.z\": \"WIP\"\n}\nchange_log := \"notes\"\n");
        let err = check_root_declarations_for_release(
            &module,
            &Libpath::new("a.b.c"),
            Version::Numbered { major: 2, minor: 0, patch: 0 },
            true,
        )
        .unwrap_err();
        assert!(matches!(err, BuildError::WipDependencyInRelease { .. }));
    }
}
