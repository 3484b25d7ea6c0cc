//! The write layer: where a completed build's manifest and module-cache
//! output actually lands. Exposed as a trait so the orchestrator (and its
//! tests) don't have to care whether output goes to plain files on disk or
//! into a graph database's blob side-table.

mod atomic;

use pfsc_core::{Libpath, PfscError, Version};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

/// A place a build's outputs (manifests, serialized module content) can be
/// written to and read back from, keyed by repo-relative libpath, the
/// version being built, and a caller-chosen kind tag (e.g. `"dg.json"`,
/// `"anno.html"`, `"src"`).
pub trait WriteBackend: Send + Sync {
    fn write(&self, libpath: &Libpath, version: &Version, kind: &str, bytes: &[u8]) -> Result<(), PfscError>;
    fn read(&self, libpath: &Libpath, version: &Version, kind: &str) -> Result<Option<Vec<u8>>, PfscError>;
    fn delete(&self, libpath: &Libpath, version: &Version, kind: &str) -> Result<(), PfscError>;

    /// Clears every artifact previously written for `modpath` at `version`,
    /// so a rebuild never leaves a stale dashgraph or annotation behind for
    /// an entity that no longer exists. Scoped to `modpath`'s own direct
    /// entities; a submodule's artifacts live under their own `clear_module`
    /// call and must not be touched by this one.
    fn clear_module(&self, modpath: &Libpath, version: &Version) -> Result<(), PfscError>;
}

/// Writes each `(libpath, version, kind)` triple to its own file under a
/// build root, using [`atomic::atomic_write`] so a crash mid-build never
/// leaves a truncated file for a later read to trip over. Layout follows
/// `<root>/<version>/<libpath-dirs>/<name>.<kind>`, e.g.
/// `<root>/v1.0.0/a/b/Thm.dg.json`; the one exception is the manifest,
/// which lands flat at `<root>/<version>/manifest.json`.
pub struct FsWriteBackend {
    root: PathBuf,
}

impl FsWriteBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, libpath: &Libpath, version: &Version, kind: &str) -> PathBuf {
        if kind == "manifest.json" {
            let mut p = self.root.clone();
            p.push(version.to_string());
            p.push(kind);
            return p;
        }
        let mut p = self.root.clone();
        p.push(version.to_string());
        let segments: Vec<&str> = libpath.segments().collect();
        for seg in &segments[..segments.len().saturating_sub(1)] {
            p.push(seg);
        }
        p.push(format!("{}.{kind}", libpath.last_segment()));
        p
    }

    /// The directory holding `modpath`'s own entity artifacts (its
    /// deductions, annotations, source mirror), as opposed to the
    /// directories of any submodules nested beneath it.
    fn module_dir(&self, modpath: &Libpath, version: &Version) -> PathBuf {
        let mut p = self.root.clone();
        p.push(version.to_string());
        for seg in modpath.segments() {
            p.push(seg);
        }
        p
    }
}

impl WriteBackend for FsWriteBackend {
    fn write(&self, libpath: &Libpath, version: &Version, kind: &str, bytes: &[u8]) -> Result<(), PfscError> {
        atomic::atomic_write(&self.path_for(libpath, version, kind), bytes).map_err(PfscError::from)
    }

    fn read(&self, libpath: &Libpath, version: &Version, kind: &str) -> Result<Option<Vec<u8>>, PfscError> {
        match std::fs::read(self.path_for(libpath, version, kind)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(PfscError::from(err)),
        }
    }

    fn delete(&self, libpath: &Libpath, version: &Version, kind: &str) -> Result<(), PfscError> {
        match std::fs::remove_file(self.path_for(libpath, version, kind)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(PfscError::from(err)),
        }
    }

    fn clear_module(&self, modpath: &Libpath, version: &Version) -> Result<(), PfscError> {
        let dir = self.module_dir(modpath, version);
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(err) => return Err(PfscError::from(err)),
        };
        for entry in entries {
            let entry = entry.map_err(PfscError::from)?;
            let path = entry.path();
            // Only this module's own files; a submodule's artifacts live in
            // a subdirectory here and are cleared by its own build job.
            if path.is_file() {
                std::fs::remove_file(&path).map_err(PfscError::from)?;
            }
        }
        Ok(())
    }
}

/// A graph database keeps built module content as a blob attached to the
/// node it was built from, rather than as a standalone file; this backend
/// models that as an in-memory side table, and doubles as the reference
/// backend the test suite runs against.
#[derive(Default)]
pub struct GraphBlobWriteBackend {
    blobs: Mutex<HashMap<(Libpath, String, String), Vec<u8>>>,
}

impl GraphBlobWriteBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WriteBackend for GraphBlobWriteBackend {
    fn write(&self, libpath: &Libpath, version: &Version, kind: &str, bytes: &[u8]) -> Result<(), PfscError> {
        self.blobs
            .lock()
            .unwrap()
            .insert((libpath.clone(), version.to_string(), kind.to_string()), bytes.to_vec());
        Ok(())
    }

    fn read(&self, libpath: &Libpath, version: &Version, kind: &str) -> Result<Option<Vec<u8>>, PfscError> {
        Ok(self
            .blobs
            .lock()
            .unwrap()
            .get(&(libpath.clone(), version.to_string(), kind.to_string()))
            .cloned())
    }

    fn delete(&self, libpath: &Libpath, version: &Version, kind: &str) -> Result<(), PfscError> {
        self.blobs
            .lock()
            .unwrap()
            .remove(&(libpath.clone(), version.to_string(), kind.to_string()));
        Ok(())
    }

    fn clear_module(&self, modpath: &Libpath, version: &Version) -> Result<(), PfscError> {
        let version_tag = version.to_string();
        self.blobs
            .lock()
            .unwrap()
            .retain(|(libpath, v, _), _| !(v == &version_tag && libpath.parent().as_ref() == Some(modpath)));
        Ok(())
    }
}

/// Convenience wrapper around a [`WriteBackend`] for JSON payloads, used by
/// the manifest and module-cache writers so they deal in typed values
/// instead of raw bytes.
pub struct JsonWriter<'a> {
    backend: &'a dyn WriteBackend,
}

impl<'a> JsonWriter<'a> {
    pub fn new(backend: &'a dyn WriteBackend) -> Self {
        Self { backend }
    }

    pub fn write_value(
        &self,
        libpath: &Libpath,
        version: &Version,
        kind: &str,
        value: &serde_json::Value,
    ) -> Result<(), PfscError> {
        let bytes = serde_json::to_vec(value).map_err(|e| {
            PfscError::new(pfsc_core::PECode::ManifestBadForm, format!("failed to serialize {kind}: {e}"))
        })?;
        self.backend.write(libpath, version, kind, &bytes)
    }

    pub fn read_value(
        &self,
        libpath: &Libpath,
        version: &Version,
        kind: &str,
    ) -> Result<Option<serde_json::Value>, PfscError> {
        let Some(bytes) = self.backend.read(libpath, version, kind)? else {
            return Ok(None);
        };
        let value = serde_json::from_slice(&bytes).map_err(|e| {
            PfscError::new(pfsc_core::PECode::ManifestBadForm, format!("failed to parse {kind}: {e}"))
        })?;
        Ok(Some(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fs_backend_round_trips_through_json_writer() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FsWriteBackend::new(dir.path());
        let writer = JsonWriter::new(&backend);
        let lp = Libpath::new("a.b.c");
        let version = Version::parse("v1.0.0").unwrap();
        writer.write_value(&lp, &version, "manifest.json", &json!({"ok": true})).unwrap();
        let got = writer.read_value(&lp, &version, "manifest.json").unwrap().unwrap();
        assert_eq!(got["ok"], true);
        assert!(dir.path().join("v1.0.0").join("manifest.json").is_file());
    }

    #[test]
    fn fs_backend_versions_a_module_and_a_release_separately() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FsWriteBackend::new(dir.path());
        let lp = Libpath::new("a.b.Thm");
        backend.write(&lp, &Version::Wip, "dg.json", b"wip").unwrap();
        backend.write(&lp, &Version::parse("v1.0.0").unwrap(), "dg.json", b"released").unwrap();
        assert_eq!(backend.read(&lp, &Version::Wip, "dg.json").unwrap().unwrap(), b"wip");
        assert_eq!(
            backend.read(&lp, &Version::parse("v1.0.0").unwrap(), "dg.json").unwrap().unwrap(),
            b"released"
        );
    }

    #[test]
    fn fs_backend_clear_module_removes_only_its_own_files_not_submodules() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FsWriteBackend::new(dir.path());
        let version = Version::Wip;
        let modpath = Libpath::new("a.b");
        backend.write(&Libpath::new("a.b.Thm"), &version, "dg.json", b"x").unwrap();
        backend.write(&Libpath::new("a.b.c.Thm"), &version, "dg.json", b"y").unwrap();

        backend.clear_module(&modpath, &version).unwrap();

        assert!(backend.read(&Libpath::new("a.b.Thm"), &version, "dg.json").unwrap().is_none());
        assert_eq!(
            backend.read(&Libpath::new("a.b.c.Thm"), &version, "dg.json").unwrap().unwrap(),
            b"y"
        );
    }

    #[test]
    fn graph_backend_delete_then_read_returns_none() {
        let backend = GraphBlobWriteBackend::new();
        let lp = Libpath::new("a.b");
        let version = Version::Wip;
        backend.write(&lp, &version, "src", b"data").unwrap();
        backend.delete(&lp, &version, "src").unwrap();
        assert!(backend.read(&lp, &version, "src").unwrap().is_none());
    }

    #[test]
    fn graph_backend_clear_module_scopes_by_modpath_and_version() {
        let backend = GraphBlobWriteBackend::new();
        let modpath = Libpath::new("a.b");
        backend.write(&Libpath::new("a.b.Thm"), &Version::Wip, "dg.json", b"x").unwrap();
        backend
            .write(&Libpath::new("a.b.Thm"), &Version::parse("v1.0.0").unwrap(), "dg.json", b"released")
            .unwrap();

        backend.clear_module(&modpath, &Version::Wip).unwrap();

        assert!(backend.read(&Libpath::new("a.b.Thm"), &Version::Wip, "dg.json").unwrap().is_none());
        assert!(backend
            .read(&Libpath::new("a.b.Thm"), &Version::parse("v1.0.0").unwrap(), "dg.json")
            .unwrap()
            .is_some());
    }
}
