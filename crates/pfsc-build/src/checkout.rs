//! Scoped repository checkout: a classic scoped-acquisition. `checkout`
//! leaves the working tree at `version`; the returned guard restores it to
//! whatever it was on every exit path (success, error, early return), the
//! same way [`crate::fs_cleanup`]'s best-effort cleanup always runs
//! regardless of how the enclosing call returns.

use crate::error::BuildError;
use pfsc_core::{Libpath, Version};
use std::path::{Path, PathBuf};

/// A VCS (or demo-filesystem) working tree the builder can check a repo out
/// into. Concrete checkout mechanics (git, a tarball cache, a bare copy) are
/// out of scope for the core; this port is all the builder depends on.
pub trait RepoCheckout: Send + Sync {
    fn checkout(&self, repopath: &Libpath, version: Version) -> crate::error::Result<CheckoutHandle>;
}

/// The live working-tree root for a checkout, released on drop. `release`
/// runs at most once, on the first drop.
pub struct CheckoutHandle {
    root: PathBuf,
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl CheckoutHandle {
    pub fn new(root: impl Into<PathBuf>, release: impl FnOnce() + Send + 'static) -> Self {
        CheckoutHandle { root: root.into(), release: Some(Box::new(release)) }
    }

    /// A handle over a tree that's already checked out and needs no release
    /// action (e.g. a fixed demo directory, or a release version that's
    /// immutable and never un-checked-out).
    pub fn borrowed(root: impl Into<PathBuf>) -> Self {
        CheckoutHandle { root: root.into(), release: None }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Drop for CheckoutHandle {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

/// A [`RepoCheckout`] whose repos already sit at a single fixed path,
/// unversioned; used by the CLI's demo-environment mode and by tests, where
/// there is only ever one version of a repo on disk at a time (usually WIP).
pub struct FixedRootCheckout {
    root: PathBuf,
}

impl FixedRootCheckout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FixedRootCheckout { root: root.into() }
    }
}

impl RepoCheckout for FixedRootCheckout {
    fn checkout(&self, _repopath: &Libpath, _version: Version) -> crate::error::Result<CheckoutHandle> {
        Ok(CheckoutHandle::borrowed(self.root.clone()))
    }
}

/// A [`RepoCheckout`] that copies a fixed source tree into a scratch
/// directory per checkout, so that a release build's read of the WIP tree
/// can't race a concurrent WIP edit. The scratch copy is torn down
/// file-by-file on release, using [`crate::fs_cleanup`]'s best-effort
/// semantics so one locked/already-gone file doesn't abort the rest.
pub struct ScratchCopyCheckout {
    source: PathBuf,
    scratch_parent: PathBuf,
}

impl ScratchCopyCheckout {
    pub fn new(source: impl Into<PathBuf>, scratch_parent: impl Into<PathBuf>) -> Self {
        ScratchCopyCheckout { source: source.into(), scratch_parent: scratch_parent.into() }
    }

    fn copy_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
        std::fs::create_dir_all(dst)?;
        for entry in std::fs::read_dir(src)? {
            let entry = entry?;
            let dst_path = dst.join(entry.file_name());
            if entry.file_type()?.is_dir() {
                Self::copy_recursive(&entry.path(), &dst_path)?;
            } else {
                std::fs::copy(entry.path(), &dst_path)?;
            }
        }
        Ok(())
    }

    fn remove_recursive_best_effort(dir: &Path) {
        let Ok(entries) = std::fs::read_dir(dir) else { return };
        for entry in entries.flatten() {
            let path = entry.path();
            if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                Self::remove_recursive_best_effort(&path);
            } else {
                crate::fs_cleanup::remove_file_best_effort(&path, "scratch checkout teardown");
            }
        }
        crate::fs_cleanup::sync_dir_best_effort(dir, "scratch checkout teardown");
        let _ = std::fs::remove_dir(dir);
    }
}

impl RepoCheckout for ScratchCopyCheckout {
    fn checkout(&self, repopath: &Libpath, version: Version) -> crate::error::Result<CheckoutHandle> {
        let dir_name = format!("{}-{}-{}", repopath.as_str().replace('.', "_"), version, std::process::id());
        let scratch_root = self.scratch_parent.join(dir_name);
        Self::copy_recursive(&self.source, &scratch_root)
            .map_err(|source| BuildError::Io { path: self.source.clone(), source })?;
        Ok(CheckoutHandle::new(scratch_root.clone(), move || {
            Self::remove_recursive_best_effort(&scratch_root);
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn copies_source_tree_and_tears_it_down_on_drop() {
        let source = tempfile::tempdir().unwrap();
        fs::write(source.path().join("__.pfsc"), "x := 1\n").unwrap();
        fs::create_dir(source.path().join("sub")).unwrap();
        fs::write(source.path().join("sub").join("y.pfsc"), "y := 2\n").unwrap();

        let scratch_parent = tempfile::tempdir().unwrap();
        let checkout = ScratchCopyCheckout::new(source.path(), scratch_parent.path());

        let scratch_root = {
            let handle = checkout.checkout(&Libpath::new("a.b.c"), Version::Wip).unwrap();
            assert!(handle.root().join("__.pfsc").is_file());
            assert!(handle.root().join("sub").join("y.pfsc").is_file());
            handle.root().to_path_buf()
        };
        assert!(!scratch_root.exists());
    }
}
