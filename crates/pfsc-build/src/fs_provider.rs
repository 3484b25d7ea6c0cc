//! A filesystem-backed [`pfsc_loader::SourceProvider`]: the concrete
//! implementation the builder hands the loader once a repo has been checked
//! out to a real directory. Filesystem layout stays a named port everywhere
//! else in the stack; this is the one place the core actually touches disk
//! directly, since the builder's directory walk (spec.md §4.4) is itself an
//! in-scope filesystem operation.

use pfsc_core::{Libpath, PECode, PfscError, Version};
use pfsc_loader::LoaderError;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

pub struct FsSourceProvider {
    root: PathBuf,
}

impl FsSourceProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FsSourceProvider { root: root.into() }
    }

    fn path_for(&self, libpath: &Libpath) -> PathBuf {
        let mut p = self.root.clone();
        for segment in libpath.segments() {
            p.push(segment);
        }
        p.set_extension("pfsc");
        p
    }

    fn dunder_path_for(&self, libpath: &Libpath) -> PathBuf {
        let mut p = self.root.clone();
        for segment in libpath.segments() {
            p.push(segment);
        }
        p.push("__.pfsc");
        p
    }

    /// A module's source can live at `name.pfsc` or, when the module is
    /// itself a directory of submodules, at `name/__.pfsc`.
    fn resolve_path(&self, libpath: &Libpath) -> Option<PathBuf> {
        let plain = self.path_for(libpath);
        if plain.is_file() {
            return Some(plain);
        }
        let dunder = self.dunder_path_for(libpath);
        if dunder.is_file() {
            return Some(dunder);
        }
        None
    }
}

impl pfsc_loader::SourceProvider for FsSourceProvider {
    fn mtime(&self, libpath: &Libpath, version: Version) -> Result<SystemTime, LoaderError> {
        let path = self
            .resolve_path(libpath)
            .ok_or_else(|| LoaderError::ModuleDoesNotExist { libpath: libpath.clone(), version })?;
        std::fs::metadata(&path)
            .and_then(|m| m.modified())
            .map_err(|e| LoaderError::Parse(PfscError::new(PECode::ModuleDoesNotExist, e.to_string())))
    }

    fn read_text(&self, libpath: &Libpath, version: Version) -> Result<String, LoaderError> {
        let path = self
            .resolve_path(libpath)
            .ok_or_else(|| LoaderError::ModuleDoesNotExist { libpath: libpath.clone(), version })?;
        std::fs::read_to_string(&path)
            .map_err(|e| LoaderError::Parse(PfscError::new(PECode::ModuleDoesNotExist, e.to_string())))
    }

    fn submodule_exists(&self, libpath: &Libpath, _version: Version) -> bool {
        let mut dir = self.root.clone();
        for segment in libpath.segments() {
            dir.push(segment);
        }
        self.resolve_path(libpath).is_some() || is_nonempty_dir(&dir)
    }
}

fn is_nonempty_dir(dir: &Path) -> bool {
    dir.is_dir() && std::fs::read_dir(dir).map(|mut it| it.next().is_some()).unwrap_or(false)
}
