//! The Build phase's filesystem walk: every `.pfsc` file under a checked-out
//! repo root becomes a job `(modpath, is_dunder)`; directories that carry
//! none are reported back as "useless" rather than silently dropped.

use crate::error::{BuildError, Result};
use pfsc_core::Libpath;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct ModuleJob {
    pub libpath: Libpath,
    pub path: PathBuf,
    /// `true` for a `__.pfsc` dunder module, which attaches directly to the
    /// parent directory's own libpath rather than introducing a child of it.
    pub is_dunder: bool,
}

#[derive(Debug, Default)]
pub struct WalkReport {
    /// Jobs in post-order-stable directory order: a directory's own jobs
    /// come after every job found in its subdirectories, so a module is
    /// never processed before the submodules it (transitively) contains.
    pub jobs: Vec<ModuleJob>,
    pub useless_dirs: Vec<PathBuf>,
}

/// Walks `fs_root`, skipping hidden entries (dotfiles/dot-directories) and
/// anything in `ignore`, recording one [`ModuleJob`] per `.pfsc` file found
/// and translating its path (relative to `fs_root`) into a libpath rooted at
/// `repo_libpath`.
pub fn walk_modules(fs_root: &Path, repo_libpath: &Libpath, ignore: &HashSet<PathBuf>) -> Result<WalkReport> {
    let mut jobs = Vec::new();
    let mut pfsc_count_by_dir: HashMap<PathBuf, usize> = HashMap::new();
    pfsc_count_by_dir.insert(fs_root.to_path_buf(), 0);

    let walker = WalkDir::new(fs_root).into_iter().filter_entry(|entry| {
        let name = entry.file_name().to_string_lossy();
        let hidden = entry.depth() > 0 && name.starts_with('.');
        !hidden && !ignore.contains(entry.path())
    });

    for entry in walker {
        let entry = entry.map_err(|source| BuildError::Walk { path: fs_root.to_path_buf(), source })?;
        if entry.file_type().is_dir() {
            pfsc_count_by_dir.entry(entry.path().to_path_buf()).or_insert(0);
            continue;
        }
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("pfsc") {
            continue;
        }

        let parent = path.parent().unwrap_or(fs_root).to_path_buf();
        *pfsc_count_by_dir.entry(parent.clone()).or_insert(0) += 1;

        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
        let is_dunder = stem == "__";
        let rel_dir = parent.strip_prefix(fs_root).unwrap_or_else(|_| Path::new(""));

        let mut libpath = repo_libpath.clone();
        for component in rel_dir.components() {
            if let std::path::Component::Normal(segment) = component {
                libpath = libpath.join(&segment.to_string_lossy());
            }
        }
        if !is_dunder {
            libpath = libpath.join(stem);
        }

        jobs.push(ModuleJob { libpath, path: path.to_path_buf(), is_dunder });
    }

    // Post-order stable: deeper directories' jobs sort before their
    // ancestors', with a path-string tiebreak for determinism between
    // siblings.
    jobs.sort_by(|a, b| {
        let depth_a = a.path.components().count();
        let depth_b = b.path.components().count();
        depth_b.cmp(&depth_a).then_with(|| a.path.cmp(&b.path))
    });

    let useless_dirs = pfsc_count_by_dir
        .into_iter()
        .filter(|(_, count)| *count == 0)
        .map(|(dir, _)| dir)
        .collect();

    Ok(WalkReport { jobs, useless_dirs })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn finds_dunder_and_named_modules_and_reports_useless_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("__.pfsc"), "").unwrap();
        fs::create_dir(root.join("sub")).unwrap();
        fs::write(root.join("sub").join("x.pfsc"), "").unwrap();
        fs::create_dir(root.join("empty")).unwrap();

        let report = walk_modules(root, &Libpath::new("a.b"), &HashSet::new()).unwrap();

        let libpaths: Vec<String> = report.jobs.iter().map(|j| j.libpath.as_str().to_string()).collect();
        assert!(libpaths.contains(&"a.b".to_string()));
        assert!(libpaths.contains(&"a.b.sub.x".to_string()));
        assert_eq!(report.useless_dirs.len(), 1);
        assert_eq!(report.useless_dirs[0], root.join("empty"));
    }

    #[test]
    fn skips_hidden_directories() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir(root.join(".git")).unwrap();
        fs::write(root.join(".git").join("x.pfsc"), "").unwrap();

        let report = walk_modules(root, &Libpath::new("a.b"), &HashSet::new()).unwrap();
        assert!(report.jobs.is_empty());
    }
}
