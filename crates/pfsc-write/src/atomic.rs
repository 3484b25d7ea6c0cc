//! Crash-safe "write somewhere new, then rename over the destination"
//! helper, used by every disk-backed write port so a reader never observes a
//! half-written manifest or module-cache file.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

pub fn atomic_write(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let parent = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)?;

    let (tmp_path, mut file) = open_unique_tmp_file(path, parent)?;
    let write_result = (|| -> io::Result<()> {
        file.write_all(bytes)?;
        file.sync_all()?;
        Ok(())
    })();
    if let Err(err) = write_result {
        drop(file);
        let _ = fs::remove_file(&tmp_path);
        return Err(err);
    }
    drop(file);

    const MAX_RENAME_ATTEMPTS: usize = 1024;
    let mut attempts = 0usize;
    loop {
        match fs::rename(&tmp_path, path) {
            Ok(()) => break,
            Err(err) if cfg!(windows) && (err.kind() == io::ErrorKind::AlreadyExists || path.exists()) => {
                if attempts >= MAX_RENAME_ATTEMPTS {
                    let _ = fs::remove_file(&tmp_path);
                    return Err(err);
                }
                match fs::remove_file(path) {
                    Ok(()) => {}
                    Err(remove_err) if remove_err.kind() == io::ErrorKind::NotFound => {}
                    Err(remove_err) => {
                        let _ = fs::remove_file(&tmp_path);
                        return Err(remove_err);
                    }
                }
                attempts += 1;
            }
            Err(err) => {
                let _ = fs::remove_file(&tmp_path);
                return Err(err);
            }
        }
    }

    sync_dir_best_effort(parent);
    Ok(())
}

#[cfg(unix)]
fn sync_dir_best_effort(dir: &Path) {
    if let Ok(dir) = fs::File::open(dir) {
        let _ = dir.sync_all();
    }
}

#[cfg(not(unix))]
fn sync_dir_best_effort(_dir: &Path) {}

fn open_unique_tmp_file(dest: &Path, parent: &Path) -> io::Result<(PathBuf, fs::File)> {
    let file_name = dest
        .file_name()
        .ok_or_else(|| io::Error::other("destination path has no file name"))?;
    let pid = std::process::id();
    loop {
        let counter = TMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        let mut tmp_name = file_name.to_os_string();
        tmp_name.push(format!(".tmp.{pid}.{counter}"));
        let tmp_path = parent.join(tmp_name);
        match fs::OpenOptions::new().write(true).create_new(true).open(&tmp_path) {
            Ok(file) => return Ok((tmp_path, file)),
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_and_replaces_destination_without_leaving_tmp_files() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("nested").join("out.json");
        atomic_write(&dest, b"first").unwrap();
        atomic_write(&dest, b"second").unwrap();
        assert_eq!(fs::read(&dest).unwrap(), b"second");
        for entry in fs::read_dir(dest.parent().unwrap()).unwrap() {
            let name = entry.unwrap().file_name();
            assert!(!name.to_string_lossy().contains(".tmp."));
        }
    }
}
