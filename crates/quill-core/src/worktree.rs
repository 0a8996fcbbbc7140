//! Working-tree synchronization.
//!
//! Reconciles the on-disk directory with a target snapshot, shared by
//! branch checkout, reset and merge. The untracked-hazard scan runs to
//! completion before any file is deleted or written, so a refused sync
//! leaves the working tree byte-for-byte unchanged. (Not crash-atomic: an
//! interruption mid-sync can leave a partial tree.)

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use walkdir::WalkDir;

use crate::error::{QuillError, QuillResult};
use crate::object::ObjectStore;
use crate::repo::QUILL_DIR;

/// Relative paths of every regular file under `root`, repository directory
/// excluded, sorted.
pub fn working_files(root: &Path) -> QuillResult<Vec<String>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| e.file_name().to_string_lossy() != QUILL_DIR)
    {
        let entry = entry.map_err(io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = match entry.path().strip_prefix(root) {
            Ok(p) => p.to_string_lossy().to_string(),
            Err(_) => continue,
        };
        files.push(rel);
    }
    files.sort();
    Ok(files)
}

/// Reconcile the working tree with `target`.
///
/// Phase 1 scans every working file for the untracked hazard: on disk,
/// untracked by `current`, and about to be overwritten because `target`
/// tracks it. The scan completes before phase 2 deletes the paths `target`
/// dropped and phase 3 (over)writes every path `target` tracks.
pub fn sync_to(
    root: &Path,
    objects: &ObjectStore,
    target: &BTreeMap<String, String>,
    current: &BTreeMap<String, String>,
) -> QuillResult<()> {
    for path in working_files(root)? {
        if !current.contains_key(&path) && target.contains_key(&path) {
            return Err(QuillError::UntrackedFile);
        }
    }
    for path in current.keys() {
        if !target.contains_key(path) {
            remove_working_file(root, path)?;
        }
    }
    for (path, blob_id) in target {
        restore_file(root, objects, path, blob_id)?;
    }
    log::debug!("synced working tree to {} paths", target.len());
    Ok(())
}

/// Write one tracked file from its blob, creating parent directories.
pub fn restore_file(
    root: &Path,
    objects: &ObjectStore,
    path: &str,
    blob_id: &str,
) -> QuillResult<()> {
    let bytes = objects.retrieve(blob_id)?;
    let full = root.join(path);
    if let Some(parent) = full.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(full, bytes)?;
    Ok(())
}

/// Delete a tracked file if it is still on disk.
pub fn remove_working_file(root: &Path, path: &str) -> QuillResult<()> {
    match fs::remove_file(root.join(path)) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn setup() -> (tempfile::TempDir, ObjectStore) {
        let dir = tempdir().unwrap();
        let objects = ObjectStore::new(&dir.path().join(QUILL_DIR).join("objects"));
        (dir, objects)
    }

    fn tree(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_working_files_skips_repo_dir() {
        let (dir, _objects) = setup();
        fs::write(dir.path().join("a.txt"), "a").unwrap();
        fs::create_dir_all(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/b.txt"), "b").unwrap();
        fs::create_dir_all(dir.path().join(QUILL_DIR).join("heads")).unwrap();
        fs::write(dir.path().join(QUILL_DIR).join("HEAD"), "master").unwrap();

        assert_eq!(working_files(dir.path()).unwrap(), vec!["a.txt", "sub/b.txt"]);
    }

    #[test]
    fn test_sync_writes_and_deletes() {
        let (dir, objects) = setup();
        let old = objects.store(b"old content").unwrap();
        let new = objects.store(b"new content").unwrap();
        fs::write(dir.path().join("keep.txt"), "stale").unwrap();
        fs::write(dir.path().join("drop.txt"), "old content").unwrap();

        let current = tree(&[("keep.txt", &old), ("drop.txt", &old)]);
        let target = tree(&[("keep.txt", &new)]);
        sync_to(dir.path(), &objects, &target, &current).unwrap();

        assert_eq!(fs::read(dir.path().join("keep.txt")).unwrap(), b"new content");
        assert!(!dir.path().join("drop.txt").exists());
    }

    #[test]
    fn test_sync_creates_nested_paths() {
        let (dir, objects) = setup();
        let blob = objects.store(b"nested").unwrap();

        let target = tree(&[("src/deep/mod.rs", &blob)]);
        sync_to(dir.path(), &objects, &target, &BTreeMap::new()).unwrap();

        assert_eq!(fs::read(dir.path().join("src/deep/mod.rs")).unwrap(), b"nested");
    }

    #[test]
    fn test_untracked_hazard_aborts_before_mutation() {
        let (dir, objects) = setup();
        let tracked = objects.store(b"tracked").unwrap();
        let incoming = objects.store(b"incoming").unwrap();
        fs::write(dir.path().join("tracked.txt"), "stale").unwrap();
        fs::write(dir.path().join("local.txt"), "precious").unwrap();

        let current = tree(&[("tracked.txt", &tracked)]);
        let target = tree(&[("tracked.txt", &incoming), ("local.txt", &incoming)]);
        let result = sync_to(dir.path(), &objects, &target, &current);

        assert!(matches!(result, Err(QuillError::UntrackedFile)));
        // Nothing was touched, including files the sync would have updated.
        assert_eq!(fs::read(dir.path().join("local.txt")).unwrap(), b"precious");
        assert_eq!(fs::read(dir.path().join("tracked.txt")).unwrap(), b"stale");
    }

    #[test]
    fn test_untracked_file_not_in_target_survives() {
        let (dir, objects) = setup();
        let blob = objects.store(b"content").unwrap();
        fs::write(dir.path().join("scratch.txt"), "mine").unwrap();

        let target = tree(&[("a.txt", &blob)]);
        sync_to(dir.path(), &objects, &target, &BTreeMap::new()).unwrap();

        assert_eq!(fs::read(dir.path().join("scratch.txt")).unwrap(), b"mine");
        assert!(dir.path().join("a.txt").exists());
    }
}
