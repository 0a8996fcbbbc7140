//! Content-addressable object store.
//!
//! Immutable byte content lives under `.quill/objects/`, fanned out into
//! directories named by the first two hex characters of the SHA-256 digest
//! (digest `abcdef...` is stored at `ab/cdef...`). The store is append-only:
//! objects are never updated or deleted.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{QuillError, QuillResult};
use crate::hash::hash_bytes;

/// Append-only, digest-keyed storage for immutable byte content.
pub struct ObjectStore {
    root: PathBuf,
}

impl ObjectStore {
    /// Create an object store rooted at the given directory.
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    /// Store bytes and return their digest.
    ///
    /// Idempotent: identical content maps to the same id and is written at
    /// most once.
    pub fn store(&self, data: &[u8]) -> QuillResult<String> {
        let id = hash_bytes(data);
        let path = self.object_path(&id);
        if path.exists() {
            return Ok(id);
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        log::debug!("storing object {id} ({} bytes)", data.len());
        fs::write(&path, data)?;
        Ok(id)
    }

    /// Fetch an object's bytes by digest.
    pub fn retrieve(&self, id: &str) -> QuillResult<Vec<u8>> {
        if id.len() < 2 {
            return Err(QuillError::ObjectNotFound(id.to_string()));
        }
        let path = self.object_path(id);
        if !path.exists() {
            return Err(QuillError::ObjectNotFound(id.to_string()));
        }
        Ok(fs::read(&path)?)
    }

    /// Whether an object with this digest is present.
    pub fn contains(&self, id: &str) -> bool {
        id.len() >= 2 && self.object_path(id).exists()
    }

    fn object_path(&self, id: &str) -> PathBuf {
        let (prefix, rest) = id.split_at(2);
        self.root.join(prefix).join(rest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_round_trip() {
        let dir = tempdir().unwrap();
        let store = ObjectStore::new(dir.path());

        let id = store.store(b"some file content").unwrap();
        assert_eq!(store.retrieve(&id).unwrap(), b"some file content");
    }

    #[test]
    fn test_store_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = ObjectStore::new(dir.path());

        let a = store.store(b"same bytes").unwrap();
        let b = store.store(b"same bytes").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_retrieve_missing_fails() {
        let dir = tempdir().unwrap();
        let store = ObjectStore::new(dir.path());

        let result = store.retrieve("deadbeef00");
        assert!(matches!(result, Err(QuillError::ObjectNotFound(_))));
    }

    #[test]
    fn test_contains() {
        let dir = tempdir().unwrap();
        let store = ObjectStore::new(dir.path());

        let id = store.store(b"tracked").unwrap();
        assert!(store.contains(&id));
        assert!(!store.contains("0000000000"));
        assert!(!store.contains("f"));
    }
}
