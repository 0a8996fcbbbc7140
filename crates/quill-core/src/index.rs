//! The staging area: pending changes layered over the current commit.
//!
//! Persisted as `.quill/index.json`. A path is never simultaneously staged
//! for addition and marked for removal.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::QuillResult;
use crate::fsutil::atomic_write;

/// Pending additions and removals for the next commit.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StagingArea {
    /// Paths staged for addition, mapped to blob digests.
    pub staged: BTreeMap<String, String>,
    /// Paths the next commit will stop tracking.
    pub removed: BTreeSet<String>,
}

impl StagingArea {
    /// Load from a JSON file, or start empty if none exists yet.
    pub fn load(path: &Path) -> QuillResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Save as JSON (write-then-rename).
    pub fn save(&self, path: &Path) -> QuillResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        atomic_write(path, json.as_bytes())
    }

    /// Record a pending addition of `path` with content `blob_id`.
    ///
    /// `head_entry` is what the current commit tracks for the path. Staging
    /// content the commit already has is a cancelling no-op: any pending
    /// addition or removal is cleared instead.
    pub fn stage(&mut self, path: &str, blob_id: String, head_entry: Option<&str>) {
        if head_entry == Some(blob_id.as_str()) {
            self.staged.remove(path);
            self.removed.remove(path);
            return;
        }
        self.removed.remove(path);
        self.staged.insert(path.to_string(), blob_id);
    }

    /// Drop a pending addition. Returns whether one existed.
    pub fn unstage(&mut self, path: &str) -> bool {
        self.staged.remove(path).is_some()
    }

    /// Mark a path for removal by the next commit, dropping any pending
    /// addition first.
    pub fn mark_removed(&mut self, path: &str) {
        self.staged.remove(path);
        self.removed.insert(path.to_string());
    }

    /// Forget all pending changes.
    pub fn clear(&mut self) {
        self.staged.clear();
        self.removed.clear();
    }

    /// True when nothing is staged and nothing is marked removed.
    pub fn is_empty(&self) -> bool {
        self.staged.is_empty() && self.removed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_stage_records_addition() {
        let mut staging = StagingArea::default();
        staging.stage("a.txt", "abc".to_string(), None);

        assert_eq!(staging.staged.get("a.txt"), Some(&"abc".to_string()));
        assert!(!staging.is_empty());
    }

    #[test]
    fn test_stage_unchanged_content_cancels() {
        let mut staging = StagingArea::default();
        staging.stage("a.txt", "new".to_string(), Some("old"));
        assert!(staging.staged.contains_key("a.txt"));

        // Re-staging what HEAD already tracks clears the pending entry.
        staging.stage("a.txt", "old".to_string(), Some("old"));
        assert!(staging.is_empty());
    }

    #[test]
    fn test_stage_unchanged_content_unmarks_removal() {
        let mut staging = StagingArea::default();
        staging.mark_removed("a.txt");

        staging.stage("a.txt", "old".to_string(), Some("old"));
        assert!(staging.is_empty());
    }

    #[test]
    fn test_mark_removed_drops_pending_addition() {
        let mut staging = StagingArea::default();
        staging.stage("a.txt", "abc".to_string(), None);
        staging.mark_removed("a.txt");

        assert!(!staging.staged.contains_key("a.txt"));
        assert!(staging.removed.contains("a.txt"));
    }

    #[test]
    fn test_stage_unmarks_removal() {
        let mut staging = StagingArea::default();
        staging.mark_removed("a.txt");
        staging.stage("a.txt", "abc".to_string(), None);

        assert!(staging.staged.contains_key("a.txt"));
        assert!(!staging.removed.contains("a.txt"));
    }

    #[test]
    fn test_unstage() {
        let mut staging = StagingArea::default();
        staging.stage("a.txt", "abc".to_string(), None);

        assert!(staging.unstage("a.txt"));
        assert!(!staging.unstage("a.txt"));
        assert!(staging.is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index.json");

        let mut staging = StagingArea::default();
        staging.stage("a.txt", "abc".to_string(), None);
        staging.mark_removed("b.txt");
        staging.save(&path).unwrap();

        let loaded = StagingArea::load(&path).unwrap();
        assert_eq!(loaded.staged.get("a.txt"), Some(&"abc".to_string()));
        assert!(loaded.removed.contains("b.txt"));
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let staging = StagingArea::load(&dir.path().join("index.json")).unwrap();
        assert!(staging.is_empty());
    }
}
