//! Branch refs and HEAD.
//!
//! Each branch is one file under `.quill/heads/` holding its tip commit id;
//! `.quill/HEAD` holds the name of the current branch. All writes go through
//! `atomic_write`.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{QuillError, QuillResult};
use crate::fsutil::atomic_write;

/// Named mutable pointers to commit ids, plus the current-branch pointer.
pub struct RefStore {
    heads_dir: PathBuf,
    head_file: PathBuf,
}

impl RefStore {
    /// Create a ref store inside the repository directory.
    pub fn new(repo_dir: &Path) -> Self {
        Self {
            heads_dir: repo_dir.join("heads"),
            head_file: repo_dir.join("HEAD"),
        }
    }

    /// Create a new branch pointing at `commit_id`.
    pub fn create_branch(&self, name: &str, commit_id: &str) -> QuillResult<()> {
        if self.branch_exists(name) {
            return Err(QuillError::BranchExists);
        }
        fs::create_dir_all(&self.heads_dir)?;
        atomic_write(&self.heads_dir.join(name), commit_id.as_bytes())
    }

    /// Delete a branch pointer. The current branch cannot be deleted.
    pub fn delete_branch(&self, name: &str) -> QuillResult<()> {
        if name == self.current_head()? {
            return Err(QuillError::CurrentBranch);
        }
        if !self.branch_exists(name) {
            return Err(QuillError::BranchNotFound);
        }
        fs::remove_file(self.heads_dir.join(name))?;
        Ok(())
    }

    /// Whether a branch with this name exists.
    pub fn branch_exists(&self, name: &str) -> bool {
        !name.is_empty() && self.heads_dir.join(name).is_file()
    }

    /// Point HEAD at the named branch.
    pub fn set_head(&self, name: &str) -> QuillResult<()> {
        atomic_write(&self.head_file, name.as_bytes())
    }

    /// Name of the branch HEAD points at.
    pub fn current_head(&self) -> QuillResult<String> {
        Ok(fs::read_to_string(&self.head_file)?.trim().to_string())
    }

    /// Tip commit id of the named branch.
    pub fn tip_of(&self, name: &str) -> QuillResult<String> {
        if !self.branch_exists(name) {
            return Err(QuillError::BranchNotFound);
        }
        Ok(fs::read_to_string(self.heads_dir.join(name))?
            .trim()
            .to_string())
    }

    /// Move an existing branch to a new tip — the only mutation an
    /// existing ref supports.
    pub fn advance(&self, name: &str, commit_id: &str) -> QuillResult<()> {
        if !self.branch_exists(name) {
            return Err(QuillError::BranchNotFound);
        }
        atomic_write(&self.heads_dir.join(name), commit_id.as_bytes())
    }

    /// All branch names, sorted.
    pub fn list_branches(&self) -> QuillResult<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.heads_dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                names.push(entry.file_name().to_string_lossy().to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn ref_store() -> (tempfile::TempDir, RefStore) {
        let dir = tempdir().unwrap();
        let refs = RefStore::new(dir.path());
        refs.create_branch("master", "c0").unwrap();
        refs.set_head("master").unwrap();
        (dir, refs)
    }

    #[test]
    fn test_create_and_read_branch() {
        let (_dir, refs) = ref_store();
        assert!(refs.branch_exists("master"));
        assert_eq!(refs.tip_of("master").unwrap(), "c0");
        assert_eq!(refs.current_head().unwrap(), "master");
    }

    #[test]
    fn test_create_duplicate_fails() {
        let (_dir, refs) = ref_store();
        assert!(matches!(
            refs.create_branch("master", "c1"),
            Err(QuillError::BranchExists)
        ));
    }

    #[test]
    fn test_advance_moves_tip() {
        let (_dir, refs) = ref_store();
        refs.advance("master", "c1").unwrap();
        assert_eq!(refs.tip_of("master").unwrap(), "c1");
    }

    #[test]
    fn test_advance_missing_branch_fails() {
        let (_dir, refs) = ref_store();
        assert!(matches!(
            refs.advance("ghost", "c1"),
            Err(QuillError::BranchNotFound)
        ));
    }

    #[test]
    fn test_delete_branch() {
        let (_dir, refs) = ref_store();
        refs.create_branch("side", "c0").unwrap();
        refs.delete_branch("side").unwrap();
        assert!(!refs.branch_exists("side"));
    }

    #[test]
    fn test_delete_current_branch_fails() {
        let (_dir, refs) = ref_store();
        assert!(matches!(
            refs.delete_branch("master"),
            Err(QuillError::CurrentBranch)
        ));
    }

    #[test]
    fn test_delete_missing_branch_fails() {
        let (_dir, refs) = ref_store();
        assert!(matches!(
            refs.delete_branch("ghost"),
            Err(QuillError::BranchNotFound)
        ));
    }

    #[test]
    fn test_list_branches_sorted() {
        let (_dir, refs) = ref_store();
        refs.create_branch("dev", "c0").unwrap();
        refs.create_branch("alpha", "c0").unwrap();
        assert_eq!(
            refs.list_branches().unwrap(),
            vec!["alpha", "dev", "master"]
        );
    }
}
