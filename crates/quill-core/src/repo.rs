//! Repository — the explicit context every command runs against.
//!
//! Ties the object store, commit graph, staging area and branch refs into
//! one value; nothing global survives between invocations, so multiple
//! repositories can coexist in one process. Each command reads persisted
//! state when it starts and writes updated state when it finishes.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use crate::commit::{Commit, CommitStore};
use crate::error::{QuillError, QuillResult};
use crate::hash::hash_bytes;
use crate::index::StagingArea;
use crate::merge::{self, MergeOutcome, Resolution};
use crate::object::ObjectStore;
use crate::refs::RefStore;
use crate::worktree;

/// The repository directory name.
pub const QUILL_DIR: &str = ".quill";

/// A quill repository rooted at a working directory.
pub struct Repository {
    root: PathBuf,
    quill_dir: PathBuf,
    objects: ObjectStore,
    commits: CommitStore,
    refs: RefStore,
}

/// Read-only snapshot printed by `status`.
#[derive(Debug, Clone)]
pub struct StatusReport {
    /// Branch names, the current one prefixed with `*`, sorted.
    pub branches: Vec<String>,
    /// Paths staged for addition, sorted.
    pub staged: Vec<String>,
    /// Paths marked for removal, sorted.
    pub removed: Vec<String>,
}

impl Repository {
    /// Create a new repository in `root`.
    ///
    /// Writes the root commit (`initial commit`, empty tree, no parents),
    /// a `master` branch pointing at it, HEAD on `master`, and an empty
    /// staging area.
    pub fn init(root: &Path) -> QuillResult<Self> {
        let quill_dir = root.join(QUILL_DIR);
        if quill_dir.exists() {
            return Err(QuillError::RepoExists);
        }
        fs::create_dir_all(quill_dir.join("objects"))?;
        fs::create_dir_all(quill_dir.join("commits"))?;
        fs::create_dir_all(quill_dir.join("heads"))?;

        let repo = Self::open(root)?;
        let root_commit = repo
            .commits
            .create("initial commit", BTreeMap::new(), Vec::new())?;
        repo.refs.create_branch("master", &root_commit.id)?;
        repo.refs.set_head("master")?;
        StagingArea::default().save(&repo.staging_path())?;
        log::info!("initialized repository at {}", repo.root.display());
        Ok(repo)
    }

    /// Open an existing repository rooted at `root`.
    pub fn open(root: &Path) -> QuillResult<Self> {
        let quill_dir = root.join(QUILL_DIR);
        if !quill_dir.exists() {
            return Err(QuillError::NotARepo);
        }
        let objects = ObjectStore::new(&quill_dir.join("objects"));
        let commits = CommitStore::new(&quill_dir.join("commits"));
        let refs = RefStore::new(&quill_dir);
        Ok(Self {
            root: root.to_path_buf(),
            quill_dir,
            objects,
            commits,
            refs,
        })
    }

    fn staging_path(&self) -> PathBuf {
        self.quill_dir.join("index.json")
    }

    fn load_staging(&self) -> QuillResult<StagingArea> {
        StagingArea::load(&self.staging_path())
    }

    /// The commit the current branch points at.
    pub fn head_commit(&self) -> QuillResult<Commit> {
        let branch = self.refs.current_head()?;
        let tip = self.refs.tip_of(&branch)?;
        self.commits.resolve(&tip)
    }

    /// Stage a file's current content for the next commit.
    ///
    /// Staging content the current commit already tracks cancels any
    /// pending entry for the path instead.
    pub fn add(&self, path: &str) -> QuillResult<()> {
        let full = self.root.join(path);
        if !full.is_file() {
            return Err(QuillError::FileNotFound);
        }
        let bytes = fs::read(&full)?;
        let blob_id = hash_bytes(&bytes);
        let head = self.head_commit()?;
        let head_entry = head.tree.get(path).map(String::as_str);
        if head_entry != Some(blob_id.as_str()) {
            self.objects.store(&bytes)?;
        }
        let mut staging = self.load_staging()?;
        staging.stage(path, blob_id, head_entry);
        staging.save(&self.staging_path())
    }

    /// Record staged changes as a new commit on the current branch.
    pub fn commit(&self, message: &str) -> QuillResult<Commit> {
        if message.trim().is_empty() {
            return Err(QuillError::EmptyMessage);
        }
        let mut staging = self.load_staging()?;
        if staging.is_empty() {
            return Err(QuillError::NothingToCommit);
        }
        let head = self.head_commit()?;
        let tree = apply_staging(&head.tree, &staging);
        let commit = self.commits.create(message, tree, vec![head.id])?;
        let branch = self.refs.current_head()?;
        self.refs.advance(&branch, &commit.id)?;
        staging.clear();
        staging.save(&self.staging_path())?;
        log::info!("committed {} on {branch}", commit.id);
        Ok(commit)
    }

    /// Unstage a file, or mark a tracked file for removal and delete it
    /// from the working tree.
    pub fn remove(&self, path: &str) -> QuillResult<()> {
        let head = self.head_commit()?;
        let mut staging = self.load_staging()?;
        if head.tree.contains_key(path) {
            worktree::remove_working_file(&self.root, path)?;
            staging.mark_removed(path);
            staging.save(&self.staging_path())
        } else if staging.unstage(path) {
            staging.save(&self.staging_path())
        } else {
            Err(QuillError::NoReasonToRemove)
        }
    }

    /// Switch HEAD to another branch and sync the working tree to its tip.
    pub fn checkout_branch(&self, name: &str) -> QuillResult<()> {
        if !self.refs.branch_exists(name) {
            return Err(QuillError::NoSuchBranch);
        }
        let target = self.commits.resolve(&self.refs.tip_of(name)?)?;
        let current = self.head_commit()?;
        worktree::sync_to(&self.root, &self.objects, &target.tree, &current.tree)?;
        let mut staging = self.load_staging()?;
        staging.clear();
        staging.save(&self.staging_path())?;
        self.refs.set_head(name)
    }

    /// Restore one file from the current commit, leaving HEAD untouched.
    pub fn restore_path(&self, path: &str) -> QuillResult<()> {
        let head = self.head_commit()?;
        self.restore_from(&head, path)
    }

    /// Restore one file from the given (possibly abbreviated) commit id.
    pub fn restore_path_at(&self, commit_id: &str, path: &str) -> QuillResult<()> {
        let commit = self.commits.resolve_prefix(commit_id)?;
        self.restore_from(&commit, path)
    }

    fn restore_from(&self, commit: &Commit, path: &str) -> QuillResult<()> {
        match commit.tree.get(path) {
            Some(blob_id) => worktree::restore_file(&self.root, &self.objects, path, blob_id),
            None => Err(QuillError::FileNotInCommit),
        }
    }

    /// Create a branch pointing at the current commit.
    pub fn create_branch(&self, name: &str) -> QuillResult<()> {
        let tip = self.refs.tip_of(&self.refs.current_head()?)?;
        self.refs.create_branch(name, &tip)
    }

    /// Delete a branch pointer.
    pub fn delete_branch(&self, name: &str) -> QuillResult<()> {
        self.refs.delete_branch(name)
    }

    /// Move the current branch to a commit and sync the working tree.
    pub fn reset(&self, commit_id: &str) -> QuillResult<()> {
        let target = self.commits.resolve_prefix(commit_id)?;
        let current = self.head_commit()?;
        worktree::sync_to(&self.root, &self.objects, &target.tree, &current.tree)?;
        let mut staging = self.load_staging()?;
        staging.clear();
        staging.save(&self.staging_path())?;
        self.refs.advance(&self.refs.current_head()?, &target.id)
    }

    /// Merge another branch into the current branch.
    ///
    /// Preconditions, checked in order with no mutation on failure:
    /// staging empty, branch exists, branch is not the current one. The
    /// working tree is only touched through the synchronizer, whose hazard
    /// scan precedes all mutation.
    pub fn merge(&self, branch: &str) -> QuillResult<MergeOutcome> {
        let mut staging = self.load_staging()?;
        if !staging.is_empty() {
            return Err(QuillError::UncommittedChanges);
        }
        if !self.refs.branch_exists(branch) {
            return Err(QuillError::BranchNotFound);
        }
        let head_branch = self.refs.current_head()?;
        if branch == head_branch {
            return Err(QuillError::SelfMerge);
        }

        let current = self.head_commit()?;
        let other = self.commits.resolve(&self.refs.tip_of(branch)?)?;
        let split_id = self.commits.split_point(&current.id, &other.id)?;

        if split_id == current.id {
            worktree::sync_to(&self.root, &self.objects, &other.tree, &current.tree)?;
            self.refs.advance(&head_branch, &other.id)?;
            log::info!("fast-forwarded {head_branch} to {}", other.id);
            return Ok(MergeOutcome::FastForward);
        }
        if split_id == other.id {
            return Ok(MergeOutcome::AlreadyUpToDate);
        }
        let split = self.commits.resolve(&split_id)?;

        let mut paths: BTreeSet<&String> = BTreeSet::new();
        paths.extend(split.tree.keys());
        paths.extend(current.tree.keys());
        paths.extend(other.tree.keys());

        let mut result_tree: BTreeMap<String, String> = BTreeMap::new();
        let mut conflicted = false;
        for path in paths {
            let s = split.tree.get(path).map(String::as_str);
            let c = current.tree.get(path).map(String::as_str);
            let o = other.tree.get(path).map(String::as_str);
            match merge::classify(s, c, o) {
                Resolution::KeepCurrent => {
                    if let Some(blob_id) = c {
                        result_tree.insert(path.clone(), blob_id.to_string());
                    }
                }
                Resolution::TakeOther(Some(blob_id)) => {
                    result_tree.insert(path.clone(), blob_id.clone());
                    staging.stage(path, blob_id, c);
                }
                Resolution::TakeOther(None) => {
                    staging.mark_removed(path);
                }
                Resolution::Conflict => {
                    let current_bytes = match c {
                        Some(id) => Some(self.objects.retrieve(id)?),
                        None => None,
                    };
                    let other_bytes = match o {
                        Some(id) => Some(self.objects.retrieve(id)?),
                        None => None,
                    };
                    let rendered =
                        merge::render_conflict(current_bytes.as_deref(), other_bytes.as_deref());
                    let blob_id = self.objects.store(&rendered)?;
                    result_tree.insert(path.clone(), blob_id.clone());
                    staging.stage(path, blob_id, c);
                    conflicted = true;
                }
            }
        }

        // Staging above is in-memory only; an aborted sync therefore
        // leaves both the working tree and the persisted staging intact.
        worktree::sync_to(&self.root, &self.objects, &result_tree, &current.tree)?;

        if conflicted {
            staging.save(&self.staging_path())?;
            return Ok(MergeOutcome::Conflicted);
        }

        let message = format!("Merged {head_branch} with {branch}.");
        let commit = self
            .commits
            .create(&message, result_tree, vec![current.id, other.id])?;
        self.refs.advance(&head_branch, &commit.id)?;
        staging.clear();
        staging.save(&self.staging_path())?;
        log::info!("merged {branch} into {head_branch} as {}", commit.id);
        Ok(MergeOutcome::Merged(commit.id))
    }

    /// First-parent history from the current commit back to the root.
    pub fn log(&self) -> QuillResult<Vec<Commit>> {
        let mut commits = Vec::new();
        let mut cursor = Some(self.head_commit()?);
        while let Some(commit) = cursor {
            cursor = match commit.parents.first() {
                Some(parent) => Some(self.commits.resolve(parent)?),
                None => None,
            };
            commits.push(commit);
        }
        Ok(commits)
    }

    /// Every commit ever made, oldest first.
    pub fn log_all(&self) -> QuillResult<Vec<Commit>> {
        let mut commits = Vec::new();
        for id in self.commits.all_ids()? {
            commits.push(self.commits.resolve(&id)?);
        }
        commits.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));
        Ok(commits)
    }

    /// Ids of every commit whose message is exactly `message`.
    pub fn find(&self, message: &str) -> QuillResult<Vec<String>> {
        let mut ids = Vec::new();
        for commit in self.log_all()? {
            if commit.message == message {
                ids.push(commit.id);
            }
        }
        Ok(ids)
    }

    /// Branch list (current starred) plus staged and removed paths.
    pub fn status(&self) -> QuillResult<StatusReport> {
        let current = self.refs.current_head()?;
        let mut branches = Vec::new();
        for name in self.refs.list_branches()? {
            if name == current {
                branches.push(format!("*{name}"));
            } else {
                branches.push(name);
            }
        }
        branches.sort();
        let staging = self.load_staging()?;
        Ok(StatusReport {
            branches,
            staged: staging.staged.keys().cloned().collect(),
            removed: staging.removed.iter().cloned().collect(),
        })
    }
}

/// HEAD tree plus staged additions minus pending removals.
fn apply_staging(
    head_tree: &BTreeMap<String, String>,
    staging: &StagingArea,
) -> BTreeMap<String, String> {
    let mut tree = head_tree.clone();
    for (path, blob_id) in &staging.staged {
        tree.insert(path.clone(), blob_id.clone());
    }
    for path in &staging.removed {
        tree.remove(path);
    }
    tree
}
