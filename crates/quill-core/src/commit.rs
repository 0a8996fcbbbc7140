//! Commit records and the commit graph.
//!
//! A commit is an immutable snapshot: message, timestamp, parent ids and a
//! path-to-blob mapping. Commits are stored one JSON file per id under
//! `.quill/commits/` and linked into a directed graph through `parents`.

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{QuillError, QuillResult};
use crate::hash::hash_str;

/// An immutable snapshot in the commit graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Commit {
    /// SHA-256 of this commit's own serialization.
    pub id: String,
    /// Commit message.
    pub message: String,
    /// When the commit was created.
    pub timestamp: DateTime<Utc>,
    /// Parent ids: empty for the root commit, two for a merge.
    pub parents: Vec<String>,
    /// Tracked paths mapped to blob digests.
    pub tree: BTreeMap<String, String>,
}

impl Commit {
    /// Build a commit and compute its id.
    ///
    /// The id is the SHA-256 of the commit's JSON with `id` serialized as
    /// the empty string, so it is a pure function of message, timestamp,
    /// parents and tree. It is computed once and never recomputed.
    pub fn new(
        message: String,
        timestamp: DateTime<Utc>,
        parents: Vec<String>,
        tree: BTreeMap<String, String>,
    ) -> Self {
        let mut commit = Commit {
            id: String::new(),
            message,
            timestamp,
            parents,
            tree,
        };
        let json = serde_json::to_string(&commit).expect("commit serialization should not fail");
        commit.id = hash_str(&json);
        commit
    }
}

/// Persistent storage and ancestry queries over the commit graph.
pub struct CommitStore {
    dir: PathBuf,
}

impl CommitStore {
    /// Create a commit store over the given directory.
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    /// Create, persist and return a new commit stamped with the current
    /// time. Fails `EmptyMessage` on a blank message.
    pub fn create(
        &self,
        message: &str,
        tree: BTreeMap<String, String>,
        parents: Vec<String>,
    ) -> QuillResult<Commit> {
        if message.trim().is_empty() {
            return Err(QuillError::EmptyMessage);
        }
        let commit = Commit::new(message.to_string(), Utc::now(), parents, tree);
        self.save(&commit)?;
        Ok(commit)
    }

    /// Persist a commit under its id.
    pub fn save(&self, commit: &Commit) -> QuillResult<()> {
        fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_vec_pretty(commit)?;
        fs::write(self.dir.join(&commit.id), json)?;
        Ok(())
    }

    /// Load a commit by its full id.
    pub fn resolve(&self, id: &str) -> QuillResult<Commit> {
        if id.is_empty() {
            return Err(QuillError::CommitNotFound);
        }
        let path = self.dir.join(id);
        if !path.is_file() {
            return Err(QuillError::CommitNotFound);
        }
        let data = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Resolve a possibly-abbreviated commit id.
    ///
    /// The prefix must match exactly one stored commit; an unknown or
    /// ambiguous prefix fails `CommitNotFound`.
    pub fn resolve_prefix(&self, prefix: &str) -> QuillResult<Commit> {
        if prefix.is_empty() {
            return Err(QuillError::CommitNotFound);
        }
        let mut matched: Option<String> = None;
        for id in self.all_ids()? {
            if id.starts_with(prefix) {
                if matched.is_some() {
                    return Err(QuillError::CommitNotFound);
                }
                matched = Some(id);
            }
        }
        match matched {
            Some(id) => self.resolve(&id),
            None => Err(QuillError::CommitNotFound),
        }
    }

    /// Every stored commit id, sorted.
    pub fn all_ids(&self) -> QuillResult<Vec<String>> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                ids.push(entry.file_name().to_string_lossy().to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }

    /// All commits reachable from `id` via parent edges, including `id`
    /// itself, in breadth-first order.
    ///
    /// Iterative with a visited set: shared ancestors behind merge commits
    /// are visited once, so the walk terminates on any rooted graph.
    pub fn ancestors_of(&self, id: &str) -> QuillResult<Vec<String>> {
        let mut visited = HashSet::new();
        let mut order = Vec::new();
        let mut queue = VecDeque::new();
        visited.insert(id.to_string());
        queue.push_back(id.to_string());
        while let Some(current) = queue.pop_front() {
            let commit = self.resolve(&current)?;
            order.push(current);
            for parent in &commit.parents {
                if visited.insert(parent.clone()) {
                    queue.push_back(parent.clone());
                }
            }
        }
        Ok(order)
    }

    /// The split point (closest common ancestor) of two commits.
    ///
    /// Breadth-first from `a` recording every reachable id, then
    /// breadth-first from `b`; the first id `b`'s walk reaches that `a`
    /// already visited is the split point. Parents are enqueued in listed
    /// order, so ties resolve toward the earlier-listed parent.
    /// `NoCommonAncestor` is unreachable in a correctly rooted repository.
    pub fn split_point(&self, a: &str, b: &str) -> QuillResult<String> {
        let reachable: HashSet<String> = self.ancestors_of(a)?.into_iter().collect();
        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();
        visited.insert(b.to_string());
        queue.push_back(b.to_string());
        while let Some(current) = queue.pop_front() {
            if reachable.contains(&current) {
                return Ok(current);
            }
            let commit = self.resolve(&current)?;
            for parent in &commit.parents {
                if visited.insert(parent.clone()) {
                    queue.push_back(parent.clone());
                }
            }
        }
        Err(QuillError::NoCommonAncestor)
    }
}
