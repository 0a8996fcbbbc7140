//! Error types for quill operations.
//!
//! `Display` renders the exact single-line message the CLI prints for each
//! failure, so callers never translate variants into user text.

use std::fmt;
use std::io;

/// All possible quill errors.
#[derive(Debug)]
pub enum QuillError {
    /// The working directory holds no repository.
    NotARepo,
    /// A repository already exists here.
    RepoExists,
    /// An I/O error occurred.
    Io(io::Error),
    /// JSON serialization/deserialization failed.
    Json(serde_json::Error),
    /// An object with the given digest was not found in the store.
    ObjectNotFound(String),
    /// No commit matches the given id or prefix.
    CommitNotFound,
    /// The branch given to checkout does not exist.
    NoSuchBranch,
    /// The named branch does not exist.
    BranchNotFound,
    /// A branch with that name already exists.
    BranchExists,
    /// The current branch cannot be deleted.
    CurrentBranch,
    /// The commit message was blank.
    EmptyMessage,
    /// The staging area was empty at commit time.
    NothingToCommit,
    /// The path given to `add` is not a file on disk.
    FileNotFound,
    /// The file is not tracked by the commit it was requested from.
    FileNotInCommit,
    /// The file is neither staged nor tracked.
    NoReasonToRemove,
    /// The staging area must be empty before merging.
    UncommittedChanges,
    /// A branch cannot be merged with itself.
    SelfMerge,
    /// An untracked working file would be overwritten.
    UntrackedFile,
    /// Two commits share no ancestor; the graph is malformed.
    NoCommonAncestor,
}

impl fmt::Display for QuillError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuillError::NotARepo => write!(f, "Not in an initialized quill directory."),
            QuillError::RepoExists => write!(
                f,
                "A quill version-control system already exists in the current directory."
            ),
            QuillError::Io(e) => write!(f, "I/O error: {e}"),
            QuillError::Json(e) => write!(f, "JSON error: {e}"),
            QuillError::ObjectNotFound(id) => write!(f, "object not found: {id}"),
            QuillError::CommitNotFound => write!(f, "No commit with that id exists."),
            QuillError::NoSuchBranch => write!(f, "No such branch exists."),
            QuillError::BranchNotFound => write!(f, "A branch with that name does not exist."),
            QuillError::BranchExists => write!(f, "A branch with that name already exists."),
            QuillError::CurrentBranch => write!(f, "Cannot remove the current branch."),
            QuillError::EmptyMessage => write!(f, "Please enter a commit message."),
            QuillError::NothingToCommit => write!(f, "No changes added to the commit."),
            QuillError::FileNotFound => write!(f, "File does not exist."),
            QuillError::FileNotInCommit => write!(f, "File does not exist in that commit."),
            QuillError::NoReasonToRemove => write!(f, "No reason to remove the file."),
            QuillError::UncommittedChanges => write!(f, "You have uncommitted changes."),
            QuillError::SelfMerge => write!(f, "Cannot merge a branch with itself."),
            QuillError::UntrackedFile => write!(
                f,
                "There is an untracked file in the way; delete it or add it first."
            ),
            QuillError::NoCommonAncestor => {
                write!(f, "There was an error finding the split point.")
            }
        }
    }
}

impl std::error::Error for QuillError {}

impl From<io::Error> for QuillError {
    fn from(e: io::Error) -> Self {
        QuillError::Io(e)
    }
}

impl From<serde_json::Error> for QuillError {
    fn from(e: serde_json::Error) -> Self {
        QuillError::Json(e)
    }
}

/// Convenience alias for Results in quill.
pub type QuillResult<T> = Result<T, QuillError>;
