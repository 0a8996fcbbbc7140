//! Three-way merge: per-path classification and conflict rendering.
//!
//! The pure parts of the merge engine live here, independent of I/O;
//! `Repository::merge` orchestrates ancestor discovery, staging and
//! working-tree application around them.

/// Outcome of `Repository::merge`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The current branch was an ancestor of the other tip and was
    /// advanced to it; no commit was created.
    FastForward,
    /// The other tip was already an ancestor of the current branch.
    AlreadyUpToDate,
    /// At least one path conflicted; conflict markers were written and the
    /// non-conflicting resolutions remain staged.
    Conflicted,
    /// A merge commit with two parents was created.
    Merged(String),
}

/// The fate of a single path across the split, current and other trees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The current side's state stands, present or absent.
    KeepCurrent,
    /// The other side's state wins: `Some` content, or `None` for a removal.
    TakeOther(Option<String>),
    /// Both sides changed the path in different ways.
    Conflict,
}

/// Classify one path given its blob digest (or absence) in the split,
/// current and other trees.
///
/// Collapses the twelve-row fate table: agreeing sides keep current; a
/// side that still matches the split yields to the other side; divergence
/// from the split on both sides is a conflict.
pub fn classify(split: Option<&str>, current: Option<&str>, other: Option<&str>) -> Resolution {
    if current == other {
        Resolution::KeepCurrent
    } else if split == current {
        Resolution::TakeOther(other.map(String::from))
    } else if split == other {
        Resolution::KeepCurrent
    } else {
        Resolution::Conflict
    }
}

/// Render conflict markers for a path both sides changed.
///
/// Pure byte construction: an absent side renders as an empty section, and
/// the caller decides where the bytes go.
pub fn render_conflict(current: Option<&[u8]>, other: Option<&[u8]>) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(b"<<<<<<< HEAD\n");
    if let Some(bytes) = current {
        out.extend_from_slice(bytes);
    }
    out.extend_from_slice(b"=======\n");
    if let Some(bytes) = other {
        out.extend_from_slice(bytes);
    }
    out.extend_from_slice(b">>>>>>>\n");
    out
}
