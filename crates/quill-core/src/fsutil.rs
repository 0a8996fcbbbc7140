//! Filesystem helpers for crash-safe persistence.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::QuillResult;

/// Write data to a file atomically via temp-file-then-rename.
///
/// `rename()` within one filesystem is atomic on POSIX, so a reader sees
/// either the old content or the new content, never a torn write. The temp
/// file is fsynced before the rename.
pub fn atomic_write(path: &Path, data: &[u8]) -> QuillResult<()> {
    let tmp = tmp_sibling(path);
    let mut file = File::create(&tmp)?;
    file.write_all(data)?;
    file.sync_data()?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Sibling path with `.tmp` appended to the whole file name.
/// (`with_extension` would replace an existing extension, so `a.json` and
/// `a.lock` would fight over the same temp name.)
fn tmp_sibling(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.file_name().unwrap_or_default());
    name.push(".tmp");
    path.with_file_name(name)
}
