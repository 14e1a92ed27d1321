//! Atomic file output.

use crate::error::RowError;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Write `bytes` to `dir/name` through a temporary file in the same directory,
/// then persist it into place. Readers never see a partial file, and the
/// temporary file is removed on every failure path.
pub fn write_atomic(dir: &Path, name: &str, bytes: &[u8]) -> Result<PathBuf, RowError> {
    let target = dir.join(name);
    let write_error = |source| RowError::Write {
        path: target.clone(),
        source,
    };

    let mut temp = NamedTempFile::new_in(dir).map_err(write_error)?;
    temp.write_all(bytes).map_err(write_error)?;
    temp.as_file().sync_all().map_err(write_error)?;
    temp.persist(&target).map_err(|e| write_error(e.error))?;
    Ok(target)
}
