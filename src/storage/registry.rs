//! Generation Registry
//!
//! Discovers, names and deletes generations in a storage directory.
//! A generation `N` is the file pair `values<N>` + `offsets<N>`; ordering is
//! purely by `N`, never by modification time.

use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{Result, StrataError};

/// Filename prefix of values files
pub const VALUES_PREFIX: &str = "values";

/// Filename prefix of offsets files
pub const OFFSETS_PREFIX: &str = "offsets";

/// Path of the values file of generation `index`
pub fn values_path(dir: &Path, index: u64) -> PathBuf {
    dir.join(format!("{}{}", VALUES_PREFIX, index))
}

/// Path of the offsets file of generation `index`
pub fn offsets_path(dir: &Path, index: u64) -> PathBuf {
    dir.join(format!("{}{}", OFFSETS_PREFIX, index))
}

/// Parse the generation index out of a filename
/// "values42" with prefix "values" → Some(42)
pub fn parse_index(file_name: &str, prefix: &str) -> Option<u64> {
    let suffix = file_name.strip_prefix(prefix)?;
    if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    suffix.parse().ok()
}

/// Generation indices present in `dir`, oldest first
///
/// A missing directory holds no generations. Fails with `DirectoryLayout`
/// when values and offsets files do not pair up.
pub fn discover(dir: &Path) -> Result<Vec<u64>> {
    let (values, offsets) = scan(dir)?;

    if values.len() != offsets.len() {
        return Err(StrataError::DirectoryLayout(format!(
            "{} must contain the same number of \"{}\" and \"{}\" files (found {} and {})",
            dir.display(),
            VALUES_PREFIX,
            OFFSETS_PREFIX,
            values.len(),
            offsets.len()
        )));
    }
    if values != offsets {
        let unpaired: Vec<u64> = values.symmetric_difference(&offsets).copied().collect();
        return Err(StrataError::DirectoryLayout(format!(
            "{} has unpaired generations {:?}",
            dir.display(),
            unpaired
        )));
    }

    tracing::debug!(dir = %dir.display(), generations = values.len(), "discovered generations");
    Ok(values.into_iter().collect())
}

/// An index strictly greater than every generation file in `dir`
///
/// Considers both prefixes independently so a half-written generation left
/// behind by a failed flush is never reused.
pub fn next_index(dir: &Path) -> Result<u64> {
    let (values, offsets) = scan(dir)?;
    let max = values.iter().chain(offsets.iter()).max();
    Ok(max.map_or(0, |&index| index + 1))
}

/// Delete every `prefix` file whose index is below `keep_from`
///
/// Call only once the replacement generation is fully written.
/// Returns the number of files removed.
pub fn purge_older_than(dir: &Path, prefix: &str, keep_from: u64) -> Result<usize> {
    let mut removed = 0;
    for (index, path) in list(dir, prefix)? {
        if index < keep_from {
            fs::remove_file(&path)?;
            tracing::debug!(path = %path.display(), "purged superseded file");
            removed += 1;
        }
    }
    Ok(removed)
}

// =============================================================================
// Private Helpers
// =============================================================================

/// Indices of values files and offsets files in `dir`
fn scan(dir: &Path) -> Result<(BTreeSet<u64>, BTreeSet<u64>)> {
    let values = list(dir, VALUES_PREFIX)?.into_iter().map(|(i, _)| i).collect();
    let offsets = list(dir, OFFSETS_PREFIX)?.into_iter().map(|(i, _)| i).collect();
    Ok((values, offsets))
}

/// Regular files in `dir` named `<prefix><N>`
fn list(dir: &Path, prefix: &str) -> Result<Vec<(u64, PathBuf)>> {
    let read_dir = match fs::read_dir(dir) {
        Ok(read_dir) => read_dir,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut found = Vec::new();
    for dir_entry in read_dir {
        let dir_entry = dir_entry?;
        if !dir_entry.file_type()?.is_file() {
            continue;
        }
        let file_name = dir_entry.file_name();
        let Some(file_name) = file_name.to_str() else {
            continue;
        };
        if let Some(index) = parse_index(file_name, prefix) {
            found.push((index, dir_entry.path()));
        }
    }
    found.sort_by_key(|(index, _)| *index);
    Ok(found)
}
