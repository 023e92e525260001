//! `index.toml`: the single source of truth for which checkpoint is active
//! per unit. All reads and writes go through [`vibesafe_lock::acquire_for_index`]
//! so that concurrent `activate` calls serialize into a total order with
//! exactly one winner (`spec.md` §4.6 invariant 9, §8 P9).

use std::collections::HashMap;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use vibesafe_utils::error::StorageError;

const INDEX_FILE_NAME: &str = "index.toml";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
struct IndexEntry {
    active: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
struct IndexFile {
    #[serde(default)]
    units: HashMap<String, IndexEntry>,
}

pub(crate) fn index_path(root: &Utf8PathBuf) -> Utf8PathBuf {
    root.join(INDEX_FILE_NAME)
}

fn load(root: &Utf8PathBuf) -> Result<IndexFile, StorageError> {
    let path = index_path(root);
    match std::fs::read_to_string(path.as_std_path()) {
        Ok(text) => toml::from_str(&text).map_err(|e| StorageError::WriteFailed {
            path: path.to_string(),
            reason: format!("index.toml is corrupt: {e}"),
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(IndexFile::default()),
        Err(e) => Err(StorageError::WriteFailed {
            path: path.to_string(),
            reason: e.to_string(),
        }),
    }
}

fn save(root: &Utf8PathBuf, index: &IndexFile) -> Result<(), StorageError> {
    let path = index_path(root);
    let text = toml::to_string_pretty(index).map_err(|e| StorageError::WriteFailed {
        path: path.to_string(),
        reason: e.to_string(),
    })?;
    vibesafe_utils::atomic_write::write_file_atomic(&path, text.as_bytes()).map_err(|e| {
        StorageError::WriteFailed {
            path: path.to_string(),
            reason: e.to_string(),
        }
    })?;
    Ok(())
}

/// Look up the currently active checkpoint hash for `unit_id`, if any. Does
/// not take the index lock: a plain read racing an in-flight `activate` may
/// observe either the old or the new value, never a torn one, since writes
/// are atomic renames.
pub(crate) fn active(root: &Utf8PathBuf, unit_id: &str) -> Result<Option<String>, StorageError> {
    let index = load(root)?;
    Ok(index.units.get(unit_id).map(|e| e.active.clone()))
}

/// Set `unit_id`'s active checkpoint to `h_chk`, holding the index lock for
/// the read-modify-write so concurrent `activate` calls serialize.
pub(crate) fn activate(root: &Utf8PathBuf, unit_id: &str, h_chk: &str) -> Result<(), StorageError> {
    let _guard = vibesafe_lock::acquire_for_index(root).map_err(|e| StorageError::IndexLockContended {
        unit_id: format!("{unit_id} ({e})"),
    })?;
    let mut index = load(root)?;
    index.units.insert(
        unit_id.to_string(),
        IndexEntry {
            active: h_chk.to_string(),
        },
    );
    save(root, &index)
}
