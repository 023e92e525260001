//! The Checkpoint Store (`spec.md` §4.6): a content-addressed directory of
//! generated artifacts under `<root>/checkpoints/<module_path>/<unit_name>/<H_chk>/`,
//! plus `<root>/index.toml` tracking which `H_chk` is active per unit, and
//! `<root>/cache/` for provider-response caching (owned by `vibesafe-llm`,
//! rooted here).

mod index;
mod meta;

use camino::{Utf8Path, Utf8PathBuf};
use vibesafe_utils::atomic_write::write_file_atomic;
use vibesafe_utils::error::StorageError;

pub use meta::{CheckpointMeta, DependencyPin, HashInputsEcho};

const CHECKPOINTS_DIR: &str = "checkpoints";
const IMPL_FILE_STEM: &str = "impl";
const META_FILE_NAME: &str = "meta.toml";

/// A checkpoint store rooted at one project's data directory.
pub struct Store {
    root: Utf8PathBuf,
}

/// Split `unit_id` (`"pkg.math/add_strs"`) into its module path segments and
/// unit name, mirroring the directory nesting `spec.md` §4.6 prescribes.
fn split_unit_id(unit_id: &str) -> (Vec<&str>, &str) {
    match unit_id.rsplit_once('/') {
        Some((module_path, unit_name)) => (module_path.split('.').collect(), unit_name),
        None => (Vec::new(), unit_id),
    }
}

impl Store {
    #[must_use]
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Directory holding every checkpoint ever generated for `unit_id`.
    #[must_use]
    pub fn unit_dir(&self, unit_id: &str) -> Utf8PathBuf {
        let (module_segments, unit_name) = split_unit_id(unit_id);
        let mut dir = self.root.join(CHECKPOINTS_DIR);
        for segment in module_segments {
            dir = dir.join(segment);
        }
        dir.join(unit_name)
    }

    /// Directory for one specific checkpoint.
    #[must_use]
    pub fn checkpoint_dir(&self, unit_id: &str, h_chk: &str) -> Utf8PathBuf {
        self.unit_dir(unit_id).join(h_chk)
    }

    /// Write a checkpoint's artifact and metadata, idempotently.
    ///
    /// Verifies that `meta.hash_inputs` actually produces `h_chk` before
    /// touching disk, so a caller can never persist a checkpoint directory
    /// whose name lies about its contents.
    pub fn write(
        &self,
        unit_id: &str,
        h_chk: &str,
        impl_ext: &str,
        impl_bytes: &[u8],
        meta: &CheckpointMeta,
    ) -> Result<Utf8PathBuf, StorageError> {
        let h_impl = vibesafe_hash::hash_impl(impl_bytes);
        let recomputed = vibesafe_hash::hash_checkpoint(
            &meta.hash_inputs.h_spec,
            &meta.hash_inputs.h_prompt,
            &h_impl,
        );
        if recomputed != h_chk {
            return Err(StorageError::HashMismatchOnWrite {
                path: self.checkpoint_dir(unit_id, h_chk).to_string(),
                expected: h_chk.to_string(),
                actual: recomputed,
            });
        }

        let dir = self.checkpoint_dir(unit_id, h_chk);
        let impl_path = dir.join(format!("{IMPL_FILE_STEM}.{impl_ext}"));
        let meta_path = dir.join(META_FILE_NAME);

        write_file_atomic(&impl_path, impl_bytes).map_err(|e| StorageError::WriteFailed {
            path: impl_path.to_string(),
            reason: e.to_string(),
        })?;

        let meta_text = meta.to_toml().map_err(|e| StorageError::WriteFailed {
            path: meta_path.to_string(),
            reason: e.to_string(),
        })?;
        write_file_atomic(&meta_path, meta_text.as_bytes()).map_err(|e| {
            StorageError::WriteFailed {
                path: meta_path.to_string(),
                reason: e.to_string(),
            }
        })?;

        Ok(dir)
    }

    /// The path to one checkpoint's `impl.<ext>` file, whatever its
    /// extension, so a caller (the Runtime Loader) can hand it to a
    /// [`vibesafe_introspect::TargetIntrospector::load_artifact`] directly.
    pub fn impl_path(&self, unit_id: &str, h_chk: &str) -> Result<Utf8PathBuf, StorageError> {
        find_impl_file(&self.checkpoint_dir(unit_id, h_chk))
    }

    /// Read back one checkpoint's artifact bytes and metadata.
    pub fn read(&self, unit_id: &str, h_chk: &str) -> Result<(Vec<u8>, CheckpointMeta), StorageError> {
        let dir = self.checkpoint_dir(unit_id, h_chk);
        let impl_path = find_impl_file(&dir)?;
        let impl_bytes = std::fs::read(impl_path.as_std_path()).map_err(|e| StorageError::ReadFailed {
            path: impl_path.to_string(),
            reason: e.to_string(),
        })?;

        let meta_path = dir.join(META_FILE_NAME);
        let meta_text =
            std::fs::read_to_string(meta_path.as_std_path()).map_err(|e| StorageError::ReadFailed {
                path: meta_path.to_string(),
                reason: e.to_string(),
            })?;
        let meta = CheckpointMeta::from_toml(&meta_text).map_err(|e| StorageError::ReadFailed {
            path: meta_path.to_string(),
            reason: e.to_string(),
        })?;

        Ok((impl_bytes, meta))
    }

    /// Mark `h_chk` as the active checkpoint for `unit_id`. Serialized
    /// through the index lock so concurrent callers resolve to exactly one
    /// winner.
    pub fn activate(&self, unit_id: &str, h_chk: &str) -> Result<(), StorageError> {
        index::activate(&self.root, unit_id, h_chk)
    }

    /// The currently active checkpoint hash for `unit_id`, if one has ever
    /// been activated.
    pub fn active(&self, unit_id: &str) -> Result<Option<String>, StorageError> {
        index::active(&self.root, unit_id)
    }

    /// Every checkpoint hash ever written for `unit_id`, oldest first by
    /// `meta.toml`'s `timestamp` field.
    pub fn list_checkpoints(&self, unit_id: &str) -> Result<Vec<String>, StorageError> {
        let dir = self.unit_dir(unit_id);
        let entries = match std::fs::read_dir(dir.as_std_path()) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(StorageError::ReadFailed {
                    path: dir.to_string(),
                    reason: e.to_string(),
                })
            }
        };

        let mut by_timestamp = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StorageError::ReadFailed {
                path: dir.to_string(),
                reason: e.to_string(),
            })?;
            if !entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                continue;
            }
            let h_chk = entry.file_name().to_string_lossy().into_owned();
            let (_, meta) = self.read(unit_id, &h_chk)?;
            by_timestamp.push((meta.timestamp, h_chk));
        }
        by_timestamp.sort();
        Ok(by_timestamp.into_iter().map(|(_, h_chk)| h_chk).collect())
    }
}

fn find_impl_file(dir: &Utf8Path) -> Result<Utf8PathBuf, StorageError> {
    let entries = std::fs::read_dir(dir.as_std_path()).map_err(|e| StorageError::ReadFailed {
        path: dir.to_string(),
        reason: e.to_string(),
    })?;
    for entry in entries {
        let entry = entry.map_err(|e| StorageError::ReadFailed {
            path: dir.to_string(),
            reason: e.to_string(),
        })?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with(IMPL_FILE_STEM) {
            return Utf8PathBuf::from_path_buf(entry.path()).map_err(|p| StorageError::ReadFailed {
                path: p.to_string_lossy().into_owned(),
                reason: "path is not valid UTF-8".to_string(),
            });
        }
    }
    Err(StorageError::ReadFailed {
        path: dir.to_string(),
        reason: "no impl.* file found in checkpoint directory".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_meta() -> CheckpointMeta {
        CheckpointMeta {
            spec_hash: "h_spec".to_string(),
            chk_sha: String::new(),
            tool_version: "0.1.0".to_string(),
            provider: "anthropic:claude".to_string(),
            prompt_template: "function".to_string(),
            seed: None,
            temperature: None,
            timestamp: "2026-07-28T00:00:00Z".to_string(),
            hash_inputs: HashInputsEcho {
                h_spec: "h_spec".to_string(),
                h_prompt: "h_prompt".to_string(),
                h_impl: String::new(),
            },
            deps: None,
        }
    }

    fn new_store() -> (tempfile::TempDir, Store) {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let store = Store::new(root);
        (dir, store)
    }

    #[test]
    fn split_unit_id_nests_module_segments() {
        let (segments, name) = split_unit_id("pkg.math/add_strs");
        assert_eq!(segments, vec!["pkg", "math"]);
        assert_eq!(name, "add_strs");
    }

    #[test]
    fn write_then_read_round_trips() {
        let (_dir, store) = new_store();
        let impl_bytes = b"def add_strs(a, b):\n    return a + b\n";
        let h_impl = vibesafe_hash::hash_impl(impl_bytes);
        let h_chk = vibesafe_hash::hash_checkpoint("h_spec", "h_prompt", &h_impl);
        let mut meta = sample_meta();
        meta.chk_sha = h_chk.clone();
        meta.hash_inputs.h_impl = h_impl;

        let path = store
            .write("pkg.math/add_strs", &h_chk, "py", impl_bytes, &meta)
            .unwrap();
        assert!(path.join("meta.toml").exists());

        let (read_bytes, read_meta) = store.read("pkg.math/add_strs", &h_chk).unwrap();
        assert_eq!(read_bytes, impl_bytes);
        assert_eq!(read_meta, meta);
    }

    #[test]
    fn write_rejects_a_mismatched_hash() {
        let (_dir, store) = new_store();
        let impl_bytes = b"def add_strs(a, b):\n    return a + b\n";
        let meta = sample_meta();
        let err = store
            .write("pkg.math/add_strs", "not-the-real-hash", "py", impl_bytes, &meta)
            .unwrap_err();
        assert!(matches!(err, StorageError::HashMismatchOnWrite { .. }));
    }

    #[test]
    fn write_is_idempotent() {
        let (_dir, store) = new_store();
        let impl_bytes = b"def add_strs(a, b):\n    return a + b\n";
        let h_impl = vibesafe_hash::hash_impl(impl_bytes);
        let h_chk = vibesafe_hash::hash_checkpoint("h_spec", "h_prompt", &h_impl);
        let mut meta = sample_meta();
        meta.chk_sha = h_chk.clone();
        meta.hash_inputs.h_impl = h_impl;

        store
            .write("pkg.math/add_strs", &h_chk, "py", impl_bytes, &meta)
            .unwrap();
        let second = store
            .write("pkg.math/add_strs", &h_chk, "py", impl_bytes, &meta)
            .unwrap();
        let (read_bytes, _) = store.read("pkg.math/add_strs", &h_chk).unwrap();
        assert_eq!(read_bytes, impl_bytes);
        assert_eq!(second, store.checkpoint_dir("pkg.math/add_strs", &h_chk));
    }

    #[test]
    fn activate_then_active_and_list_checkpoints() {
        let (_dir, store) = new_store();
        let unit_id = "pkg.math/add_strs";

        for body in ["return a + b", "return b + a"] {
            let impl_bytes = format!("def add_strs(a, b):\n    {body}\n");
            let impl_bytes = impl_bytes.as_bytes();
            let h_impl = vibesafe_hash::hash_impl(impl_bytes);
            let h_chk = vibesafe_hash::hash_checkpoint("h_spec", "h_prompt", &h_impl);
            let mut meta = sample_meta();
            meta.chk_sha = h_chk.clone();
            meta.hash_inputs.h_impl = h_impl;
            meta.timestamp = format!("2026-07-28T00:00:0{}Z", body.len() % 10);
            store.write(unit_id, &h_chk, "py", impl_bytes, &meta).unwrap();
            store.activate(unit_id, &h_chk).unwrap();
        }

        assert!(store.active(unit_id).unwrap().is_some());
        assert_eq!(store.list_checkpoints(unit_id).unwrap().len(), 2);
    }

    #[test]
    fn list_checkpoints_is_empty_for_an_unknown_unit() {
        let (_dir, store) = new_store();
        assert_eq!(store.list_checkpoints("pkg.math/never_seen").unwrap(), Vec::<String>::new());
    }
}
