//! The Runtime Loader (`spec.md` §4.8): resolves `unit_id -> callable
//! artifact` under the active `RunMode`, recomputing `H_spec` from the
//! current source and branching on drift per `dev`/`prod` rules.
//!
//! `dev`'s "transparently invoke the Orchestrator to compile" is expressed
//! as a small [`Compiler`] port the root crate implements, so this crate
//! never depends on the CLI/orchestration crate (the inversion the teacher
//! uses between its engine and CLI crates).

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use camino::Utf8Path;
use vibesafe_config::RunMode;
use vibesafe_hash::{hash_spec, ProviderIdentity, ProviderParams};
use vibesafe_introspect::{LoadedArtifact, TargetIntrospector};
use vibesafe_store::Store;
use vibesafe_utils::error::{IntegrityError, VibesafeError};

/// What the Loader asks the Orchestrator to do on a missing/stale
/// checkpoint in `dev` mode: compile `unit_id` and return the `H_chk` of
/// the checkpoint it activated.
#[async_trait]
pub trait Compiler: Send + Sync {
    async fn compile(&self, unit_id: &str) -> Result<String, VibesafeError>;
}

/// A loaded artifact plus the checkpoint hash it came from, and a warning
/// the Loader surfaced if `dev` mode silently recompiled on drift.
#[derive(Debug, Clone)]
pub struct LoadResult {
    pub artifact: LoadedArtifact,
    pub h_chk: String,
    pub warning: Option<String>,
}

/// Resolves `unit_id` to an executable binding against a [`Store`] and a
/// [`TargetIntrospector`], memoising per `(unit_id, H_chk)` within the
/// process lifetime.
pub struct Loader<'a> {
    store: &'a Store,
    introspector: &'a dyn TargetIntrospector,
    run_mode: RunMode,
    memo: Mutex<HashMap<(String, String), LoadedArtifact>>,
}

impl<'a> Loader<'a> {
    #[must_use]
    pub fn new(store: &'a Store, introspector: &'a dyn TargetIntrospector, run_mode: RunMode) -> Self {
        Self {
            store,
            introspector,
            run_mode,
            memo: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve `unit_id`, re-extracting its Spec from `current_source` to
    /// detect drift against the active checkpoint.
    pub async fn load(
        &self,
        unit_id: &str,
        current_source: &str,
        file_path: &Utf8Path,
        module_path: &str,
        compiler: &dyn Compiler,
    ) -> Result<LoadResult, VibesafeError> {
        match self.store.active(unit_id)? {
            None => match self.run_mode {
                RunMode::Dev => {
                    let h_chk = compiler.compile(unit_id).await?;
                    let artifact = self.load_artifact(unit_id, &h_chk)?;
                    Ok(LoadResult {
                        artifact,
                        h_chk,
                        warning: Some(format!(
                            "unit '{unit_id}' had no active checkpoint; compiled a new one"
                        )),
                    })
                }
                RunMode::Prod => Err(VibesafeError::Integrity(IntegrityError::CheckpointMissing {
                    unit_id: unit_id.to_string(),
                })),
            },
            Some(h_chk) => {
                if let Some(artifact) = self.memo_get(unit_id, &h_chk) {
                    return Ok(LoadResult {
                        artifact,
                        h_chk,
                        warning: None,
                    });
                }

                let (_, meta) = self.store.read(unit_id, &h_chk)?;
                let current_h_spec = self.recompute_h_spec(
                    unit_id,
                    current_source,
                    file_path,
                    module_path,
                    meta.provider.as_str(),
                    meta.seed,
                    meta.temperature,
                )?;

                if current_h_spec == meta.spec_hash {
                    let artifact = self.load_artifact(unit_id, &h_chk)?;
                    self.memo_put(unit_id, &h_chk, artifact.clone());
                    return Ok(LoadResult {
                        artifact,
                        h_chk,
                        warning: None,
                    });
                }

                match self.run_mode {
                    RunMode::Dev => {
                        tracing::warn!(
                            unit_id,
                            checkpoint_hash = %meta.spec_hash,
                            current_hash = %current_h_spec,
                            "spec hash drift detected; recompiling",
                        );
                        let new_h_chk = compiler.compile(unit_id).await?;
                        let artifact = self.load_artifact(unit_id, &new_h_chk)?;
                        Ok(LoadResult {
                            artifact,
                            h_chk: new_h_chk,
                            warning: Some(format!(
                                "unit '{unit_id}' drifted from checkpoint {} (now {current_h_spec}); recompiled",
                                meta.spec_hash
                            )),
                        })
                    }
                    RunMode::Prod => Err(VibesafeError::Integrity(IntegrityError::HashMismatch {
                        unit_id: unit_id.to_string(),
                        checkpoint_hash: meta.spec_hash,
                        current_hash: current_h_spec,
                    })),
                }
            }
        }
    }

    /// The active checkpoint hash for `unit_id`, if memoisation or the
    /// Store's index already resolved one.
    pub fn active(&self, unit_id: &str) -> Result<Option<String>, VibesafeError> {
        Ok(self.store.active(unit_id)?)
    }

    fn load_artifact(&self, unit_id: &str, h_chk: &str) -> Result<LoadedArtifact, VibesafeError> {
        let path = self.store.impl_path(unit_id, h_chk)?;
        self.introspector.load_artifact(&path).map_err(|e| {
            VibesafeError::Io(std::io::Error::other(format!(
                "failed to load checkpoint artifact for '{unit_id}': {e}"
            )))
        })
    }

    fn recompute_h_spec(
        &self,
        unit_id: &str,
        current_source: &str,
        file_path: &Utf8Path,
        module_path: &str,
        provider: &str,
        seed: Option<u64>,
        temperature: Option<f64>,
    ) -> Result<String, VibesafeError> {
        let specs = vibesafe_spec::scan_file(current_source, file_path, module_path, self.introspector)?;
        let spec = specs
            .into_iter()
            .find(|s| s.unit_id == unit_id)
            .ok_or_else(|| {
                VibesafeError::Io(std::io::Error::other(format!(
                    "unit '{unit_id}' no longer exists in its source file"
                )))
            })?;

        let (kind, model) = provider.split_once(':').unwrap_or((provider, ""));
        let identity = ProviderIdentity {
            kind: kind.to_string(),
            model: model.to_string(),
        };
        let params = ProviderParams {
            seed,
            temperature,
            max_tokens: None,
        };
        Ok(hash_spec(&spec, &identity, &params))
    }

    fn memo_get(&self, unit_id: &str, h_chk: &str) -> Option<LoadedArtifact> {
        let memo = self.memo.lock().unwrap_or_else(|e| e.into_inner());
        memo.get(&(unit_id.to_string(), h_chk.to_string())).cloned()
    }

    fn memo_put(&self, unit_id: &str, h_chk: &str, artifact: LoadedArtifact) {
        let mut memo = self.memo.lock().unwrap_or_else(|e| e.into_inner());
        memo.insert((unit_id.to_string(), h_chk.to_string()), artifact);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use vibesafe_introspect::TextIntrospector;
    use vibesafe_store::{CheckpointMeta, HashInputsEcho};

    const SOURCE: &str = "@vibesafe(kind=\"function\", provider=\"default\", template=\"function\")\ndef add_strs(a: str, b: str) -> str:\n    \"\"\"Adds two numeric strings.\n\n    >>> add_strs(\"2\", \"3\")\n    '5'\n    \"\"\"\n    a_int, b_int = int(a), int(b)\n    ...\n";

    struct NeverCompiler;

    #[async_trait]
    impl Compiler for NeverCompiler {
        async fn compile(&self, unit_id: &str) -> Result<String, VibesafeError> {
            panic!("compiler should not be invoked for unit {unit_id}")
        }
    }

    struct AlwaysCompiles {
        h_chk: String,
    }

    #[async_trait]
    impl Compiler for AlwaysCompiles {
        async fn compile(&self, _unit_id: &str) -> Result<String, VibesafeError> {
            Ok(self.h_chk.clone())
        }
    }

    fn seed_checkpoint(store: &Store, unit_id: &str, identity: &str) -> String {
        let introspector = TextIntrospector::default();
        let specs = vibesafe_spec::scan_file(
            SOURCE,
            Utf8PathBuf::from("pkg/math.py").as_path(),
            "pkg.math",
            &introspector,
        )
        .unwrap();
        let spec = specs.into_iter().find(|s| s.unit_id == unit_id).unwrap();

        let (kind, model) = identity.split_once(':').unwrap();
        let provider_identity = ProviderIdentity {
            kind: kind.to_string(),
            model: model.to_string(),
        };
        let params = ProviderParams::default();
        let h_spec = hash_spec(&spec, &provider_identity, &params);

        let impl_bytes =
            b"def add_strs(a: str, b: str) -> str:\n    a_int, b_int = int(a), int(b)\n    return str(a_int + b_int)\n";
        let h_prompt = vibesafe_hash::hash_prompt(b"prompt bytes");
        let h_impl = vibesafe_hash::hash_impl(impl_bytes);
        let h_chk = vibesafe_hash::hash_checkpoint(&h_spec, &h_prompt, &h_impl);

        let meta = CheckpointMeta {
            spec_hash: h_spec.clone(),
            chk_sha: h_chk.clone(),
            tool_version: "0.1.0".to_string(),
            provider: identity.to_string(),
            prompt_template: "function".to_string(),
            seed: None,
            temperature: None,
            timestamp: "2026-07-28T00:00:00Z".to_string(),
            hash_inputs: HashInputsEcho {
                h_spec,
                h_prompt,
                h_impl,
            },
            deps: None,
        };
        store.write(unit_id, &h_chk, "py", impl_bytes, &meta).unwrap();
        store.activate(unit_id, &h_chk).unwrap();
        h_chk
    }

    #[tokio::test]
    async fn loads_an_up_to_date_checkpoint_without_compiling() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let store = Store::new(root);
        let unit_id = "pkg.math/add_strs";
        let h_chk = seed_checkpoint(&store, unit_id, "anthropic:claude");

        let introspector = TextIntrospector::default();
        let loader = Loader::new(&store, &introspector, RunMode::Prod);
        let result = loader
            .load(unit_id, SOURCE, Utf8PathBuf::from("pkg/math.py").as_path(), "pkg.math", &NeverCompiler)
            .await
            .unwrap();
        assert_eq!(result.h_chk, h_chk);
        assert!(result.warning.is_none());
    }

    #[tokio::test]
    async fn prod_raises_checkpoint_missing_when_nothing_is_active() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let store = Store::new(root);
        let introspector = TextIntrospector::default();
        let loader = Loader::new(&store, &introspector, RunMode::Prod);
        let err = loader
            .load(
                "pkg.math/add_strs",
                SOURCE,
                Utf8PathBuf::from("pkg/math.py").as_path(),
                "pkg.math",
                &NeverCompiler,
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            VibesafeError::Integrity(IntegrityError::CheckpointMissing { .. })
        ));
    }

    #[tokio::test]
    async fn dev_transparently_compiles_when_nothing_is_active() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let store = Store::new(root);
        let unit_id = "pkg.math/add_strs";
        let h_chk = seed_checkpoint(&store, unit_id, "anthropic:claude");

        let introspector = TextIntrospector::default();
        let compiler = AlwaysCompiles { h_chk: h_chk.clone() };
        // Deactivate by pointing the index nowhere: simulate via a fresh store root instead.
        let dir2 = tempfile::tempdir().unwrap();
        let root2 = Utf8PathBuf::from_path_buf(dir2.path().to_path_buf()).unwrap();
        let empty_store = Store::new(root2);
        // Re-seed the checkpoint bytes into the empty store without activating it.
        let (impl_bytes, meta) = store.read(unit_id, &h_chk).unwrap();
        empty_store
            .write(unit_id, &h_chk, "py", impl_bytes.as_slice(), &meta)
            .unwrap();

        let empty_loader = Loader::new(&empty_store, &introspector, RunMode::Dev);
        let result = empty_loader
            .load(unit_id, SOURCE, Utf8PathBuf::from("pkg/math.py").as_path(), "pkg.math", &compiler)
            .await
            .unwrap();
        assert_eq!(result.h_chk, h_chk);
        assert!(result.warning.is_some());
    }

    #[tokio::test]
    async fn prod_raises_hash_mismatch_on_drift() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let store = Store::new(root);
        let unit_id = "pkg.math/add_strs";
        seed_checkpoint(&store, unit_id, "anthropic:claude");

        let introspector = TextIntrospector::default();
        let loader = Loader::new(&store, &introspector, RunMode::Prod);
        let drifted_source = SOURCE.replace("Adds two numeric strings.", "Adds two numbers, now documented differently.");
        let err = loader
            .load(
                unit_id,
                &drifted_source,
                Utf8PathBuf::from("pkg/math.py").as_path(),
                "pkg.math",
                &NeverCompiler,
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            VibesafeError::Integrity(IntegrityError::HashMismatch { .. })
        ));
    }
}
