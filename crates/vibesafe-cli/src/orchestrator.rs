//! Composes the pipeline crates into the `vibesafe` CLI's user operations
//! (`spec.md` §4.9): unit discovery, `compile`, the Verification Harness
//! invocation, and `save`'s activation.

use std::time::Duration;

use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use chrono::Utc;
use vibesafe_config::Config;
use vibesafe_harness::{run_all_gates, HarnessInput, HarnessReport};
use vibesafe_hash::{hash_checkpoint, hash_impl, hash_prompt, hash_spec, ProviderIdentity, ProviderParams};
use vibesafe_introspect::TextIntrospector;
use vibesafe_llm::{cache_key, construct_backend, ProviderRequest, ResponseCache};
use vibesafe_spec::{DependencyEntry, Spec};
use vibesafe_store::{CheckpointMeta, DependencyPin, HashInputsEcho, Store};
use vibesafe_utils::error::{SpecError, VibesafeError};
use vibesafe_validation::{common_patterns, validate, DenyList};

/// Bound on concurrently in-flight provider requests (`compile`) or gate
/// invocations (`test`/`check`/`save`) per CLI invocation (`SPEC_FULL.md`
/// §5). Within a single unit the pipeline stays strictly sequential; this
/// bound only caps how many *different* units are in flight at once.
pub const MAX_INFLIGHT: usize = 4;

/// Everything a subcommand needs: resolved config, the checkpoint store, and
/// the reference introspector.
pub struct Workspace {
    pub project_root: Utf8PathBuf,
    pub config: Config,
    pub store: Store,
    pub introspector: TextIntrospector,
    pub deny_list: DenyList,
}

impl Workspace {
    #[must_use]
    pub fn new(project_root: Utf8PathBuf, config: Config) -> Self {
        let store = Store::new(config.paths.checkpoints.clone());
        let deny_list =
            DenyList::from_patterns(&common_patterns()).unwrap_or_else(|_| DenyList::empty());
        Self {
            project_root,
            config,
            store,
            introspector: TextIntrospector::default(),
            deny_list,
        }
    }

    /// Resolve a Spec's `provider_ref` against the configured providers,
    /// falling back to whichever provider is configured first when the
    /// reference is the unconfigured decorator default (`"default"`) and no
    /// provider is actually named `"default"`.
    pub(crate) fn provider_config(&self, provider_ref: &str) -> Result<(&str, &vibesafe_config::ProviderConfig), VibesafeError> {
        if let Some((name, cfg)) = self.config.providers.get_key_value(provider_ref) {
            return Ok((name.as_str(), cfg));
        }
        if provider_ref == "default" {
            if let Some((name, cfg)) = self.config.providers.iter().next() {
                return Ok((name.as_str(), cfg));
            }
        }
        Err(VibesafeError::Config(
            vibesafe_utils::error::ConfigError::UnknownProvider {
                name: provider_ref.to_string(),
            },
        ))
    }

    fn response_cache(&self) -> ResponseCache {
        ResponseCache::new(self.config.paths.cache.clone())
    }
}

/// Every unit discovered in a project, in deterministic scan order.
pub fn discover_units(ws: &Workspace) -> Result<Vec<Spec>, VibesafeError> {
    let mut files = Vec::new();
    collect_source_files(ws.project_root.as_path(), &mut files)?;
    files.sort();

    let mut specs = Vec::new();
    for file in files {
        let Ok(source) = std::fs::read_to_string(file.as_std_path()) else {
            continue;
        };
        let relative = file
            .strip_prefix(&ws.project_root)
            .unwrap_or(file.as_path());
        let module_path = relative
            .with_extension("")
            .as_str()
            .replace(['/', '\\'], ".");
        match vibesafe_spec::scan_file(&source, relative, &module_path, &ws.introspector) {
            Ok(mut unit_specs) => specs.append(&mut unit_specs),
            Err(e) => tracing::warn!(file = %relative, error = %e, "skipping file with an extraction error"),
        }
    }
    specs.sort_by(|a, b| a.unit_id.cmp(&b.unit_id));
    Ok(specs)
}

fn collect_source_files(dir: &Utf8Path, out: &mut Vec<Utf8PathBuf>) -> Result<(), VibesafeError> {
    let entries = match std::fs::read_dir(dir.as_std_path()) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(VibesafeError::Io(e)),
    };
    for entry in entries {
        let entry = entry.map_err(VibesafeError::Io)?;
        let Ok(path) = Utf8PathBuf::from_path_buf(entry.path()) else {
            continue;
        };
        let file_name = path.file_name().unwrap_or_default();
        if file_name.starts_with('.') || file_name == "target" || file_name == "vibesafe.toml" {
            continue;
        }
        if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
            collect_source_files(&path, out)?;
        } else if path.extension() == Some("py") {
            out.push(path);
        }
    }
    Ok(())
}

/// The derived coverage state `scan`/`status` report for one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitStatus {
    Uncompiled,
    CompiledActive,
    Drifted,
    MissingExamples,
}

impl UnitStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Uncompiled => "uncompiled",
            Self::CompiledActive => "compiled_active",
            Self::Drifted => "drifted",
            Self::MissingExamples => "missing_examples",
        }
    }
}

/// Classify one unit's coverage against the store, without re-invoking the
/// provider.
pub fn unit_status(ws: &Workspace, spec: &Spec) -> Result<UnitStatus, VibesafeError> {
    if spec.examples.is_empty() {
        return Ok(UnitStatus::MissingExamples);
    }
    let Some(h_chk) = ws.store.active(&spec.unit_id)? else {
        return Ok(UnitStatus::Uncompiled);
    };
    let (_, meta) = ws.store.read(&spec.unit_id, &h_chk)?;
    let (identity, params) = provider_identity_for_meta(&meta);
    let current_h_spec = hash_spec(spec, &identity, &params);
    if current_h_spec == meta.spec_hash {
        Ok(UnitStatus::CompiledActive)
    } else {
        Ok(UnitStatus::Drifted)
    }
}

fn provider_identity_for_meta(meta: &CheckpointMeta) -> (ProviderIdentity, ProviderParams) {
    let (kind, model) = meta.provider.split_once(':').unwrap_or((meta.provider.as_str(), ""));
    (
        ProviderIdentity {
            kind: kind.to_string(),
            model: model.to_string(),
        },
        ProviderParams {
            seed: meta.seed,
            temperature: meta.temperature,
            max_tokens: None,
        },
    )
}

/// The outcome of one `compile` invocation.
pub struct CompileOutcome {
    pub h_chk: String,
    pub cache_hit: bool,
}

/// Render, generate (honouring the cache unless `force`), validate, and
/// write a checkpoint for `spec`. Never activates it.
pub async fn compile_unit(ws: &Workspace, spec: &Spec, force: bool) -> Result<CompileOutcome, VibesafeError> {
    let (provider_name, provider_cfg) = ws.provider_config(&spec.provider_ref)?;
    let identity = ProviderIdentity {
        kind: provider_cfg.kind.clone(),
        model: provider_cfg.model.clone(),
    };
    let params = ProviderParams {
        seed: provider_cfg.seed,
        temperature: provider_cfg.temperature,
        max_tokens: provider_cfg.max_tokens,
    };
    let provider_identity_str = format!("{}:{}", identity.kind, identity.model);

    let prompt = vibesafe_template::render(spec)?;
    let h_prompt = hash_prompt(prompt.as_bytes());

    let cache = ws.response_cache();
    let cached = if force { None } else { cache.get(&h_prompt, &provider_identity_str) };
    let (generated, cache_hit) = match cached {
        Some(text) => (text, true),
        None => {
            let api_key = provider_cfg
                .api_key_env
                .as_deref()
                .and_then(|var| std::env::var(var).ok())
                .unwrap_or_default();
            let backend = construct_backend(&provider_cfg.kind, &api_key, provider_cfg.base_url.clone())
                .ok_or_else(|| {
                    VibesafeError::Config(vibesafe_utils::error::ConfigError::UnknownProvider {
                        name: format!("{provider_name} (kind '{}')", provider_cfg.kind),
                    })
                })?;
            let mut request = ProviderRequest::new(prompt.clone(), provider_cfg.model.clone());
            request.seed = provider_cfg.seed;
            request.temperature = provider_cfg.temperature;
            request.max_tokens = provider_cfg.max_tokens;
            request.timeout = Duration::from_secs(provider_cfg.timeout);
            let text = backend.complete(&request).await?;
            cache
                .put(&h_prompt, &provider_identity_str, &text)
                .map_err(|e| VibesafeError::Io(std::io::Error::other(e.to_string())))?;
            (text, false)
        }
    };

    let impl_bytes = generated.as_bytes();
    validate(spec, &generated, &ws.introspector, &ws.deny_list)?;

    let h_spec = hash_spec(spec, &identity, &params);
    let h_impl = hash_impl(impl_bytes);
    let h_chk = hash_checkpoint(&h_spec, &h_prompt, &h_impl);

    let meta = CheckpointMeta {
        spec_hash: h_spec.clone(),
        chk_sha: h_chk.clone(),
        tool_version: env!("CARGO_PKG_VERSION").to_string(),
        provider: provider_identity_str,
        prompt_template: vibesafe_template::resolve_template_ref(spec).to_string(),
        seed: params.seed,
        temperature: params.temperature,
        timestamp: Utc::now().to_rfc3339(),
        hash_inputs: HashInputsEcho {
            h_spec,
            h_prompt,
            h_impl,
        },
        deps: None,
    };

    ws.store.write(&spec.unit_id, &h_chk, impl_extension(spec), impl_bytes, &meta)?;
    Ok(CompileOutcome { h_chk, cache_hit })
}

fn impl_extension(_spec: &Spec) -> &'static str {
    "py"
}

/// The checkpoint `test`/`save`/`check` should evaluate: the most recently
/// written candidate if one exists, else the active checkpoint.
pub fn candidate_checkpoint(ws: &Workspace, unit_id: &str) -> Result<Option<String>, VibesafeError> {
    let mut checkpoints = ws.store.list_checkpoints(unit_id)?;
    if let Some(latest) = checkpoints.pop() {
        return Ok(Some(latest));
    }
    Ok(ws.store.active(unit_id)?)
}

/// Run the Verification Harness against `h_chk` for `spec`.
pub async fn test_unit(ws: &Workspace, spec: &Spec, h_chk: &str) -> Result<HarnessReport, VibesafeError> {
    let (impl_bytes, _meta) = ws.store.read(&spec.unit_id, h_chk)?;
    let artifact_text = String::from_utf8(impl_bytes)
        .map_err(|e| VibesafeError::Io(std::io::Error::other(e.to_string())))?;
    let artifact_path = ws.store.impl_path(&spec.unit_id, h_chk)?;
    let property_block = vibesafe_spec::extract_property_block(&spec.docstring);

    let input = HarnessInput {
        unit_id: &spec.unit_id,
        examples: &spec.examples,
        artifact_path: &artifact_path,
        artifact_text: &artifact_text,
        property_block: property_block.as_deref(),
        lint_cmd: &ws.config.gates.lint_cmd,
        type_cmd: &ws.config.gates.type_cmd,
        property_cmd: &ws.config.gates.property_cmd,
        timeout: Duration::from_secs(ws.config.gates.timeout),
    };
    Ok(run_all_gates(&input, &ws.introspector).await)
}

/// `save`: gate-then-activate. Requires an Example on the Spec and every
/// gate to pass; optionally freezes dependency pins into `meta.toml`.
pub async fn save_unit(
    ws: &Workspace,
    spec: &Spec,
    freeze_deps: bool,
) -> Result<HarnessReport, VibesafeError> {
    if spec.examples.is_empty() {
        return Err(VibesafeError::Spec(SpecError::MissingDoctest {
            unit_id: spec.unit_id.clone(),
        }));
    }
    let h_chk = candidate_checkpoint(ws, &spec.unit_id)?.ok_or_else(|| {
        VibesafeError::Integrity(vibesafe_utils::error::IntegrityError::CheckpointMissing {
            unit_id: spec.unit_id.clone(),
        })
    })?;
    let report = test_unit(ws, spec, &h_chk).await?;
    if !report.all_passed() {
        return Ok(report);
    }

    if freeze_deps {
        let (impl_bytes, mut meta) = ws.store.read(&spec.unit_id, &h_chk)?;
        meta.deps = Some(pins_from_digest(&spec.dependency_digest));
        ws.store
            .write(&spec.unit_id, &h_chk, impl_extension(spec), &impl_bytes, &meta)?;
    }

    ws.store.activate(&spec.unit_id, &h_chk)?;
    Ok(report)
}

fn pins_from_digest(digest: &vibesafe_spec::DependencyDigest) -> Vec<DependencyPin> {
    digest
        .0
        .iter()
        .map(|entry: &DependencyEntry| DependencyPin {
            name: entry.name.clone(),
            content_hash: entry.content_hash.clone(),
        })
        .collect()
}

/// The small port `vibesafe-loader`'s `dev`-mode auto-compile calls back
/// into, closing the dependency inversion without `vibesafe-loader`
/// depending on this crate.
pub struct CliCompiler<'a> {
    pub ws: &'a Workspace,
    pub specs_by_unit: std::collections::HashMap<String, Spec>,
}

#[async_trait]
impl vibesafe_loader::Compiler for CliCompiler<'_> {
    async fn compile(&self, unit_id: &str) -> Result<String, VibesafeError> {
        let spec = self.specs_by_unit.get(unit_id).ok_or_else(|| {
            VibesafeError::Spec(SpecError::InvalidSignature {
                unit_id: unit_id.to_string(),
                reason: "unit not found during re-scan".to_string(),
            })
        })?;
        let outcome = compile_unit(self.ws, spec, false).await?;
        Ok(outcome.h_chk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vibesafe_config::ProviderConfig;

    const SOURCE: &str = "@vibesafe(kind=\"function\", provider=\"anthropic\", template=\"function\")\ndef add_strs(a: str, b: str) -> str:\n    \"\"\"Adds two numeric strings.\n\n    >>> add_strs(\"2\", \"3\")\n    '5'\n    \"\"\"\n    a_int, b_int = int(a), int(b)\n    ...\n";

    fn workspace(tmp: &tempfile::TempDir) -> Workspace {
        let root = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).unwrap();
        let mut config = Config::resolve(None, None).unwrap();
        config.paths.checkpoints = root.join("checkpoints");
        config.paths.cache = root.join("cache");
        config.providers.insert(
            "anthropic".to_string(),
            ProviderConfig {
                kind: "mock".to_string(),
                model: "mock-model".to_string(),
                base_url: None,
                api_key_env: None,
                seed: None,
                temperature: None,
                max_tokens: None,
                timeout: 10,
            },
        );
        Workspace::new(root, config)
    }

    fn sample_spec() -> Spec {
        let introspector = TextIntrospector::default();
        let specs =
            vibesafe_spec::scan_file(SOURCE, Utf8PathBuf::from("pkg/math.py").as_path(), "pkg.math", &introspector)
                .unwrap();
        specs.into_iter().find(|s| s.unit_id == "pkg.math/add_strs").unwrap()
    }

    /// `provider_ref` on the Spec must select the named provider, not
    /// whichever one happens to be configured first.
    #[test]
    fn provider_config_resolves_the_spec_provider_ref_by_name() {
        let tmp = tempfile::tempdir().unwrap();
        let mut ws = workspace(&tmp);
        ws.config.providers.insert(
            "unused".to_string(),
            ProviderConfig {
                kind: "mock".to_string(),
                model: "decoy".to_string(),
                base_url: None,
                api_key_env: None,
                seed: None,
                temperature: None,
                max_tokens: None,
                timeout: 10,
            },
        );
        let (name, cfg) = ws.provider_config("anthropic").unwrap();
        assert_eq!(name, "anthropic");
        assert_eq!(cfg.model, "mock-model");
    }

    #[test]
    fn provider_config_rejects_an_unknown_reference() {
        let tmp = tempfile::tempdir().unwrap();
        let ws = workspace(&tmp);
        let err = ws.provider_config("does-not-exist").unwrap_err();
        assert!(matches!(
            err,
            VibesafeError::Config(vibesafe_utils::error::ConfigError::UnknownProvider { .. })
        ));
    }

    /// P7: with a warm cache, `compile_unit` performs no provider call (the
    /// mock backend has no canned response and would error if invoked) and
    /// yields the same `H_chk` on repeated calls.
    #[tokio::test]
    async fn compile_unit_is_cache_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let ws = workspace(&tmp);
        let spec = sample_spec();

        let prompt = vibesafe_template::render(&spec).unwrap();
        let h_prompt = hash_prompt(prompt.as_bytes());
        let cache = ws.response_cache();
        cache
            .put(
                &h_prompt,
                "mock:mock-model",
                "def add_strs(a: str, b: str) -> str:\n    a_int, b_int = int(a), int(b)\n    return str(a_int + b_int)\n",
            )
            .unwrap();

        let first = compile_unit(&ws, &spec, false).await.unwrap();
        assert!(first.cache_hit);
        let second = compile_unit(&ws, &spec, false).await.unwrap();
        assert!(second.cache_hit);
        assert_eq!(first.h_chk, second.h_chk);
    }
}
