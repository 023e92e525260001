//! `vibesafe.toml` schema (`spec.md` §6.1) and the resolved, source-attributed
//! [`Config`] built from it.

use std::collections::HashMap;

use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use vibesafe_utils::error::ConfigError;

use crate::run_mode::RunMode;

/// Where a resolved config field's value actually came from. Surfaced by
/// `vibesafe status` so a user can tell a CLI override from a file default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    Cli,
    File,
    Default,
}

/// Raw `[project]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectConfig {
    pub env: Option<String>,
}

/// Raw `[paths]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_checkpoints")]
    pub checkpoints: Utf8PathBuf,
    #[serde(default = "default_cache")]
    pub cache: Utf8PathBuf,
    #[serde(default = "default_index")]
    pub index: Utf8PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            checkpoints: default_checkpoints(),
            cache: default_cache(),
            index: default_index(),
        }
    }
}

fn default_checkpoints() -> Utf8PathBuf {
    Utf8PathBuf::from(".vibesafe/checkpoints")
}

fn default_cache() -> Utf8PathBuf {
    Utf8PathBuf::from(".vibesafe/cache")
}

fn default_index() -> Utf8PathBuf {
    Utf8PathBuf::from(".vibesafe/index.toml")
}

/// Raw `[prompts]` section: a template path per invocation kind.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PromptsConfig {
    pub function: Option<Utf8PathBuf>,
    pub http: Option<Utf8PathBuf>,
    pub cli: Option<Utf8PathBuf>,
}

/// Raw `[provider.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    pub kind: String,
    pub model: String,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub api_key_env: Option<String>,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default = "default_provider_timeout")]
    pub timeout: u64,
}

fn default_provider_timeout() -> u64 {
    60
}

/// Raw `[sandbox]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct SandboxConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_sandbox_timeout")]
    pub timeout: u64,
    #[serde(default = "default_sandbox_memory_mb")]
    pub memory_mb: u64,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            timeout: default_sandbox_timeout(),
            memory_mb: default_sandbox_memory_mb(),
        }
    }
}

fn default_sandbox_timeout() -> u64 {
    10
}

fn default_sandbox_memory_mb() -> u64 {
    512
}

/// Raw `[gates]` section: the argv of each configured Gate Tool (`spec.md`
/// §6.7), plus the per-gate timeout the Harness enforces.
#[derive(Debug, Clone, Deserialize)]
pub struct GatesConfig {
    #[serde(default)]
    pub lint_cmd: Vec<String>,
    #[serde(default)]
    pub type_cmd: Vec<String>,
    #[serde(default)]
    pub property_cmd: Vec<String>,
    #[serde(default = "default_gate_timeout")]
    pub timeout: u64,
}

impl Default for GatesConfig {
    fn default() -> Self {
        Self {
            lint_cmd: Vec::new(),
            type_cmd: Vec::new(),
            property_cmd: Vec::new(),
            timeout: default_gate_timeout(),
        }
    }
}

fn default_gate_timeout() -> u64 {
    10
}

/// Raw deserialization target for `vibesafe.toml`. Every field is optional:
/// an absent section simply means "use the default".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub project: ProjectConfig,
    #[serde(default)]
    pub paths: Option<PathsConfig>,
    #[serde(default)]
    pub prompts: PromptsConfig,
    #[serde(default)]
    pub provider: HashMap<String, ProviderConfig>,
    #[serde(default)]
    pub sandbox: Option<SandboxConfig>,
    #[serde(default)]
    pub gates: Option<GatesConfig>,
}

impl TomlConfig {
    /// Parse a `vibesafe.toml` file's contents.
    pub fn parse(content: &str, path: &Utf8Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseFailed {
            path: path.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Fully resolved configuration: CLI overrides layered over file values
/// layered over built-in defaults, with per-field provenance retained.
#[derive(Debug, Clone)]
pub struct Config {
    pub run_mode: RunMode,
    pub paths: PathsConfig,
    pub prompts: PromptsConfig,
    pub providers: HashMap<String, ProviderConfig>,
    pub sandbox: SandboxConfig,
    pub gates: GatesConfig,
    pub source_attribution: HashMap<String, ConfigSource>,
}

impl Config {
    /// Build a resolved [`Config`] from an optional parsed file and the
    /// `VIBESAFE_ENV` environment variable. CLI-level overrides are applied
    /// afterward by the caller (the CLI crate owns `clap` parsing).
    pub fn resolve(file: Option<TomlConfig>, env_var: Option<&str>) -> Result<Self, ConfigError> {
        let mut source_attribution = HashMap::new();

        let project_env = file.as_ref().and_then(|f| f.project.env.as_deref());
        let run_mode = RunMode::resolve(env_var, project_env)?;
        source_attribution.insert(
            "project.env".to_string(),
            if env_var.is_some() {
                ConfigSource::Cli
            } else if project_env.is_some() {
                ConfigSource::File
            } else {
                ConfigSource::Default
            },
        );

        let paths = match file.as_ref().and_then(|f| f.paths.clone()) {
            Some(p) => {
                source_attribution.insert("paths".to_string(), ConfigSource::File);
                p
            }
            None => {
                source_attribution.insert("paths".to_string(), ConfigSource::Default);
                PathsConfig::default()
            }
        };

        let prompts = file.as_ref().map(|f| f.prompts.clone()).unwrap_or_default();
        source_attribution.insert(
            "prompts".to_string(),
            if file.is_some() {
                ConfigSource::File
            } else {
                ConfigSource::Default
            },
        );

        let providers = file
            .as_ref()
            .map(|f| f.provider.clone())
            .unwrap_or_default();
        source_attribution.insert(
            "provider".to_string(),
            if providers.is_empty() {
                ConfigSource::Default
            } else {
                ConfigSource::File
            },
        );

        let sandbox = match file.as_ref().and_then(|f| f.sandbox.clone()) {
            Some(s) => {
                source_attribution.insert("sandbox".to_string(), ConfigSource::File);
                s
            }
            None => {
                source_attribution.insert("sandbox".to_string(), ConfigSource::Default);
                SandboxConfig::default()
            }
        };

        let gates = match file.as_ref().and_then(|f| f.gates.clone()) {
            Some(g) => {
                source_attribution.insert("gates".to_string(), ConfigSource::File);
                g
            }
            None => {
                source_attribution.insert("gates".to_string(), ConfigSource::Default);
                GatesConfig::default()
            }
        };

        Ok(Self {
            run_mode,
            paths,
            prompts,
            providers,
            sandbox,
            gates,
            source_attribution,
        })
    }

    /// Look up a configured provider by name, or fail with `UnknownProvider`.
    pub fn provider(&self, name: &str) -> Result<&ProviderConfig, ConfigError> {
        self.providers
            .get(name)
            .ok_or_else(|| ConfigError::UnknownProvider {
                name: name.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_defaults_with_no_file() {
        let cfg = Config::resolve(None, None).unwrap();
        assert_eq!(cfg.run_mode, RunMode::Dev);
        assert_eq!(cfg.paths.checkpoints, Utf8PathBuf::from(".vibesafe/checkpoints"));
        assert_eq!(
            cfg.source_attribution.get("project.env"),
            Some(&ConfigSource::Default)
        );
    }

    #[test]
    fn file_values_are_attributed_to_file() {
        let toml_src = r#"
            [project]
            env = "prod"

            [provider.claude]
            kind = "anthropic"
            model = "claude-opus"
        "#;
        let parsed = TomlConfig::parse(toml_src, Utf8Path::new("vibesafe.toml")).unwrap();
        let cfg = Config::resolve(Some(parsed), None).unwrap();
        assert_eq!(cfg.run_mode, RunMode::Prod);
        assert_eq!(
            cfg.source_attribution.get("project.env"),
            Some(&ConfigSource::File)
        );
        assert!(cfg.provider("claude").is_ok());
        assert!(matches!(
            cfg.provider("missing"),
            Err(ConfigError::UnknownProvider { .. })
        ));
    }

    #[test]
    fn env_var_outranks_file_value() {
        let toml_src = "[project]\nenv = \"prod\"\n";
        let parsed = TomlConfig::parse(toml_src, Utf8Path::new("vibesafe.toml")).unwrap();
        let cfg = Config::resolve(Some(parsed), Some("dev")).unwrap();
        assert_eq!(cfg.run_mode, RunMode::Dev);
        assert_eq!(
            cfg.source_attribution.get("project.env"),
            Some(&ConfigSource::Cli)
        );
    }

    #[test]
    fn gates_default_to_empty_commands_and_a_ten_second_timeout() {
        let cfg = Config::resolve(None, None).unwrap();
        assert!(cfg.gates.lint_cmd.is_empty());
        assert!(cfg.gates.type_cmd.is_empty());
        assert!(cfg.gates.property_cmd.is_empty());
        assert_eq!(cfg.gates.timeout, 10);
    }

    #[test]
    fn gates_section_is_read_from_file() {
        let toml_src = "[gates]\nlint_cmd = [\"ruff\", \"check\"]\ntype_cmd = [\"mypy\"]\ntimeout = 5\n";
        let parsed = TomlConfig::parse(toml_src, Utf8Path::new("vibesafe.toml")).unwrap();
        let cfg = Config::resolve(Some(parsed), None).unwrap();
        assert_eq!(cfg.gates.lint_cmd, vec!["ruff".to_string(), "check".to_string()]);
        assert_eq!(cfg.gates.timeout, 5);
    }

    #[test]
    fn rejects_malformed_toml() {
        let err = TomlConfig::parse("not valid = [", Utf8Path::new("vibesafe.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ParseFailed { .. }));
    }
}
