//! The vibesafe error taxonomy.
//!
//! `VibesafeError` aggregates the leaf error kinds enumerated in the error
//! handling design: `SpecError`, `TemplateError`, `ProviderError`,
//! `ValidationError`, `GateFailure`, `StorageError`, `IntegrityError`, and
//! `ConfigError`. Each implements [`UserFriendlyError`] so the CLI can print
//! a remediation hint without the caller needing to match on variants.

use std::fmt;

use crate::exit_codes::ExitCode;

/// Top-level error type returned by vibesafe library operations.
#[derive(thiserror::Error, Debug)]
pub enum VibesafeError {
    #[error("spec error: {0}")]
    Spec(#[from] SpecError),

    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("gate failure: {0}")]
    Gate(#[from] GateFailure),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("integrity error: {0}")]
    Integrity(#[from] IntegrityError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl VibesafeError {
    /// Map this error onto a CLI exit code per the exit code table.
    #[must_use]
    pub fn to_exit_code(&self) -> ExitCode {
        match self {
            Self::Config(_) => ExitCode::CLI_ARGS,
            Self::Provider(_) => ExitCode::PROVIDER_ERROR,
            Self::Integrity(_) => ExitCode::INTEGRITY_VIOLATION,
            Self::Spec(_) | Self::Validation(_) | Self::Gate(_) | Self::Storage(_) => {
                ExitCode::EXPECTED_FAILURE
            }
            Self::Template(_) | Self::Io(_) => ExitCode::INTERNAL,
        }
    }

    /// The `unit_id` this error pertains to, when applicable.
    #[must_use]
    pub fn unit_id(&self) -> Option<&str> {
        match self {
            Self::Spec(e) => e.unit_id(),
            Self::Validation(e) => Some(e.unit_id.as_str()),
            Self::Gate(e) => Some(e.unit_id.as_str()),
            Self::Integrity(e) => Some(e.unit_id()),
            _ => None,
        }
    }
}

/// Trait implemented by every leaf error kind for user-facing reporting.
pub trait UserFriendlyError {
    /// A one-line, human-readable description of what went wrong.
    fn user_message(&self) -> String;
    /// Additional context explaining why this matters.
    fn context(&self) -> Option<String> {
        None
    }
    /// Concrete remediation suggestions ("add a doctest", "run compile").
    fn suggestions(&self) -> Vec<String> {
        Vec::new()
    }
    /// Broad category, used for grouping/metrics.
    fn category(&self) -> ErrorCategory;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Spec,
    Template,
    Provider,
    Validation,
    Gate,
    Storage,
    Integrity,
    Config,
}

/// `spec.md` §4.1 failure kinds.
#[derive(thiserror::Error, Debug)]
pub enum SpecError {
    #[error("unit {unit_id} has no doctest example")]
    MissingDoctest { unit_id: String },

    #[error("unit {unit_id} has an invalid or ambiguous signature: {reason}")]
    InvalidSignature { unit_id: String, reason: String },

    #[error("unit {unit_id} body has no sentinel statement")]
    SentinelMissing { unit_id: String },

    #[error("decorator option '{option}' is not recognized for unit {unit_id}")]
    DecoratorOptionInvalid { unit_id: String, option: String },
}

impl SpecError {
    #[must_use]
    pub fn unit_id(&self) -> Option<&str> {
        match self {
            Self::MissingDoctest { unit_id }
            | Self::InvalidSignature { unit_id, .. }
            | Self::SentinelMissing { unit_id }
            | Self::DecoratorOptionInvalid { unit_id, .. } => Some(unit_id.as_str()),
        }
    }
}

impl UserFriendlyError for SpecError {
    fn user_message(&self) -> String {
        match self {
            Self::MissingDoctest { unit_id } => {
                format!("unit '{unit_id}' has no doctest example")
            }
            Self::InvalidSignature { unit_id, reason } => {
                format!("unit '{unit_id}' has an invalid signature: {reason}")
            }
            Self::SentinelMissing { unit_id } => {
                format!("unit '{unit_id}' has no sentinel statement in its body")
            }
            Self::DecoratorOptionInvalid { unit_id, option } => {
                format!("unit '{unit_id}' uses an unrecognized decorator option '{option}'")
            }
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::MissingDoctest { .. } => vec![
                "add at least one `>>>` doctest example to the docstring".to_string(),
            ],
            Self::InvalidSignature { .. } => {
                vec!["annotate every parameter and the return type".to_string()]
            }
            Self::SentinelMissing { .. } => {
                vec!["add the configured sentinel statement to the function body".to_string()]
            }
            Self::DecoratorOptionInvalid { .. } => {
                vec!["remove the unrecognized option or check its spelling".to_string()]
            }
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Spec
    }
}

/// `spec.md` §4.3 failure kinds.
#[derive(thiserror::Error, Debug)]
pub enum TemplateError {
    #[error("template not found: {template_id}")]
    NotFound { template_id: String },

    #[error("failed to render template {template_id} at line {line}: {reason}")]
    RenderError {
        template_id: String,
        line: u32,
        reason: String,
    },
}

impl UserFriendlyError for TemplateError {
    fn user_message(&self) -> String {
        match self {
            Self::NotFound { template_id } => format!("template '{template_id}' not found"),
            Self::RenderError {
                template_id,
                line,
                reason,
            } => format!("template '{template_id}' failed to render at line {line}: {reason}"),
        }
    }

    fn suggestions(&self) -> Vec<String> {
        vec!["run `vibesafe status` to see the resolved template path".to_string()]
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Template
    }
}

/// `spec.md` §4.4 / §7 provider error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorCategory {
    Auth,
    Quota,
    Network,
    Protocol,
    Malformed,
}

impl fmt::Display for ProviderErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Auth => "auth",
            Self::Quota => "quota",
            Self::Network => "network",
            Self::Protocol => "protocol",
            Self::Malformed => "malformed",
        };
        write!(f, "{s}")
    }
}

#[derive(thiserror::Error, Debug)]
#[error("provider '{provider}' failed ({category}): {message}")]
pub struct ProviderError {
    pub provider: String,
    pub category: ProviderErrorCategory,
    pub message: String,
}

impl UserFriendlyError for ProviderError {
    fn user_message(&self) -> String {
        format!("provider '{}' failed: {}", self.provider, self.message)
    }

    fn context(&self) -> Option<String> {
        Some(format!("error category: {}", self.category))
    }

    fn suggestions(&self) -> Vec<String> {
        match self.category {
            ProviderErrorCategory::Auth => {
                vec!["set the provider's api_key_env environment variable".to_string()]
            }
            ProviderErrorCategory::Quota => vec!["retry later or switch provider".to_string()],
            ProviderErrorCategory::Network => vec!["check connectivity and retry".to_string()],
            ProviderErrorCategory::Protocol | ProviderErrorCategory::Malformed => {
                vec!["inspect provider response; file a bug if it recurs".to_string()]
            }
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Provider
    }
}

/// `spec.md` §4.5 validation failure.
#[derive(thiserror::Error, Debug)]
#[error("validation failed for {unit_id} ({kind}) at {location}")]
pub struct ValidationError {
    pub unit_id: String,
    pub kind: String,
    pub location: String,
}

impl UserFriendlyError for ValidationError {
    fn user_message(&self) -> String {
        format!(
            "generated code for '{}' failed validation: {} at {}",
            self.unit_id, self.kind, self.location
        )
    }

    fn suggestions(&self) -> Vec<String> {
        vec!["run `vibesafe compile --force` to regenerate".to_string()]
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Validation
    }
}

/// `spec.md` §4.7 / §7 gate failure categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateFailureCategory {
    ExampleMismatch,
    Lint,
    Type,
    Timeout,
    Sandbox,
}

impl fmt::Display for GateFailureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ExampleMismatch => "example_mismatch",
            Self::Lint => "lint",
            Self::Type => "type",
            Self::Timeout => "timeout",
            Self::Sandbox => "sandbox",
        };
        write!(f, "{s}")
    }
}

#[derive(thiserror::Error, Debug)]
#[error("gate failure for {unit_id} ({category}): {message}")]
pub struct GateFailure {
    pub unit_id: String,
    pub category: GateFailureCategory,
    pub message: String,
}

impl UserFriendlyError for GateFailure {
    fn user_message(&self) -> String {
        format!(
            "unit '{}' failed the {} gate: {}",
            self.unit_id, self.category, self.message
        )
    }

    fn suggestions(&self) -> Vec<String> {
        vec!["run `vibesafe test --target <unit_id>` for full gate output".to_string()]
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Gate
    }
}

/// `spec.md` §4.6 / §7 storage failures.
#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("failed to write checkpoint at {path}: {reason}")]
    WriteFailed { path: String, reason: String },

    #[error("checkpoint at {path} hashed to {actual} but expected {expected}")]
    HashMismatchOnWrite {
        path: String,
        expected: String,
        actual: String,
    },

    #[error("index lock contended while activating {unit_id}")]
    IndexLockContended { unit_id: String },

    #[error("failed to read checkpoint at {path}: {reason}")]
    ReadFailed { path: String, reason: String },
}

impl UserFriendlyError for StorageError {
    fn user_message(&self) -> String {
        match self {
            Self::WriteFailed { path, reason } => {
                format!("failed to write checkpoint at '{path}': {reason}")
            }
            Self::HashMismatchOnWrite {
                path,
                expected,
                actual,
            } => format!(
                "checkpoint at '{path}' hashed to {actual} but its directory name is {expected}"
            ),
            Self::IndexLockContended { unit_id } => {
                format!("index lock was contended while activating '{unit_id}'")
            }
            Self::ReadFailed { path, reason } => {
                format!("failed to read checkpoint at '{path}': {reason}")
            }
        }
    }

    fn suggestions(&self) -> Vec<String> {
        vec!["retry the operation; the store rolls back partial writes".to_string()]
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Storage
    }
}

/// `spec.md` §4.8 / §7 integrity errors — raised only by the Runtime Loader in `prod`.
#[derive(thiserror::Error, Debug)]
pub enum IntegrityError {
    #[error("no active checkpoint for unit {unit_id}")]
    CheckpointMissing { unit_id: String },

    #[error("spec hash mismatch for unit {unit_id}: checkpoint has {checkpoint_hash}, source is now {current_hash}")]
    HashMismatch {
        unit_id: String,
        checkpoint_hash: String,
        current_hash: String,
    },
}

impl IntegrityError {
    #[must_use]
    pub fn unit_id(&self) -> &str {
        match self {
            Self::CheckpointMissing { unit_id } | Self::HashMismatch { unit_id, .. } => unit_id,
        }
    }
}

impl UserFriendlyError for IntegrityError {
    fn user_message(&self) -> String {
        match self {
            Self::CheckpointMissing { unit_id } => {
                format!("unit '{unit_id}' has no active checkpoint")
            }
            Self::HashMismatch { unit_id, .. } => {
                format!("unit '{unit_id}' has drifted from its active checkpoint")
            }
        }
    }

    fn suggestions(&self) -> Vec<String> {
        vec!["run `vibesafe compile && vibesafe save` in dev, never auto-generated in prod"
            .to_string()]
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Integrity
    }
}

/// `spec.md` §7 configuration errors.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to parse config file {path}: {reason}")]
    ParseFailed { path: String, reason: String },

    #[error("unknown run mode '{value}', expected 'dev' or 'prod'")]
    InvalidRunMode { value: String },

    #[error("provider '{name}' is not configured")]
    UnknownProvider { name: String },
}

impl UserFriendlyError for ConfigError {
    fn user_message(&self) -> String {
        match self {
            Self::ParseFailed { path, reason } => {
                format!("failed to parse config file '{path}': {reason}")
            }
            Self::InvalidRunMode { value } => format!("invalid run mode '{value}'"),
            Self::UnknownProvider { name } => format!("provider '{name}' is not configured"),
        }
    }

    fn suggestions(&self) -> Vec<String> {
        vec!["check vibesafe.toml against the [provider.<name>] schema".to_string()]
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Config
    }
}
