#[derive(Debug, thiserror::Error)]
pub enum IntrospectError {
    #[error("failed to parse source: {reason} (line {line})")]
    ParseError { reason: String, line: u32 },

    #[error("symbol '{name}' not found")]
    SymbolNotFound { name: String },

    #[error("artifact not found at {path}")]
    ArtifactNotFound { path: String },

    #[error("artifact at {path} is not loadable: {reason}")]
    ArtifactLoadError { path: String, reason: String },

    #[error("evaluation of '{expr}' failed: {reason}")]
    EvaluationError { expr: String, reason: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
