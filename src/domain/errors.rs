use thiserror::Error;

/// Errors raised while building the run configuration, before any test event arrives
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("Malformed extra label '{entry}': expected key=value")]
    MalformedLabel { entry: String },

    #[error("Invalid label name '{name}': must match [a-zA-Z_][a-zA-Z0-9_]* and not start with '__'")]
    InvalidLabelName { name: String },

    #[error("Invalid job name '{job}': {reason}")]
    InvalidJobName { job: String, reason: String },

    #[error("Invalid pushgateway URL '{url}': {reason}")]
    InvalidEndpoint { url: String, reason: String },
}

/// Errors raised when a series is added to the run registry
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RegistryError {
    #[error("Duplicate metric: a series named '{name}' is already registered for this run")]
    DuplicateMetric { name: String },

    #[error("Metric '{name}' rejected by the registry: {reason}")]
    InvalidMetric { name: String, reason: String },
}

/// Errors raised by the single end-of-run push
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FlushError {
    #[error("Failed to register aggregate metrics: {0}")]
    Registry(#[from] RegistryError),

    #[error("Failed to encode metrics: {reason}")]
    Encode { reason: String },

    #[error("Push to {url} failed: {reason}")]
    Transport { url: String, reason: String },

    #[error("Push to {url} timed out after {duration_ms}ms")]
    Timeout { url: String, duration_ms: u64 },

    #[error("Pushgateway rejected payload with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Top-level error surfaced by the reporter lifecycle
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ReporterError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Flush(#[from] FlushError),

    #[error("Run already closed: no further events or flushes are accepted")]
    RunClosed,

    #[error("Failed to read test events: {reason}")]
    Input { reason: String },
}
