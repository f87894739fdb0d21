//! Shared error type across perfpoc crates.

use thiserror::Error;

/// Stable error codes (used in logs and ops responses).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Configuration could not be parsed or failed validation.
    BadConfig,
    /// Unsupported config version.
    UnsupportedVersion,
    /// Category is not present in the counter subsystem.
    CategoryNotFound,
    /// Category already exists and cannot be created again.
    CategoryExists,
    /// Counter is not present in its category.
    CounterNotFound,
    /// Category definition violates the layout rules.
    InvalidCategory,
    /// Two emitters declared the same counter.
    DuplicateMetric,
    /// Live category disagrees with the declared descriptors.
    ProvisioningMismatch,
    /// An emitter task failed or panicked.
    EmitterFailed,
    /// Filesystem access failed.
    Io,
    /// Internal error.
    Internal,
}

impl ErrorCode {
    /// String representation used in logs and JSON bodies.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::BadConfig => "BAD_CONFIG",
            ErrorCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ErrorCode::CategoryNotFound => "CATEGORY_NOT_FOUND",
            ErrorCode::CategoryExists => "CATEGORY_EXISTS",
            ErrorCode::CounterNotFound => "COUNTER_NOT_FOUND",
            ErrorCode::InvalidCategory => "INVALID_CATEGORY",
            ErrorCode::DuplicateMetric => "DUPLICATE_METRIC",
            ErrorCode::ProvisioningMismatch => "PROVISIONING_MISMATCH",
            ErrorCode::EmitterFailed => "EMITTER_FAILED",
            ErrorCode::Io => "IO",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, PerfError>;

/// Unified error type used by core and host.
#[derive(Debug, Error)]
pub enum PerfError {
    #[error("bad config: {0}")]
    BadConfig(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("category not found: {0}")]
    CategoryNotFound(String),
    #[error("category already exists: {0}")]
    CategoryExists(String),
    #[error("counter not found: {category}/{counter}")]
    CounterNotFound { category: String, counter: String },
    #[error("invalid category: {0}")]
    InvalidCategory(String),
    #[error("metric declared more than once: {0}")]
    DuplicateMetric(String),
    #[error("provisioning mismatch: {0}")]
    ProvisioningMismatch(String),
    #[error("emitter {emitter} failed: {reason}")]
    EmitterFailed { emitter: String, reason: String },
    #[error("io: {0}")]
    Io(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl PerfError {
    /// Map the error to its stable code.
    pub fn code(&self) -> ErrorCode {
        match self {
            PerfError::BadConfig(_) => ErrorCode::BadConfig,
            PerfError::UnsupportedVersion => ErrorCode::UnsupportedVersion,
            PerfError::CategoryNotFound(_) => ErrorCode::CategoryNotFound,
            PerfError::CategoryExists(_) => ErrorCode::CategoryExists,
            PerfError::CounterNotFound { .. } => ErrorCode::CounterNotFound,
            PerfError::InvalidCategory(_) => ErrorCode::InvalidCategory,
            PerfError::DuplicateMetric(_) => ErrorCode::DuplicateMetric,
            PerfError::ProvisioningMismatch(_) => ErrorCode::ProvisioningMismatch,
            PerfError::EmitterFailed { .. } => ErrorCode::EmitterFailed,
            PerfError::Io(_) => ErrorCode::Io,
            PerfError::Internal(_) => ErrorCode::Internal,
        }
    }
}
