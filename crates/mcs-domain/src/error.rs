//! Error handling types

use thiserror::Error;

/// Result type alias for operations that can fail
pub type Result<T> = std::result::Result<T, Error>;

/// Stable error codes surfaced in the tool response envelope.
///
/// Every [`Error`] variant maps to exactly one code; the dispatcher is the
/// only place that turns errors into envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Request failed schema or semantic validation
    Validation,
    /// No or invalid credentials
    Unauthorized,
    /// Valid principal but insufficient tier or missing MFA
    Forbidden,
    /// Resource absent (index, document, tool)
    NotFound,
    /// Admin operation rejected (schema differs, destructive without confirm)
    Conflict,
    /// External search/embedding/auth failure after retries
    DependencyUnavailable,
    /// Deadline exceeded
    Timeout,
    /// Unexpected state
    Internal,
}

impl ErrorCode {
    /// Wire representation used in the response envelope
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::DependencyUnavailable => "dependency_unavailable",
            Self::Timeout => "timeout",
            Self::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Main error type for MCP Code Search
#[derive(Error, Debug)]
pub enum Error {
    /// Request failed validation
    #[error("Validation error: {message}")]
    Validation {
        /// Offending field, when known
        field: Option<String>,
        /// Description of the validation failure
        message: String,
    },

    /// Missing or invalid credentials
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// Description of the authentication failure
        message: String,
    },

    /// Valid principal but insufficient access
    #[error("Forbidden: {message}")]
    Forbidden {
        /// Description of the authorization failure
        message: String,
    },

    /// Resource not found
    #[error("Not found: {resource}")]
    NotFound {
        /// The resource that was not found
        resource: String,
    },

    /// Operation conflicts with current state
    #[error("Conflict: {message}")]
    Conflict {
        /// Description of the conflict
        message: String,
    },

    /// An external dependency failed after retries
    #[error("{dependency} unavailable: {message}")]
    DependencyUnavailable {
        /// Which dependency failed (search, embedding, auth)
        dependency: String,
        /// Description of the failure
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Deadline exceeded
    #[error("Timeout after {elapsed_ms}ms in {operation}")]
    Timeout {
        /// The operation that timed out
        operation: String,
        /// Elapsed time in milliseconds
        elapsed_ms: u64,
    },

    /// I/O operation error
    #[error("I/O error: {message}")]
    Io {
        /// Description of the I/O error
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// JSON parsing or serialization error
    #[error("JSON error: {source}")]
    Json {
        /// The underlying JSON error
        #[from]
        source: serde_json::Error,
    },

    /// Configuration-related error
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error
        message: String,
    },

    /// Internal system error
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error
        message: String,
    },
}

impl Error {
    /// The envelope code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Validation { .. } => ErrorCode::Validation,
            Self::Unauthorized { .. } => ErrorCode::Unauthorized,
            Self::Forbidden { .. } => ErrorCode::Forbidden,
            Self::NotFound { .. } => ErrorCode::NotFound,
            Self::Conflict { .. } => ErrorCode::Conflict,
            Self::DependencyUnavailable { .. } => ErrorCode::DependencyUnavailable,
            Self::Timeout { .. } => ErrorCode::Timeout,
            Self::Io { .. } | Self::Json { .. } | Self::Config { .. } | Self::Internal { .. } => {
                ErrorCode::Internal
            }
        }
    }

    /// Create a validation error without a field reference
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            field: None,
            message: message.into(),
        }
    }

    /// Create a validation error for a specific field
    pub fn validation_field<F: Into<String>, S: Into<String>>(field: F, message: S) -> Self {
        Self::Validation {
            field: Some(field.into()),
            message: message.into(),
        }
    }

    /// Create an unauthorized error
    pub fn unauthorized<S: Into<String>>(message: S) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Create a forbidden error
    pub fn forbidden<S: Into<String>>(message: S) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found<S: Into<String>>(resource: S) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Create a conflict error
    pub fn conflict<S: Into<String>>(message: S) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Create a dependency unavailable error
    pub fn dependency<D: Into<String>, S: Into<String>>(dependency: D, message: S) -> Self {
        Self::DependencyUnavailable {
            dependency: dependency.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Create a dependency unavailable error with source
    pub fn dependency_with_source<
        D: Into<String>,
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    >(
        dependency: D,
        message: S,
        source: E,
    ) -> Self {
        Self::DependencyUnavailable {
            dependency: dependency.into(),
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a timeout error
    pub fn timeout<S: Into<String>>(operation: S, elapsed_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            elapsed_ms,
        }
    }

    /// Create an I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io {
            message: message.into(),
            source: None,
        }
    }

    /// Create an I/O error with source
    pub fn io_with_source<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
        message: S,
        source: E,
    ) -> Self {
        Self::Io {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io {
            message: e.to_string(),
            source: Some(Box::new(e)),
        }
    }
}
