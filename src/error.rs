//! Error types for harness runs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("Server returned: {status} {reason} ({path})")]
    Transport {
        path: String,
        status: u16,
        reason: String,
    },

    #[error("Leaked interpreter diagnostic in {path}:\n{}", .lines.join("\n"))]
    LeakedDiagnostic { path: String, lines: Vec<String> },

    #[error("Expected a JSON object from {path}, got:\n{body}")]
    Protocol { path: String, body: String },

    #[error("Assertion failed: {0}")]
    Assertion(String),

    #[error("Provisioning failed: {0}")]
    Provisioning(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Run interrupted")]
    Interrupted,

    #[error("{source}\nTeardown also failed:\n  {}", .teardown.join("\n  "))]
    Teardown {
        source: Box<HarnessError>,
        teardown: Vec<String>,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl HarnessError {
    pub fn assertion(message: impl Into<String>) -> Self {
        HarnessError::Assertion(message.into())
    }

    pub fn provisioning(message: impl Into<String>) -> Self {
        HarnessError::Provisioning(message.into())
    }

    /// Attach teardown failures to this error. Returns `self` untouched when
    /// teardown went cleanly.
    pub fn with_teardown(self, teardown: Vec<String>) -> Self {
        if teardown.is_empty() {
            self
        } else {
            HarnessError::Teardown {
                source: Box::new(self),
                teardown,
            }
        }
    }

    /// Short class name used in reports
    pub fn kind(&self) -> &'static str {
        match self {
            HarnessError::Transport { .. } => "TransportError",
            HarnessError::LeakedDiagnostic { .. } => "LeakedDiagnostic",
            HarnessError::Protocol { .. } => "ProtocolError",
            HarnessError::Assertion(_) => "AssertionError",
            HarnessError::Provisioning(_) => "ProvisioningError",
            HarnessError::Config(_) => "ConfigError",
            HarnessError::Interrupted => "Interrupted",
            HarnessError::Teardown { source, .. } => source.kind(),
            HarnessError::Http(_) => "HttpError",
            HarnessError::Database(_) => "DatabaseError",
            HarnessError::Io(_) => "IoError",
            HarnessError::Json(_) => "JsonError",
        }
    }
}

pub type HarnessResult<T> = Result<T, HarnessError>;

/// Bail out of a step with an [`HarnessError::Assertion`] unless `cond` holds.
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            return Err($crate::error::HarnessError::Assertion(format!($($arg)+)));
        }
    };
}
