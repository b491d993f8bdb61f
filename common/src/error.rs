//! Error types for administrative operations.

use crate::StatusSnapshot;
use thiserror::Error;

/// Main error type for rsinit operations.
#[derive(Error, Debug, Clone)]
pub enum AdminError {
    /// Transport-level failure reaching the deployment.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Operation did not complete in time (including server selection).
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// The deployment rejected an administrative command.
    #[error("Command failed ({code_name}, code {code}): {message}")]
    Command {
        code: i32,
        code_name: String,
        message: String,
    },

    /// A reply arrived but could not be interpreted.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The member never reached a stable role within the attempt budget.
    #[error("Replica set not ready after {attempts} attempts")]
    NotReady {
        attempts: u32,
        last_status: Option<Box<StatusSnapshot>>,
    },

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AdminError {
    /// Build a command error from its parts.
    pub fn command(code: i32, code_name: impl Into<String>, message: impl Into<String>) -> Self {
        AdminError::Command {
            code,
            code_name: code_name.into(),
            message: message.into(),
        }
    }

    /// Check if this error means the deployment could not be reached at all.
    pub fn is_transient(&self) -> bool {
        matches!(self, AdminError::Connection(_) | AdminError::Timeout(_))
    }

    /// Get error code for log output.
    pub fn error_code(&self) -> &'static str {
        match self {
            AdminError::Connection(_) => "CONNECTION_ERROR",
            AdminError::Timeout(_) => "TIMEOUT",
            AdminError::Command { .. } => "COMMAND_FAILED",
            AdminError::InvalidResponse(_) => "INVALID_RESPONSE",
            AdminError::Configuration(_) => "CONFIGURATION_ERROR",
            AdminError::NotReady { .. } => "NOT_READY",
            AdminError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Structured dump of the error, suitable for console output.
    pub fn to_json(&self) -> serde_json::Value {
        let mut value = serde_json::json!({
            "error": self.error_code(),
            "message": self.to_string(),
        });
        match self {
            AdminError::Command {
                code, code_name, ..
            } => {
                value["code"] = serde_json::json!(code);
                value["codeName"] = serde_json::json!(code_name);
            }
            AdminError::NotReady { last_status, .. } => {
                value["lastStatus"] = serde_json::to_value(last_status).unwrap_or_default();
            }
            _ => {}
        }
        value
    }
}

/// Result type alias for administrative operations.
pub type AdminResult<T> = std::result::Result<T, AdminError>;
