//! Error types for Lantern
//!
//! The analyzer itself never fails; these cover the collaborators around it.

use std::time::Duration;

use thiserror::Error;

pub type LanternResult<T> = std::result::Result<T, LanternError>;

#[derive(Debug, Error)]
pub enum LanternError {
    #[error("{0}")]
    Toolchain(#[from] ToolchainError),

    #[error("{0}")]
    Session(#[from] SessionError),

    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Failures from the external compiler, checker and runner
#[derive(Debug, Error)]
pub enum ToolchainError {
    #[error("Failed to save {path} before running {tool}: {source}")]
    Save {
        tool: String,
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to launch '{command}': {source}. Check [toolchain] in your config.")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Non-zero exit or non-empty standard error; `message` is the tool's
    /// stderr verbatim when it wrote any.
    #[error("{tool} failed: {message}")]
    Failed { tool: String, message: String },

    #[error("{tool} timed out after {}s", .timeout.as_secs())]
    Timeout { tool: String, timeout: Duration },

    #[error("Aborted: {0}")]
    Aborted(String),
}

impl ToolchainError {
    pub fn failed(tool: &str, message: impl Into<String>) -> Self {
        Self::Failed {
            tool: tool.to_string(),
            message: message.into(),
        }
    }

    /// Failures reported by the tool itself, as opposed to launch problems
    pub fn is_tool_failure(&self) -> bool {
        matches!(self, Self::Failed { .. } | Self::Timeout { .. })
    }
}

/// Failures talking to an external language server process
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Failed to start language server: {0}")]
    Start(String),

    #[error("Language server session is not running")]
    NotConnected,

    #[error("Language server terminated unexpectedly")]
    Terminated,

    #[error("'{method}' timed out after {}ms", .timeout.as_millis())]
    Timeout { method: String, timeout: Duration },

    #[error("Server error [{code}]: {message}")]
    Server { code: i32, message: String },

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl SessionError {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminated | Self::NotConnected)
    }
}

impl From<crate::infra::lsp::protocol::ResponseError> for SessionError {
    fn from(err: crate::infra::lsp::protocol::ResponseError) -> Self {
        Self::Server {
            code: err.code,
            message: err.message,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config parse error: {0}")]
    Parse(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_message_is_verbatim() {
        let err = ToolchainError::failed("lanternc", "main.ln:3: unexpected '}'");
        assert_eq!(err.to_string(), "lanternc failed: main.ln:3: unexpected '}'");
        assert!(err.is_tool_failure());
    }

    #[test]
    fn test_timeout_display() {
        let err = ToolchainError::Timeout {
            tool: "lanternc".to_string(),
            timeout: Duration::from_secs(60),
        };
        assert_eq!(err.to_string(), "lanternc timed out after 60s");
        assert!(err.is_tool_failure());
    }

    #[test]
    fn test_spawn_is_not_tool_failure() {
        let err = ToolchainError::Spawn {
            command: "missing".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert!(!err.is_tool_failure());
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_session_error_classification() {
        assert!(SessionError::Terminated.is_terminal());
        assert!(SessionError::NotConnected.is_terminal());
        assert!(!SessionError::Protocol("bad".into()).is_terminal());
    }

    #[test]
    fn test_lantern_error_wraps() {
        let err: LanternError = ConfigError::Parse("bad toml".into()).into();
        assert_eq!(err.to_string(), "Config parse error: bad toml");
    }
}
