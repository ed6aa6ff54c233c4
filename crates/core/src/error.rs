//! Error types for the Reagent domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all Reagent operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Errors raised by LLM provider backends.
///
/// These are transport-level failures. They are *not* part of the
/// recoverable loop taxonomy: the agent loop propagates them to the caller
/// rather than feeding them back to the model.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Errors raised by tool registration and execution.
///
/// `NotFound`, `ExecutionFailed`, and `Timeout` are recoverable inside the
/// agent loop: they become error Observations that the model can react to.
/// `Duplicate` only occurs at registration time.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool already registered: {0}")]
    Duplicate(String),

    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Tool execution failed: {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Tool timed out: {tool_name} after {timeout_secs}s")]
    Timeout { tool_name: String, timeout_secs: u64 },

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),
}

impl ToolError {
    /// Shorthand for an execution failure.
    pub fn execution(tool_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ExecutionFailed {
            tool_name: tool_name.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_status() {
        let err = Error::Provider(ProviderError::ApiError {
            status_code: 503,
            message: "upstream unavailable".into(),
        });
        assert!(err.to_string().contains("503"));
        assert!(err.to_string().contains("upstream unavailable"));
    }

    #[test]
    fn tool_error_displays_tool_name() {
        let err = Error::Tool(ToolError::execution("calculator", "division by zero"));
        assert!(err.to_string().contains("calculator"));
        assert!(err.to_string().contains("division by zero"));
    }

    #[test]
    fn duplicate_error_names_the_tool() {
        let err = ToolError::Duplicate("web_search".into());
        assert!(err.to_string().contains("web_search"));
    }
}
