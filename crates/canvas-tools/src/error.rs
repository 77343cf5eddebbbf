use canvas_context::ContextError;
use serde_json::Value;
use thiserror::Error;

use crate::host::HostError;

/// Errors surfaced to the agent runtime. Tools return `anyhow::Result`; recover the kind with
/// `err.downcast_ref::<ToolError>()`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    /// Valid JSON that lacks what the tool needs; the agent should re-plan and retry.
    #[error("missing required field `{field}`: {hint}")]
    MissingField { field: &'static str, hint: String },

    /// The content handed back by the runtime is itself an error payload.
    #[error("network error: {0}")]
    Transport(String),

    #[error(transparent)]
    Host(#[from] HostError),

    #[error(transparent)]
    Context(#[from] ContextError),

    #[error("tool call cancelled")]
    Cancelled,
}

impl ToolError {
    pub fn missing(field: &'static str, hint: impl Into<String>) -> Self {
        ToolError::MissingField {
            field,
            hint: hint.into(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, ToolError::MissingField { .. })
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, ToolError::Transport(_))
    }

    pub fn code(&self) -> &'static str {
        match self {
            ToolError::MissingField { .. } => "MISSING_FIELD",
            ToolError::Transport(_) => "TRANSPORT",
            ToolError::Host(_) => "HOST_REJECTED",
            ToolError::Context(_) => "CONTEXT",
            ToolError::Cancelled => "CANCELLED",
        }
    }

    /// Short text shown to the user.
    pub fn user_message(&self) -> String {
        match self {
            ToolError::MissingField { field, hint } => {
                format!("The response did not include a usable {field} ({hint}). Please choose again and retry.")
            }
            ToolError::Transport(_) => "network error".to_string(),
            other => other.to_string(),
        }
    }
}

/// Detects runtime content that is an error object (`{"message": ...}`) instead of a response.
pub fn detect_transport_error(content: &str) -> Option<ToolError> {
    let value = serde_json::from_str::<Value>(content.trim()).ok()?;
    let message = value.get("message")?.as_str()?;
    Some(ToolError::Transport(message.to_string()))
}
