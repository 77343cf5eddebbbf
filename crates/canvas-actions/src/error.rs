use thiserror::Error;

/// Reasons a confirmed line did not become a command. These never reach the agent: the
/// parser logs them and moves on to the next line.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActionsError {
    #[error("line is not valid JSON even after repair: {0}")]
    InvalidJson(String),

    #[error("expected [targetId, selector, kind, params], got {0}")]
    NotATuple(String),

    #[error("command has an empty target id")]
    EmptyTarget,

    #[error("unknown operation kind '{0}'")]
    UnknownKind(String),

    #[error("invalid params for {kind}: {reason}")]
    InvalidParams { kind: String, reason: String },
}

impl ActionsError {
    /// Stable name for logs. The variants carry raw agent text, which is never logged as is.
    pub fn code(&self) -> &'static str {
        match self {
            ActionsError::InvalidJson(_) => "invalid_json",
            ActionsError::NotATuple(_) => "not_a_tuple",
            ActionsError::EmptyTarget => "empty_target",
            ActionsError::UnknownKind(_) => "unknown_kind",
            ActionsError::InvalidParams { .. } => "invalid_params",
        }
    }
}

pub type Result<T> = std::result::Result<T, ActionsError>;
