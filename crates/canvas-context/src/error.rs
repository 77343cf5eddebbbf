use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContextError {
    #[error("no page or component with id '{0}'")]
    UnknownDocument(String),

    #[error("host returned no outline for {kind} '{id}'")]
    MissingOutline { id: String, kind: &'static str },
}

pub type Result<T> = std::result::Result<T, ContextError>;
