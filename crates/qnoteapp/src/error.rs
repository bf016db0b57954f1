use thiserror::Error;

#[derive(Error, Debug)]
pub enum QnoteError {
    #[error("Note not found: {0}")]
    NoteNotFound(String),

    #[error("Not signed in")]
    NotAuthenticated,

    #[error("Invalid note: {0}")]
    InvalidNote(String),

    #[error("Offline: {0}")]
    Offline(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] confique::Error),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Api Error: {0}")]
    Api(String),

    #[error("Remote error: {0}")]
    Remote(#[from] SyncError),
}

pub type Result<T> = std::result::Result<T, QnoteError>;

/// Failures of the remote store contract.
///
/// None of these are fatal: the affected note stays pending and the next
/// reconciliation retries it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    #[error("remote store unreachable: {0}")]
    Unreachable(String),

    #[error("remote request failed: {0}")]
    Request(String),

    #[error("malformed remote document: {0}")]
    Malformed(String),
}
