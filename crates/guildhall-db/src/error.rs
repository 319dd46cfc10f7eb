use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

/// Store-level failures. Conflict variants (`DuplicateSubmission`,
/// `UserNotFound`, `SubmissionNotFound`) are expected outcomes the API layer
/// maps to 4xx; `Sqlite`/`Internal` are opaque 500s.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("user not found")]
    UserNotFound,

    #[error("submission not found")]
    SubmissionNotFound,

    #[error("a live submission for this quest already exists")]
    DuplicateSubmission,

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error("{0}")]
    Internal(String),
}
