use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum StoreError {
    /// The persistence layer reported an error; the cause is preserved.
    #[error("storage failure: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid identifier in stored row: {0}")]
    Decode(#[from] uuid::Error),

    #[error("access model error: {0}")]
    Domain(#[from] access::AccessError),
}
