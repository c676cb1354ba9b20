use thiserror::Error;
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, UserError>;

/// Errors surfaced by the lifecycle services.
///
/// "User not found", "referenced access not found" and "storage
/// unavailable" stay distinct so callers can decide between prompting for
/// corrected input and surfacing a system error.
#[derive(Error, Debug)]
pub enum UserError {
    #[error("store error: {0}")]
    Store(#[from] database::StoreError),

    #[error("access model error: {0}")]
    Access(#[from] access::AccessError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("user not found: {0}")]
    UserNotFound(Uuid),

    #[error("group not found: {0}")]
    GroupNotFound(Uuid),

    #[error("referenced access does not exist: {0}")]
    AccessNotFound(Uuid),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("a group may only contain permissions; nested group {0} is not supported")]
    NestedGroup(Uuid),
}
