use thiserror::Error;

pub type Result<T> = std::result::Result<T, AccessError>;

#[derive(Error, Debug)]
pub enum AccessError {
    /// Structural violation of the composite contract: a permission is a
    /// leaf and can never hold children. This must hold for every caller,
    /// it is not a validation that can be skipped.
    #[error("cannot {0} on a permission: permissions are leaf access nodes")]
    LeafMutation(&'static str),

    #[error("unknown access kind: {0}")]
    UnknownKind(i64),
}
