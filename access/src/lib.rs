pub mod error;
pub mod node;
pub mod user;

pub use error::{AccessError, Result};
pub use node::{AccessKind, AccessNode, Group, Permission};
pub use user::User;
