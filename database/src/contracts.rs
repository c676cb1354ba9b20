//! Persistence contracts for the entity repositories and the three
//! many-to-many association relations.
//!
//! Every trait object is `Send + Sync` so the repositories can be built
//! once at startup and shared as `Arc<dyn …>` across the lifecycle
//! services, and so tests can substitute in-memory doubles.

use crate::error::Result;
use access::{Group, Permission, User};
use async_trait::async_trait;
use uuid::Uuid;

/// CRUD over stored permissions.
#[async_trait]
pub trait PermissionRepository: Send + Sync {
    async fn add(&self, permission: &Permission) -> Result<()>;
    async fn update(&self, permission: &Permission) -> Result<()>;
    async fn remove(&self, id: Uuid) -> Result<()>;
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Permission>>;
    async fn get_all(&self) -> Result<Vec<Permission>>;
}

/// CRUD over stored groups. Only the scalar attributes are persisted here;
/// a group's permission edges live in the group↔permission relation.
#[async_trait]
pub trait GroupRepository: Send + Sync {
    async fn add(&self, group: &Group) -> Result<()>;
    async fn update(&self, group: &Group) -> Result<()>;
    async fn remove(&self, id: Uuid) -> Result<()>;
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Group>>;
    async fn get_all(&self) -> Result<Vec<Group>>;
}

/// CRUD over stored users. Returned users carry scalar attributes only;
/// hydration of the access collection is the caller's responsibility.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn add(&self, user: &User) -> Result<()>;
    async fn update(&self, user: &User) -> Result<()>;
    async fn remove(&self, id: Uuid) -> Result<()>;
    async fn get_by_id(&self, id: Uuid) -> Result<Option<User>>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;
    async fn get_all(&self) -> Result<Vec<User>>;
}

/// The user↔permission relation.
///
/// `list_by_owner` returns fully materialized permissions in one round
/// trip: the query joins the link table against the permission table so no
/// per-child follow-up lookup is ever needed.
#[async_trait]
pub trait UserPermissionStore: Send + Sync {
    /// Fails with `InvalidArgument` when either id is nil.
    async fn link(&self, user_id: Uuid, permission_id: Uuid) -> Result<()>;
    /// Idempotent: unlinking a missing row is not an error.
    async fn unlink(&self, user_id: Uuid, permission_id: Uuid) -> Result<()>;
    async fn unlink_all_by_owner(&self, user_id: Uuid) -> Result<()>;
    async fn unlink_all_by_target(&self, permission_id: Uuid) -> Result<()>;
    async fn list_by_owner(&self, user_id: Uuid) -> Result<Vec<Permission>>;
}

/// The user↔group relation. Listed groups are shallow: their children are
/// empty until explicitly hydrated from the group↔permission relation.
#[async_trait]
pub trait UserGroupStore: Send + Sync {
    async fn link(&self, user_id: Uuid, group_id: Uuid) -> Result<()>;
    async fn unlink(&self, user_id: Uuid, group_id: Uuid) -> Result<()>;
    async fn unlink_all_by_owner(&self, user_id: Uuid) -> Result<()>;
    async fn unlink_all_by_target(&self, group_id: Uuid) -> Result<()>;
    async fn list_by_owner(&self, user_id: Uuid) -> Result<Vec<Group>>;
}

/// The group↔permission relation.
#[async_trait]
pub trait GroupPermissionStore: Send + Sync {
    async fn link(&self, group_id: Uuid, permission_id: Uuid) -> Result<()>;
    async fn unlink(&self, group_id: Uuid, permission_id: Uuid) -> Result<()>;
    async fn unlink_all_by_owner(&self, group_id: Uuid) -> Result<()>;
    async fn unlink_all_by_target(&self, permission_id: Uuid) -> Result<()>;
    async fn list_by_owner(&self, group_id: Uuid) -> Result<Vec<Permission>>;
}
