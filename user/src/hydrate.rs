//! Hydration of in-memory composite trees from association rows.
//!
//! Hydration is intentionally one level deep, matching the flat two-tier
//! model the association relations encode (`User -> {Permission, Group}`,
//! `Group -> {Permission}`). A group attached to a user comes back with
//! empty children; a caller that needs the expanded tree hydrates each
//! nested group explicitly.

use crate::error::Result;
use access::{AccessNode, Group, User};
use database::{GroupPermissionStore, UserGroupStore, UserPermissionStore};
use std::sync::Arc;
use tracing::debug;

#[derive(Clone)]
pub struct Hydrator {
    user_permissions: Arc<dyn UserPermissionStore>,
    user_groups: Arc<dyn UserGroupStore>,
    group_permissions: Arc<dyn GroupPermissionStore>,
}

impl Hydrator {
    pub fn new(
        user_permissions: Arc<dyn UserPermissionStore>,
        user_groups: Arc<dyn UserGroupStore>,
        group_permissions: Arc<dyn GroupPermissionStore>,
    ) -> Self {
        Self {
            user_permissions,
            user_groups,
            group_permissions,
        }
    }

    /// Populate `user.accesses` from the user's two association relations.
    /// The user's scalar attributes must already be loaded.
    pub async fn hydrate_user(&self, user: &mut User) -> Result<()> {
        let permissions = self.user_permissions.list_by_owner(user.id).await?;
        let groups = self.user_groups.list_by_owner(user.id).await?;

        debug!(
            "Hydrating user {}: {} permissions, {} groups",
            user.id,
            permissions.len(),
            groups.len()
        );

        user.accesses
            .extend(permissions.into_iter().map(AccessNode::Permission));
        user.accesses
            .extend(groups.into_iter().map(AccessNode::Group));
        Ok(())
    }

    /// Populate `group.children` from the group↔permission relation.
    pub async fn hydrate_group(&self, group: &mut Group) -> Result<()> {
        let permissions = self.group_permissions.list_by_owner(group.id).await?;

        debug!(
            "Hydrating group {}: {} permissions",
            group.id,
            permissions.len()
        );

        group
            .children
            .extend(permissions.into_iter().map(AccessNode::Permission));
        Ok(())
    }
}
