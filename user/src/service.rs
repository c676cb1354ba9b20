//! User access lifecycle: registration, update, deletion and reads that
//! keep a user's persisted scalar row and its association rows consistent.
//!
//! Every referenced access is validated against its owning repository
//! *before* any write is issued, so a `NotFound` aborts with zero rows
//! written. Within one call the write order is fixed: owner row, link
//! removals, link insertions. There is no optimistic-concurrency token;
//! concurrent Update/Delete calls for the same user need caller-supplied
//! serialization.

use crate::audit::{AuditLevel, AuditLog};
use crate::error::{Result, UserError};
use crate::hasher::CredentialHasher;
use crate::hydrate::Hydrator;
use access::{AccessNode, User};
use database::{
    GroupRepository, PermissionRepository, StoreError, UserGroupStore, UserPermissionStore,
    UserRepository,
};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

pub struct UserService {
    users: Arc<dyn UserRepository>,
    permissions: Arc<dyn PermissionRepository>,
    groups: Arc<dyn GroupRepository>,
    user_permissions: Arc<dyn UserPermissionStore>,
    user_groups: Arc<dyn UserGroupStore>,
    hydrator: Hydrator,
    hasher: Arc<dyn CredentialHasher>,
    audit: Arc<AuditLog>,
}

impl UserService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        users: Arc<dyn UserRepository>,
        permissions: Arc<dyn PermissionRepository>,
        groups: Arc<dyn GroupRepository>,
        user_permissions: Arc<dyn UserPermissionStore>,
        user_groups: Arc<dyn UserGroupStore>,
        hydrator: Hydrator,
        hasher: Arc<dyn CredentialHasher>,
        audit: Arc<AuditLog>,
    ) -> Self {
        Self {
            users,
            permissions,
            groups,
            user_permissions,
            user_groups,
            hydrator,
            hasher,
            audit,
        }
    }

    /// Check that every access in the list exists in its owning repository.
    /// Runs before any write so a dangling reference leaves no partial state.
    async fn validate_accesses(&self, accesses: &[AccessNode]) -> Result<()> {
        for node in accesses {
            match node {
                AccessNode::Permission(p) => {
                    if self.permissions.get_by_id(p.id).await?.is_none() {
                        return Err(UserError::AccessNotFound(p.id));
                    }
                }
                AccessNode::Group(g) => {
                    if self.groups.get_by_id(g.id).await?.is_none() {
                        return Err(UserError::AccessNotFound(g.id));
                    }
                }
            }
        }
        Ok(())
    }

    /// Link each access exactly once. A caller-built list may repeat an
    /// id; inserting it twice would trip the link table's primary key
    /// mid-write, so duplicates are collapsed here.
    async fn link_accesses(&self, user_id: Uuid, accesses: &[AccessNode]) -> Result<()> {
        let mut seen = HashSet::new();
        for node in accesses {
            if !seen.insert(node.id()) {
                continue;
            }
            match node {
                AccessNode::Permission(p) => self.user_permissions.link(user_id, p.id).await?,
                AccessNode::Group(g) => self.user_groups.link(user_id, g.id).await?,
            }
        }
        Ok(())
    }

    /// Persist a new user and one association row per granted access.
    pub async fn register(&self, user: &User) -> Result<()> {
        if user.username.trim().is_empty() {
            return Err(UserError::InvalidArgument(
                "username must not be empty".into(),
            ));
        }

        self.validate_accesses(&user.accesses).await?;

        self.users.add(user).await?;
        self.link_accesses(user.id, &user.accesses).await?;

        info!("Registered user {} with {} accesses", user.username, user.accesses.len());
        self.audit
            .record(
                AuditLevel::Info,
                &format!("user {} registered", user.username),
            )
            .await;
        Ok(())
    }

    /// Hash the password and register in one step.
    pub async fn register_with_password(
        &self,
        username: &str,
        password: &str,
        accesses: Vec<AccessNode>,
    ) -> Result<User> {
        let mut user = User::new(username, self.hasher.hash(password));
        user.accesses = accesses;
        self.register(&user).await?;
        Ok(user)
    }

    /// Update scalar fields and replace the user's associations wholesale:
    /// all existing links in both relations are removed, then the supplied
    /// list is re-linked. A full replace, not a diff.
    pub async fn update(&self, user: &User) -> Result<()> {
        self.validate_accesses(&user.accesses).await?;

        match self.users.update(user).await {
            Err(StoreError::NotFound(_)) => return Err(UserError::UserNotFound(user.id)),
            other => other?,
        }

        self.user_permissions.unlink_all_by_owner(user.id).await?;
        self.user_groups.unlink_all_by_owner(user.id).await?;
        self.link_accesses(user.id, &user.accesses).await?;

        info!("Updated user {} ({} accesses)", user.username, user.accesses.len());
        self.audit
            .record(AuditLevel::Info, &format!("user {} updated", user.username))
            .await;
        Ok(())
    }

    /// Remove a user's associations in both relations, then the user row.
    pub async fn delete(&self, user_id: Uuid) -> Result<()> {
        let user = self
            .users
            .get_by_id(user_id)
            .await?
            .ok_or(UserError::UserNotFound(user_id))?;

        self.user_permissions.unlink_all_by_owner(user_id).await?;
        self.user_groups.unlink_all_by_owner(user_id).await?;
        self.users.remove(user_id).await?;

        info!("Deleted user {}", user.username);
        self.audit
            .record(AuditLevel::Info, &format!("user {} deleted", user.username))
            .await;
        Ok(())
    }

    /// Load a user and hydrate its access collection.
    pub async fn get_by_id(&self, user_id: Uuid) -> Result<User> {
        let mut user = self
            .users
            .get_by_id(user_id)
            .await?
            .ok_or(UserError::UserNotFound(user_id))?;
        self.hydrator.hydrate_user(&mut user).await?;
        Ok(user)
    }

    /// Load all users, each with a hydrated access collection.
    pub async fn get_all(&self) -> Result<Vec<User>> {
        let mut users = self.users.get_all().await?;
        for user in &mut users {
            self.hydrator.hydrate_user(user).await?;
        }
        Ok(users)
    }

    /// Validate a username/password pair. A missing user and a wrong
    /// password both come back as `false`, never as an error.
    pub async fn login(&self, username: &str, password: &str) -> Result<bool> {
        let user = match self.users.find_by_username(username).await? {
            Some(user) => user,
            None => {
                self.audit
                    .record(
                        AuditLevel::Warning,
                        &format!("login failed: user {} not found", username),
                    )
                    .await;
                return Ok(false);
            }
        };

        if !self.hasher.verify(password, &user.password_hash) {
            self.audit
                .record(
                    AuditLevel::Warning,
                    &format!("login failed: wrong password for {}", username),
                )
                .await;
            return Ok(false);
        }

        self.audit
            .record(AuditLevel::Info, &format!("user {} logged in", username))
            .await;
        Ok(true)
    }
}
