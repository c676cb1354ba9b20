//! Group lifecycle: keeps a group's scalar row and its group↔permission
//! association rows consistent, mirroring the user lifecycle.
//!
//! The model is strictly two-tier: a stored group holds permissions only.
//! A nested group in the children list is rejected up front.

use crate::audit::{AuditLevel, AuditLog};
use crate::error::{Result, UserError};
use crate::hydrate::Hydrator;
use access::{AccessNode, Group};
use database::{GroupPermissionStore, GroupRepository, PermissionRepository, StoreError};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

pub struct GroupService {
    groups: Arc<dyn GroupRepository>,
    permissions: Arc<dyn PermissionRepository>,
    group_permissions: Arc<dyn GroupPermissionStore>,
    hydrator: Hydrator,
    audit: Arc<AuditLog>,
}

impl GroupService {
    pub fn new(
        groups: Arc<dyn GroupRepository>,
        permissions: Arc<dyn PermissionRepository>,
        group_permissions: Arc<dyn GroupPermissionStore>,
        hydrator: Hydrator,
        audit: Arc<AuditLog>,
    ) -> Self {
        Self {
            groups,
            permissions,
            group_permissions,
            hydrator,
            audit,
        }
    }

    /// Check children are permissions and that each one exists, before any
    /// write is issued. Repeated ids collapse to one link; inserting the
    /// same pair twice would trip the link table's primary key mid-write.
    async fn validate_children(&self, children: &[AccessNode]) -> Result<Vec<Uuid>> {
        let mut seen = HashSet::new();
        let mut ids = Vec::with_capacity(children.len());
        for child in children {
            match child {
                AccessNode::Permission(p) => {
                    if self.permissions.get_by_id(p.id).await?.is_none() {
                        return Err(UserError::AccessNotFound(p.id));
                    }
                    if seen.insert(p.id) {
                        ids.push(p.id);
                    }
                }
                AccessNode::Group(g) => return Err(UserError::NestedGroup(g.id)),
            }
        }
        Ok(ids)
    }

    /// Persist a new group and one association row per child permission.
    pub async fn register(&self, group: &Group) -> Result<()> {
        if group.name.trim().is_empty() {
            return Err(UserError::InvalidArgument(
                "group name must not be empty".into(),
            ));
        }

        let child_ids = self.validate_children(&group.children).await?;

        self.groups.add(group).await?;
        for permission_id in child_ids {
            self.group_permissions.link(group.id, permission_id).await?;
        }

        info!("Registered group {} with {} permissions", group.name, group.count());
        self.audit
            .record(
                AuditLevel::Info,
                &format!("group {} registered", group.name),
            )
            .await;
        Ok(())
    }

    /// Update scalar fields and replace the group's permission links
    /// wholesale, like the user lifecycle's full-replace update.
    pub async fn update(&self, group: &Group) -> Result<()> {
        let child_ids = self.validate_children(&group.children).await?;

        match self.groups.update(group).await {
            Err(StoreError::NotFound(_)) => return Err(UserError::GroupNotFound(group.id)),
            other => other?,
        }

        self.group_permissions.unlink_all_by_owner(group.id).await?;
        for permission_id in child_ids {
            self.group_permissions.link(group.id, permission_id).await?;
        }

        self.audit
            .record(AuditLevel::Info, &format!("group {} updated", group.name))
            .await;
        Ok(())
    }

    /// Remove the group's permission associations, then the group row.
    /// No cascade: permissions the group pointed at are left alone, and so
    /// are user↔group rows naming this group (reads simply stop seeing it).
    pub async fn delete(&self, group_id: Uuid) -> Result<()> {
        let group = self
            .groups
            .get_by_id(group_id)
            .await?
            .ok_or(UserError::GroupNotFound(group_id))?;

        self.group_permissions.unlink_all_by_owner(group_id).await?;
        self.groups.remove(group_id).await?;

        info!("Deleted group {}", group.name);
        self.audit
            .record(AuditLevel::Info, &format!("group {} deleted", group.name))
            .await;
        Ok(())
    }

    /// Load a group and hydrate its permission children.
    pub async fn get_by_id(&self, group_id: Uuid) -> Result<Group> {
        let mut group = self
            .groups
            .get_by_id(group_id)
            .await?
            .ok_or(UserError::GroupNotFound(group_id))?;
        self.hydrator.hydrate_group(&mut group).await?;
        Ok(group)
    }

    /// Load all groups, each with hydrated permission children.
    pub async fn get_all(&self) -> Result<Vec<Group>> {
        let mut groups = self.groups.get_all().await?;
        for group in &mut groups {
            self.hydrator.hydrate_group(group).await?;
        }
        Ok(groups)
    }
}
