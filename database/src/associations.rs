//! Sqlite-backed stores for the three many-to-many association relations.
//!
//! Each `list_by_owner` joins the link table against the entity table so a
//! single round trip returns everything needed to materialize the linked
//! nodes. The original fan-out of one lookup per child is gone.

use crate::contracts::{GroupPermissionStore, UserGroupStore, UserPermissionStore};
use crate::error::Result;
use crate::repositories::{ensure_id, group_from_row, permission_from_row};
use access::{Group, Permission};
use async_trait::async_trait;
use sqlx::{Pool, Sqlite};
use tracing::debug;
use uuid::Uuid;

async fn link_pair(
    pool: &Pool<Sqlite>,
    sql: &str,
    owner: Uuid,
    target: Uuid,
    owner_what: &str,
    target_what: &str,
) -> Result<()> {
    ensure_id(owner, owner_what)?;
    ensure_id(target, target_what)?;

    sqlx::query(sql)
        .bind(owner.to_string())
        .bind(target.to_string())
        .execute(pool)
        .await?;

    debug!("Linked {} {} -> {} {}", owner_what, owner, target_what, target);
    Ok(())
}

async fn unlink_pair(pool: &Pool<Sqlite>, sql: &str, owner: Uuid, target: Uuid) -> Result<()> {
    // Deleting a missing row affects zero rows and that is fine: unlink is
    // idempotent by contract.
    sqlx::query(sql)
        .bind(owner.to_string())
        .bind(target.to_string())
        .execute(pool)
        .await?;
    Ok(())
}

async fn unlink_all(pool: &Pool<Sqlite>, sql: &str, id: Uuid, what: &str) -> Result<()> {
    ensure_id(id, what)?;

    let result = sqlx::query(sql).bind(id.to_string()).execute(pool).await?;
    debug!("Removed {} link rows for {} {}", result.rows_affected(), what, id);
    Ok(())
}

/// The user↔permission relation.
pub struct SqliteUserPermissions {
    pool: Pool<Sqlite>,
}

impl SqliteUserPermissions {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserPermissionStore for SqliteUserPermissions {
    async fn link(&self, user_id: Uuid, permission_id: Uuid) -> Result<()> {
        link_pair(
            &self.pool,
            "INSERT INTO user_permissions (user_id, permission_id) VALUES (?, ?)",
            user_id,
            permission_id,
            "user id",
            "permission id",
        )
        .await
    }

    async fn unlink(&self, user_id: Uuid, permission_id: Uuid) -> Result<()> {
        unlink_pair(
            &self.pool,
            "DELETE FROM user_permissions WHERE user_id = ? AND permission_id = ?",
            user_id,
            permission_id,
        )
        .await
    }

    async fn unlink_all_by_owner(&self, user_id: Uuid) -> Result<()> {
        unlink_all(
            &self.pool,
            "DELETE FROM user_permissions WHERE user_id = ?",
            user_id,
            "user id",
        )
        .await
    }

    async fn unlink_all_by_target(&self, permission_id: Uuid) -> Result<()> {
        unlink_all(
            &self.pool,
            "DELETE FROM user_permissions WHERE permission_id = ?",
            permission_id,
            "permission id",
        )
        .await
    }

    async fn list_by_owner(&self, user_id: Uuid) -> Result<Vec<Permission>> {
        ensure_id(user_id, "user id")?;

        let rows = sqlx::query(
            r#"
            SELECT p.id, p.name, p.data_key, p.kind
            FROM user_permissions up
            JOIN permissions p ON p.id = up.permission_id
            WHERE up.user_id = ?
            ORDER BY p.name
            "#,
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(permission_from_row).collect()
    }
}

/// The user↔group relation.
pub struct SqliteUserGroups {
    pool: Pool<Sqlite>,
}

impl SqliteUserGroups {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserGroupStore for SqliteUserGroups {
    async fn link(&self, user_id: Uuid, group_id: Uuid) -> Result<()> {
        link_pair(
            &self.pool,
            "INSERT INTO user_groups (user_id, group_id) VALUES (?, ?)",
            user_id,
            group_id,
            "user id",
            "group id",
        )
        .await
    }

    async fn unlink(&self, user_id: Uuid, group_id: Uuid) -> Result<()> {
        unlink_pair(
            &self.pool,
            "DELETE FROM user_groups WHERE user_id = ? AND group_id = ?",
            user_id,
            group_id,
        )
        .await
    }

    async fn unlink_all_by_owner(&self, user_id: Uuid) -> Result<()> {
        unlink_all(
            &self.pool,
            "DELETE FROM user_groups WHERE user_id = ?",
            user_id,
            "user id",
        )
        .await
    }

    async fn unlink_all_by_target(&self, group_id: Uuid) -> Result<()> {
        unlink_all(
            &self.pool,
            "DELETE FROM user_groups WHERE group_id = ?",
            group_id,
            "group id",
        )
        .await
    }

    async fn list_by_owner(&self, user_id: Uuid) -> Result<Vec<Group>> {
        ensure_id(user_id, "user id")?;

        let rows = sqlx::query(
            r#"
            SELECT g.id, g.name, g.description
            FROM user_groups ug
            JOIN access_groups g ON g.id = ug.group_id
            WHERE ug.user_id = ?
            ORDER BY g.name
            "#,
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(group_from_row).collect()
    }
}

/// The group↔permission relation.
pub struct SqliteGroupPermissions {
    pool: Pool<Sqlite>,
}

impl SqliteGroupPermissions {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GroupPermissionStore for SqliteGroupPermissions {
    async fn link(&self, group_id: Uuid, permission_id: Uuid) -> Result<()> {
        link_pair(
            &self.pool,
            "INSERT INTO group_permissions (group_id, permission_id) VALUES (?, ?)",
            group_id,
            permission_id,
            "group id",
            "permission id",
        )
        .await
    }

    async fn unlink(&self, group_id: Uuid, permission_id: Uuid) -> Result<()> {
        unlink_pair(
            &self.pool,
            "DELETE FROM group_permissions WHERE group_id = ? AND permission_id = ?",
            group_id,
            permission_id,
        )
        .await
    }

    async fn unlink_all_by_owner(&self, group_id: Uuid) -> Result<()> {
        unlink_all(
            &self.pool,
            "DELETE FROM group_permissions WHERE group_id = ?",
            group_id,
            "group id",
        )
        .await
    }

    async fn unlink_all_by_target(&self, permission_id: Uuid) -> Result<()> {
        unlink_all(
            &self.pool,
            "DELETE FROM group_permissions WHERE permission_id = ?",
            permission_id,
            "permission id",
        )
        .await
    }

    async fn list_by_owner(&self, group_id: Uuid) -> Result<Vec<Permission>> {
        ensure_id(group_id, "group id")?;

        let rows = sqlx::query(
            r#"
            SELECT p.id, p.name, p.data_key, p.kind
            FROM group_permissions gp
            JOIN permissions p ON p.id = gp.permission_id
            WHERE gp.group_id = ?
            ORDER BY p.name
            "#,
        )
        .bind(group_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(permission_from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::{GroupRepository, PermissionRepository, UserRepository};
    use crate::error::StoreError;
    use crate::repositories::{
        SqliteGroupRepository, SqlitePermissionRepository, SqliteUserRepository,
    };
    use crate::Database;
    use access::{AccessKind, User};
    use tempfile::TempDir;

    async fn setup() -> (TempDir, Database) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test_links.db");
        let db = Database::new(db_path.to_str().unwrap()).await.unwrap();
        (temp_dir, db)
    }

    async fn seed_user(db: &Database, username: &str) -> User {
        let user = User::new(username, "digest");
        SqliteUserRepository::new(db.get_pool())
            .add(&user)
            .await
            .unwrap();
        user
    }

    async fn seed_permission(db: &Database, name: &str) -> Permission {
        let permission = Permission::new(name, "key", AccessKind::Control);
        SqlitePermissionRepository::new(db.get_pool())
            .add(&permission)
            .await
            .unwrap();
        permission
    }

    #[tokio::test]
    async fn test_link_and_list_denormalized() {
        let (_dir, db) = setup().await;
        let store = SqliteUserPermissions::new(db.get_pool());

        let user = seed_user(&db, "alice").await;
        let p1 = seed_permission(&db, "audit_trail").await;
        let p2 = seed_permission(&db, "view_reports").await;

        store.link(user.id, p1.id).await.unwrap();
        store.link(user.id, p2.id).await.unwrap();

        let listed = store.list_by_owner(user.id).await.unwrap();
        assert_eq!(listed.len(), 2);
        // Rows come back fully materialized, display attributes included.
        assert_eq!(listed[0], p1);
        assert_eq!(listed[1], p2);
    }

    #[tokio::test]
    async fn test_link_rejects_nil_ids() {
        let (_dir, db) = setup().await;
        let store = SqliteUserPermissions::new(db.get_pool());

        let err = store.link(Uuid::nil(), Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidArgument(_)));

        let err = store.link(Uuid::new_v4(), Uuid::nil()).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_unlink_is_idempotent() {
        let (_dir, db) = setup().await;
        let store = SqliteUserPermissions::new(db.get_pool());

        let user = seed_user(&db, "alice").await;
        let p = seed_permission(&db, "view_reports").await;

        store.link(user.id, p.id).await.unwrap();
        store.unlink(user.id, p.id).await.unwrap();
        // Second removal of the same link is not an error.
        store.unlink(user.id, p.id).await.unwrap();

        assert!(store.list_by_owner(user.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unlink_all_by_owner_and_target() {
        let (_dir, db) = setup().await;
        let store = SqliteGroupPermissions::new(db.get_pool());

        let group = Group::new("reporting", "");
        SqliteGroupRepository::new(db.get_pool())
            .add(&group)
            .await
            .unwrap();
        let p1 = seed_permission(&db, "view_reports").await;
        let p2 = seed_permission(&db, "export_reports").await;

        store.link(group.id, p1.id).await.unwrap();
        store.link(group.id, p2.id).await.unwrap();

        store.unlink_all_by_target(p1.id).await.unwrap();
        assert_eq!(store.list_by_owner(group.id).await.unwrap(), vec![p2.clone()]);

        store.unlink_all_by_owner(group.id).await.unwrap();
        assert!(store.list_by_owner(group.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_user_group_rows_are_shallow() {
        let (_dir, db) = setup().await;
        let user_groups = SqliteUserGroups::new(db.get_pool());
        let group_permissions = SqliteGroupPermissions::new(db.get_pool());

        let user = seed_user(&db, "alice").await;
        let group = Group::new("reporting", "Report access");
        SqliteGroupRepository::new(db.get_pool())
            .add(&group)
            .await
            .unwrap();
        let p = seed_permission(&db, "view_reports").await;

        user_groups.link(user.id, group.id).await.unwrap();
        group_permissions.link(group.id, p.id).await.unwrap();

        let listed = user_groups.list_by_owner(user.id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "reporting");
        // One level deep: the group's own permissions are not expanded here.
        assert!(listed[0].children.is_empty());
    }
}
