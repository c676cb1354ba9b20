//! Sqlite-backed entity repositories for users, permissions and groups.

use crate::contracts::{GroupRepository, PermissionRepository, UserRepository};
use crate::error::{Result, StoreError};
use access::{AccessKind, Group, Permission, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, Row, Sqlite};
use tracing::info;
use uuid::Uuid;

/// Rejects the nil identifier before any query is issued.
pub(crate) fn ensure_id(id: Uuid, what: &str) -> Result<()> {
    if id.is_nil() {
        return Err(StoreError::InvalidArgument(format!(
            "{} must not be the nil identifier",
            what
        )));
    }
    Ok(())
}

pub(crate) fn permission_from_row(row: &SqliteRow) -> Result<Permission> {
    Ok(Permission {
        id: Uuid::parse_str(row.try_get::<String, _>("id")?.as_str())?,
        name: row.try_get("name")?,
        data_key: row.try_get("data_key")?,
        kind: AccessKind::from_i64(row.try_get::<i64, _>("kind")?)?,
    })
}

pub(crate) fn group_from_row(row: &SqliteRow) -> Result<Group> {
    Ok(Group {
        id: Uuid::parse_str(row.try_get::<String, _>("id")?.as_str())?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        children: Vec::new(),
    })
}

fn user_from_row(row: &SqliteRow) -> Result<User> {
    Ok(User {
        id: Uuid::parse_str(row.try_get::<String, _>("id")?.as_str())?,
        username: row.try_get("username")?,
        password_hash: row.try_get("password_hash")?,
        last_modified: row.try_get::<DateTime<Utc>, _>("last_modified")?,
        accesses: Vec::new(),
    })
}

pub struct SqlitePermissionRepository {
    pool: Pool<Sqlite>,
}

impl SqlitePermissionRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PermissionRepository for SqlitePermissionRepository {
    async fn add(&self, permission: &Permission) -> Result<()> {
        ensure_id(permission.id, "permission id")?;

        sqlx::query("INSERT INTO permissions (id, name, data_key, kind) VALUES (?, ?, ?, ?)")
            .bind(permission.id.to_string())
            .bind(&permission.name)
            .bind(&permission.data_key)
            .bind(permission.kind.as_i64())
            .execute(&self.pool)
            .await?;

        info!("Created permission {} ({})", permission.name, permission.id);
        Ok(())
    }

    async fn update(&self, permission: &Permission) -> Result<()> {
        ensure_id(permission.id, "permission id")?;

        let result =
            sqlx::query("UPDATE permissions SET name = ?, data_key = ?, kind = ? WHERE id = ?")
                .bind(&permission.name)
                .bind(&permission.data_key)
                .bind(permission.kind.as_i64())
                .bind(permission.id.to_string())
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!(
                "permission {}",
                permission.id
            )));
        }
        Ok(())
    }

    async fn remove(&self, id: Uuid) -> Result<()> {
        ensure_id(id, "permission id")?;

        let result = sqlx::query("DELETE FROM permissions WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("permission {}", id)));
        }

        info!("Deleted permission {}", id);
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Permission>> {
        ensure_id(id, "permission id")?;

        let row = sqlx::query("SELECT id, name, data_key, kind FROM permissions WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(permission_from_row).transpose()
    }

    async fn get_all(&self) -> Result<Vec<Permission>> {
        let rows = sqlx::query("SELECT id, name, data_key, kind FROM permissions ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(permission_from_row).collect()
    }
}

pub struct SqliteGroupRepository {
    pool: Pool<Sqlite>,
}

impl SqliteGroupRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GroupRepository for SqliteGroupRepository {
    async fn add(&self, group: &Group) -> Result<()> {
        ensure_id(group.id, "group id")?;

        sqlx::query("INSERT INTO access_groups (id, name, description) VALUES (?, ?, ?)")
            .bind(group.id.to_string())
            .bind(&group.name)
            .bind(&group.description)
            .execute(&self.pool)
            .await?;

        info!("Created group {} ({})", group.name, group.id);
        Ok(())
    }

    async fn update(&self, group: &Group) -> Result<()> {
        ensure_id(group.id, "group id")?;

        let result = sqlx::query("UPDATE access_groups SET name = ?, description = ? WHERE id = ?")
            .bind(&group.name)
            .bind(&group.description)
            .bind(group.id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("group {}", group.id)));
        }
        Ok(())
    }

    async fn remove(&self, id: Uuid) -> Result<()> {
        ensure_id(id, "group id")?;

        let result = sqlx::query("DELETE FROM access_groups WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("group {}", id)));
        }

        info!("Deleted group {}", id);
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Group>> {
        ensure_id(id, "group id")?;

        let row = sqlx::query("SELECT id, name, description FROM access_groups WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(group_from_row).transpose()
    }

    async fn get_all(&self) -> Result<Vec<Group>> {
        let rows = sqlx::query("SELECT id, name, description FROM access_groups ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(group_from_row).collect()
    }
}

pub struct SqliteUserRepository {
    pool: Pool<Sqlite>,
}

impl SqliteUserRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn add(&self, user: &User) -> Result<()> {
        ensure_id(user.id, "user id")?;

        sqlx::query(
            "INSERT INTO users (id, username, password_hash, last_modified) VALUES (?, ?, ?, ?)",
        )
        .bind(user.id.to_string())
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.last_modified)
        .execute(&self.pool)
        .await?;

        info!("Created user {} ({})", user.username, user.id);
        Ok(())
    }

    async fn update(&self, user: &User) -> Result<()> {
        ensure_id(user.id, "user id")?;

        let result = sqlx::query(
            "UPDATE users SET username = ?, password_hash = ?, last_modified = ? WHERE id = ?",
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.last_modified)
        .bind(user.id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("user {}", user.id)));
        }
        Ok(())
    }

    async fn remove(&self, id: Uuid) -> Result<()> {
        ensure_id(id, "user id")?;

        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("user {}", id)));
        }

        info!("Deleted user {}", id);
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<User>> {
        ensure_id(id, "user id")?;

        let row = sqlx::query(
            "SELECT id, username, password_hash, last_modified FROM users WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let row = sqlx::query(
            "SELECT id, username, password_hash, last_modified FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn get_all(&self) -> Result<Vec<User>> {
        let rows = sqlx::query(
            "SELECT id, username, password_hash, last_modified FROM users ORDER BY username",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(user_from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;
    use access::AccessKind;
    use tempfile::TempDir;

    async fn setup() -> (TempDir, Database) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test_repos.db");
        let db = Database::new(db_path.to_str().unwrap()).await.unwrap();
        (temp_dir, db)
    }

    #[tokio::test]
    async fn test_permission_crud() {
        let (_dir, db) = setup().await;
        let repo = SqlitePermissionRepository::new(db.get_pool());

        let mut permission = Permission::new("view_reports", "reports.view", AccessKind::Ui);
        repo.add(&permission).await.unwrap();

        let loaded = repo.get_by_id(permission.id).await.unwrap().unwrap();
        assert_eq!(loaded, permission);

        permission.name = "view_all_reports".to_string();
        permission.kind = AccessKind::UseCase;
        repo.update(&permission).await.unwrap();

        let loaded = repo.get_by_id(permission.id).await.unwrap().unwrap();
        assert_eq!(loaded.name, "view_all_reports");
        assert_eq!(loaded.kind, AccessKind::UseCase);

        repo.remove(permission.id).await.unwrap();
        assert!(repo.get_by_id(permission.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_permission_nil_id_rejected() {
        let (_dir, db) = setup().await;
        let repo = SqlitePermissionRepository::new(db.get_pool());

        let err = repo.get_by_id(Uuid::nil()).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_remove_missing_permission_is_not_found() {
        let (_dir, db) = setup().await;
        let repo = SqlitePermissionRepository::new(db.get_pool());

        let err = repo.remove(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_group_crud() {
        let (_dir, db) = setup().await;
        let repo = SqliteGroupRepository::new(db.get_pool());

        let mut group = Group::new("reporting", "Report access");
        repo.add(&group).await.unwrap();

        let loaded = repo.get_by_id(group.id).await.unwrap().unwrap();
        assert_eq!(loaded.name, "reporting");
        assert_eq!(loaded.description, "Report access");
        // Children are never persisted with the scalar row.
        assert!(loaded.children.is_empty());

        group.description = "All reporting permissions".to_string();
        repo.update(&group).await.unwrap();
        let loaded = repo.get_by_id(group.id).await.unwrap().unwrap();
        assert_eq!(loaded.description, "All reporting permissions");

        repo.remove(group.id).await.unwrap();
        assert!(repo.get_by_id(group.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_user_crud_and_find_by_username() {
        let (_dir, db) = setup().await;
        let repo = SqliteUserRepository::new(db.get_pool());

        let user = User::new("alice", "digest");
        repo.add(&user).await.unwrap();

        let loaded = repo.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(loaded.id, user.id);
        assert_eq!(loaded.password_hash, "digest");
        assert!(loaded.accesses.is_empty());

        assert!(repo.find_by_username("bob").await.unwrap().is_none());

        let all = repo.get_all().await.unwrap();
        assert_eq!(all.len(), 1);

        repo.remove(user.id).await.unwrap();
        assert!(repo.get_by_id(user.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_is_storage_failure() {
        let (_dir, db) = setup().await;
        let repo = SqliteUserRepository::new(db.get_pool());

        repo.add(&User::new("alice", "digest")).await.unwrap();
        let err = repo.add(&User::new("alice", "other")).await.unwrap_err();
        assert!(matches!(err, StoreError::Storage(_)));
    }
}
