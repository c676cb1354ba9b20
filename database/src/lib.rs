use sqlx::{Pool, Sqlite, SqlitePool};
use std::path::Path;
use tracing::{debug, info};

pub mod associations;
pub mod contracts;
pub mod error;
pub mod repositories;

pub use associations::{SqliteGroupPermissions, SqliteUserGroups, SqliteUserPermissions};
pub use contracts::{
    GroupPermissionStore, GroupRepository, PermissionRepository, UserGroupStore,
    UserPermissionStore, UserRepository,
};
pub use error::{Result, StoreError};
pub use repositories::{SqliteGroupRepository, SqlitePermissionRepository, SqliteUserRepository};

/// Database connection pool for the access-control store.
///
/// Opening a database runs the idempotent schema migrations, so a freshly
/// created file is immediately usable.
#[derive(Debug)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Open (creating if necessary) the database at the given path.
    pub async fn new(database_path: &str) -> Result<Self> {
        // Ensure the data directory exists
        if let Some(parent) = Path::new(database_path).parent() {
            std::fs::create_dir_all(parent)?;
        }

        info!("Connecting to access database at: {}", database_path);

        let pool = SqlitePool::connect_with(
            sqlx::sqlite::SqliteConnectOptions::new()
                .filename(database_path)
                .create_if_missing(true),
        )
        .await?;

        debug!("Database connection established");

        let db = Self { pool };
        db.run_migrations().await?;

        Ok(db)
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Get a clone of the connection pool
    pub fn get_pool(&self) -> Pool<Sqlite> {
        self.pool.clone()
    }

    /// Run database migrations
    async fn run_migrations(&self) -> Result<()> {
        info!("Running access database migrations");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                username TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                last_modified TIMESTAMP NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS permissions (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                data_key TEXT NOT NULL DEFAULT '',
                kind INTEGER NOT NULL DEFAULT 0
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // "groups" is reserved in some SQL dialects, so the table carries a prefix.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS access_groups (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT ''
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Association rows are the durable representation of the composite
        // edges. No foreign-key cascade: cleanup is explicit, by owner.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS user_permissions (
                user_id TEXT NOT NULL,
                permission_id TEXT NOT NULL,
                PRIMARY KEY (user_id, permission_id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS user_groups (
                user_id TEXT NOT NULL,
                group_id TEXT NOT NULL,
                PRIMARY KEY (user_id, group_id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS group_permissions (
                group_id TEXT NOT NULL,
                permission_id TEXT NOT NULL,
                PRIMARY KEY (group_id, permission_id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Indexes on the owner columns, which every hydration query filters on.
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_user_permissions_user ON user_permissions(user_id)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_user_groups_user ON user_groups(user_id)")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_group_permissions_group ON group_permissions(group_id)",
        )
        .execute(&self.pool)
        .await?;

        info!("Access database migrations completed");

        Ok(())
    }

    /// Check if a table exists
    pub async fn table_exists(&self, table_name: &str) -> Result<bool> {
        let query = r#"
            SELECT COUNT(*) as count
            FROM sqlite_master
            WHERE type='table' AND name=?
        "#;

        let result: (i32,) = sqlx::query_as(query)
            .bind(table_name)
            .fetch_one(&self.pool)
            .await?;

        Ok(result.0 > 0)
    }

    /// Close the database connection
    pub async fn close(self) {
        self.pool.close().await;
        info!("Access database connection closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn create_test_db() -> (TempDir, Database) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test_access.db");
        let db = Database::new(db_path.to_str().unwrap()).await.unwrap();
        (temp_dir, db)
    }

    #[tokio::test]
    async fn test_database_connection() {
        let (_dir, db) = create_test_db().await;
        assert!(db.pool().acquire().await.is_ok());
    }

    #[tokio::test]
    async fn test_migrations_create_all_tables() {
        let (_dir, db) = create_test_db().await;

        for table in [
            "users",
            "permissions",
            "access_groups",
            "user_permissions",
            "user_groups",
            "group_permissions",
        ] {
            assert!(
                db.table_exists(table).await.unwrap(),
                "missing table: {}",
                table
            );
        }
        assert!(!db.table_exists("no_such_table").await.unwrap());
    }
}
