pub mod audit;
pub mod error;
pub mod groups;
pub mod hasher;
pub mod hydrate;
pub mod service;

use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use audit::AuditLog;
use database::{
    Database, GroupPermissionStore, GroupRepository, PermissionRepository,
    SqliteGroupPermissions, SqliteGroupRepository, SqlitePermissionRepository, SqliteUserGroups,
    SqliteUserPermissions, SqliteUserRepository, UserGroupStore, UserPermissionStore,
    UserRepository,
};
use hydrate::Hydrator;

pub use audit::{AuditLevel, AuditLog as Audit};
pub use error::{Result, UserError};
pub use groups::GroupService;
pub use hasher::{CredentialHasher, Sha256Hasher};
pub use service::UserService;

/// Configuration for the access management system.
#[derive(Debug, Clone)]
pub struct AccessConfig {
    /// Path to the database file
    pub database_path: PathBuf,
    /// Directory for the audit log files
    pub audit_log_dir: PathBuf,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("data/access.db"),
            audit_log_dir: PathBuf::from("data/logs"),
        }
    }
}

/// Access management system: wires the repositories and association stores
/// once at startup and hands out the lifecycle services.
pub struct AccessManager {
    database: Database,
    permissions: Arc<dyn PermissionRepository>,
    users: UserService,
    groups: GroupService,
}

impl AccessManager {
    /// Open the database and build the services over it.
    pub async fn open(config: AccessConfig) -> Result<Self> {
        info!("Initializing access management system");

        let database = Database::new(&config.database_path.to_string_lossy()).await?;
        let pool = database.get_pool();

        let user_repo: Arc<dyn UserRepository> = Arc::new(SqliteUserRepository::new(pool.clone()));
        let permission_repo: Arc<dyn PermissionRepository> =
            Arc::new(SqlitePermissionRepository::new(pool.clone()));
        let group_repo: Arc<dyn GroupRepository> =
            Arc::new(SqliteGroupRepository::new(pool.clone()));

        let user_permissions: Arc<dyn UserPermissionStore> =
            Arc::new(SqliteUserPermissions::new(pool.clone()));
        let user_groups: Arc<dyn UserGroupStore> = Arc::new(SqliteUserGroups::new(pool.clone()));
        let group_permissions: Arc<dyn GroupPermissionStore> =
            Arc::new(SqliteGroupPermissions::new(pool));

        let hydrator = Hydrator::new(
            user_permissions.clone(),
            user_groups.clone(),
            group_permissions.clone(),
        );
        let hasher: Arc<dyn CredentialHasher> = Arc::new(Sha256Hasher);
        let audit = Arc::new(AuditLog::new(config.audit_log_dir));

        let users = UserService::new(
            user_repo,
            permission_repo.clone(),
            group_repo.clone(),
            user_permissions,
            user_groups,
            hydrator.clone(),
            hasher,
            audit.clone(),
        );
        let groups = GroupService::new(
            group_repo,
            permission_repo.clone(),
            group_permissions,
            hydrator,
            audit,
        );

        info!("Access management system initialized");

        Ok(Self {
            database,
            permissions: permission_repo,
            users,
            groups,
        })
    }

    /// Open with the default configuration.
    pub async fn open_default() -> Result<Self> {
        Self::open(AccessConfig::default()).await
    }

    /// The user lifecycle service.
    pub fn users(&self) -> &UserService {
        &self.users
    }

    /// The group lifecycle service.
    pub fn groups(&self) -> &GroupService {
        &self.groups
    }

    /// The permission repository, for administering the permission catalog.
    pub fn permissions(&self) -> &Arc<dyn PermissionRepository> {
        &self.permissions
    }

    /// The underlying database.
    pub fn database(&self) -> &Database {
        &self.database
    }
}
