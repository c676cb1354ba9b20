use crate::node::AccessNode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A system user and the access nodes directly granted to it.
///
/// `accesses` is a hydrated view rebuilt from the association rows on every
/// read; it is never the source of truth and is never persisted directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub last_modified: DateTime<Utc>,
    #[serde(default)]
    pub accesses: Vec<AccessNode>,
}

impl User {
    pub fn new(username: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            password_hash: password_hash.into(),
            last_modified: Utc::now(),
            accesses: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{AccessKind, Permission};

    #[test]
    fn test_new_user_has_no_accesses() {
        let user = User::new("alice", "digest");
        assert!(user.accesses.is_empty());
        assert!(!user.id.is_nil());
        assert_eq!(user.username, "alice");
    }

    #[test]
    fn test_accesses_hold_mixed_nodes() {
        let mut user = User::new("alice", "digest");
        user.accesses.push(AccessNode::Permission(Permission::new(
            "view_reports",
            "reports",
            AccessKind::Ui,
        )));
        user.accesses.push(AccessNode::Group(crate::node::Group::new(
            "reporting",
            "Report access",
        )));
        assert_eq!(user.accesses.len(), 2);
    }
}
