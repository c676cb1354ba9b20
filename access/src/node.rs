use crate::error::{AccessError, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Classification of what a permission unlocks.
///
/// Persisted as an integer column, so the discriminant mapping below is
/// part of the storage format and must stay stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccessKind {
    Ui,
    Control,
    UseCase,
}

impl AccessKind {
    pub fn as_i64(self) -> i64 {
        match self {
            AccessKind::Ui => 0,
            AccessKind::Control => 1,
            AccessKind::UseCase => 2,
        }
    }

    pub fn from_i64(value: i64) -> Result<Self> {
        match value {
            0 => Ok(AccessKind::Ui),
            1 => Ok(AccessKind::Control),
            2 => Ok(AccessKind::UseCase),
            other => Err(AccessError::UnknownKind(other)),
        }
    }
}

/// Leaf access node: a single grant carrying an opaque data key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub id: Uuid,
    pub name: String,
    pub data_key: String,
    pub kind: AccessKind,
}

impl Permission {
    pub fn new(name: impl Into<String>, data_key: impl Into<String>, kind: AccessKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            data_key: data_key.into(),
            kind,
        }
    }
}

/// Composite access node: a named collection of child access nodes.
///
/// Children are kept in insertion order for display. Identity is by `id`
/// only; duplicates are not deduplicated on `add`, and `remove` clears
/// every child sharing the given id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub children: Vec<AccessNode>,
}

impl Group {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: description.into(),
            children: Vec::new(),
        }
    }

    pub fn add(&mut self, child: AccessNode) {
        self.children.push(child);
    }

    /// Removes every child whose id matches, returning how many were removed.
    pub fn remove(&mut self, child_id: Uuid) -> usize {
        let before = self.children.len();
        self.children.retain(|c| c.id() != child_id);
        before - self.children.len()
    }

    /// Number of direct children. Nested groups are not counted recursively.
    pub fn count(&self) -> usize {
        self.children.len()
    }
}

/// An access-control node: either a single permission (leaf) or a named
/// group of permissions (composite).
///
/// Both variants answer `add`/`remove`/`count` so traversal code can treat
/// them uniformly; the leaf arm rejects mutation instead of ignoring it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessNode {
    Permission(Permission),
    Group(Group),
}

impl AccessNode {
    pub fn id(&self) -> Uuid {
        match self {
            AccessNode::Permission(p) => p.id,
            AccessNode::Group(g) => g.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            AccessNode::Permission(p) => &p.name,
            AccessNode::Group(g) => &g.name,
        }
    }

    /// Appends a child. Fails on a permission: leaves hold no children.
    pub fn add(&mut self, child: AccessNode) -> Result<()> {
        match self {
            AccessNode::Permission(_) => Err(AccessError::LeafMutation("add")),
            AccessNode::Group(g) => {
                g.add(child);
                Ok(())
            }
        }
    }

    /// Removes all children matching `child_id`, returning how many were
    /// removed. Fails on a permission.
    pub fn remove(&mut self, child_id: Uuid) -> Result<usize> {
        match self {
            AccessNode::Permission(_) => Err(AccessError::LeafMutation("remove")),
            AccessNode::Group(g) => Ok(g.remove(child_id)),
        }
    }

    /// A permission always counts as one entity; a group reports its number
    /// of direct children.
    pub fn count(&self) -> usize {
        match self {
            AccessNode::Permission(_) => 1,
            AccessNode::Group(g) => g.count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn permission(name: &str) -> Permission {
        Permission::new(name, "key", AccessKind::Ui)
    }

    #[test]
    fn test_permission_rejects_add() {
        let mut node = AccessNode::Permission(permission("view_reports"));
        let child = AccessNode::Permission(permission("other"));

        let err = node.add(child).unwrap_err();
        assert!(matches!(err, AccessError::LeafMutation("add")));
    }

    #[test]
    fn test_permission_rejects_remove() {
        let mut node = AccessNode::Permission(permission("view_reports"));

        let err = node.remove(Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, AccessError::LeafMutation("remove")));
    }

    #[test]
    fn test_permission_count_is_always_one() {
        let node = AccessNode::Permission(permission("view_reports"));
        assert_eq!(node.count(), 1);
    }

    #[test]
    fn test_group_add_and_count() {
        let mut group = AccessNode::Group(Group::new("reporting", "Report access"));
        assert_eq!(group.count(), 0);

        group
            .add(AccessNode::Permission(permission("view_reports")))
            .unwrap();
        assert_eq!(group.count(), 1);

        group
            .add(AccessNode::Permission(permission("export_reports")))
            .unwrap();
        assert_eq!(group.count(), 2);
    }

    #[test]
    fn test_group_remove_clears_all_matching_ids() {
        let mut group = Group::new("reporting", "Report access");
        let p = permission("view_reports");
        let id = p.id;

        // Duplicate identities can coexist when inserted directly.
        group.add(AccessNode::Permission(p.clone()));
        group.add(AccessNode::Permission(p));
        group.add(AccessNode::Permission(permission("export_reports")));
        assert_eq!(group.count(), 3);

        let removed = group.remove(id);
        assert_eq!(removed, 2);
        assert_eq!(group.count(), 1);
    }

    #[test]
    fn test_group_remove_missing_id_is_noop() {
        let mut group = Group::new("reporting", "Report access");
        group.add(AccessNode::Permission(permission("view_reports")));

        let removed = group.remove(Uuid::new_v4());
        assert_eq!(removed, 0);
        assert_eq!(group.count(), 1);
    }

    #[test]
    fn test_group_count_is_not_recursive() {
        let mut inner = Group::new("inner", "");
        inner.add(AccessNode::Permission(permission("a")));
        inner.add(AccessNode::Permission(permission("b")));

        let mut outer = Group::new("outer", "");
        outer.add(AccessNode::Group(inner));

        assert_eq!(outer.count(), 1);
    }

    #[test]
    fn test_access_kind_roundtrip() {
        for kind in [AccessKind::Ui, AccessKind::Control, AccessKind::UseCase] {
            assert_eq!(AccessKind::from_i64(kind.as_i64()).unwrap(), kind);
        }
        assert!(matches!(
            AccessKind::from_i64(7),
            Err(AccessError::UnknownKind(7))
        ));
    }

    #[test]
    fn test_node_accessors_dispatch() {
        let p = permission("view_reports");
        let pid = p.id;
        let node = AccessNode::Permission(p);
        assert_eq!(node.id(), pid);
        assert_eq!(node.name(), "view_reports");

        let g = Group::new("reporting", "Report access");
        let gid = g.id;
        let node = AccessNode::Group(g);
        assert_eq!(node.id(), gid);
        assert_eq!(node.name(), "reporting");
    }
}
