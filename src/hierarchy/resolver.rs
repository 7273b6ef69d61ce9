//! Work-list traversal of role parent chains

use crate::error::Result;
use crate::store::PermissionStore;
use crate::types::{PermissionKey, RoleId};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::warn;

/// Resolves the full permission closure of a role
///
/// # Thread Safety
///
/// The resolver is stateless apart from the injected store and can be shared
/// across tasks with `Arc`.
#[derive(Clone)]
pub struct HierarchyResolver {
    store: Arc<dyn PermissionStore>,
}

impl HierarchyResolver {
    /// Create a resolver over the given store
    pub fn new(store: Arc<dyn PermissionStore>) -> Self {
        Self { store }
    }

    /// Resolve a role's permission keys, including every ancestor's
    ///
    /// Traversal is iterative with a visited set: a role reachable through
    /// multiple paths, or through a parent cycle, contributes its keys once
    /// and is never revisited. A parent id that no longer resolves to a role
    /// is tolerated; the branch contributes nothing and a warning is logged.
    pub async fn resolve(&self, role_id: &str) -> Result<HashSet<PermissionKey>> {
        let mut permissions = HashSet::new();
        let mut visited: HashSet<RoleId> = HashSet::new();
        let mut pending = vec![role_id.to_string()];

        while let Some(id) = pending.pop() {
            if !visited.insert(id.clone()) {
                continue;
            }

            match self.store.role(&id).await? {
                Some(role) => {
                    permissions.extend(role.permissions.iter().cloned());
                    if let Some(parent_id) = role.parent_id {
                        pending.push(parent_id);
                    }
                }
                None => {
                    warn!(role_id = %id, "role reference did not resolve, branch contributes nothing");
                }
            }
        }

        Ok(permissions)
    }
}
