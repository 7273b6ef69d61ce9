//! Core data model for effective permission resolution

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Unique principal identifier (user or API key)
pub type PrincipalId = String;

/// Unique organization identifier
pub type OrganizationId = String;

/// Unique role identifier
pub type RoleId = String;

/// Unique team identifier
pub type TeamId = String;

/// Opaque permission key (e.g., "identities.write"); unique by key
pub type PermissionKey = String;

/// Whether a role applies platform-wide or inside a single organization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RoleScope {
    /// Role applies across all organizations
    Platform,
    /// Role applies only within its owning organization
    Org,
}

/// Kind of principal being authorized
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PrincipalKind {
    /// Human user, optionally carrying a role name from before the RBAC model
    User {
        #[serde(skip_serializing_if = "Option::is_none")]
        legacy_role: Option<String>,
    },
    /// API key with direct permission scopes, no roles or teams
    ApiKey,
}

/// Principal (user or API key) with its monotonically increasing
/// permissions version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Principal identifier
    pub id: PrincipalId,

    /// User or API key
    pub kind: PrincipalKind,

    /// Monotonic counter; bumping it invalidates every cached snapshot
    /// keyed under an older value
    pub permissions_version: u64,
}

impl Principal {
    /// Create a user principal
    pub fn user(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: PrincipalKind::User { legacy_role: None },
            permissions_version: 0,
        }
    }

    /// Create an API-key principal
    pub fn api_key(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: PrincipalKind::ApiKey,
            permissions_version: 0,
        }
    }

    /// Attach a pre-RBAC legacy role name (users only)
    pub fn with_legacy_role(mut self, role: impl Into<String>) -> Self {
        if let PrincipalKind::User { legacy_role } = &mut self.kind {
            *legacy_role = Some(role.into());
        }
        self
    }

    /// The legacy role name, if this principal is a user that carries one
    pub fn legacy_role(&self) -> Option<&str> {
        match &self.kind {
            PrincipalKind::User { legacy_role } => legacy_role.as_deref(),
            PrincipalKind::ApiKey => None,
        }
    }
}

/// Role definition with optional parent link and granted permission keys
///
/// Parent links form a forest that is not structurally guaranteed to be
/// acyclic; traversal is responsible for cycle safety.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// Role identifier
    pub id: RoleId,

    /// Role name (recorded in the effective set's role lists)
    pub name: String,

    /// Platform-wide or organization-scoped
    pub scope: RoleScope,

    /// Owning organization; required when scope is `Org`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<OrganizationId>,

    /// Optional parent role whose permissions are inherited
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<RoleId>,

    /// Permission keys granted directly by this role
    #[serde(default)]
    pub permissions: HashSet<PermissionKey>,
}

impl Role {
    /// Create a platform-scoped role
    pub fn platform(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            scope: RoleScope::Platform,
            organization_id: None,
            parent_id: None,
            permissions: HashSet::new(),
        }
    }

    /// Create an organization-scoped role
    pub fn org(
        id: impl Into<String>,
        name: impl Into<String>,
        organization_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            scope: RoleScope::Org,
            organization_id: Some(organization_id.into()),
            parent_id: None,
            permissions: HashSet::new(),
        }
    }

    /// Set the parent role
    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    /// Grant a permission key
    pub fn with_permission(mut self, key: impl Into<String>) -> Self {
        self.permissions.insert(key.into());
        self
    }
}

/// Team scoped to one organization, with directly granted permission keys
///
/// Teams have no hierarchy of their own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    /// Team identifier
    pub id: TeamId,

    /// Owning organization
    pub organization_id: OrganizationId,

    /// Permission keys granted to every member
    #[serde(default)]
    pub permissions: HashSet<PermissionKey>,
}

impl Team {
    /// Create a team within an organization
    pub fn new(id: impl Into<String>, organization_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            organization_id: organization_id.into(),
            permissions: HashSet::new(),
        }
    }

    /// Grant a permission key to team members
    pub fn with_permission(mut self, key: impl Into<String>) -> Self {
        self.permissions.insert(key.into());
        self
    }
}

/// Resolution mode requested by the calling middleware
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessMode {
    /// Organization-scoped user check; requires an organization context
    User,
    /// API-key check against the key's direct permission scopes
    ApiKey,
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::ApiKey => write!(f, "api_key"),
        }
    }
}

/// Role names recorded while aggregating, split by scope
///
/// Order preserves discovery order but carries no meaning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveRoles {
    /// Names of platform-scoped roles that contributed
    #[serde(default)]
    pub platform: Vec<String>,

    /// Names of organization-scoped roles that contributed
    #[serde(default)]
    pub org: Vec<String>,
}

/// The computed, cacheable resolution result
///
/// Represents only what roles and teams grant; the ABAC overlay is applied
/// at check time and is never baked into this set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectivePermissionSet {
    /// Deduplicated permission keys usable by the principal
    #[serde(default)]
    pub permissions: HashSet<PermissionKey>,

    /// Role names that contributed, by scope
    #[serde(default)]
    pub roles: EffectiveRoles,

    /// Teams the principal belongs to within the queried organization
    #[serde(default)]
    pub team_ids: Vec<TeamId>,
}

impl EffectivePermissionSet {
    /// Whether the set grants the given permission key
    pub fn contains(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }

    /// True when roles and teams granted nothing
    pub fn is_empty_grant(&self) -> bool {
        self.permissions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_principal_carries_legacy_role() {
        let principal = Principal::user("user:alice").with_legacy_role("admin");

        assert_eq!(principal.id, "user:alice");
        assert_eq!(principal.legacy_role(), Some("admin"));
        assert_eq!(principal.permissions_version, 0);
    }

    #[test]
    fn test_api_key_principal_has_no_legacy_role() {
        let key = Principal::api_key("key:ci-deploy").with_legacy_role("admin");

        // with_legacy_role is a no-op for API keys
        assert_eq!(key.legacy_role(), None);
        assert_eq!(key.kind, PrincipalKind::ApiKey);
    }

    #[test]
    fn test_role_builders() {
        let role = Role::org("role-1", "Editor", "org-a")
            .with_parent("role-2")
            .with_permission("docs.write");

        assert_eq!(role.scope, RoleScope::Org);
        assert_eq!(role.organization_id.as_deref(), Some("org-a"));
        assert_eq!(role.parent_id.as_deref(), Some("role-2"));
        assert!(role.permissions.contains("docs.write"));

        let platform = Role::platform("role-3", "Operator");
        assert_eq!(platform.scope, RoleScope::Platform);
        assert!(platform.organization_id.is_none());
    }

    #[test]
    fn test_access_mode_display() {
        assert_eq!(AccessMode::User.to_string(), "user");
        assert_eq!(AccessMode::ApiKey.to_string(), "api_key");
    }

    #[test]
    fn test_empty_grant() {
        let mut set = EffectivePermissionSet::default();
        assert!(set.is_empty_grant());

        set.permissions.insert("docs.read".to_string());
        assert!(!set.is_empty_grant());
        assert!(set.contains("docs.read"));
        assert!(!set.contains("docs.write"));
    }
}
