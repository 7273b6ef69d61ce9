//! In-memory store backends
//!
//! Thread-safe via DashMap. Used as the default embedded backend and as the
//! fake in tests; production deployments inject their own implementations of
//! the store traits.

use super::{PermissionStore, SnapshotCache};
use crate::error::{PermissionError, Result};
use crate::types::{
    EffectivePermissionSet, PermissionKey, Principal, PrincipalId, Role, RoleId, Team, TeamId,
};
use async_trait::async_trait;
use dashmap::DashMap;
use std::time::{Duration, Instant};

/// In-memory [`PermissionStore`]
#[derive(Default)]
pub struct MemoryPermissionStore {
    principals: DashMap<PrincipalId, Principal>,
    roles: DashMap<RoleId, Role>,
    assignments: DashMap<PrincipalId, Vec<RoleId>>,
    teams: DashMap<TeamId, Team>,
    memberships: DashMap<PrincipalId, Vec<TeamId>>,
    api_key_scopes: DashMap<PrincipalId, Vec<PermissionKey>>,
    org_members: DashMap<String, Vec<PrincipalId>>,
}

impl MemoryPermissionStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a principal record
    pub fn insert_principal(&self, principal: Principal) {
        self.principals.insert(principal.id.clone(), principal);
    }

    /// Record organization membership for invalidation fan-out
    pub fn add_to_organization(&self, principal_id: &str, organization_id: &str) {
        let mut members = self
            .org_members
            .entry(organization_id.to_string())
            .or_default();
        if !members.iter().any(|m| m == principal_id) {
            members.push(principal_id.to_string());
        }
    }

    /// Insert or replace a role definition
    pub fn insert_role(&self, role: Role) {
        self.roles.insert(role.id.clone(), role);
    }

    /// Assign a role to a principal
    pub fn assign_role(&self, principal_id: &str, role_id: &str) {
        let mut assigned = self
            .assignments
            .entry(principal_id.to_string())
            .or_default();
        if !assigned.iter().any(|r| r == role_id) {
            assigned.push(role_id.to_string());
        }
    }

    /// Remove a role assignment; the caller is responsible for bumping the
    /// principal's version afterwards
    pub fn revoke_role(&self, principal_id: &str, role_id: &str) {
        if let Some(mut assigned) = self.assignments.get_mut(principal_id) {
            assigned.retain(|r| r != role_id);
        }
    }

    /// Insert or replace a team
    pub fn insert_team(&self, team: Team) {
        self.teams.insert(team.id.clone(), team);
    }

    /// Add a principal to a team
    pub fn add_team_member(&self, principal_id: &str, team_id: &str) {
        let mut teams = self
            .memberships
            .entry(principal_id.to_string())
            .or_default();
        if !teams.iter().any(|t| t == team_id) {
            teams.push(team_id.to_string());
        }
    }

    /// Remove a principal from a team
    pub fn remove_team_member(&self, principal_id: &str, team_id: &str) {
        if let Some(mut teams) = self.memberships.get_mut(principal_id) {
            teams.retain(|t| t != team_id);
        }
    }

    /// Set the direct permission scopes of an API key
    pub fn set_api_key_permissions(&self, principal_id: &str, permissions: Vec<PermissionKey>) {
        self.api_key_scopes
            .insert(principal_id.to_string(), permissions);
    }
}

#[async_trait]
impl PermissionStore for MemoryPermissionStore {
    async fn principal(&self, id: &str) -> Result<Option<Principal>> {
        Ok(self.principals.get(id).map(|p| p.clone()))
    }

    async fn assigned_roles(&self, principal_id: &str) -> Result<Vec<RoleId>> {
        Ok(self
            .assignments
            .get(principal_id)
            .map(|a| a.clone())
            .unwrap_or_default())
    }

    async fn role(&self, id: &str) -> Result<Option<Role>> {
        Ok(self.roles.get(id).map(|r| r.clone()))
    }

    async fn teams_for_principal(
        &self,
        principal_id: &str,
        organization_id: &str,
    ) -> Result<Vec<Team>> {
        let team_ids = self
            .memberships
            .get(principal_id)
            .map(|t| t.clone())
            .unwrap_or_default();

        let mut teams = Vec::new();
        for team_id in team_ids {
            if let Some(team) = self.teams.get(&team_id) {
                if team.organization_id == organization_id {
                    teams.push(team.clone());
                }
            }
        }
        Ok(teams)
    }

    async fn api_key_permissions(&self, principal_id: &str) -> Result<Vec<PermissionKey>> {
        Ok(self
            .api_key_scopes
            .get(principal_id)
            .map(|p| p.clone())
            .unwrap_or_default())
    }

    async fn permissions_version(&self, principal_id: &str) -> Result<u64> {
        self.principals
            .get(principal_id)
            .map(|p| p.permissions_version)
            .ok_or_else(|| PermissionError::PrincipalNotFound(principal_id.to_string()))
    }

    async fn bump_permissions_version(&self, principal_id: &str) -> Result<u64> {
        let mut principal = self
            .principals
            .get_mut(principal_id)
            .ok_or_else(|| PermissionError::PrincipalNotFound(principal_id.to_string()))?;
        principal.permissions_version += 1;
        Ok(principal.permissions_version)
    }

    async fn principals_in_organization(&self, organization_id: &str) -> Result<Vec<PrincipalId>> {
        Ok(self
            .org_members
            .get(organization_id)
            .map(|m| m.clone())
            .unwrap_or_default())
    }
}

/// Cached snapshot with its expiry deadline
#[derive(Clone)]
struct CachedEntry {
    value: EffectivePermissionSet,
    expires_at: Instant,
}

/// In-memory [`SnapshotCache`] with TTL expiry
#[derive(Default)]
pub struct MemorySnapshotCache {
    entries: DashMap<String, CachedEntry>,
}

impl MemorySnapshotCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (possibly expired, not yet reaped) entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl SnapshotCache for MemorySnapshotCache {
    async fn get(&self, key: &str) -> Result<Option<EffectivePermissionSet>> {
        if let Some(entry) = self.entries.get(key) {
            if Instant::now() >= entry.expires_at {
                drop(entry);
                self.entries.remove(key);
                return Ok(None);
            }
            return Ok(Some(entry.value.clone()));
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: EffectivePermissionSet, ttl: Duration) -> Result<()> {
        self.entries.insert(
            key.to_string(),
            CachedEntry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}
