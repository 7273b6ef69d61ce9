//! Backend seams consumed by the engine
//!
//! The engine reads roles, teams, and version counters through
//! [`PermissionStore`] and keeps computed snapshots in a [`SnapshotCache`].
//! Both are injected trait objects so the engine runs against an in-memory
//! fake in tests and a shared backend in production.

pub mod memory;

pub use memory::{MemoryPermissionStore, MemorySnapshotCache};

use crate::error::Result;
use crate::types::{
    EffectivePermissionSet, PermissionKey, Principal, PrincipalId, Role, RoleId, Team,
};
use async_trait::async_trait;
use std::time::Duration;

/// Source-of-truth reads plus the permissions-version counter
///
/// All reads are point-in-time; the engine never assumes two calls observe
/// the same state. Transient failures surface as
/// [`PermissionError::StoreUnavailable`](crate::PermissionError::StoreUnavailable).
#[async_trait]
pub trait PermissionStore: Send + Sync {
    /// Fetch a principal record, including its current permissions version
    async fn principal(&self, id: &str) -> Result<Option<Principal>>;

    /// Role ids directly assigned to the principal
    async fn assigned_roles(&self, principal_id: &str) -> Result<Vec<RoleId>>;

    /// Fetch a role definition by id
    async fn role(&self, id: &str) -> Result<Option<Role>>;

    /// Teams within the organization that the principal is a member of
    async fn teams_for_principal(
        &self,
        principal_id: &str,
        organization_id: &str,
    ) -> Result<Vec<Team>>;

    /// Direct permission scopes of an API key
    async fn api_key_permissions(&self, principal_id: &str) -> Result<Vec<PermissionKey>>;

    /// Current permissions version, read fresh from the principal record
    async fn permissions_version(&self, principal_id: &str) -> Result<u64>;

    /// Atomically increment the permissions version, returning the new value
    async fn bump_permissions_version(&self, principal_id: &str) -> Result<u64>;

    /// All principals belonging to an organization (invalidation fan-out)
    async fn principals_in_organization(
        &self,
        organization_id: &str,
    ) -> Result<Vec<PrincipalId>>;
}

/// Snapshot cache with TTL semantics
///
/// Entries are immutable once written; invalidation happens by version-key
/// rotation (users) or outright deletion (API keys), never by mutation.
#[async_trait]
pub trait SnapshotCache: Send + Sync {
    /// Fetch a cached snapshot if present and not expired
    async fn get(&self, key: &str) -> Result<Option<EffectivePermissionSet>>;

    /// Store a snapshot under the given key for at most `ttl`
    async fn set(&self, key: &str, value: EffectivePermissionSet, ttl: Duration) -> Result<()>;

    /// Remove a snapshot outright
    async fn delete(&self, key: &str) -> Result<()>;
}
