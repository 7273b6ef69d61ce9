//! Engine facade tying aggregation, caching, and the ABAC overlay together
//!
//! ```text
//! check(principal, org, mode, permission)
//!   → VersionedCache.get          (version-keyed read-through)
//!       → PermissionAggregator    (roles + hierarchy + teams + legacy)
//!   → AbacOverlay.denies          (evaluated fresh, never cached)
//! ```

use crate::cache::{CacheStats, VersionedCache};
use crate::error::Result;
use crate::overlay::{AbacOverlay, CheckOutcome};
use crate::store::{MemoryPermissionStore, MemorySnapshotCache, PermissionStore, SnapshotCache};
use crate::types::{AccessMode, EffectivePermissionSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Snapshot time-to-live; version bumps invalidate earlier
    pub snapshot_ttl: Duration,

    /// Denial rules evaluated at check time
    pub overlay: AbacOverlay,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            snapshot_ttl: Duration::from_secs(300),
            overlay: AbacOverlay::default(),
        }
    }
}

/// Effective permission resolution engine
///
/// Stateless per call; a single instance is shared across tasks behind
/// `Arc`. All blocking happens in the injected stores.
pub struct PermissionEngine {
    store: Arc<dyn PermissionStore>,
    cache: VersionedCache,
    overlay: AbacOverlay,
}

impl PermissionEngine {
    /// Create an engine over injected backends
    pub fn new(
        store: Arc<dyn PermissionStore>,
        snapshots: Arc<dyn SnapshotCache>,
        config: EngineConfig,
    ) -> Self {
        let cache = VersionedCache::new(store.clone(), snapshots, config.snapshot_ttl);
        info!(
            ttl_secs = config.snapshot_ttl.as_secs(),
            denial_rules = config.overlay.rule_count(),
            "permission engine initialized"
        );
        Self {
            store,
            cache,
            overlay: config.overlay,
        }
    }

    /// Create an engine backed entirely by in-memory stores
    pub fn in_memory(store: Arc<MemoryPermissionStore>, config: EngineConfig) -> Self {
        Self::new(store, Arc::new(MemorySnapshotCache::new()), config)
    }

    /// Resolve the effective permission set, served from cache when fresh
    pub async fn effective_permissions(
        &self,
        principal_id: &str,
        organization_id: Option<&str>,
        mode: AccessMode,
    ) -> Result<EffectivePermissionSet> {
        self.cache.get(principal_id, organization_id, mode).await
    }

    /// Check one permission, reporting the audit-distinguishable outcome
    ///
    /// The overlay is consulted on every call against the freshly served
    /// set, so rule changes apply without any cache invalidation.
    pub async fn check(
        &self,
        principal_id: &str,
        organization_id: Option<&str>,
        mode: AccessMode,
        permission: &str,
    ) -> Result<CheckOutcome> {
        let effective = self
            .effective_permissions(principal_id, organization_id, mode)
            .await?;

        if !effective.contains(permission) {
            return Ok(CheckOutcome::NotGranted);
        }

        let legacy_role = self
            .store
            .principal(principal_id)
            .await?
            .and_then(|p| p.legacy_role().map(str::to_string));

        if self
            .overlay
            .denies(permission, &effective, legacy_role.as_deref())
        {
            debug!(principal = %principal_id, %permission, "permission stripped by denial rule");
            return Ok(CheckOutcome::DeniedByPolicy);
        }

        Ok(CheckOutcome::Granted)
    }

    /// Whether the principal may exercise the permission
    pub async fn has_permission(
        &self,
        principal_id: &str,
        organization_id: Option<&str>,
        mode: AccessMode,
        permission: &str,
    ) -> Result<bool> {
        Ok(self
            .check(principal_id, organization_id, mode, permission)
            .await?
            .is_granted())
    }

    /// Whether the principal may exercise at least one of the permissions
    pub async fn has_any_permission(
        &self,
        principal_id: &str,
        organization_id: Option<&str>,
        mode: AccessMode,
        required: &[&str],
    ) -> Result<bool> {
        for permission in required {
            if self
                .check(principal_id, organization_id, mode, permission)
                .await?
                .is_granted()
            {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Whether the principal may exercise every one of the permissions
    pub async fn has_all_permissions(
        &self,
        principal_id: &str,
        organization_id: Option<&str>,
        mode: AccessMode,
        required: &[&str],
    ) -> Result<bool> {
        for permission in required {
            if !self
                .check(principal_id, organization_id, mode, permission)
                .await?
                .is_granted()
            {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// The permissions from `required` that the check denies, for 403 bodies
    pub async fn denied_permissions(
        &self,
        principal_id: &str,
        organization_id: Option<&str>,
        mode: AccessMode,
        required: &[&str],
    ) -> Result<Vec<String>> {
        let mut denied = Vec::new();
        for permission in required {
            if !self
                .check(principal_id, organization_id, mode, permission)
                .await?
                .is_granted()
            {
                denied.push((*permission).to_string());
            }
        }
        Ok(denied)
    }

    /// Invalidate every cached snapshot for a principal; returns the new
    /// permissions version
    ///
    /// Role and team mutations must call this before their transaction is
    /// considered complete.
    pub async fn invalidate_principal(&self, principal_id: &str) -> Result<u64> {
        self.cache.invalidate_principal(principal_id).await
    }

    /// Invalidate every principal in an organization; returns the number of
    /// principals bumped
    pub async fn invalidate_organization(&self, organization_id: &str) -> Result<usize> {
        self.cache.invalidate_organization(organization_id).await
    }

    /// Delete an API key's cached snapshot
    pub async fn invalidate_api_key(&self, api_key_id: &str) -> Result<()> {
        self.cache.invalidate_api_key(api_key_id).await
    }

    /// Snapshot cache statistics
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}
