//! Versioned read-through snapshot cache
//!
//! Cache keys embed the principal's current permissions version, read fresh
//! from the source-of-truth store on every `get`. Invalidation bumps the
//! version instead of deleting entries: one O(1) increment makes every key
//! derived from the old version unreachable, across all organizations and
//! modes, and the orphaned entries expire by TTL. API-key snapshots carry no
//! version and are deleted outright.

use crate::aggregator::PermissionAggregator;
use crate::error::{PermissionError, Result};
use crate::store::{PermissionStore, SnapshotCache};
use crate::types::{AccessMode, EffectivePermissionSet};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Read-through cache over the aggregator
pub struct VersionedCache {
    store: Arc<dyn PermissionStore>,
    snapshots: Arc<dyn SnapshotCache>,
    aggregator: PermissionAggregator,
    ttl: Duration,
    stats: DashMap<&'static str, usize>,
}

impl VersionedCache {
    /// Create a cache over the given backends
    pub fn new(
        store: Arc<dyn PermissionStore>,
        snapshots: Arc<dyn SnapshotCache>,
        ttl: Duration,
    ) -> Self {
        let aggregator = PermissionAggregator::new(store.clone());
        Self {
            store,
            snapshots,
            aggregator,
            ttl,
            stats: DashMap::new(),
        }
    }

    /// Fetch the effective permission set, computing on miss
    ///
    /// The version component of the key is read within this call, never from
    /// a stale copy, so a bump observed before the read forces a miss. If the
    /// snapshot cache is unreachable the call degrades to recomputation
    /// against the source of truth; it never serves a result it cannot
    /// confirm is current.
    pub async fn get(
        &self,
        principal_id: &str,
        organization_id: Option<&str>,
        mode: AccessMode,
    ) -> Result<EffectivePermissionSet> {
        let key = match mode {
            AccessMode::ApiKey => api_key_cache_key(principal_id),
            AccessMode::User => {
                let organization_id = organization_id.ok_or_else(|| {
                    PermissionError::NoOrganizationContext(principal_id.to_string())
                })?;
                let version = self.current_version(principal_id).await?;
                versioned_cache_key(version, principal_id, organization_id, mode)
            }
        };

        if let Some(cached) = self.snapshot_get(&key).await {
            self.increment_stat("hits");
            debug!(principal = %principal_id, %key, "snapshot cache hit");
            return Ok(cached);
        }
        self.increment_stat("misses");

        let computed = self
            .aggregator
            .compute_effective_permissions(principal_id, organization_id, mode)
            .await?;

        if let Err(err) = self
            .snapshots
            .set(&key, computed.clone(), self.ttl)
            .await
        {
            // Losing the write only costs a later recomputation
            warn!(%key, error = %err, "snapshot cache write failed");
        }

        Ok(computed)
    }

    /// Invalidate every cached snapshot for a principal by bumping its
    /// permissions version; returns the new version
    ///
    /// Existing entries are not deleted. They become unreachable because no
    /// subsequent `get` derives their key, and they expire by TTL.
    pub async fn invalidate_principal(&self, principal_id: &str) -> Result<u64> {
        let version = self.store.bump_permissions_version(principal_id).await?;
        debug!(principal = %principal_id, version, "permissions version bumped");
        Ok(version)
    }

    /// Invalidate every principal in an organization
    ///
    /// Used when an organization-scoped role definition itself changes, not
    /// just an assignment. O(organization size).
    pub async fn invalidate_organization(&self, organization_id: &str) -> Result<usize> {
        let principals = self
            .store
            .principals_in_organization(organization_id)
            .await?;
        for principal_id in &principals {
            self.store.bump_permissions_version(principal_id).await?;
        }
        info!(
            organization = %organization_id,
            principals = principals.len(),
            "organization permissions invalidated"
        );
        Ok(principals.len())
    }

    /// Delete an API key's snapshot outright
    ///
    /// API keys carry no version counter, so their non-versioned key must be
    /// removed rather than rotated. Retried once; a persistent failure
    /// propagates so the caller's mutation does not complete with a live
    /// stale grant.
    pub async fn invalidate_api_key(&self, api_key_id: &str) -> Result<()> {
        let key = api_key_cache_key(api_key_id);
        match self.snapshots.delete(&key).await {
            Ok(()) => Ok(()),
            Err(err) if err.is_transient() => {
                warn!(%key, error = %err, "snapshot delete failed, retrying");
                self.snapshots.delete(&key).await
            }
            Err(err) => Err(err),
        }
    }

    /// Hit/miss counters since construction
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.get_stat("hits"),
            misses: self.get_stat("misses"),
            degraded_reads: self.get_stat("degraded_reads"),
        }
    }

    /// Version read with a single retry on transient failure
    ///
    /// Without a confirmed current version there is no safe key to serve
    /// from, so a persistent failure propagates instead of degrading.
    async fn current_version(&self, principal_id: &str) -> Result<u64> {
        match self.store.permissions_version(principal_id).await {
            Ok(version) => Ok(version),
            Err(err) if err.is_transient() => {
                warn!(principal = %principal_id, error = %err, "version read failed, retrying");
                self.store.permissions_version(principal_id).await
            }
            Err(err) => Err(err),
        }
    }

    /// Snapshot read that fails closed into recomputation
    async fn snapshot_get(&self, key: &str) -> Option<EffectivePermissionSet> {
        match self.snapshots.get(key).await {
            Ok(found) => found,
            Err(err) if err.is_transient() => {
                warn!(%key, error = %err, "snapshot read failed, retrying");
                match self.snapshots.get(key).await {
                    Ok(found) => found,
                    Err(err) => {
                        self.increment_stat("degraded_reads");
                        warn!(%key, error = %err, "snapshot cache unavailable, recomputing");
                        None
                    }
                }
            }
            Err(err) => {
                self.increment_stat("degraded_reads");
                warn!(%key, error = %err, "snapshot cache unavailable, recomputing");
                None
            }
        }
    }

    fn increment_stat(&self, key: &'static str) {
        self.stats
            .entry(key)
            .and_modify(|count| *count += 1)
            .or_insert(1);
    }

    fn get_stat(&self, key: &'static str) -> usize {
        self.stats.get(key).map(|v| *v).unwrap_or(0)
    }
}

/// Cache statistics
#[derive(Debug, Clone)]
pub struct CacheStats {
    /// Snapshot cache hits
    pub hits: usize,
    /// Snapshot cache misses (including forced version misses)
    pub misses: usize,
    /// Reads degraded to recomputation by cache-store failure
    pub degraded_reads: usize,
}

impl CacheStats {
    /// Hit rate over all reads
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

fn versioned_cache_key(
    version: u64,
    principal_id: &str,
    organization_id: &str,
    mode: AccessMode,
) -> String {
    format!("perm:v{version}:{principal_id}:{organization_id}:{mode}")
}

fn api_key_cache_key(api_key_id: &str) -> String {
    format!("perm:apikey:{api_key_id}")
}
