//! # Effective Permission Resolution Engine
//!
//! Computes the authoritative set of permissions a principal (user or API
//! key) may exercise within an organization, and keeps that computation
//! correct under concurrent role, permission, and team mutations.
//!
//! ## Design
//!
//! - **Aggregation** unions direct role grants (with cycle-safe parent
//!   hierarchy closure), team grants, and a static legacy bridge used only
//!   when roles and teams grant nothing.
//! - **Versioned caching** keys every snapshot on the principal's current
//!   permissions version; bumping the version is an O(1) invalidation of
//!   every derived key, so a revoked grant is never served stale.
//! - **ABAC overlay** is a denial-only predicate evaluated per check, never
//!   baked into cached snapshots.
//! - **Injected backends**: source-of-truth reads and the snapshot cache are
//!   trait objects, with in-memory implementations for tests and embedding.
//!
//! ## Example
//!
//! ```rust
//! use permission_engine::{
//!     AccessMode, EngineConfig, MemoryPermissionStore, PermissionEngine, Principal, Role,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(MemoryPermissionStore::new());
//!     store.insert_principal(Principal::user("user:alice"));
//!     store.insert_role(Role::org("editor", "Editor", "org-acme").with_permission("docs.write"));
//!     store.assign_role("user:alice", "editor");
//!
//!     let engine = PermissionEngine::in_memory(store, EngineConfig::default());
//!
//!     let allowed = engine
//!         .has_permission("user:alice", Some("org-acme"), AccessMode::User, "docs.write")
//!         .await?;
//!     assert!(allowed);
//!
//!     Ok(())
//! }
//! ```

pub mod aggregator;
pub mod cache;
pub mod engine;
pub mod error;
pub mod hierarchy;
pub mod legacy;
pub mod overlay;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use aggregator::PermissionAggregator;
pub use cache::{CacheStats, VersionedCache};
pub use engine::{EngineConfig, PermissionEngine};
pub use error::{PermissionError, Result};
pub use hierarchy::HierarchyResolver;
pub use legacy::{LegacyGrant, LegacyRole};
pub use overlay::{AbacOverlay, CheckOutcome, DenialRule};
pub use store::{MemoryPermissionStore, MemorySnapshotCache, PermissionStore, SnapshotCache};
pub use types::{
    AccessMode, EffectivePermissionSet, EffectiveRoles, OrganizationId, PermissionKey, Principal,
    PrincipalId, PrincipalKind, Role, RoleId, RoleScope, Team, TeamId,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
