//! Permission aggregation across roles, teams, and the legacy bridge
//!
//! Pure over fetched data: no side effects, safe to run concurrently for the
//! same principal. Caching and invalidation live one layer up in
//! [`VersionedCache`](crate::cache::VersionedCache).

use crate::error::{PermissionError, Result};
use crate::hierarchy::HierarchyResolver;
use crate::legacy;
use crate::store::PermissionStore;
use crate::types::{AccessMode, EffectivePermissionSet, RoleScope};
use std::sync::Arc;
use tracing::{debug, warn};

/// Computes the effective permission set for a principal
#[derive(Clone)]
pub struct PermissionAggregator {
    store: Arc<dyn PermissionStore>,
    hierarchy: HierarchyResolver,
}

impl PermissionAggregator {
    /// Create an aggregator over the given store
    pub fn new(store: Arc<dyn PermissionStore>) -> Self {
        let hierarchy = HierarchyResolver::new(store.clone());
        Self { store, hierarchy }
    }

    /// Compute the effective permission set for a principal in an
    /// organization context
    ///
    /// Accumulates, in order: directly assigned roles (with hierarchy
    /// closure, organization-scoped roles only when they belong to the
    /// requested organization), team grants within the organization, and the
    /// legacy bridge as a fallback only when roles and teams granted nothing.
    ///
    /// # Errors
    ///
    /// - [`PermissionError::PrincipalNotFound`] when the principal id does
    ///   not exist
    /// - [`PermissionError::NoOrganizationContext`] when mode is `User` and
    ///   no organization id was supplied
    pub async fn compute_effective_permissions(
        &self,
        principal_id: &str,
        organization_id: Option<&str>,
        mode: AccessMode,
    ) -> Result<EffectivePermissionSet> {
        let principal = self
            .store
            .principal(principal_id)
            .await?
            .ok_or_else(|| PermissionError::PrincipalNotFound(principal_id.to_string()))?;

        if mode == AccessMode::ApiKey {
            let mut set = EffectivePermissionSet::default();
            set.permissions
                .extend(self.store.api_key_permissions(principal_id).await?);
            debug!(
                principal = %principal_id,
                permissions = set.permissions.len(),
                "resolved api key scopes"
            );
            return Ok(set);
        }

        let organization_id = organization_id
            .ok_or_else(|| PermissionError::NoOrganizationContext(principal_id.to_string()))?;

        let mut set = EffectivePermissionSet::default();

        // Step 1: directly assigned roles, with strict tenant isolation
        for role_id in self.store.assigned_roles(principal_id).await? {
            let Some(role) = self.store.role(&role_id).await? else {
                warn!(role_id = %role_id, "assignment references missing role, skipping");
                continue;
            };

            match role.scope {
                RoleScope::Platform => {
                    set.roles.platform.push(role.name.clone());
                    set.permissions
                        .extend(self.hierarchy.resolve(&role.id).await?);
                }
                RoleScope::Org => {
                    if role.organization_id.as_deref() == Some(organization_id) {
                        set.roles.org.push(role.name.clone());
                        set.permissions
                            .extend(self.hierarchy.resolve(&role.id).await?);
                    }
                }
            }
        }

        // Step 2: team grants within the organization
        for team in self
            .store
            .teams_for_principal(principal_id, organization_id)
            .await?
        {
            set.team_ids.push(team.id.clone());
            set.permissions.extend(team.permissions.iter().cloned());
        }

        // Step 3: legacy bridge, only when roles and teams granted nothing
        if set.is_empty_grant() {
            if let Some(name) = principal.legacy_role() {
                if let Some(grant) = legacy::lookup(name) {
                    set.permissions
                        .extend(grant.permissions.iter().map(|p| p.to_string()));
                    match grant.scope {
                        RoleScope::Platform => set.roles.platform.push(name.to_string()),
                        RoleScope::Org => set.roles.org.push(name.to_string()),
                    }
                    debug!(principal = %principal_id, legacy_role = %name, "legacy fallback applied");
                }
            }
        }

        debug!(
            principal = %principal_id,
            organization = %organization_id,
            permissions = set.permissions.len(),
            platform_roles = set.roles.platform.len(),
            org_roles = set.roles.org.len(),
            teams = set.team_ids.len(),
            "aggregated effective permissions"
        );

        Ok(set)
    }
}
