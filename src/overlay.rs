//! Attribute-based denial overlay
//!
//! Evaluated per permission check, never baked into cached snapshots, so a
//! new denial rule takes effect immediately with no cache invalidation. The
//! overlay can only remove permissions; it never grants one that roles and
//! teams did not.

use crate::types::{EffectivePermissionSet, PermissionKey};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Denies a set of permission keys to principals holding a named role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DenialRule {
    /// Role name the rule applies to; matched case-insensitively against the
    /// principal's legacy role and its organization role list
    pub role: String,

    /// Permission keys stripped from holders of the role
    pub denied: HashSet<PermissionKey>,
}

/// Statically configured set of denial rules
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbacOverlay {
    #[serde(default)]
    rules: Vec<DenialRule>,
}

impl AbacOverlay {
    /// Overlay with the given rules
    pub fn new(rules: Vec<DenialRule>) -> Self {
        Self { rules }
    }

    /// Add a denial rule for a role
    pub fn deny<I, S>(mut self, role: impl Into<String>, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rules.push(DenialRule {
            role: role.into(),
            denied: permissions.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Number of configured rules
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Whether the rule set strips this permission from the principal
    ///
    /// A rule applies when the principal's legacy role equals the rule's role
    /// name, or the effective set's organization role list contains it.
    pub fn denies(
        &self,
        permission: &str,
        effective: &EffectivePermissionSet,
        legacy_role: Option<&str>,
    ) -> bool {
        self.rules.iter().any(|rule| {
            let holds_role = legacy_role
                .map_or(false, |name| name.eq_ignore_ascii_case(&rule.role))
                || effective
                    .roles
                    .org
                    .iter()
                    .any(|name| name.eq_ignore_ascii_case(&rule.role));
            holds_role && rule.denied.contains(permission)
        })
    }
}

/// Outcome of a single permission check
///
/// `DeniedByPolicy` is distinct from `NotGranted` so audit logging can tell
/// an overlay denial apart from a permission that was never granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckOutcome {
    /// Present in the effective set and not stripped by any rule
    Granted,
    /// Absent from the effective set
    NotGranted,
    /// Present in the effective set but stripped by a denial rule
    DeniedByPolicy,
}

impl CheckOutcome {
    /// Whether the check permits the action
    pub fn is_granted(self) -> bool {
        matches!(self, Self::Granted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn effective_with_org_role(role: &str, permissions: &[&str]) -> EffectivePermissionSet {
        let mut set = EffectivePermissionSet::default();
        set.roles.org.push(role.to_string());
        set.permissions
            .extend(permissions.iter().map(|p| p.to_string()));
        set
    }

    #[test]
    fn test_denies_listed_permission_for_org_role() {
        let overlay = AbacOverlay::default().deny("Auditor", ["reports.write"]);
        let effective = effective_with_org_role("Auditor", &["reports.read", "reports.write"]);

        assert!(overlay.denies("reports.write", &effective, None));
        assert!(!overlay.denies("reports.read", &effective, None));
    }

    #[test]
    fn test_denies_via_legacy_role() {
        let overlay = AbacOverlay::default().deny("auditor", ["identities.write"]);
        let mut effective = EffectivePermissionSet::default();
        effective.permissions.insert("identities.write".to_string());

        assert!(overlay.denies("identities.write", &effective, Some("auditor")));
        assert!(!overlay.denies("identities.write", &effective, Some("analyst")));
        assert!(!overlay.denies("identities.write", &effective, None));
    }

    #[test]
    fn test_role_match_is_case_insensitive() {
        let overlay = AbacOverlay::default().deny("auditor", ["reports.write"]);
        let effective = effective_with_org_role("Auditor", &["reports.write"]);

        assert!(overlay.denies("reports.write", &effective, None));
    }

    #[test]
    fn test_unrelated_roles_pass_through() {
        let overlay = AbacOverlay::default().deny("Auditor", ["reports.write"]);
        let effective = effective_with_org_role("Editor", &["reports.write"]);

        assert!(!overlay.denies("reports.write", &effective, None));
    }

    #[test]
    fn test_rules_deserialize_from_config() {
        let overlay: AbacOverlay = serde_json::from_str(
            r#"{"rules": [{"role": "Auditor", "denied": ["reports.write", "identities.write"]}]}"#,
        )
        .unwrap();

        assert_eq!(overlay.rule_count(), 1);
        let effective = effective_with_org_role("Auditor", &["reports.write"]);
        assert!(overlay.denies("reports.write", &effective, None));
    }

    proptest! {
        // Denial-only: the overlay never turns an absent permission into a
        // granted one, whatever the rules say.
        #[test]
        fn prop_overlay_never_grants(
            permission in "[a-z]{1,8}\\.[a-z]{1,8}",
            denied in prop::collection::hash_set("[a-z]{1,8}\\.[a-z]{1,8}", 0..4),
        ) {
            let overlay = AbacOverlay::default().deny("Auditor", denied);
            let effective = effective_with_org_role("Auditor", &[]);

            // Permission absent from the effective set: the only possible
            // outcomes are NotGranted or DeniedByPolicy, never Granted.
            let granted = effective.contains(&permission)
                && !overlay.denies(&permission, &effective, None);
            prop_assert!(!granted);
        }
    }
}
