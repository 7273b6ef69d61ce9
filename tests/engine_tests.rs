//! End-to-end resolution tests
//!
//! Exercise the full pipeline: role assignments with hierarchy closure,
//! team grants, the legacy bridge, and the check-time denial overlay.

use permission_engine::{
    AbacOverlay, AccessMode, CheckOutcome, EngineConfig, MemoryPermissionStore, PermissionEngine,
    PermissionError, Principal, Role, Team,
};
use std::sync::Arc;

fn engine_with(store: Arc<MemoryPermissionStore>) -> PermissionEngine {
    PermissionEngine::in_memory(store, EngineConfig::default())
}

// ============================================================================
// AGGREGATION
// ============================================================================

#[tokio::test]
async fn test_editor_inherits_viewer_permissions() {
    // U1 assigned Editor, whose parent Viewer grants docs.read
    let store = Arc::new(MemoryPermissionStore::new());
    store.insert_principal(Principal::user("user:u1"));
    store.insert_role(
        Role::org("editor", "Editor", "org-a")
            .with_parent("viewer")
            .with_permission("docs.write")
            .with_permission("docs.read"),
    );
    store.insert_role(Role::org("viewer", "Viewer", "org-a").with_permission("docs.read"));
    store.assign_role("user:u1", "editor");

    let engine = engine_with(store);
    let set = engine
        .effective_permissions("user:u1", Some("org-a"), AccessMode::User)
        .await
        .unwrap();

    assert_eq!(set.permissions.len(), 2);
    assert!(set.contains("docs.read"));
    assert!(set.contains("docs.write"));
    assert_eq!(set.roles.org, vec!["Editor"]);
}

#[tokio::test]
async fn test_legacy_admin_fallback() {
    // U2 has no assignments; legacy "admin" maps to platform *.admin
    let store = Arc::new(MemoryPermissionStore::new());
    store.insert_principal(Principal::user("user:u2").with_legacy_role("admin"));

    let engine = engine_with(store);
    let set = engine
        .effective_permissions("user:u2", Some("org-a"), AccessMode::User)
        .await
        .unwrap();

    assert!(set.contains("*.admin"));
    assert_eq!(set.roles.platform, vec!["admin"]);
    assert!(set.roles.org.is_empty());
}

#[tokio::test]
async fn test_roles_and_teams_union() {
    let store = Arc::new(MemoryPermissionStore::new());
    store.insert_principal(Principal::user("user:u1"));
    store.insert_role(Role::org("viewer", "Viewer", "org-a").with_permission("docs.read"));
    store.assign_role("user:u1", "viewer");
    store.insert_team(Team::new("team-sec", "org-a").with_permission("threats.read"));
    store.add_team_member("user:u1", "team-sec");

    let engine = engine_with(store);
    let set = engine
        .effective_permissions("user:u1", Some("org-a"), AccessMode::User)
        .await
        .unwrap();

    assert!(set.contains("docs.read"));
    assert!(set.contains("threats.read"));
    assert_eq!(set.team_ids, vec!["team-sec"]);
}

#[tokio::test]
async fn test_tenant_isolation_across_organizations() {
    let store = Arc::new(MemoryPermissionStore::new());
    store.insert_principal(Principal::user("user:u1"));
    store.insert_role(Role::org("editor-x", "Editor", "org-x").with_permission("docs.write"));
    store.assign_role("user:u1", "editor-x");
    store.insert_team(Team::new("team-x", "org-x").with_permission("docs.read"));
    store.add_team_member("user:u1", "team-x");

    let engine = engine_with(store);
    let set = engine
        .effective_permissions("user:u1", Some("org-y"), AccessMode::User)
        .await
        .unwrap();

    assert!(set.is_empty_grant());
    assert!(set.team_ids.is_empty());
}

// ============================================================================
// CHECK SEMANTICS
// ============================================================================

#[tokio::test]
async fn test_auditor_denial_rule() {
    // U3 holds org role Auditor granting reports.{read,write}; the overlay
    // strips reports.write at check time
    let store = Arc::new(MemoryPermissionStore::new());
    store.insert_principal(Principal::user("user:u3"));
    store.insert_role(
        Role::org("auditor", "Auditor", "org-a")
            .with_permission("reports.read")
            .with_permission("reports.write"),
    );
    store.assign_role("user:u3", "auditor");

    let config = EngineConfig {
        overlay: AbacOverlay::default().deny("Auditor", ["reports.write"]),
        ..Default::default()
    };
    let engine = PermissionEngine::in_memory(store, config);

    assert!(engine
        .has_permission("user:u3", Some("org-a"), AccessMode::User, "reports.read")
        .await
        .unwrap());
    assert!(!engine
        .has_permission("user:u3", Some("org-a"), AccessMode::User, "reports.write")
        .await
        .unwrap());

    // The cached snapshot itself still carries the grant; only the check
    // outcome differs
    let set = engine
        .effective_permissions("user:u3", Some("org-a"), AccessMode::User)
        .await
        .unwrap();
    assert!(set.contains("reports.write"));
}

#[tokio::test]
async fn test_has_any_and_has_all() {
    let store = Arc::new(MemoryPermissionStore::new());
    store.insert_principal(Principal::user("user:u1"));
    store.insert_role(Role::org("viewer", "Viewer", "org-a").with_permission("docs.read"));
    store.assign_role("user:u1", "viewer");

    let engine = engine_with(store);

    assert!(engine
        .has_any_permission(
            "user:u1",
            Some("org-a"),
            AccessMode::User,
            &["docs.write", "docs.read"],
        )
        .await
        .unwrap());
    assert!(!engine
        .has_all_permissions(
            "user:u1",
            Some("org-a"),
            AccessMode::User,
            &["docs.write", "docs.read"],
        )
        .await
        .unwrap());

    let denied = engine
        .denied_permissions(
            "user:u1",
            Some("org-a"),
            AccessMode::User,
            &["docs.write", "docs.read"],
        )
        .await
        .unwrap();
    assert_eq!(denied, vec!["docs.write"]);
}

#[tokio::test]
async fn test_api_key_checks_direct_scopes() {
    let store = Arc::new(MemoryPermissionStore::new());
    store.insert_principal(Principal::api_key("key:ci"));
    store.set_api_key_permissions("key:ci", vec!["deploy.write".to_string()]);

    let engine = engine_with(store);

    assert!(engine
        .has_permission("key:ci", None, AccessMode::ApiKey, "deploy.write")
        .await
        .unwrap());
    assert_eq!(
        engine
            .check("key:ci", None, AccessMode::ApiKey, "deploy.delete")
            .await
            .unwrap(),
        CheckOutcome::NotGranted
    );
}

// ============================================================================
// ERROR TAXONOMY
// ============================================================================

#[tokio::test]
async fn test_unknown_principal_is_fatal() {
    let engine = engine_with(Arc::new(MemoryPermissionStore::new()));

    let err = engine
        .effective_permissions("user:ghost", Some("org-a"), AccessMode::User)
        .await
        .unwrap_err();
    assert!(matches!(err, PermissionError::PrincipalNotFound(_)));
}

#[tokio::test]
async fn test_missing_org_context_is_a_caller_error() {
    let store = Arc::new(MemoryPermissionStore::new());
    store.insert_principal(Principal::user("user:u1"));
    let engine = engine_with(store);

    let err = engine
        .effective_permissions("user:u1", None, AccessMode::User)
        .await
        .unwrap_err();
    assert!(matches!(err, PermissionError::NoOrganizationContext(_)));
}
