//! Static bridge for principals that predate the role/permission model
//!
//! The mapping is a closed enum rather than open string matching so that an
//! unknown legacy name fails closed with no permissions. New names are added
//! only as code changes; nothing here mutates at runtime.

use crate::types::RoleScope;

/// Known pre-RBAC role names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegacyRole {
    /// Platform-wide administrator
    Admin,
    /// Organization analyst with read/write on reporting
    Analyst,
    /// Organization auditor, read-only by convention
    Auditor,
    /// Organization viewer
    Viewer,
}

/// Scope and permissions equivalent to a legacy role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegacyGrant {
    /// Scope the legacy role maps into
    pub scope: RoleScope,
    /// Permission keys the legacy role grants
    pub permissions: &'static [&'static str],
}

impl LegacyRole {
    /// Parse a legacy role name, case-insensitively; unknown names fail
    /// closed by returning `None`
    pub fn parse(name: &str) -> Option<Self> {
        if name.eq_ignore_ascii_case("admin") {
            Some(Self::Admin)
        } else if name.eq_ignore_ascii_case("analyst") {
            Some(Self::Analyst)
        } else if name.eq_ignore_ascii_case("auditor") {
            Some(Self::Auditor)
        } else if name.eq_ignore_ascii_case("viewer") {
            Some(Self::Viewer)
        } else {
            None
        }
    }

    /// The equivalent scope and permission set
    pub fn grant(self) -> LegacyGrant {
        match self {
            Self::Admin => LegacyGrant {
                scope: RoleScope::Platform,
                permissions: &["*.admin"],
            },
            Self::Analyst => LegacyGrant {
                scope: RoleScope::Org,
                permissions: &[
                    "threats.read",
                    "identities.read",
                    "reports.read",
                    "reports.write",
                ],
            },
            Self::Auditor => LegacyGrant {
                scope: RoleScope::Org,
                permissions: &["reports.read", "compliance.read"],
            },
            Self::Viewer => LegacyGrant {
                scope: RoleScope::Org,
                permissions: &["threats.read", "reports.read"],
            },
        }
    }
}

/// Look up the grant for a legacy role name; pure, no I/O
pub fn lookup(name: &str) -> Option<LegacyGrant> {
    LegacyRole::parse(name).map(LegacyRole::grant)
}
