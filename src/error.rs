//! Error types for the permission resolution engine

use thiserror::Error;

/// Permission engine errors
#[derive(Debug, Error)]
pub enum PermissionError {
    /// Principal id does not exist; never retried
    #[error("Principal not found: {0}")]
    PrincipalNotFound(String),

    /// Caller omitted a required organization context; a caller contract
    /// violation, never retried
    #[error("Organization context required for principal {0}")]
    NoOrganizationContext(String),

    /// Transient backend failure; the caching layer retries once and then
    /// degrades to recomputation against the source of truth
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PermissionError {
    /// Whether the error is transient and eligible for a single retry
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }
}

/// Result type for permission operations
pub type Result<T> = std::result::Result<T, PermissionError>;
