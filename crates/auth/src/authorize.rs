//! Permission-level guard decision.
//!
//! The HTTP layer wraps this in a per-route layer; services call it directly
//! when they need the same check deeper in the call chain.

use thiserror::Error;

use crate::{IdentityContext, PermissionLevel};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    /// No identity where one is required.
    #[error("authentication required")]
    Unauthorized,

    /// Identity present but not allowed.
    #[error("forbidden: {0}")]
    Forbidden(String),
}

impl AuthzError {
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }
}

/// Require an identity whose level is at least `required`.
///
/// - No IO
/// - No panics
/// - Returns the identity on success so callers can keep using it
pub fn require_level(
    identity: Option<&IdentityContext>,
    required: PermissionLevel,
) -> Result<&IdentityContext, AuthzError> {
    let identity = identity.ok_or(AuthzError::Unauthorized)?;

    if identity.permission_level() < required {
        return Err(AuthzError::forbidden(format!(
            "permission level {} required, caller has {}",
            required,
            identity.permission_level()
        )));
    }

    Ok(identity)
}
