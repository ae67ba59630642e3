//! Resource ownership policy.
//!
//! A caller may act on a record when they own it, or when they are a superuser.
//! Ownership is keyed by account name, which is what the token carries.

use crate::{AuthzError, IdentityContext};

/// `true` iff `identity` is a superuser or owns the record.
pub fn may_access(identity: &IdentityContext, owner_account: &str) -> bool {
    identity.is_superuser() || identity.account() == owner_account
}

/// Same as [`may_access`], as a `Forbidden` error on denial.
pub fn ensure_may_access(identity: &IdentityContext, owner_account: &str) -> Result<(), AuthzError> {
    if may_access(identity, owner_account) {
        Ok(())
    } else {
        Err(AuthzError::forbidden(format!(
            "'{}' may not act on records owned by '{}'",
            identity.account(),
            owner_account
        )))
    }
}
