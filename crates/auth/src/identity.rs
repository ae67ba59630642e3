use serde::Serialize;

use crate::PermissionLevel;

/// Identity of the caller, resolved from a validated token.
///
/// Built fresh for each request and dropped with it. Nothing persists or
/// caches this value; handlers receive it explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentityContext {
    account: String,
    permission_level: PermissionLevel,
}

impl IdentityContext {
    pub fn new(account: impl Into<String>, permission_level: PermissionLevel) -> Self {
        Self {
            account: account.into(),
            permission_level,
        }
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn permission_level(&self) -> PermissionLevel {
        self.permission_level
    }

    pub fn is_superuser(&self) -> bool {
        self.permission_level.is_superuser()
    }
}
