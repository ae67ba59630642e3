use serde::{Deserialize, Serialize};

/// Integer privilege rank. Higher is more privileged.
///
/// Only two values carry meaning on their own: [`PermissionLevel::SUPERUSER`]
/// and [`PermissionLevel::AUTHENTICATED`]. Everything else is compared against
/// a route's declared threshold.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionLevel(i32);

impl PermissionLevel {
    /// Reserved superuser sentinel.
    pub const SUPERUSER: PermissionLevel = PermissionLevel(99);

    /// Level of a signed-in user without any assigned permission.
    pub const AUTHENTICATED: PermissionLevel = PermissionLevel(0);

    pub const fn new(level: i32) -> Self {
        Self(level)
    }

    pub const fn value(self) -> i32 {
        self.0
    }

    pub fn is_superuser(self) -> bool {
        self >= Self::SUPERUSER
    }
}

impl core::fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<i32> for PermissionLevel {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

impl From<PermissionLevel> for i32 {
    fn from(value: PermissionLevel) -> Self {
        value.0
    }
}
