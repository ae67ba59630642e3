//! Permission records and the user ↔ permission association.
//!
//! A permission is a named row per level; users point at it through a join
//! record. Each user holds at most one association at a time; the store
//! replaces it atomically.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use minibill_auth::PermissionLevel;
use minibill_core::{Entity, PermissionId, UserId, UserPermissionId};

/// A permission level that can be granted to users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub id: PermissionId,
    pub level: PermissionLevel,
    pub created_at: DateTime<Utc>,
}

impl Permission {
    pub fn new(level: PermissionLevel, now: DateTime<Utc>) -> Self {
        Self {
            id: PermissionId::new(),
            level,
            created_at: now,
        }
    }
}

impl Entity for Permission {
    type Id = PermissionId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Binds a user to their active permission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPermission {
    pub id: UserPermissionId,
    pub user_id: UserId,
    pub permission_id: PermissionId,
}

impl UserPermission {
    pub fn new(user_id: UserId, permission_id: PermissionId) -> Self {
        Self {
            id: UserPermissionId::new(),
            user_id,
            permission_id,
        }
    }
}

impl Entity for UserPermission {
    type Id = UserPermissionId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
