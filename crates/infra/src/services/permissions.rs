//! Permission records and their assignment to users.
//!
//! Assignment rules:
//! - only superusers may assign or revoke
//! - nobody may change their own assignment, directly or by editing the
//!   permission record they hold, so a superuser cannot lock themselves out
//! - the superuser record itself can neither be deleted nor moved off
//!   [`PermissionLevel::SUPERUSER`]
//! - assigning replaces whatever the user held, atomically

use chrono::Utc;
use serde::Serialize;

use minibill_auth::{IdentityContext, PermissionLevel, require_level};
use minibill_core::{PermissionId, UserId};
use minibill_users::{Permission, User, UserProfile};

use super::{ServiceError, ServiceResult};
use crate::store::Repositories;

/// Which permission to assign.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionRef {
    Id(PermissionId),
    Level(PermissionLevel),
}

/// A user together with the permission they currently hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserAssignment {
    pub user: UserProfile,
    pub permission: Option<Permission>,
}

#[derive(Debug, Clone)]
pub struct PermissionService {
    repos: Repositories,
}

impl PermissionService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Permission records
    // ─────────────────────────────────────────────────────────────────────

    pub fn list(&self) -> ServiceResult<Vec<Permission>> {
        Ok(self.repos.permissions.list()?)
    }

    pub fn get(&self, id: &PermissionId) -> ServiceResult<Permission> {
        self.repos
            .permissions
            .find_by_id(id)?
            .ok_or(ServiceError::NotFound("permission"))
    }

    pub fn create(&self, level: PermissionLevel) -> ServiceResult<Permission> {
        if self.repos.permissions.find_by_level(level)?.is_some() {
            return Err(ServiceError::Conflict(format!("permission level {level} already exists")));
        }

        let permission = Permission::new(level, Utc::now());
        self.repos.permissions.insert(permission.clone())?;
        tracing::info!(permission_id = %permission.id, level = %level, "permission created");
        Ok(permission)
    }

    /// Change the level a permission record stands for. Every user holding it
    /// gets the new level from their next sign-in on.
    pub fn update(
        &self,
        actor: &IdentityContext,
        id: &PermissionId,
        level: PermissionLevel,
    ) -> ServiceResult<Permission> {
        require_level(Some(actor), PermissionLevel::SUPERUSER)?;
        let mut permission = self.get(id)?;
        self.ensure_not_held_by(actor, &permission)?;
        if permission.level == PermissionLevel::SUPERUSER && level != PermissionLevel::SUPERUSER {
            return Err(ServiceError::forbidden("the superuser permission cannot be moved"));
        }

        permission.level = level;
        self.repos.permissions.update(permission.clone())?;
        tracing::info!(actor = actor.account(), permission_id = %permission.id, level = %level, "permission updated");
        Ok(permission)
    }

    /// Delete a permission and every association pointing at it. Affected
    /// users fall back to level 0.
    pub fn delete(&self, actor: &IdentityContext, id: &PermissionId) -> ServiceResult<()> {
        require_level(Some(actor), PermissionLevel::SUPERUSER)?;
        let permission = self.get(id)?;
        self.ensure_not_held_by(actor, &permission)?;
        if permission.level == PermissionLevel::SUPERUSER {
            return Err(ServiceError::forbidden("the superuser permission cannot be deleted"));
        }

        let released = self.repos.user_permissions.delete_by_permission(&permission.id)?;
        self.repos.permissions.delete(&permission.id)?;
        tracing::info!(actor = actor.account(), permission_id = %permission.id, released, "permission deleted");
        Ok(())
    }

    /// An actor without a stored account (the development bootstrap identity)
    /// holds nothing.
    fn ensure_not_held_by(&self, actor: &IdentityContext, permission: &Permission) -> ServiceResult<()> {
        let Some(me) = self.repos.users.find_by_account(actor.account())? else {
            return Ok(());
        };
        if self.repos.user_permissions.exists(&me.id, &permission.id)? {
            return Err(ServiceError::forbidden("cannot change a permission you hold"));
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Assignments
    // ─────────────────────────────────────────────────────────────────────

    /// Give `user_id` exactly the referenced permission, replacing any
    /// previous one.
    pub fn assign(
        &self,
        actor: &IdentityContext,
        user_id: &UserId,
        target: PermissionRef,
    ) -> ServiceResult<UserAssignment> {
        require_level(Some(actor), PermissionLevel::SUPERUSER)?;
        let user = self.find_user(user_id)?;
        ensure_not_self(actor, &user)?;
        let permission = self.resolve(target)?;

        self.repos.user_permissions.replace(user.id, permission.id)?;

        tracing::info!(
            actor = actor.account(),
            account = %user.account,
            level = %permission.level,
            "permission assigned"
        );
        Ok(UserAssignment {
            user: user.profile(),
            permission: Some(permission),
        })
    }

    /// Remove the user's association; they drop to level 0.
    pub fn revoke(&self, actor: &IdentityContext, user_id: &UserId) -> ServiceResult<()> {
        require_level(Some(actor), PermissionLevel::SUPERUSER)?;
        let user = self.find_user(user_id)?;
        ensure_not_self(actor, &user)?;

        if !self.repos.user_permissions.delete_by_user(&user.id)? {
            return Err(ServiceError::NotFound("permission assignment"));
        }

        tracing::info!(actor = actor.account(), account = %user.account, "permission revoked");
        Ok(())
    }

    pub fn assignment_of(&self, user_id: &UserId) -> ServiceResult<UserAssignment> {
        let user = self.find_user(user_id)?;
        self.assignment(user)
    }

    /// Every user with the permission they hold, oldest account first.
    pub fn list_assignments(&self) -> ServiceResult<Vec<UserAssignment>> {
        self.repos
            .users
            .list()?
            .into_iter()
            .map(|user| self.assignment(user))
            .collect()
    }

    fn assignment(&self, user: User) -> ServiceResult<UserAssignment> {
        let permission = match self.repos.user_permissions.find_by_user(&user.id)? {
            Some(association) => self.repos.permissions.find_by_id(&association.permission_id)?,
            None => None,
        };
        Ok(UserAssignment {
            user: user.profile(),
            permission,
        })
    }

    fn find_user(&self, user_id: &UserId) -> ServiceResult<User> {
        self.repos.users.find_by_id(user_id)?.ok_or(ServiceError::NotFound("user"))
    }

    fn resolve(&self, target: PermissionRef) -> ServiceResult<Permission> {
        let found = match target {
            PermissionRef::Id(id) => self.repos.permissions.find_by_id(&id)?,
            PermissionRef::Level(level) => self.repos.permissions.find_by_level(level)?,
        };
        found.ok_or(ServiceError::NotFound("permission"))
    }
}

fn ensure_not_self(actor: &IdentityContext, user: &User) -> ServiceResult<()> {
    if actor.account() == user.account {
        return Err(ServiceError::forbidden("cannot change your own permission"));
    }
    Ok(())
}
