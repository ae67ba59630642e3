use std::sync::Arc;

use serde::Deserialize;

use minibill_auth::{CredentialVerifier, IdentityContext};
use minibill_core::UserId;
use minibill_users::{UserProfile, UserUpdate};

use super::{ServiceError, ServiceResult, authorize_user_target};
use crate::store::Repositories;

/// Profile changes a user may make. The account name is immutable.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Clone)]
pub struct UserService {
    repos: Repositories,
    credentials: Arc<dyn CredentialVerifier>,
}

impl UserService {
    pub fn new(repos: Repositories, credentials: Arc<dyn CredentialVerifier>) -> Self {
        Self { repos, credentials }
    }

    pub fn list(&self) -> ServiceResult<Vec<UserProfile>> {
        Ok(self.repos.users.list()?.iter().map(UserProfile::from).collect())
    }

    /// Owner or superuser only.
    pub fn get(&self, identity: &IdentityContext, id: &UserId) -> ServiceResult<UserProfile> {
        let user = authorize_user_target(identity, self.repos.users.find_by_id(id)?)?;
        Ok(user.profile())
    }

    /// Owner or superuser only.
    pub fn update(&self, identity: &IdentityContext, id: &UserId, input: ProfileUpdate) -> ServiceResult<UserProfile> {
        let mut user = authorize_user_target(identity, self.repos.users.find_by_id(id)?)?;

        let password_hash = match input.password.as_deref() {
            Some(p) if !p.is_empty() => Some(self.credentials.hash(p)?),
            _ => None,
        };

        user.apply_update(UserUpdate {
            name: input.name,
            email: input.email,
            password_hash,
        })?;
        self.repos.users.update(user.clone())?;

        tracing::info!(actor = identity.account(), account = %user.account, "user updated");
        Ok(user.profile())
    }

    /// Delete a user and their permission association. Transactions they own
    /// are kept for the books.
    pub fn delete(&self, actor: &IdentityContext, id: &UserId) -> ServiceResult<()> {
        let user = self.repos.users.find_by_id(id)?.ok_or(ServiceError::NotFound("user"))?;
        if actor.account() == user.account {
            return Err(ServiceError::forbidden("cannot delete your own account"));
        }

        self.repos.user_permissions.delete_by_user(&user.id)?;
        self.repos.users.delete(&user.id)?;

        tracing::info!(actor = actor.account(), account = %user.account, "user deleted");
        Ok(())
    }
}

impl std::fmt::Debug for UserService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserService").finish_non_exhaustive()
    }
}
