//! Application services.
//!
//! Each service owns a [`Repositories`] handle and applies the authorization
//! rules that depend on stored data (ownership, self-modification). Route-level
//! permission thresholds are enforced before a service is ever called.

mod accounts;
mod billing;
mod catalog;
mod error;
mod permissions;
mod users;

pub use accounts::{AccountService, SignUp, SignedIn};
pub use billing::{BillingService, TransactionRequest, TransactionView};
pub use catalog::CatalogService;
pub use error::{ServiceError, ServiceResult};
pub use permissions::{PermissionRef, PermissionService, UserAssignment};
pub use users::{ProfileUpdate, UserService};

use minibill_auth::{IdentityContext, PermissionLevel, ensure_may_access};
use minibill_core::UserId;
use minibill_users::User;

use crate::store::Repositories;

/// The level carried in a user's tokens. Users without an association get
/// [`PermissionLevel::AUTHENTICATED`].
pub(crate) fn effective_level(repos: &Repositories, user_id: &UserId) -> ServiceResult<PermissionLevel> {
    let Some(association) = repos.user_permissions.find_by_user(user_id)? else {
        return Ok(PermissionLevel::AUTHENTICATED);
    };

    Ok(repos
        .permissions
        .find_by_id(&association.permission_id)?
        .map(|p| p.level)
        .unwrap_or(PermissionLevel::AUTHENTICATED))
}

/// The stored user behind an identity.
pub(crate) fn current_user(repos: &Repositories, identity: &IdentityContext) -> ServiceResult<User> {
    repos
        .users
        .find_by_account(identity.account())?
        .ok_or(ServiceError::NotFound("user"))
}

/// Apply the ownership policy to a looked-up user.
///
/// Non-superusers get `Forbidden` for anyone but themselves, whether or not
/// the target exists.
pub(crate) fn authorize_user_target(identity: &IdentityContext, target: Option<User>) -> ServiceResult<User> {
    match target {
        Some(user) => {
            ensure_may_access(identity, &user.account)?;
            Ok(user)
        }
        None if identity.is_superuser() => Err(ServiceError::NotFound("user")),
        None => Err(ServiceError::forbidden("not the owner of this resource")),
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::sync::Arc;

    use chrono::Utc;
    use minibill_auth::{
        CredentialError, CredentialVerifier, IdentityContext, PermissionLevel, SigningSecret, TokenConfig,
        TokenService,
    };
    use minibill_core::UserId;
    use minibill_users::{NewUser, Permission, User};

    use crate::store::Repositories;

    /// Reversible stand-in for Argon2 so service tests stay fast.
    pub struct PlainVerifier;

    impl CredentialVerifier for PlainVerifier {
        fn hash(&self, plain: &str) -> Result<String, CredentialError> {
            Ok(format!("plain:{plain}"))
        }

        fn verify(&self, plain: &str, hash: &str) -> bool {
            hash.strip_prefix("plain:") == Some(plain)
        }
    }

    pub fn verifier() -> Arc<dyn CredentialVerifier> {
        Arc::new(PlainVerifier)
    }

    pub fn tokens() -> Arc<TokenService> {
        Arc::new(TokenService::new(&TokenConfig::new(SigningSecret::new("service-test-secret"))))
    }

    pub fn identity(account: &str, level: i32) -> IdentityContext {
        IdentityContext::new(account, PermissionLevel::new(level))
    }

    /// Store a user with password `"1234"`.
    pub fn register(repos: &Repositories, account: &str) -> User {
        let user = User::register(
            NewUser {
                account: account.to_string(),
                name: format!("{account} test"),
                email: format!("{account}@example.com"),
                password_hash: "plain:1234".to_string(),
            },
            Utc::now(),
        )
        .unwrap();
        repos.users.insert(user.clone()).unwrap();
        user
    }

    /// Bind `user_id` to `level`, creating the permission row if needed.
    pub fn grant(repos: &Repositories, user_id: UserId, level: i32) -> Permission {
        let level = PermissionLevel::new(level);
        let permission = match repos.permissions.find_by_level(level).unwrap() {
            Some(p) => p,
            None => {
                let p = Permission::new(level, Utc::now());
                repos.permissions.insert(p.clone()).unwrap();
                p
            }
        };
        repos.user_permissions.replace(user_id, permission.id).unwrap();
        permission
    }
}
