//! Startup seeding.
//!
//! Idempotent: running it against an already-seeded store changes nothing.

use chrono::Utc;

use minibill_auth::{CredentialVerifier, PermissionLevel};
use minibill_users::{NewUser, Permission, User};

use crate::services::ServiceResult;
use crate::store::Repositories;

pub const ADMIN_ACCOUNT: &str = "admin";
const ADMIN_EMAIL: &str = "admin@minibill.local";

/// Make sure a permission row exists for `level`.
pub fn ensure_permission(repos: &Repositories, level: PermissionLevel) -> ServiceResult<Permission> {
    if let Some(existing) = repos.permissions.find_by_level(level)? {
        return Ok(existing);
    }
    let permission = Permission::new(level, Utc::now());
    repos.permissions.insert(permission.clone())?;
    tracing::info!(level = %level, "seeded permission");
    Ok(permission)
}

/// Seed the two levels with built-in meaning.
pub fn seed_default_permissions(repos: &Repositories) -> ServiceResult<()> {
    ensure_permission(repos, PermissionLevel::AUTHENTICATED)?;
    ensure_permission(repos, PermissionLevel::SUPERUSER)?;
    Ok(())
}

/// Create the `admin` account (if missing) and bind it to the superuser level.
///
/// An existing admin keeps its password.
pub fn seed_admin(repos: &Repositories, credentials: &dyn CredentialVerifier, password: &str) -> ServiceResult<User> {
    let superuser = ensure_permission(repos, PermissionLevel::SUPERUSER)?;

    let admin = match repos.users.find_by_account(ADMIN_ACCOUNT)? {
        Some(user) => user,
        None => {
            let user = User::register(
                NewUser {
                    account: ADMIN_ACCOUNT.to_string(),
                    name: "Administrator".to_string(),
                    email: ADMIN_EMAIL.to_string(),
                    password_hash: credentials.hash(password)?,
                },
                Utc::now(),
            )?;
            repos.users.insert(user.clone())?;
            tracing::info!(account = ADMIN_ACCOUNT, "seeded admin account");
            user
        }
    };

    if !repos.user_permissions.exists(&admin.id, &superuser.id)? {
        repos.user_permissions.replace(admin.id, superuser.id)?;
    }
    Ok(admin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::fixtures::PlainVerifier;

    #[test]
    fn seeding_twice_is_a_no_op() {
        let repos = Repositories::in_memory();
        seed_default_permissions(&repos).unwrap();
        let first = seed_admin(&repos, &PlainVerifier, "secret").unwrap();
        seed_default_permissions(&repos).unwrap();
        let second = seed_admin(&repos, &PlainVerifier, "other").unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.password_hash, "plain:secret");
        assert_eq!(repos.permissions.list().unwrap().len(), 2);
        assert_eq!(repos.user_permissions.list().unwrap().len(), 1);
    }

    #[test]
    fn admin_holds_superuser() {
        let repos = Repositories::in_memory();
        let admin = seed_admin(&repos, &PlainVerifier, "secret").unwrap();
        let association = repos.user_permissions.find_by_user(&admin.id).unwrap().unwrap();
        let permission = repos.permissions.find_by_id(&association.permission_id).unwrap().unwrap();
        assert!(permission.level.is_superuser());
    }
}
