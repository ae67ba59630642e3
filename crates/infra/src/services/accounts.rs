use std::sync::{Arc, OnceLock};

use chrono::Utc;
use serde::Deserialize;

use minibill_auth::{CredentialVerifier, IdentityContext, PermissionLevel, Token, TokenService};
use minibill_users::{NewUser, User, UserProfile};

use super::{ServiceError, ServiceResult, current_user, effective_level};
use crate::store::{Repositories, StoreError};

/// Hashed once and verified against on unknown accounts, so both failure
/// paths pay for a full credential check.
const DUMMY_PASSWORD: &str = "minibill-unknown-account";

/// Sign-up input with the plaintext password.
#[derive(Debug, Clone, Deserialize)]
pub struct SignUp {
    pub account: String,
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Result of a successful sign-in.
#[derive(Debug, Clone)]
pub struct SignedIn {
    pub token: Token,
    pub user: UserProfile,
    pub permission_level: PermissionLevel,
}

/// Sign-up and sign-in.
#[derive(Clone)]
pub struct AccountService {
    repos: Repositories,
    credentials: Arc<dyn CredentialVerifier>,
    tokens: Arc<TokenService>,
    dummy_hash: Arc<OnceLock<Option<String>>>,
}

impl AccountService {
    pub fn new(repos: Repositories, credentials: Arc<dyn CredentialVerifier>, tokens: Arc<TokenService>) -> Self {
        Self {
            repos,
            credentials,
            tokens,
            dummy_hash: Arc::new(OnceLock::new()),
        }
    }

    /// Register a new account. New accounts hold no permission association,
    /// so their tokens carry level 0 until a superuser assigns one.
    pub fn sign_up(&self, input: SignUp) -> ServiceResult<UserProfile> {
        if input.password.is_empty() {
            return Err(ServiceError::validation("password cannot be empty"));
        }

        let account = input.account.trim();
        if self.repos.users.find_by_account(account)?.is_some() {
            return Err(ServiceError::DuplicateAccount(account.to_string()));
        }

        let password_hash = self.credentials.hash(&input.password)?;
        let user = User::register(
            NewUser {
                account: account.to_string(),
                name: input.name,
                email: input.email,
                password_hash,
            },
            Utc::now(),
        )?;

        match self.repos.users.insert(user.clone()) {
            Ok(()) => {}
            // Lost a race with a concurrent sign-up for the same account.
            Err(StoreError::Duplicate(what)) if what.starts_with("account") => {
                return Err(ServiceError::DuplicateAccount(user.account));
            }
            Err(err) => return Err(err.into()),
        }

        tracing::info!(account = %user.account, user_id = %user.id, "account registered");
        Ok(user.profile())
    }

    /// Verify credentials and issue a token carrying the user's current level.
    ///
    /// Unknown accounts and wrong passwords are indistinguishable to the caller.
    pub fn sign_in(&self, account: &str, password: &str) -> ServiceResult<SignedIn> {
        let Some(mut user) = self.repos.users.find_by_account(account.trim())? else {
            if let Some(hash) = self.dummy_hash() {
                self.credentials.verify(password, hash);
            }
            tracing::warn!(account, "sign-in failed: unknown account");
            return Err(ServiceError::InvalidCredentials);
        };

        if !self.credentials.verify(password, &user.password_hash) {
            tracing::warn!(account = %user.account, "sign-in failed: wrong password");
            return Err(ServiceError::InvalidCredentials);
        }

        let permission_level = effective_level(&self.repos, &user.id)?;
        let token = self.tokens.issue(&user.account, permission_level)?;

        user.record_login(Utc::now());
        self.repos.users.update(user.clone())?;

        tracing::info!(account = %user.account, level = %permission_level, "sign-in succeeded");
        Ok(SignedIn {
            token,
            user: user.profile(),
            permission_level,
        })
    }

    fn dummy_hash(&self) -> Option<&str> {
        self.dummy_hash
            .get_or_init(|| self.credentials.hash(DUMMY_PASSWORD).ok())
            .as_deref()
    }

    /// Stored profile for an identity, if it maps to a user.
    ///
    /// The development bootstrap identity has no backing user.
    pub fn profile_of(&self, identity: &IdentityContext) -> ServiceResult<Option<UserProfile>> {
        match current_user(&self.repos, identity) {
            Ok(user) => Ok(Some(user.profile())),
            Err(ServiceError::NotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }
}

impl std::fmt::Debug for AccountService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountService").finish_non_exhaustive()
    }
}
