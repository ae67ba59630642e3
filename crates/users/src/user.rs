//! User accounts.
//!
//! The password hash is produced by the credential verifier before it reaches
//! this module, and never leaves the service layer: responses use
//! [`UserProfile`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use minibill_core::{DomainError, DomainResult, Entity, UserId};

// ─────────────────────────────────────────────────────────────────────────────
// User
// ─────────────────────────────────────────────────────────────────────────────

/// A registered account.
///
/// # Invariants
/// - `account` is non-empty, has no whitespace and is immutable after sign-up.
/// - `email` is normalized to lowercase and contains an `@`.
/// - `name` is non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub account: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

/// Sign-up input, with the password already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub account: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// Partial profile update. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
}

const MAX_ACCOUNT_LEN: usize = 64;

impl User {
    /// Validate sign-up input and build the account record.
    pub fn register(input: NewUser, now: DateTime<Utc>) -> DomainResult<Self> {
        let account = validate_account(&input.account)?;
        let name = validate_name(&input.name)?;
        let email = validate_email(&input.email)?;

        if input.password_hash.is_empty() {
            return Err(DomainError::validation("password cannot be empty"));
        }

        Ok(Self {
            id: UserId::new(),
            account,
            name,
            email,
            password_hash: input.password_hash,
            created_at: now,
            last_login_at: None,
        })
    }

    /// Apply a partial update, validating every supplied field first.
    pub fn apply_update(&mut self, update: UserUpdate) -> DomainResult<()> {
        let name = update.name.as_deref().map(validate_name).transpose()?;
        let email = update.email.as_deref().map(validate_email).transpose()?;

        if let Some(name) = name {
            self.name = name;
        }
        if let Some(email) = email {
            self.email = email;
        }
        if let Some(hash) = update.password_hash.filter(|h| !h.is_empty()) {
            self.password_hash = hash;
        }
        Ok(())
    }

    pub fn record_login(&mut self, at: DateTime<Utc>) {
        self.last_login_at = Some(at);
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile::from(self)
    }
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

fn validate_account(account: &str) -> DomainResult<String> {
    let account = account.trim();
    if account.is_empty() {
        return Err(DomainError::validation("account cannot be empty"));
    }
    if account.len() > MAX_ACCOUNT_LEN {
        return Err(DomainError::validation(format!(
            "account cannot be longer than {MAX_ACCOUNT_LEN} characters"
        )));
    }
    if account.chars().any(char::is_whitespace) {
        return Err(DomainError::validation("account cannot contain whitespace"));
    }
    Ok(account.to_string())
}

fn validate_name(name: &str) -> DomainResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DomainError::validation("name cannot be empty"));
    }
    Ok(name.to_string())
}

fn validate_email(email: &str) -> DomainResult<String> {
    let email = email.trim();
    // Basic shape check: something@something.
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email.to_lowercase()),
        _ => Err(DomainError::validation("invalid email format")),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Profile (outbound view)
// ─────────────────────────────────────────────────────────────────────────────

/// Public view of a user; carries no credential material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub account: String,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            account: user.account.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            created_at: user.created_at,
            last_login_at: user.last_login_at,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
