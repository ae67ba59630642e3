//! Token issuance and validation (HS256 JWT).
//!
//! One symmetric secret signs every token in the process. Swapping the secret
//! invalidates all outstanding tokens at once; there is no grace window.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{IdentityContext, PermissionLevel, TokenClaims, TokenValidationError, validate_claims};

/// Subject of the development bootstrap token.
pub const BOOTSTRAP_ACCOUNT: &str = "admin";

/// Symmetric signing secret. Never printed.
#[derive(Clone)]
pub struct SigningSecret(Vec<u8>);

impl SigningSecret {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self(secret.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl core::fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("SigningSecret(<redacted>)")
    }
}

/// Token service configuration, injected at construction.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub secret: SigningSecret,
    /// Lifetime of tokens issued at sign-in.
    pub ttl: Duration,
    /// Lifetime of the development bootstrap token.
    pub bootstrap_ttl: Duration,
}

impl TokenConfig {
    pub const DEFAULT_TTL_SECS: i64 = 60 * 60;
    pub const DEFAULT_BOOTSTRAP_TTL_SECS: i64 = 7 * 24 * 60 * 60;

    /// Config with the default lifetimes (1 hour, 7 days).
    pub fn new(secret: SigningSecret) -> Self {
        Self {
            secret,
            ttl: Duration::seconds(Self::DEFAULT_TTL_SECS),
            bootstrap_ttl: Duration::seconds(Self::DEFAULT_BOOTSTRAP_TTL_SECS),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_bootstrap_ttl(mut self, ttl: Duration) -> Self {
        self.bootstrap_ttl = ttl;
        self
    }
}

/// A signed, opaque token string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl core::fmt::Display for Token {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("invalid token: signature mismatch")]
    BadSignature,

    #[error("invalid token: {0}")]
    Malformed(String),

    #[error("invalid token: {0}")]
    Claims(#[from] TokenValidationError),

    #[error("failed to encode token: {0}")]
    Encode(String),
}

/// Issues and validates MiniBill tokens.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
    bootstrap_ttl: Duration,
}

impl core::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenService")
            .field("ttl", &self.ttl)
            .field("bootstrap_ttl", &self.bootstrap_ttl)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    pub fn new(config: &TokenConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked by `validate_claims` against an explicit clock.
        validation.validate_exp = false;
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            ttl: config.ttl,
            bootstrap_ttl: config.bootstrap_ttl,
        }
    }

    /// Issue a sign-in token for `account` at `level`.
    pub fn issue(&self, account: &str, level: PermissionLevel) -> Result<Token, TokenError> {
        self.issue_at(account, level, Utc::now())
    }

    pub fn issue_at(
        &self,
        account: &str,
        level: PermissionLevel,
        now: DateTime<Utc>,
    ) -> Result<Token, TokenError> {
        self.sign(TokenClaims {
            sub: account.to_string(),
            permission_level: level,
            issued_at: now,
            expires_at: now + self.ttl,
        })
    }

    /// Issue the development bootstrap token (superuser `admin`).
    pub fn issue_bootstrap(&self) -> Result<Token, TokenError> {
        self.issue_bootstrap_at(Utc::now())
    }

    pub fn issue_bootstrap_at(&self, now: DateTime<Utc>) -> Result<Token, TokenError> {
        self.sign(TokenClaims {
            sub: BOOTSTRAP_ACCOUNT.to_string(),
            permission_level: PermissionLevel::SUPERUSER,
            issued_at: now,
            expires_at: now + self.bootstrap_ttl,
        })
    }

    /// Validate `token` and extract the caller's identity.
    ///
    /// Pure computation: no IO, never blocks.
    pub fn validate(&self, token: &str) -> Result<IdentityContext, TokenError> {
        self.validate_at(token, Utc::now())
    }

    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<IdentityContext, TokenError> {
        let claims = self.decode(token)?;
        validate_claims(&claims, now)?;
        Ok(claims.identity())
    }

    /// Verify the signature and decode the claims without checking the time window.
    pub fn decode(&self, token: &str) -> Result<TokenClaims, TokenError> {
        jsonwebtoken::decode::<TokenClaims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => TokenError::BadSignature,
                _ => TokenError::Malformed(e.to_string()),
            })
    }

    fn sign(&self, claims: TokenClaims) -> Result<Token, TokenError> {
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map(Token)
            .map_err(|e| TokenError::Encode(e.to_string()))
    }
}
