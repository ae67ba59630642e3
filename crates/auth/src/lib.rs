//! `minibill-auth` — pure authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage: it issues and
//! validates tokens, and answers "may this identity do that?" questions.

pub mod authorize;
pub mod claims;
pub mod identity;
pub mod level;
pub mod ownership;
pub mod password;
pub mod token;

pub use authorize::{AuthzError, require_level};
pub use claims::{TokenClaims, TokenValidationError, validate_claims};
pub use identity::IdentityContext;
pub use level::PermissionLevel;
pub use ownership::{ensure_may_access, may_access};
pub use password::{Argon2Verifier, CredentialError, CredentialVerifier};
pub use token::{BOOTSTRAP_ACCOUNT, SigningSecret, Token, TokenConfig, TokenError, TokenService};
