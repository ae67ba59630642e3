use std::sync::Arc;

use axum::{
    extract::State,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use minibill_auth::{IdentityContext, TokenService};

use crate::config::Mode;

/// Paths that never look at credentials.
pub const PUBLIC_PATHS: &[&str] = &["/auth/signin", "/auth/signup", "/api-docs", "/health"];

#[derive(Clone)]
pub struct AuthState {
    pub tokens: Arc<TokenService>,
    pub mode: Mode,
}

/// Attach the caller's identity to the request, if there is one.
///
/// Never rejects: a missing or invalid credential leaves the request
/// anonymous, and the per-route guard decides what anonymous may do.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    if is_public(req.uri().path()) {
        return next.run(req).await;
    }

    if let Some(identity) = resolve_identity(&state, req.headers()) {
        req.extensions_mut().insert(identity);
    }

    next.run(req).await
}

pub fn is_public(path: &str) -> bool {
    let path = match path.strip_suffix('/') {
        Some(trimmed) if !trimmed.is_empty() => trimmed,
        _ => path,
    };
    PUBLIC_PATHS.contains(&path)
}

/// Resolve the identity carried by `headers`.
///
/// - valid bearer token: its identity
/// - invalid or malformed credential: `None`
/// - no credential: the bootstrap superuser in development mode, else `None`
pub fn resolve_identity(state: &AuthState, headers: &HeaderMap) -> Option<IdentityContext> {
    match extract_bearer(headers) {
        Credential::Bearer(token) => match state.tokens.validate(token) {
            Ok(identity) => Some(identity),
            Err(err) => {
                tracing::debug!(error = %err, "rejected bearer token; continuing anonymous");
                None
            }
        },
        Credential::Malformed => {
            tracing::debug!("malformed authorization header; continuing anonymous");
            None
        }
        Credential::Absent if state.mode == Mode::Development => {
            tracing::warn!("no credential supplied; using development bootstrap identity");
            let token = state.tokens.issue_bootstrap().ok()?;
            state.tokens.validate(token.as_str()).ok()
        }
        Credential::Absent => None,
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Credential<'a> {
    Absent,
    Bearer(&'a str),
    Malformed,
}

fn extract_bearer(headers: &HeaderMap) -> Credential<'_> {
    let Some(header) = headers.get(axum::http::header::AUTHORIZATION) else {
        return Credential::Absent;
    };

    let Ok(header) = header.to_str() else {
        return Credential::Malformed;
    };

    match header.strip_prefix("Bearer ").map(str::trim) {
        Some(token) if !token.is_empty() => Credential::Bearer(token),
        _ => Credential::Malformed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, header::AUTHORIZATION};
    use minibill_auth::{PermissionLevel, SigningSecret, TokenConfig};

    fn state(mode: Mode) -> AuthState {
        AuthState {
            tokens: Arc::new(TokenService::new(&TokenConfig::new(SigningSecret::new("mw-secret")))),
            mode,
        }
    }

    fn headers(value: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        h
    }

    #[test]
    fn valid_token_resolves_identity() {
        let state = state(Mode::Production);
        let token = state.tokens.issue("alice", PermissionLevel::new(5)).unwrap();

        let identity = resolve_identity(&state, &headers(&format!("Bearer {token}"))).unwrap();
        assert_eq!(identity.account(), "alice");
        assert_eq!(identity.permission_level(), PermissionLevel::new(5));
    }

    #[test]
    fn bad_credentials_soft_fail() {
        let state = state(Mode::Development);
        assert_eq!(resolve_identity(&state, &headers("Bearer not-a-jwt")), None);
        assert_eq!(resolve_identity(&state, &headers("Basic dXNlcjpwYXNz")), None);
        assert_eq!(resolve_identity(&state, &headers("Bearer   ")), None);
    }

    #[test]
    fn missing_credential_is_bootstrap_only_in_development() {
        assert_eq!(resolve_identity(&state(Mode::Production), &HeaderMap::new()), None);

        let identity = resolve_identity(&state(Mode::Development), &HeaderMap::new()).unwrap();
        assert_eq!(identity.account(), "admin");
        assert!(identity.is_superuser());
    }

    #[test]
    fn public_paths_match_exactly() {
        assert!(is_public("/auth/signin"));
        assert!(is_public("/health/"));
        assert!(!is_public("/auth/signin/extra"));
        assert!(!is_public("/whoami"));
        assert!(!is_public("/"));
    }

    #[test]
    fn extract_bearer_distinguishes_absent_and_malformed() {
        assert_eq!(extract_bearer(&HeaderMap::new()), Credential::Absent);
        assert_eq!(extract_bearer(&headers("Token abc")), Credential::Malformed);
        assert_eq!(extract_bearer(&headers("Bearer abc")), Credential::Bearer("abc"));
    }
}
