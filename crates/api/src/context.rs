use axum::extract::FromRequestParts;
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::Response;

use minibill_auth::IdentityContext;

use crate::app::errors;

/// The authenticated caller of a request.
///
/// Read from the request extensions, where the auth middleware puts the
/// identity resolved from the bearer token. Rejects with 401 when the request
/// is anonymous.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller(pub IdentityContext);

impl Caller {
    pub fn identity(&self) -> &IdentityContext {
        &self.0
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<IdentityContext>()
            .cloned()
            .map(Caller)
            .ok_or_else(|| errors::json_error(StatusCode::UNAUTHORIZED, "unauthorized", "authentication required"))
    }
}
