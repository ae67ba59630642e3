//! Per-route permission guard.
//!
//! ```ignore
//! .route("/permissions", get(list).route_layer(requires(PermissionLevel::SUPERUSER)))
//! ```
//!
//! Anonymous requests get 401, identities below the threshold get 403, and
//! everything else reaches the handler untouched.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use tower::{Layer, Service};

use minibill_auth::{IdentityContext, PermissionLevel, require_level};

use crate::app::errors;

/// Guard layer for a route requiring at least `level`.
pub fn requires(level: PermissionLevel) -> RequirePermissionLayer {
    RequirePermissionLayer { required: level }
}

#[derive(Debug, Clone, Copy)]
pub struct RequirePermissionLayer {
    required: PermissionLevel,
}

impl<S> Layer<S> for RequirePermissionLayer {
    type Service = RequirePermission<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequirePermission {
            inner,
            required: self.required,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RequirePermission<S> {
    inner: S,
    required: PermissionLevel,
}

impl<S> Service<Request<Body>> for RequirePermission<S>
where
    S: Service<Request<Body>, Response = Response> + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Response, S::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        match require_level(req.extensions().get::<IdentityContext>(), self.required) {
            Ok(_) => Box::pin(self.inner.call(req)),
            Err(err) => {
                let response = errors::authz_error_to_response(err);
                Box::pin(async move { Ok(response) })
            }
        }
    }
}
