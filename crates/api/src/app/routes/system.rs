use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::app::errors;
use crate::app::routes::ROUTES;
use crate::app::services::AppServices;
use crate::context::Caller;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// The route table: method, path and required level (`null` for public).
pub async fn api_docs() -> impl IntoResponse {
    Json(serde_json::json!({
        "service": "minibill",
        "routes": ROUTES,
    }))
}

pub async fn whoami(Extension(services): Extension<Arc<AppServices>>, Caller(identity): Caller) -> Response {
    let user = match services.accounts.profile_of(&identity) {
        Ok(user) => user,
        Err(e) => return errors::service_error_to_response(e),
    };

    Json(serde_json::json!({
        "account": identity.account(),
        "permission_level": identity.permission_level(),
        "is_superuser": identity.is_superuser(),
        "user": user,
    }))
    .into_response()
}
