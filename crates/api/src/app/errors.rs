use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use minibill_auth::AuthzError;
use minibill_infra::ServiceError;

pub fn service_error_to_response(err: ServiceError) -> axum::response::Response {
    match err {
        ServiceError::InvalidCredentials => {
            json_error(StatusCode::UNAUTHORIZED, "invalid_credentials", err.to_string())
        }
        ServiceError::DuplicateAccount(_) => json_error(StatusCode::CONFLICT, "duplicate_account", err.to_string()),
        ServiceError::Unauthorized => json_error(StatusCode::UNAUTHORIZED, "unauthorized", "authentication required"),
        ServiceError::Forbidden(msg) => json_error(StatusCode::FORBIDDEN, "forbidden", msg),
        ServiceError::NotFound(what) => json_error(StatusCode::NOT_FOUND, "not_found", format!("{what} not found")),
        ServiceError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        ServiceError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        ServiceError::Internal(msg) => {
            tracing::error!(error = %msg, "request failed with internal error");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", "internal error")
        }
    }
}

pub fn authz_error_to_response(err: AuthzError) -> axum::response::Response {
    service_error_to_response(err.into())
}

pub fn bad_request(message: impl Into<String>) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "validation_error", message)
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
