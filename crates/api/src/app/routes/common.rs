use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use minibill_infra::{ServiceError, ServiceResult};

use crate::app::errors;

/// Render a service result as JSON with `status`, or as the mapped error.
pub fn respond<T: Serialize>(status: StatusCode, result: ServiceResult<T>) -> Response {
    match result {
        Ok(value) => (status, Json(value)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub fn ok<T: Serialize>(result: ServiceResult<T>) -> Response {
    respond(StatusCode::OK, result)
}

pub fn no_content(result: ServiceResult<()>) -> Response {
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// Unwrap a JSON body, answering 400 in the usual error shape.
pub fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, Response> {
    body.map(|Json(v)| v).map_err(|e| errors::bad_request(e.body_text()))
}

/// Unwrap query parameters, answering 400 in the usual error shape.
pub fn query<T>(q: Result<axum::extract::Query<T>, QueryRejection>) -> Result<T, Response> {
    q.map(|axum::extract::Query(v)| v).map_err(|e| errors::bad_request(e.body_text()))
}

/// Run CPU-heavy service work (password hashing) off the async workers.
pub async fn blocking<T, F>(f: F) -> ServiceResult<T>
where
    F: FnOnce() -> ServiceResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .unwrap_or_else(|e| Err(ServiceError::Internal(format!("worker task failed: {e}"))))
}
