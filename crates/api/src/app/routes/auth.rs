//! Sign-in and sign-up. Both are public.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension},
    http::StatusCode,
    response::Response,
    routing::post,
    Json, Router,
};

use minibill_infra::SignUp;

use crate::app::dto::{SignInRequest, TokenResponse};
use crate::app::routes::common;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/signin", post(sign_in))
        .route("/signup", post(sign_up))
}

pub async fn sign_in(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<SignInRequest>, JsonRejection>,
) -> Response {
    let body = match common::json_body(body) {
        Ok(b) => b,
        Err(resp) => return resp,
    };

    let result = common::blocking(move || services.accounts.sign_in(&body.account, &body.password)).await;
    common::ok(result.map(|signed_in| TokenResponse {
        token: signed_in.token.into_string(),
    }))
}

pub async fn sign_up(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<SignUp>, JsonRejection>,
) -> Response {
    let body = match common::json_body(body) {
        Ok(b) => b,
        Err(resp) => return resp,
    };

    let result = common::blocking(move || services.accounts.sign_up(body)).await;
    common::respond(StatusCode::CREATED, result)
}
