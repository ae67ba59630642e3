//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store, seeding and service construction
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request/response DTOs and parsing helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use anyhow::Context;
use axum::{routing::get, Extension, Router};

use minibill_auth::TokenService;

use crate::config::AppConfig;
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(config: &AppConfig) -> anyhow::Result<Router> {
    let tokens = Arc::new(TokenService::new(&config.token_config()));
    let auth_state = middleware::AuthState {
        tokens: tokens.clone(),
        mode: config.mode,
    };

    let services = Arc::new(services::build_services(config, tokens).context("failed to initialize services")?);

    Ok(Router::new()
        .route("/health", get(routes::system::health))
        .route("/api-docs", get(routes::system::api_docs))
        .merge(routes::router())
        .layer(Extension(services))
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::auth_middleware,
        )))
}
