use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    response::Response,
    routing::{delete, get, post, put},
    Json, Router,
};

use minibill_auth::PermissionLevel;
use minibill_catalog::{CatalogItemUpdate, NewCatalogItem};
use minibill_core::CatalogItemId;

use crate::app::dto::parse_id;
use crate::app::routes::common;
use crate::app::services::AppServices;
use crate::guard::requires;

pub fn router() -> Router {
    Router::new()
        .route(
            "/",
            get(list_items)
                .route_layer(requires(PermissionLevel::AUTHENTICATED))
                .merge(post(create_item).route_layer(requires(PermissionLevel::SUPERUSER))),
        )
        .route(
            "/:id",
            put(update_item)
                .merge(delete(deactivate_item))
                .route_layer(requires(PermissionLevel::SUPERUSER)),
        )
}

/// Active items only.
pub async fn list_items(Extension(services): Extension<Arc<AppServices>>) -> Response {
    common::ok(services.catalog.list(false))
}

pub async fn create_item(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<NewCatalogItem>, JsonRejection>,
) -> Response {
    let body = match common::json_body(body) {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    common::respond(StatusCode::CREATED, services.catalog.create(body))
}

pub async fn update_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Result<Json<CatalogItemUpdate>, JsonRejection>,
) -> Response {
    let id = match parse_id::<CatalogItemId>(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let body = match common::json_body(body) {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    common::ok(services.catalog.update(&id, body))
}

pub async fn deactivate_item(Extension(services): Extension<Arc<AppServices>>, Path(id): Path<String>) -> Response {
    let id = match parse_id::<CatalogItemId>(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    common::ok(services.catalog.deactivate(&id))
}
