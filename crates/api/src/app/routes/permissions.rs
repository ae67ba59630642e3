use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Extension, Path, Query},
    http::StatusCode,
    response::Response,
    routing::{delete, get, post, put},
    Router,
};

use minibill_auth::PermissionLevel;
use minibill_core::PermissionId;

use crate::app::dto::{parse_id, LevelQuery};
use crate::app::routes::common;
use crate::app::services::AppServices;
use crate::context::Caller;
use crate::guard::requires;

pub fn router() -> Router {
    Router::new()
        .route(
            "/",
            get(list_permissions)
                .merge(post(create_permission))
                .route_layer(requires(PermissionLevel::SUPERUSER)),
        )
        .route(
            "/:id",
            put(update_permission)
                .merge(delete(delete_permission))
                .route_layer(requires(PermissionLevel::SUPERUSER)),
        )
}

pub async fn list_permissions(Extension(services): Extension<Arc<AppServices>>) -> Response {
    common::ok(services.permissions.list())
}

pub async fn create_permission(
    Extension(services): Extension<Arc<AppServices>>,
    q: Result<Query<LevelQuery>, QueryRejection>,
) -> Response {
    let q = match common::query(q) {
        Ok(q) => q,
        Err(resp) => return resp,
    };
    common::respond(
        StatusCode::CREATED,
        services.permissions.create(PermissionLevel::new(q.level)),
    )
}

/// Refuses the record the caller holds and any move off the superuser level.
pub async fn update_permission(
    Extension(services): Extension<Arc<AppServices>>,
    Caller(identity): Caller,
    Path(id): Path<String>,
    q: Result<Query<LevelQuery>, QueryRejection>,
) -> Response {
    let id = match parse_id::<PermissionId>(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let q = match common::query(q) {
        Ok(q) => q,
        Err(resp) => return resp,
    };
    common::ok(services.permissions.update(&identity, &id, PermissionLevel::new(q.level)))
}

/// Also drops every user's association to this permission.
pub async fn delete_permission(
    Extension(services): Extension<Arc<AppServices>>,
    Caller(identity): Caller,
    Path(id): Path<String>,
) -> Response {
    let id = match parse_id::<PermissionId>(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    common::no_content(services.permissions.delete(&identity, &id))
}
