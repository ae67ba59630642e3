//! User profiles and their permission assignment.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Extension, Path, Query,
    },
    response::Response,
    routing::{delete, get, post, put},
    Json, Router,
};

use minibill_auth::PermissionLevel;
use minibill_core::UserId;
use minibill_infra::ProfileUpdate;

use crate::app::dto::{parse_id, AssignPermissionQuery};
use crate::app::routes::common;
use crate::app::services::AppServices;
use crate::context::Caller;
use crate::guard::requires;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_users).route_layer(requires(PermissionLevel::SUPERUSER)))
        .route(
            "/permissions/all",
            get(list_user_permissions).route_layer(requires(PermissionLevel::SUPERUSER)),
        )
        .route(
            "/:id",
            get(get_user)
                .merge(put(update_user))
                .route_layer(requires(PermissionLevel::AUTHENTICATED))
                .merge(delete(delete_user).route_layer(requires(PermissionLevel::SUPERUSER))),
        )
        .route(
            "/:id/permissions",
            get(get_user_permission)
                .merge(post(assign_permission))
                .merge(put(assign_permission))
                .merge(delete(revoke_permission))
                .route_layer(requires(PermissionLevel::SUPERUSER)),
        )
}

pub async fn list_users(Extension(services): Extension<Arc<AppServices>>) -> Response {
    common::ok(services.users.list())
}

pub async fn get_user(
    Extension(services): Extension<Arc<AppServices>>,
    Caller(identity): Caller,
    Path(id): Path<String>,
) -> Response {
    let id = match parse_id::<UserId>(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    common::ok(services.users.get(&identity, &id))
}

pub async fn update_user(
    Extension(services): Extension<Arc<AppServices>>,
    Caller(identity): Caller,
    Path(id): Path<String>,
    body: Result<Json<ProfileUpdate>, JsonRejection>,
) -> Response {
    let id = match parse_id::<UserId>(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let body = match common::json_body(body) {
        Ok(b) => b,
        Err(resp) => return resp,
    };

    let result = common::blocking(move || services.users.update(&identity, &id, body)).await;
    common::ok(result)
}

pub async fn delete_user(
    Extension(services): Extension<Arc<AppServices>>,
    Caller(identity): Caller,
    Path(id): Path<String>,
) -> Response {
    let id = match parse_id::<UserId>(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    common::no_content(services.users.delete(&identity, &id))
}

pub async fn list_user_permissions(Extension(services): Extension<Arc<AppServices>>) -> Response {
    common::ok(services.permissions.list_assignments())
}

pub async fn get_user_permission(Extension(services): Extension<Arc<AppServices>>, Path(id): Path<String>) -> Response {
    let id = match parse_id::<UserId>(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    common::ok(services.permissions.assignment_of(&id))
}

/// Serves both POST and PUT: either way the user ends up holding exactly the
/// referenced permission.
pub async fn assign_permission(
    Extension(services): Extension<Arc<AppServices>>,
    Caller(identity): Caller,
    Path(id): Path<String>,
    q: Result<Query<AssignPermissionQuery>, QueryRejection>,
) -> Response {
    let id = match parse_id::<UserId>(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let target = match common::query(q).and_then(AssignPermissionQuery::into_ref) {
        Ok(t) => t,
        Err(resp) => return resp,
    };
    common::ok(services.permissions.assign(&identity, &id, target))
}

pub async fn revoke_permission(
    Extension(services): Extension<Arc<AppServices>>,
    Caller(identity): Caller,
    Path(id): Path<String>,
) -> Response {
    let id = match parse_id::<UserId>(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    common::no_content(services.permissions.revoke(&identity, &id))
}
