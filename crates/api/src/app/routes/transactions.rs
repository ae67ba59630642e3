use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Extension, Path, Query},
    http::StatusCode,
    response::Response,
    routing::{delete, get, post, put},
    Router,
};

use minibill_auth::PermissionLevel;
use minibill_core::{CatalogItemId, TransactionId, UserId};
use minibill_infra::TransactionRequest;

use crate::app::dto::{parse_id, CreateTransactionQuery, UpdateTransactionQuery};
use crate::app::routes::common;
use crate::app::services::AppServices;
use crate::context::Caller;
use crate::guard::requires;

pub fn router() -> Router {
    Router::new()
        .route(
            "/",
            post(create_transaction)
                .route_layer(requires(PermissionLevel::AUTHENTICATED))
                .merge(get(list_transactions).route_layer(requires(PermissionLevel::SUPERUSER))),
        )
        .route(
            "/my",
            get(list_my_transactions).route_layer(requires(PermissionLevel::AUTHENTICATED)),
        )
        .route(
            "/:id",
            get(get_transaction)
                .merge(put(update_transaction))
                .route_layer(requires(PermissionLevel::AUTHENTICATED))
                .merge(delete(delete_transaction).route_layer(requires(PermissionLevel::SUPERUSER))),
        )
}

pub async fn create_transaction(
    Extension(services): Extension<Arc<AppServices>>,
    Caller(identity): Caller,
    q: Result<Query<CreateTransactionQuery>, QueryRejection>,
) -> Response {
    let q = match common::query(q) {
        Ok(q) => q,
        Err(resp) => return resp,
    };
    let catalog_item_id = match parse_id::<CatalogItemId>(&q.catalog_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let user_id = match q.user_id.as_deref().map(parse_id::<UserId>).transpose() {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    let request = TransactionRequest {
        catalog_item_id,
        amount: q.amount,
        user_id,
        dateline: q.dateline,
    };
    common::respond(StatusCode::CREATED, services.billing.create(&identity, request))
}

pub async fn list_transactions(Extension(services): Extension<Arc<AppServices>>) -> Response {
    common::ok(services.billing.list_all())
}

pub async fn list_my_transactions(
    Extension(services): Extension<Arc<AppServices>>,
    Caller(identity): Caller,
) -> Response {
    common::ok(services.billing.list_mine(&identity))
}

pub async fn get_transaction(
    Extension(services): Extension<Arc<AppServices>>,
    Caller(identity): Caller,
    Path(id): Path<String>,
) -> Response {
    let id = match parse_id::<TransactionId>(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    common::ok(services.billing.get(&identity, &id))
}

pub async fn update_transaction(
    Extension(services): Extension<Arc<AppServices>>,
    Caller(identity): Caller,
    Path(id): Path<String>,
    q: Result<Query<UpdateTransactionQuery>, QueryRejection>,
) -> Response {
    let id = match parse_id::<TransactionId>(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let update = match common::query(q).and_then(UpdateTransactionQuery::into_update) {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    common::ok(services.billing.update(&identity, &id, update))
}

pub async fn delete_transaction(Extension(services): Extension<Arc<AppServices>>, Path(id): Path<String>) -> Response {
    let id = match parse_id::<TransactionId>(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    common::no_content(services.billing.delete(&id))
}
