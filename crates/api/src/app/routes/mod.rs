use axum::{routing::get, Router};
use serde::Serialize;

use minibill_auth::PermissionLevel;

use crate::guard::requires;

pub mod auth;
pub mod catalog;
pub mod common;
pub mod permissions;
pub mod system;
pub mod transactions;
pub mod users;

/// Router for every endpoint except `/health` and `/api-docs`.
///
/// Access control is declared per route with [`requires`]; `/auth/*` is open.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami).route_layer(requires(PermissionLevel::AUTHENTICATED)))
        .nest("/auth", auth::router())
        .nest("/catalog", catalog::router())
        .nest("/transactions", transactions::router())
        .nest("/users", users::router())
        .nest("/permissions", permissions::router())
}

/// One row of the published route table.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RouteDoc {
    pub method: &'static str,
    pub path: &'static str,
    /// Minimum permission level; `None` for public routes.
    pub level: Option<i32>,
    pub summary: &'static str,
}

const fn route(method: &'static str, path: &'static str, level: Option<i32>, summary: &'static str) -> RouteDoc {
    RouteDoc {
        method,
        path,
        level,
        summary,
    }
}

const PUBLIC: Option<i32> = None;
const ANY: Option<i32> = Some(PermissionLevel::AUTHENTICATED.value());
const SUPER: Option<i32> = Some(PermissionLevel::SUPERUSER.value());

/// Keep in sync with the routers above.
pub const ROUTES: &[RouteDoc] = &[
    route("GET", "/health", PUBLIC, "liveness"),
    route("GET", "/api-docs", PUBLIC, "this table"),
    route("POST", "/auth/signin", PUBLIC, "exchange account and password for a token"),
    route("POST", "/auth/signup", PUBLIC, "register an account"),
    route("GET", "/whoami", ANY, "identity of the caller"),
    route("GET", "/catalog", ANY, "active catalog items"),
    route("POST", "/catalog", SUPER, "create a catalog item"),
    route("PUT", "/catalog/:id", SUPER, "update a catalog item"),
    route("DELETE", "/catalog/:id", SUPER, "deactivate a catalog item"),
    route("POST", "/transactions", ANY, "open a transaction (?catalogId&amount[&userId][&dateline])"),
    route("GET", "/transactions", SUPER, "all transactions"),
    route("GET", "/transactions/my", ANY, "the caller's transactions"),
    route("GET", "/transactions/:id", ANY, "one transaction (owner or superuser)"),
    route("PUT", "/transactions/:id", ANY, "update a transaction (?catalogId&amount&isPaid)"),
    route("DELETE", "/transactions/:id", SUPER, "delete a transaction"),
    route("GET", "/users", SUPER, "all users"),
    route("GET", "/users/permissions/all", SUPER, "every user with their permission"),
    route("GET", "/users/:id", ANY, "one user (owner or superuser)"),
    route("PUT", "/users/:id", ANY, "update name, email or password (owner or superuser)"),
    route("DELETE", "/users/:id", SUPER, "delete a user"),
    route("GET", "/users/:id/permissions", SUPER, "a user's permission"),
    route("POST", "/users/:id/permissions", SUPER, "assign a permission (?permissionId or ?level)"),
    route("PUT", "/users/:id/permissions", SUPER, "replace a permission (?permissionId or ?level)"),
    route("DELETE", "/users/:id/permissions", SUPER, "remove a user's permission"),
    route("GET", "/permissions", SUPER, "all permissions"),
    route("POST", "/permissions", SUPER, "create a permission (?level)"),
    route("PUT", "/permissions/:id", SUPER, "change a permission's level (?level)"),
    route("DELETE", "/permissions/:id", SUPER, "delete a permission"),
];
