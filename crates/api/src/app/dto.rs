use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use minibill_auth::PermissionLevel;
use minibill_billing::TransactionUpdate;
use minibill_core::{CatalogItemId, DomainError, PermissionId};
use minibill_infra::PermissionRef;

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub account: String,
    pub password: String,
}

/// `POST /transactions?catalogId=..&amount=..[&userId=..][&dateline=YYYY-MM-DD]`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionQuery {
    pub catalog_id: String,
    pub amount: u64,
    pub user_id: Option<String>,
    pub dateline: Option<NaiveDate>,
}

/// `PUT /transactions/:id?[catalogId=..][&amount=..][&isPaid=..]`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTransactionQuery {
    pub catalog_id: Option<String>,
    pub amount: Option<u64>,
    pub is_paid: Option<bool>,
}

impl UpdateTransactionQuery {
    pub fn into_update(self) -> Result<TransactionUpdate, axum::response::Response> {
        let catalog_item_id = self
            .catalog_id
            .as_deref()
            .map(parse_id::<CatalogItemId>)
            .transpose()?;
        Ok(TransactionUpdate {
            catalog_item_id,
            amount: self.amount,
            is_paid: self.is_paid,
        })
    }
}

/// `?permissionId=..` or `?level=..`; the id wins when both are given.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignPermissionQuery {
    pub permission_id: Option<String>,
    pub level: Option<i32>,
}

impl AssignPermissionQuery {
    pub fn into_ref(self) -> Result<PermissionRef, axum::response::Response> {
        match (self.permission_id, self.level) {
            (Some(id), _) => Ok(PermissionRef::Id(parse_id::<PermissionId>(&id)?)),
            (None, Some(level)) => Ok(PermissionRef::Level(PermissionLevel::new(level))),
            (None, None) => Err(errors::bad_request("permissionId or level is required")),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LevelQuery {
    pub level: i32,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

// -------------------------
// Parsing helpers
// -------------------------

/// Parse a path or query id, answering 400 on garbage.
pub fn parse_id<T>(raw: &str) -> Result<T, axum::response::Response>
where
    T: FromStr<Err = DomainError>,
{
    raw.parse::<T>().map_err(|e| errors::bad_request(e.to_string()))
}
