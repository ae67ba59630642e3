use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use minibill_core::{CatalogItemId, DomainError, DomainResult, Entity, TransactionId, UserId};

/// Billing settings, injected at service construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BillingConfig {
    /// Days between creation and the payment dateline when none is given.
    pub default_dateline_days: u32,
}

impl BillingConfig {
    pub const DEFAULT_DATELINE_DAYS: u32 = 7;
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            default_dateline_days: Self::DEFAULT_DATELINE_DAYS,
        }
    }
}

/// One billed purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    /// Owner of the transaction (the billed user).
    pub user_id: UserId,
    pub catalog_item_id: CatalogItemId,
    /// Amount in smallest currency unit (e.g., cents).
    pub amount: u64,
    pub created_at: DateTime<Utc>,
    /// Date by which the transaction should be paid.
    pub dateline: NaiveDate,
    pub is_paid: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    pub user_id: UserId,
    pub catalog_item_id: CatalogItemId,
    pub amount: u64,
    /// Defaults to creation date + `default_dateline_days`.
    pub dateline: Option<NaiveDate>,
}

/// Partial update. `None` fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionUpdate {
    pub catalog_item_id: Option<CatalogItemId>,
    pub amount: Option<u64>,
    pub is_paid: Option<bool>,
}

impl Transaction {
    /// Open a new, unpaid transaction.
    pub fn open(input: NewTransaction, config: BillingConfig, now: DateTime<Utc>) -> DomainResult<Self> {
        if input.amount == 0 {
            return Err(DomainError::validation("amount must be greater than zero"));
        }

        let dateline = match input.dateline {
            Some(d) => d,
            None => now
                .date_naive()
                .checked_add_days(Days::new(u64::from(config.default_dateline_days)))
                .ok_or_else(|| DomainError::validation("dateline out of range"))?,
        };

        Ok(Self {
            id: TransactionId::new(),
            user_id: input.user_id,
            catalog_item_id: input.catalog_item_id,
            amount: input.amount,
            created_at: now,
            dateline,
            is_paid: false,
        })
    }

    pub fn apply_update(&mut self, update: TransactionUpdate) -> DomainResult<()> {
        if update.amount == Some(0) {
            return Err(DomainError::validation("amount must be greater than zero"));
        }

        if let Some(item) = update.catalog_item_id {
            self.catalog_item_id = item;
        }
        if let Some(amount) = update.amount {
            self.amount = amount;
        }
        if let Some(paid) = update.is_paid {
            self.is_paid = paid;
        }
        Ok(())
    }
}

impl Entity for Transaction {
    type Id = TransactionId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
