//! Billing transactions.
//!
//! Every read or write of a single transaction goes through the ownership
//! policy: the billed user or a superuser.

use chrono::{NaiveDate, Utc};
use serde::Serialize;

use minibill_auth::{IdentityContext, ensure_may_access};
use minibill_billing::{BillingConfig, NewTransaction, Transaction, TransactionUpdate};
use minibill_catalog::CatalogItem;
use minibill_core::{CatalogItemId, TransactionId, UserId};

use super::{ServiceError, ServiceResult, authorize_user_target, current_user};
use crate::store::Repositories;

/// Input for opening a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRequest {
    pub catalog_item_id: CatalogItemId,
    pub amount: u64,
    /// Bill someone else. Only superusers may name a user other than themselves.
    pub user_id: Option<UserId>,
    pub dateline: Option<NaiveDate>,
}

/// A transaction with its owner and item resolved for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionView {
    #[serde(flatten)]
    pub transaction: Transaction,
    /// `None` once the owning user has been deleted.
    pub account: Option<String>,
    pub catalog_item_name: Option<String>,
    pub catalog_item_price: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct BillingService {
    repos: Repositories,
    config: BillingConfig,
}

impl BillingService {
    pub fn new(repos: Repositories, config: BillingConfig) -> Self {
        Self { repos, config }
    }

    pub fn create(&self, identity: &IdentityContext, request: TransactionRequest) -> ServiceResult<TransactionView> {
        let owner = match request.user_id {
            Some(id) => authorize_user_target(identity, self.repos.users.find_by_id(&id)?)?,
            None => current_user(&self.repos, identity)?,
        };

        let item = self.billable_item(&request.catalog_item_id)?;
        let transaction = Transaction::open(
            NewTransaction {
                user_id: owner.id,
                catalog_item_id: item.id,
                amount: request.amount,
                dateline: request.dateline,
            },
            self.config,
            Utc::now(),
        )?;
        self.repos.transactions.insert(transaction.clone())?;

        tracing::info!(
            transaction_id = %transaction.id,
            account = %owner.account,
            amount = transaction.amount,
            "transaction opened"
        );
        self.view(transaction)
    }

    pub fn get(&self, identity: &IdentityContext, id: &TransactionId) -> ServiceResult<TransactionView> {
        let transaction = self.find(id)?;
        self.ensure_owner(identity, &transaction)?;
        self.view(transaction)
    }

    /// The caller's own transactions.
    pub fn list_mine(&self, identity: &IdentityContext) -> ServiceResult<Vec<TransactionView>> {
        let me = current_user(&self.repos, identity)?;
        ensure_may_access(identity, &me.account)?;
        self.repos
            .transactions
            .list_by_user(&me.id)?
            .into_iter()
            .map(|t| self.view(t))
            .collect()
    }

    pub fn list_all(&self) -> ServiceResult<Vec<TransactionView>> {
        self.repos
            .transactions
            .list()?
            .into_iter()
            .map(|t| self.view(t))
            .collect()
    }

    pub fn update(
        &self,
        identity: &IdentityContext,
        id: &TransactionId,
        update: TransactionUpdate,
    ) -> ServiceResult<TransactionView> {
        let mut transaction = self.find(id)?;
        self.ensure_owner(identity, &transaction)?;

        if let Some(item_id) = update.catalog_item_id.filter(|i| *i != transaction.catalog_item_id) {
            self.billable_item(&item_id)?;
        }
        transaction.apply_update(update)?;
        self.repos.transactions.update(transaction.clone())?;

        tracing::info!(transaction_id = %transaction.id, actor = identity.account(), "transaction updated");
        self.view(transaction)
    }

    pub fn delete(&self, id: &TransactionId) -> ServiceResult<()> {
        if !self.repos.transactions.delete(id)? {
            return Err(ServiceError::NotFound("transaction"));
        }
        tracing::info!(transaction_id = %id, "transaction deleted");
        Ok(())
    }

    fn find(&self, id: &TransactionId) -> ServiceResult<Transaction> {
        self.repos
            .transactions
            .find_by_id(id)?
            .ok_or(ServiceError::NotFound("transaction"))
    }

    fn ensure_owner(&self, identity: &IdentityContext, transaction: &Transaction) -> ServiceResult<()> {
        match self.repos.users.find_by_id(&transaction.user_id)? {
            Some(owner) => Ok(ensure_may_access(identity, &owner.account)?),
            None if identity.is_superuser() => Ok(()),
            None => Err(ServiceError::forbidden("not the owner of this transaction")),
        }
    }

    fn billable_item(&self, id: &CatalogItemId) -> ServiceResult<CatalogItem> {
        let item = self
            .repos
            .catalog
            .find_by_id(id)?
            .ok_or(ServiceError::NotFound("catalog item"))?;
        if !item.can_be_billed() {
            return Err(ServiceError::validation("catalog item is not active"));
        }
        Ok(item)
    }

    fn view(&self, transaction: Transaction) -> ServiceResult<TransactionView> {
        let account = self.repos.users.find_by_id(&transaction.user_id)?.map(|u| u.account);
        let item = self.repos.catalog.find_by_id(&transaction.catalog_item_id)?;
        Ok(TransactionView {
            transaction,
            account,
            catalog_item_name: item.as_ref().map(|i| i.name.clone()),
            catalog_item_price: item.map(|i| i.price),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::fixtures::{self, identity};
    use minibill_catalog::NewCatalogItem;

    struct World {
        repos: Repositories,
        billing: BillingService,
        item: CatalogItem,
    }

    fn world() -> World {
        let repos = Repositories::in_memory();
        let item = CatalogItem::create(
            NewCatalogItem {
                name: "Hosting".to_string(),
                description: None,
                price: 2_500,
                active: None,
            },
            Utc::now(),
        )
        .unwrap();
        repos.catalog.insert(item.clone()).unwrap();
        let billing = BillingService::new(repos.clone(), BillingConfig::default());
        World { repos, billing, item }
    }

    fn request(w: &World, user_id: Option<UserId>) -> TransactionRequest {
        TransactionRequest {
            catalog_item_id: w.item.id,
            amount: 2_500,
            user_id,
            dateline: None,
        }
    }

    #[test]
    fn create_defaults_to_caller() {
        let w = world();
        let alice = fixtures::register(&w.repos, "alice");

        let view = w.billing.create(&identity("alice", 0), request(&w, None)).unwrap();
        assert_eq!(view.transaction.user_id, alice.id);
        assert_eq!(view.account.as_deref(), Some("alice"));
        assert_eq!(view.catalog_item_name.as_deref(), Some("Hosting"));
        assert!(!view.transaction.is_paid);
    }

    #[test]
    fn billing_someone_else_requires_superuser() {
        let w = world();
        let alice = fixtures::register(&w.repos, "alice");
        fixtures::register(&w.repos, "bob");

        let err = w
            .billing
            .create(&identity("bob", 50), request(&w, Some(alice.id)))
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
        assert!(w.repos.transactions.list().unwrap().is_empty());

        let view = w.billing.create(&identity("root", 99), request(&w, Some(alice.id))).unwrap();
        assert_eq!(view.transaction.user_id, alice.id);
    }

    #[test]
    fn foreign_transaction_is_forbidden() {
        let w = world();
        fixtures::register(&w.repos, "alice");
        fixtures::register(&w.repos, "bob");
        let tx = w.billing.create(&identity("alice", 0), request(&w, None)).unwrap().transaction;

        let bob = identity("bob", 0);
        assert!(matches!(w.billing.get(&bob, &tx.id), Err(ServiceError::Forbidden(_))));
        let err = w
            .billing
            .update(
                &bob,
                &tx.id,
                TransactionUpdate {
                    is_paid: Some(true),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
        assert!(!w.repos.transactions.find_by_id(&tx.id).unwrap().unwrap().is_paid);

        assert!(w.billing.get(&identity("root", 99), &tx.id).is_ok());
    }

    #[test]
    fn owner_can_mark_paid() {
        let w = world();
        fixtures::register(&w.repos, "alice");
        let alice = identity("alice", 0);
        let tx = w.billing.create(&alice, request(&w, None)).unwrap().transaction;

        let view = w
            .billing
            .update(
                &alice,
                &tx.id,
                TransactionUpdate {
                    is_paid: Some(true),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(view.transaction.is_paid);
    }

    #[test]
    fn inactive_item_cannot_be_billed() {
        let w = world();
        fixtures::register(&w.repos, "alice");
        let mut retired = w.item.clone();
        retired.deactivate();
        w.repos.catalog.update(retired).unwrap();

        let err = w.billing.create(&identity("alice", 0), request(&w, None)).unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[test]
    fn list_mine_only_returns_own() {
        let w = world();
        let alice = fixtures::register(&w.repos, "alice");
        fixtures::register(&w.repos, "bob");
        w.billing.create(&identity("alice", 0), request(&w, None)).unwrap();
        w.billing.create(&identity("bob", 0), request(&w, None)).unwrap();

        let mine = w.billing.list_mine(&identity("alice", 0)).unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].transaction.user_id, alice.id);
        assert_eq!(w.billing.list_all().unwrap().len(), 2);
    }

    #[test]
    fn delete_missing_is_not_found() {
        let w = world();
        assert_eq!(
            w.billing.delete(&TransactionId::new()),
            Err(ServiceError::NotFound("transaction"))
        );
    }
}
