//! Billing domain module.
//!
//! A transaction bills one user for one catalog item, with a payment dateline.

pub mod transaction;

pub use transaction::{BillingConfig, NewTransaction, Transaction, TransactionUpdate};
