//! Storage abstraction.
//!
//! Services depend on these traits only. The in-memory adapters in [`memory`]
//! back tests and single-node deployments; a database adapter would implement
//! the same traits.

pub mod memory;

use std::sync::Arc;

use thiserror::Error;

use minibill_auth::PermissionLevel;
use minibill_billing::Transaction;
use minibill_catalog::CatalogItem;
use minibill_core::{CatalogItemId, PermissionId, TransactionId, UserId};
use minibill_users::{Permission, User, UserPermission};

pub use memory::{
    InMemoryCatalog, InMemoryPermissions, InMemoryStore, InMemoryTransactions, InMemoryUserPermissions,
    InMemoryUsers,
};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A uniqueness constraint was violated.
    #[error("duplicate {0}")]
    Duplicate(String),

    /// An update targeted a record that does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// A lock was poisoned by a panicking writer.
    #[error("store lock poisoned")]
    Poisoned,
}

pub trait UserRepository: Send + Sync {
    fn find_by_id(&self, id: &UserId) -> StoreResult<Option<User>>;

    fn find_by_account(&self, account: &str) -> StoreResult<Option<User>>;

    /// All users, oldest first.
    fn list(&self) -> StoreResult<Vec<User>>;

    /// Fails with [`StoreError::Duplicate`] when the account or email is taken.
    fn insert(&self, user: User) -> StoreResult<()>;

    fn update(&self, user: User) -> StoreResult<()>;

    /// Returns `false` when nothing was deleted.
    fn delete(&self, id: &UserId) -> StoreResult<bool>;
}

pub trait PermissionRepository: Send + Sync {
    fn find_by_id(&self, id: &PermissionId) -> StoreResult<Option<Permission>>;

    fn find_by_level(&self, level: PermissionLevel) -> StoreResult<Option<Permission>>;

    /// All permissions, lowest level first.
    fn list(&self) -> StoreResult<Vec<Permission>>;

    /// Levels are unique.
    fn insert(&self, permission: Permission) -> StoreResult<()>;

    fn update(&self, permission: Permission) -> StoreResult<()>;

    fn delete(&self, id: &PermissionId) -> StoreResult<bool>;
}

/// The user ↔ permission join.
///
/// Implementations must keep at most one association per user.
pub trait UserPermissionRepository: Send + Sync {
    fn find_by_user(&self, user_id: &UserId) -> StoreResult<Option<UserPermission>>;

    fn exists(&self, user_id: &UserId, permission_id: &PermissionId) -> StoreResult<bool>;

    fn list(&self) -> StoreResult<Vec<UserPermission>>;

    /// Insert a new association. Fails with [`StoreError::Duplicate`] if the
    /// user already has one; use [`replace`](Self::replace) to switch.
    fn save(&self, association: UserPermission) -> StoreResult<()>;

    /// Atomically drop whatever the user holds and bind the new permission.
    ///
    /// Concurrent callers never observe the user with zero or two associations.
    fn replace(&self, user_id: UserId, permission_id: PermissionId) -> StoreResult<UserPermission>;

    fn delete_by_user(&self, user_id: &UserId) -> StoreResult<bool>;

    /// Returns the number of associations removed.
    fn delete_by_permission(&self, permission_id: &PermissionId) -> StoreResult<usize>;
}

pub trait CatalogRepository: Send + Sync {
    fn find_by_id(&self, id: &CatalogItemId) -> StoreResult<Option<CatalogItem>>;

    /// Items in creation order, optionally including inactive ones.
    fn list(&self, include_inactive: bool) -> StoreResult<Vec<CatalogItem>>;

    fn insert(&self, item: CatalogItem) -> StoreResult<()>;

    fn update(&self, item: CatalogItem) -> StoreResult<()>;
}

pub trait TransactionRepository: Send + Sync {
    fn find_by_id(&self, id: &TransactionId) -> StoreResult<Option<Transaction>>;

    /// All transactions, oldest first.
    fn list(&self) -> StoreResult<Vec<Transaction>>;

    fn list_by_user(&self, user_id: &UserId) -> StoreResult<Vec<Transaction>>;

    fn insert(&self, transaction: Transaction) -> StoreResult<()>;

    fn update(&self, transaction: Transaction) -> StoreResult<()>;

    fn delete(&self, id: &TransactionId) -> StoreResult<bool>;
}

/// Every repository the services need, behind trait objects.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub permissions: Arc<dyn PermissionRepository>,
    pub user_permissions: Arc<dyn UserPermissionRepository>,
    pub catalog: Arc<dyn CatalogRepository>,
    pub transactions: Arc<dyn TransactionRepository>,
}

impl Repositories {
    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(InMemoryUsers::new()),
            permissions: Arc::new(InMemoryPermissions::new()),
            user_permissions: Arc::new(InMemoryUserPermissions::new()),
            catalog: Arc::new(InMemoryCatalog::new()),
            transactions: Arc::new(InMemoryTransactions::new()),
        }
    }
}

impl std::fmt::Debug for Repositories {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repositories").finish_non_exhaustive()
    }
}
