use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard};

use minibill_auth::PermissionLevel;
use minibill_billing::Transaction;
use minibill_catalog::CatalogItem;
use minibill_core::{CatalogItemId, Entity, PermissionId, TransactionId, UserId};
use minibill_users::{Permission, User, UserPermission};

use super::{
    CatalogRepository, PermissionRepository, StoreError, StoreResult, TransactionRepository,
    UserPermissionRepository, UserRepository,
};

/// In-memory entity table keyed by the entity id, for tests/dev.
///
/// Compound checks (uniqueness, replace) run inside a single [`write`](Self::write)
/// so they are atomic with respect to other writers.
#[derive(Debug)]
pub struct InMemoryStore<V: Entity> {
    inner: RwLock<HashMap<V::Id, V>>,
}

impl<V: Entity> InMemoryStore<V> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }
}

impl<V: Entity> Default for InMemoryStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> InMemoryStore<V>
where
    V: Entity + Clone,
{
    pub fn get(&self, id: &V::Id) -> StoreResult<Option<V>> {
        Ok(self.read()?.get(id).cloned())
    }

    pub fn find(&self, pred: impl Fn(&V) -> bool) -> StoreResult<Option<V>> {
        Ok(self.read()?.values().find(|v| pred(v)).cloned())
    }

    pub fn filter(&self, pred: impl Fn(&V) -> bool) -> StoreResult<Vec<V>> {
        Ok(self.read()?.values().filter(|v| pred(v)).cloned().collect())
    }

    /// Insert or overwrite.
    pub fn upsert(&self, value: V) -> StoreResult<()> {
        self.write(|map| {
            map.insert(value.id().clone(), value);
        })
    }

    /// Overwrite an existing record; `what` names it in the error.
    pub fn update(&self, value: V, what: &'static str) -> StoreResult<()> {
        self.write(|map| match map.get_mut(value.id()) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(StoreError::NotFound(what)),
        })?
    }

    pub fn remove(&self, id: &V::Id) -> StoreResult<Option<V>> {
        self.write(|map| map.remove(id))
    }

    /// Run `f` under the write lock.
    pub fn write<R>(&self, f: impl FnOnce(&mut HashMap<V::Id, V>) -> R) -> StoreResult<R> {
        let mut map = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        Ok(f(&mut map))
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, HashMap<V::Id, V>>> {
        self.inner.read().map_err(|_| StoreError::Poisoned)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Users
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct InMemoryUsers {
    records: InMemoryStore<User>,
}

impl InMemoryUsers {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserRepository for InMemoryUsers {
    fn find_by_id(&self, id: &UserId) -> StoreResult<Option<User>> {
        self.records.get(id)
    }

    fn find_by_account(&self, account: &str) -> StoreResult<Option<User>> {
        self.records.find(|u| u.account == account)
    }

    fn list(&self) -> StoreResult<Vec<User>> {
        let mut users = self.records.filter(|_| true)?;
        users.sort_by_key(|u| u.created_at);
        Ok(users)
    }

    fn insert(&self, user: User) -> StoreResult<()> {
        self.records.write(|map| {
            if map.values().any(|u| u.account == user.account) {
                return Err(StoreError::Duplicate(format!("account {}", user.account)));
            }
            if map.values().any(|u| u.email == user.email) {
                return Err(StoreError::Duplicate(format!("email {}", user.email)));
            }
            map.insert(user.id, user);
            Ok(())
        })?
    }

    fn update(&self, user: User) -> StoreResult<()> {
        self.records.write(|map| {
            if map.values().any(|u| u.id != user.id && u.email == user.email) {
                return Err(StoreError::Duplicate(format!("email {}", user.email)));
            }
            match map.get_mut(&user.id) {
                Some(slot) => {
                    *slot = user;
                    Ok(())
                }
                None => Err(StoreError::NotFound("user")),
            }
        })?
    }

    fn delete(&self, id: &UserId) -> StoreResult<bool> {
        Ok(self.records.remove(id)?.is_some())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Permissions
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct InMemoryPermissions {
    records: InMemoryStore<Permission>,
}

impl InMemoryPermissions {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PermissionRepository for InMemoryPermissions {
    fn find_by_id(&self, id: &PermissionId) -> StoreResult<Option<Permission>> {
        self.records.get(id)
    }

    fn find_by_level(&self, level: PermissionLevel) -> StoreResult<Option<Permission>> {
        self.records.find(|p| p.level == level)
    }

    fn list(&self) -> StoreResult<Vec<Permission>> {
        let mut permissions = self.records.filter(|_| true)?;
        permissions.sort_by_key(|p| p.level);
        Ok(permissions)
    }

    fn insert(&self, permission: Permission) -> StoreResult<()> {
        self.records.write(|map| {
            if map.values().any(|p| p.level == permission.level) {
                return Err(StoreError::Duplicate(format!("permission level {}", permission.level)));
            }
            map.insert(permission.id, permission);
            Ok(())
        })?
    }

    fn update(&self, permission: Permission) -> StoreResult<()> {
        self.records.write(|map| {
            if map.values().any(|p| p.id != permission.id && p.level == permission.level) {
                return Err(StoreError::Duplicate(format!("permission level {}", permission.level)));
            }
            match map.get_mut(&permission.id) {
                Some(slot) => {
                    *slot = permission;
                    Ok(())
                }
                None => Err(StoreError::NotFound("permission")),
            }
        })?
    }

    fn delete(&self, id: &PermissionId) -> StoreResult<bool> {
        Ok(self.records.remove(id)?.is_some())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// User ↔ permission associations
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct InMemoryUserPermissions {
    records: InMemoryStore<UserPermission>,
}

impl InMemoryUserPermissions {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserPermissionRepository for InMemoryUserPermissions {
    fn find_by_user(&self, user_id: &UserId) -> StoreResult<Option<UserPermission>> {
        self.records.find(|a| a.user_id == *user_id)
    }

    fn exists(&self, user_id: &UserId, permission_id: &PermissionId) -> StoreResult<bool> {
        Ok(self
            .records
            .find(|a| a.user_id == *user_id && a.permission_id == *permission_id)?
            .is_some())
    }

    fn list(&self) -> StoreResult<Vec<UserPermission>> {
        self.records.filter(|_| true)
    }

    fn save(&self, association: UserPermission) -> StoreResult<()> {
        self.records.write(|map| {
            if map.values().any(|a| a.user_id == association.user_id) {
                return Err(StoreError::Duplicate(format!(
                    "permission assignment for user {}",
                    association.user_id
                )));
            }
            map.insert(association.id, association);
            Ok(())
        })?
    }

    fn replace(&self, user_id: UserId, permission_id: PermissionId) -> StoreResult<UserPermission> {
        let association = UserPermission::new(user_id, permission_id);
        self.records.write(|map| {
            map.retain(|_, a| a.user_id != user_id);
            map.insert(association.id, association.clone());
        })?;
        Ok(association)
    }

    fn delete_by_user(&self, user_id: &UserId) -> StoreResult<bool> {
        self.records.write(|map| {
            let before = map.len();
            map.retain(|_, a| a.user_id != *user_id);
            map.len() != before
        })
    }

    fn delete_by_permission(&self, permission_id: &PermissionId) -> StoreResult<usize> {
        self.records.write(|map| {
            let before = map.len();
            map.retain(|_, a| a.permission_id != *permission_id);
            before - map.len()
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Catalog
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    records: InMemoryStore<CatalogItem>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CatalogRepository for InMemoryCatalog {
    fn find_by_id(&self, id: &CatalogItemId) -> StoreResult<Option<CatalogItem>> {
        self.records.get(id)
    }

    fn list(&self, include_inactive: bool) -> StoreResult<Vec<CatalogItem>> {
        let mut items = self.records.filter(|i| include_inactive || i.active)?;
        items.sort_by_key(|i| i.created_at);
        Ok(items)
    }

    fn insert(&self, item: CatalogItem) -> StoreResult<()> {
        self.records.upsert(item)
    }

    fn update(&self, item: CatalogItem) -> StoreResult<()> {
        self.records.update(item, "catalog item")
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Transactions
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct InMemoryTransactions {
    records: InMemoryStore<Transaction>,
}

impl InMemoryTransactions {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TransactionRepository for InMemoryTransactions {
    fn find_by_id(&self, id: &TransactionId) -> StoreResult<Option<Transaction>> {
        self.records.get(id)
    }

    fn list(&self) -> StoreResult<Vec<Transaction>> {
        let mut all = self.records.filter(|_| true)?;
        all.sort_by_key(|t| t.created_at);
        Ok(all)
    }

    fn list_by_user(&self, user_id: &UserId) -> StoreResult<Vec<Transaction>> {
        let mut mine = self.records.filter(|t| t.user_id == *user_id)?;
        mine.sort_by_key(|t| t.created_at);
        Ok(mine)
    }

    fn insert(&self, transaction: Transaction) -> StoreResult<()> {
        self.records.upsert(transaction)
    }

    fn update(&self, transaction: Transaction) -> StoreResult<()> {
        self.records.update(transaction, "transaction")
    }

    fn delete(&self, id: &TransactionId) -> StoreResult<bool> {
        Ok(self.records.remove(id)?.is_some())
    }
}
