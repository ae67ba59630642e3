use chrono::Utc;

use minibill_catalog::{CatalogItem, CatalogItemUpdate, NewCatalogItem};
use minibill_core::CatalogItemId;

use super::{ServiceError, ServiceResult};
use crate::store::Repositories;

#[derive(Debug, Clone)]
pub struct CatalogService {
    repos: Repositories,
}

impl CatalogService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    pub fn list(&self, include_inactive: bool) -> ServiceResult<Vec<CatalogItem>> {
        Ok(self.repos.catalog.list(include_inactive)?)
    }

    pub fn get(&self, id: &CatalogItemId) -> ServiceResult<CatalogItem> {
        self.repos.catalog.find_by_id(id)?.ok_or(ServiceError::NotFound("catalog item"))
    }

    pub fn create(&self, input: NewCatalogItem) -> ServiceResult<CatalogItem> {
        let item = CatalogItem::create(input, Utc::now())?;
        self.repos.catalog.insert(item.clone())?;
        tracing::info!(item_id = %item.id, name = %item.name, "catalog item created");
        Ok(item)
    }

    pub fn update(&self, id: &CatalogItemId, update: CatalogItemUpdate) -> ServiceResult<CatalogItem> {
        let mut item = self.get(id)?;
        item.apply_update(update)?;
        self.repos.catalog.update(item.clone())?;
        Ok(item)
    }

    /// Retire an item. It stays referenced by existing transactions but can no
    /// longer be billed.
    pub fn deactivate(&self, id: &CatalogItemId) -> ServiceResult<CatalogItem> {
        let mut item = self.get(id)?;
        item.deactivate();
        self.repos.catalog.update(item.clone())?;
        tracing::info!(item_id = %item.id, "catalog item deactivated");
        Ok(item)
    }
}
