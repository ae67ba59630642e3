use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use minibill_core::{CatalogItemId, DomainError, DomainResult, Entity};

/// A product or service that transactions can bill for.
///
/// Items are never hard-deleted; retiring one clears `active` so existing
/// transactions keep a valid reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: CatalogItemId,
    pub name: String,
    pub description: Option<String>,
    /// Price in smallest currency unit (e.g., cents).
    pub price: u64,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Input for a new catalog item.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewCatalogItem {
    pub name: String,
    pub description: Option<String>,
    pub price: u64,
    /// Defaults to `true`.
    pub active: Option<bool>,
}

/// Partial update. `None` fields are left as they are; a zero price is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CatalogItemUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<u64>,
    pub active: Option<bool>,
}

impl CatalogItem {
    pub fn create(input: NewCatalogItem, now: DateTime<Utc>) -> DomainResult<Self> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if input.price == 0 {
            return Err(DomainError::validation("price must be greater than zero"));
        }

        Ok(Self {
            id: CatalogItemId::new(),
            name: name.to_string(),
            description: input.description.map(|d| d.trim().to_string()).filter(|d| !d.is_empty()),
            price: input.price,
            active: input.active.unwrap_or(true),
            created_at: now,
        })
    }

    pub fn apply_update(&mut self, update: CatalogItemUpdate) -> DomainResult<()> {
        if let Some(name) = &update.name {
            if name.trim().is_empty() {
                return Err(DomainError::validation("name cannot be empty"));
            }
        }

        if let Some(name) = update.name {
            self.name = name.trim().to_string();
        }
        if let Some(description) = update.description {
            self.description = Some(description.trim().to_string()).filter(|d| !d.is_empty());
        }
        if let Some(price) = update.price.filter(|p| *p > 0) {
            self.price = price;
        }
        if let Some(active) = update.active {
            self.active = active;
        }
        Ok(())
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }

    /// Check if the item can be billed (must be active).
    pub fn can_be_billed(&self) -> bool {
        self.active
    }
}

impl Entity for CatalogItem {
    type Id = CatalogItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widget() -> NewCatalogItem {
        NewCatalogItem {
            name: " Widget ".to_string(),
            description: Some("A widget".to_string()),
            price: 1_250,
            active: None,
        }
    }

    #[test]
    fn create_defaults_to_active_and_trims_name() {
        let item = CatalogItem::create(widget(), Utc::now()).unwrap();
        assert_eq!(item.name, "Widget");
        assert!(item.active);
        assert!(item.can_be_billed());
        assert_eq!(item.price, 1_250);
    }

    #[test]
    fn create_rejects_blank_name_and_zero_price() {
        let mut blank = widget();
        blank.name = "   ".to_string();
        assert!(CatalogItem::create(blank, Utc::now()).is_err());

        let mut free = widget();
        free.price = 0;
        assert!(matches!(
            CatalogItem::create(free, Utc::now()),
            Err(DomainError::Validation(msg)) if msg.contains("price")
        ));
    }

    #[test]
    fn update_ignores_zero_price_and_missing_fields() {
        let mut item = CatalogItem::create(widget(), Utc::now()).unwrap();

        item.apply_update(CatalogItemUpdate {
            price: Some(0),
            description: Some("Better widget".to_string()),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(item.price, 1_250);
        assert_eq!(item.name, "Widget");
        assert_eq!(item.description.as_deref(), Some("Better widget"));
    }

    #[test]
    fn update_applies_positive_price_and_active_flag() {
        let mut item = CatalogItem::create(widget(), Utc::now()).unwrap();

        item.apply_update(CatalogItemUpdate {
            price: Some(900),
            active: Some(false),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(item.price, 900);
        assert!(!item.can_be_billed());
    }

    #[test]
    fn deactivate_retires_item() {
        let mut item = CatalogItem::create(widget(), Utc::now()).unwrap();
        item.deactivate();
        assert!(!item.active);
    }
}
