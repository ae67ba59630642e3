//! Catalog domain module.
//!
//! This crate contains business rules for sellable catalog items, implemented
//! purely as deterministic domain logic (no IO, no HTTP, no storage).

pub mod item;

pub use item::{CatalogItem, CatalogItemUpdate, NewCatalogItem};
