//! Catalog product (read-only from the cart's point of view).

use serde::Serialize;

use marketplace_core::{CategoryId, Price, ProductId, StoreId};

/// A product listed by a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub price: Price,
    /// Units in stock.
    pub stock: i32,
    pub category_id: CategoryId,
    pub store_id: StoreId,
}
