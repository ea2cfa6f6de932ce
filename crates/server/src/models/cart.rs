//! Cart domain types.
//!
//! A cart belongs to exactly one user and owns its line items. Line items
//! reference products by ID only; there are no back-pointers.

use chrono::{DateTime, Utc};
use serde::Serialize;

use marketplace_core::{CartId, CartItemId, Price, ProductId, Quantity, UserId};

use super::Product;

/// A user's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub id: CartId,
    /// Owning user (unique: one cart per user).
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}

/// A (product, quantity) pairing within a cart.
///
/// At most one line item exists per (cart, product) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: CartItemId,
    pub cart_id: CartId,
    pub product_id: ProductId,
    pub quantity: Quantity,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A line item together with the product it references.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    #[serde(flatten)]
    pub item: CartItem,
    pub product: Product,
    /// `product.price * quantity`
    pub line_total: Price,
}

impl CartLine {
    /// Pair an item with its product.
    #[must_use]
    pub fn new(item: CartItem, product: Product) -> Self {
        let line_total = product.price.times(item.quantity.get());
        Self {
            item,
            product,
            line_total,
        }
    }
}

/// A fully loaded cart: the cart row plus every line item.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    #[serde(flatten)]
    pub cart: Cart,
    pub items: Vec<CartLine>,
    /// Sum of all quantities.
    pub item_count: u64,
    /// Sum of all line totals.
    pub subtotal: Price,
}

impl CartView {
    /// Assemble a view, computing the totals.
    #[must_use]
    pub fn new(cart: Cart, items: Vec<CartLine>) -> Self {
        let item_count = items
            .iter()
            .map(|line| u64::from(line.item.quantity.get()))
            .sum();
        let subtotal = items.iter().fold(Price::ZERO, |acc, line| {
            Price::new(acc.amount() + line.line_total.amount()).unwrap_or(acc)
        });
        Self {
            cart,
            items,
            item_count,
            subtotal,
        }
    }

    /// Find the line for a product.
    #[must_use]
    pub fn line(&self, product_id: ProductId) -> Option<&CartLine> {
        self.items
            .iter()
            .find(|line| line.item.product_id == product_id)
    }
}

/// Outcome of setting a line item's quantity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemUpdate {
    /// The item now holds the requested quantity.
    Updated(CartItem),
    /// The requested quantity was zero and the item was deleted.
    Removed,
}
