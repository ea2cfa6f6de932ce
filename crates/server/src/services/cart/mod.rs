//! Cart service.
//!
//! Orchestrates the cart repository, user directory and catalog. Callers
//! pass the authenticated [`Identity`] into every operation; nothing here
//! reads ambient request state.
//!
//! Storage guarantees the invariants: one cart per user, one line item per
//! product, and quantity merging as a single atomic statement. This module
//! validates input and turns repository outcomes into [`CartError`]s.

mod error;

pub use error::CartError;

use std::collections::HashMap;
use std::sync::Arc;

use tracing::instrument;

use marketplace_core::{ProductId, Quantity};

use crate::db::{CartRepository, CatalogStore, RepositoryError, UserDirectory};
use crate::models::{Cart, CartItem, CartLine, CartView, Identity, ItemUpdate, User};

/// Cart operations for authenticated users.
#[derive(Clone)]
pub struct CartManager {
    carts: Arc<dyn CartRepository>,
    users: Arc<dyn UserDirectory>,
    catalog: Arc<dyn CatalogStore>,
}

impl CartManager {
    /// Create a new cart manager.
    #[must_use]
    pub fn new(
        carts: Arc<dyn CartRepository>,
        users: Arc<dyn UserDirectory>,
        catalog: Arc<dyn CatalogStore>,
    ) -> Self {
        Self {
            carts,
            users,
            catalog,
        }
    }

    /// Return the caller's cart, creating an empty one on first access.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Internal` if the identity has no stored account.
    /// Returns `CartError::Repository` if the database fails.
    #[instrument(skip(self, identity), fields(username = %identity.username))]
    pub async fn get_or_create_cart(&self, identity: &Identity) -> Result<Cart, CartError> {
        let user = self.resolve_user(identity).await?;
        Ok(self.carts.get_or_create(user.id).await?)
    }

    /// Add `quantity` units of a product, merging into an existing line.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidArgument` if `quantity` is not positive or
    /// the merged quantity would be too large.
    /// Returns `CartError::NotFound` if the product does not exist.
    /// Returns `CartError::Internal` if the identity has no stored account.
    #[instrument(skip(self, identity), fields(username = %identity.username, product_id = %product_id))]
    pub async fn add_item(
        &self,
        identity: &Identity,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<CartItem, CartError> {
        let quantity =
            Quantity::positive(quantity).map_err(|e| CartError::InvalidArgument(e.to_string()))?;
        let user = self.resolve_user(identity).await?;
        self.require_product(product_id).await?;

        let item = self
            .carts
            .add_or_increment(user.id, product_id, quantity)
            .await
            .map_err(CartError::from_repository)?;

        tracing::info!(quantity = %item.quantity, "Added to cart");
        Ok(item)
    }

    /// Set the absolute quantity of a line already in the cart. Zero
    /// removes the line.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidArgument` if `quantity` is negative or too
    /// large.
    /// Returns `CartError::NotFound` if the product does not exist or is
    /// not in the cart.
    /// Returns `CartError::Internal` if the identity has no stored account.
    #[instrument(skip(self, identity), fields(username = %identity.username, product_id = %product_id))]
    pub async fn update_item_quantity(
        &self,
        identity: &Identity,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<ItemUpdate, CartError> {
        let quantity = Quantity::non_negative(quantity)
            .map_err(|e| CartError::InvalidArgument(e.to_string()))?;
        let user = self.resolve_user(identity).await?;
        self.require_product(product_id).await?;

        let Some(quantity) = quantity else {
            if !self.carts.remove(user.id, product_id).await? {
                return Err(not_in_cart(product_id));
            }
            tracing::info!("Removed from cart");
            return Ok(ItemUpdate::Removed);
        };

        let item = self
            .carts
            .set_quantity(user.id, product_id, quantity)
            .await
            .map_err(CartError::from_repository)?
            .ok_or_else(|| not_in_cart(product_id))?;

        Ok(ItemUpdate::Updated(item))
    }

    /// Remove a line from the cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::NotFound` if the product is not in the cart.
    /// Returns `CartError::Internal` if the identity has no stored account.
    #[instrument(skip(self, identity), fields(username = %identity.username, product_id = %product_id))]
    pub async fn remove_item(
        &self,
        identity: &Identity,
        product_id: ProductId,
    ) -> Result<(), CartError> {
        let user = self.resolve_user(identity).await?;
        if !self.carts.remove(user.id, product_id).await? {
            return Err(not_in_cart(product_id));
        }
        tracing::info!("Removed from cart");
        Ok(())
    }

    /// Return the caller's cart with every line and its product loaded.
    ///
    /// Creates an empty cart on first access.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Internal` if the identity has no stored account.
    /// Returns `CartError::Repository` if the database fails or a line
    /// references a product the catalog no longer has.
    #[instrument(skip(self, identity), fields(username = %identity.username))]
    pub async fn get_cart(&self, identity: &Identity) -> Result<CartView, CartError> {
        let user = self.resolve_user(identity).await?;

        let (cart, items) = match self.carts.find_with_items(user.id).await? {
            Some(found) => found,
            None => (self.carts.get_or_create(user.id).await?, Vec::new()),
        };

        let ids: Vec<ProductId> = items.iter().map(|item| item.product_id).collect();
        let mut products: HashMap<ProductId, _> = self
            .catalog
            .find_products(&ids)
            .await?
            .into_iter()
            .map(|product| (product.id, product))
            .collect();

        let lines = items
            .into_iter()
            .map(|item| {
                let product = products.remove(&item.product_id).ok_or_else(|| {
                    RepositoryError::DataCorruption(format!(
                        "cart item {} references missing product {}",
                        item.id, item.product_id
                    ))
                })?;
                Ok(CartLine::new(item, product))
            })
            .collect::<Result<Vec<_>, RepositoryError>>()?;

        Ok(CartView::new(cart, lines))
    }

    /// Remove every line, keeping the (now empty) cart. Returns the number
    /// of lines removed.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Internal` if the identity has no stored account.
    #[instrument(skip(self, identity), fields(username = %identity.username))]
    pub async fn clear_cart(&self, identity: &Identity) -> Result<u64, CartError> {
        let user = self.resolve_user(identity).await?;
        let removed = self.carts.clear(user.id).await?;
        tracing::info!(removed, "Cleared cart");
        Ok(removed)
    }

    /// Delete the user's cart and all of its lines, as account teardown
    /// does. Returns `false` if the user had no cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::NotFound` if no account has this username.
    #[instrument(skip(self, identity), fields(username = %identity.username))]
    pub async fn delete_cart_for_user(&self, identity: &Identity) -> Result<bool, CartError> {
        let user = self
            .users
            .find_by_username(&identity.username)
            .await?
            .ok_or_else(|| CartError::NotFound(format!("user {} not found", identity.username)))?;

        let deleted = self.carts.delete_for_user(user.id).await?;
        if deleted {
            tracing::info!(user_id = %user.id, "Deleted cart");
        }
        Ok(deleted)
    }

    /// Resolve an authenticated identity to its stored account.
    ///
    /// A verified token for a user that no longer exists is a server-side
    /// fault, not a client error.
    async fn resolve_user(&self, identity: &Identity) -> Result<User, CartError> {
        self.users
            .find_by_username(&identity.username)
            .await?
            .ok_or_else(|| {
                tracing::warn!("Authenticated identity has no stored account");
                CartError::Internal(format!(
                    "no account for authenticated user {}",
                    identity.username
                ))
            })
    }

    async fn require_product(&self, product_id: ProductId) -> Result<(), CartError> {
        match self.catalog.find_product(product_id).await? {
            Some(_) => Ok(()),
            None => Err(CartError::NotFound(format!(
                "product {product_id} not found"
            ))),
        }
    }
}

fn not_in_cart(product_id: ProductId) -> CartError {
    CartError::NotFound(format!("product {product_id} is not in the cart"))
}
