//! In-memory repositories for tests.
//!
//! Each repository keeps its whole state behind one [`RwLock`], so every
//! trait method runs under a single write (or read) guard and is atomic
//! in the same way the `PostgreSQL` adapters are.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use marketplace_core::{CartId, CartItemId, ProductId, Quantity, UserId, Username};

use super::{CartRepository, CatalogStore, RepositoryError, UserDirectory};
use crate::models::{Cart, CartItem, Product, User};

#[derive(Default)]
struct CartState {
    carts: HashMap<UserId, Cart>,
    /// Keyed by item ID so iteration follows insertion order.
    items: BTreeMap<CartItemId, CartItem>,
    next_cart_id: i64,
    next_item_id: i64,
}

impl CartState {
    fn get_or_create(&mut self, user_id: UserId) -> Cart {
        if let Some(cart) = self.carts.get(&user_id) {
            return cart.clone();
        }
        self.next_cart_id += 1;
        let cart = Cart {
            id: CartId::new(self.next_cart_id),
            user_id,
            created_at: Utc::now(),
        };
        self.carts.insert(user_id, cart.clone());
        cart
    }

    fn item_key(&self, user_id: UserId, product_id: ProductId) -> Option<CartItemId> {
        let cart = self.carts.get(&user_id)?;
        self.items
            .values()
            .find(|item| item.cart_id == cart.id && item.product_id == product_id)
            .map(|item| item.id)
    }

    fn remove_items_of(&mut self, cart_id: CartId) -> u64 {
        let before = self.items.len();
        self.items.retain(|_, item| item.cart_id != cart_id);
        (before - self.items.len()) as u64
    }
}

/// In-memory [`CartRepository`].
#[derive(Default)]
pub struct MemoryCartRepository {
    state: RwLock<CartState>,
}

impl MemoryCartRepository {
    /// Create an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of carts held, across all users.
    pub async fn cart_count(&self) -> usize {
        self.state.read().await.carts.len()
    }

    /// Number of line items held, across all carts.
    pub async fn item_count(&self) -> usize {
        self.state.read().await.items.len()
    }
}

#[async_trait]
impl CartRepository for MemoryCartRepository {
    async fn find_by_user(&self, user_id: UserId) -> Result<Option<Cart>, RepositoryError> {
        Ok(self.state.read().await.carts.get(&user_id).cloned())
    }

    async fn get_or_create(&self, user_id: UserId) -> Result<Cart, RepositoryError> {
        Ok(self.state.write().await.get_or_create(user_id))
    }

    async fn find_with_items(
        &self,
        user_id: UserId,
    ) -> Result<Option<(Cart, Vec<CartItem>)>, RepositoryError> {
        let state = self.state.read().await;
        let Some(cart) = state.carts.get(&user_id) else {
            return Ok(None);
        };
        let items = state
            .items
            .values()
            .filter(|item| item.cart_id == cart.id)
            .cloned()
            .collect();
        Ok(Some((cart.clone(), items)))
    }

    async fn add_or_increment(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: Quantity,
    ) -> Result<CartItem, RepositoryError> {
        let mut state = self.state.write().await;

        if let Some(key) = state.item_key(user_id, product_id) {
            let item = state.items.get_mut(&key).ok_or(RepositoryError::NotFound)?;
            item.quantity = item.quantity.checked_add(quantity).ok_or_else(|| {
                RepositoryError::Conflict("cart item quantity out of range".to_owned())
            })?;
            item.updated_at = Utc::now();
            return Ok(item.clone());
        }

        let cart = state.get_or_create(user_id);
        state.next_item_id += 1;
        let now = Utc::now();
        let item = CartItem {
            id: CartItemId::new(state.next_item_id),
            cart_id: cart.id,
            product_id,
            quantity,
            created_at: now,
            updated_at: now,
        };
        state.items.insert(item.id, item.clone());
        Ok(item)
    }

    async fn set_quantity(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: Quantity,
    ) -> Result<Option<CartItem>, RepositoryError> {
        let mut state = self.state.write().await;
        let Some(key) = state.item_key(user_id, product_id) else {
            return Ok(None);
        };
        Ok(state.items.get_mut(&key).map(|item| {
            item.quantity = quantity;
            item.updated_at = Utc::now();
            item.clone()
        }))
    }

    async fn remove(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        let mut state = self.state.write().await;
        let Some(key) = state.item_key(user_id, product_id) else {
            return Ok(false);
        };
        Ok(state.items.remove(&key).is_some())
    }

    async fn clear(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        let mut state = self.state.write().await;
        let Some(cart_id) = state.carts.get(&user_id).map(|cart| cart.id) else {
            return Ok(0);
        };
        Ok(state.remove_items_of(cart_id))
    }

    async fn delete_for_user(&self, user_id: UserId) -> Result<bool, RepositoryError> {
        let mut state = self.state.write().await;
        let Some(cart_id) = state.carts.get(&user_id).map(|cart| cart.id) else {
            return Ok(false);
        };
        state.remove_items_of(cart_id);
        state.carts.remove(&user_id);
        Ok(true)
    }
}

/// In-memory [`UserDirectory`].
#[derive(Default)]
pub struct MemoryUserDirectory {
    users: RwLock<HashMap<Username, User>>,
}

impl MemoryUserDirectory {
    /// Create a directory holding `users`.
    #[must_use]
    pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        let users = users
            .into_iter()
            .map(|user| (user.username.clone(), user))
            .collect();
        Self {
            users: RwLock::new(users),
        }
    }

    /// Add or replace an account.
    pub async fn insert(&self, user: User) {
        self.users
            .write()
            .await
            .insert(user.username.clone(), user);
    }

    /// Drop an account, as if it had been deleted.
    pub async fn remove(&self, username: &Username) -> Option<User> {
        self.users.write().await.remove(username)
    }
}

#[async_trait]
impl UserDirectory for MemoryUserDirectory {
    async fn find_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<User>, RepositoryError> {
        Ok(self.users.read().await.get(username).cloned())
    }
}

/// In-memory [`CatalogStore`].
#[derive(Default)]
pub struct MemoryCatalogStore {
    products: RwLock<HashMap<ProductId, Product>>,
}

impl MemoryCatalogStore {
    /// Create a catalog holding `products`.
    #[must_use]
    pub fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
        let products = products
            .into_iter()
            .map(|product| (product.id, product))
            .collect();
        Self {
            products: RwLock::new(products),
        }
    }

    /// Add or replace a product.
    pub async fn insert(&self, product: Product) {
        self.products.write().await.insert(product.id, product);
    }

    /// Delist a product.
    pub async fn remove(&self, id: ProductId) -> Option<Product> {
        self.products.write().await.remove(&id)
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalogStore {
    async fn find_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(self.products.read().await.get(&id).cloned())
    }

    async fn find_products(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        let products = self.products.read().await;
        Ok(ids.iter().filter_map(|id| products.get(id).cloned()).collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn qty(n: i64) -> Quantity {
        Quantity::positive(n).unwrap()
    }

    #[tokio::test]
    async fn test_add_merges_into_existing_line() {
        let repo = MemoryCartRepository::new();
        let user = UserId::new(1);
        let product = ProductId::new(10);

        let first = repo.add_or_increment(user, product, qty(2)).await.unwrap();
        let second = repo.add_or_increment(user, product, qty(3)).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.quantity.get(), 5);
        assert_eq!(repo.item_count().await, 1);
        assert_eq!(repo.cart_count().await, 1);
    }

    #[tokio::test]
    async fn test_add_overflow_is_conflict_and_leaves_line_unchanged() {
        let repo = MemoryCartRepository::new();
        let user = UserId::new(1);
        let product = ProductId::new(10);
        repo.add_or_increment(user, product, qty(i64::from(Quantity::MAX)))
            .await
            .unwrap();

        let result = repo.add_or_increment(user, product, qty(1)).await;
        assert!(matches!(result, Err(RepositoryError::Conflict(_))));

        let (_, items) = repo.find_with_items(user).await.unwrap().unwrap();
        assert_eq!(items[0].quantity.get(), Quantity::MAX);
    }

    #[tokio::test]
    async fn test_delete_for_user_removes_cart_and_items_only_for_that_user() {
        let repo = MemoryCartRepository::new();
        repo.add_or_increment(UserId::new(1), ProductId::new(10), qty(1))
            .await
            .unwrap();
        repo.add_or_increment(UserId::new(2), ProductId::new(10), qty(1))
            .await
            .unwrap();

        assert!(repo.delete_for_user(UserId::new(1)).await.unwrap());
        assert!(!repo.delete_for_user(UserId::new(1)).await.unwrap());

        assert!(repo.find_by_user(UserId::new(1)).await.unwrap().is_none());
        assert_eq!(repo.cart_count().await, 1);
        assert_eq!(repo.item_count().await, 1);
    }

    #[tokio::test]
    async fn test_set_quantity_without_line_returns_none() {
        let repo = MemoryCartRepository::new();
        let user = UserId::new(1);
        repo.get_or_create(user).await.unwrap();

        let result = repo
            .set_quantity(user, ProductId::new(99), qty(4))
            .await
            .unwrap();
        assert!(result.is_none());
    }
}
