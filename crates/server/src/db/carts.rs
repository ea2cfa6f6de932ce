//! Cart repository.
//!
//! Every method is one atomic unit: either a single statement or a single
//! transaction. Quantity merging happens inside the database
//! (`ON CONFLICT ... DO UPDATE SET quantity = quantity + EXCLUDED.quantity`),
//! so concurrent additions to the same line never lose an update.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use marketplace_core::{CartId, CartItemId, ProductId, Quantity, UserId};

use super::RepositoryError;
use crate::models::{Cart, CartItem};

/// Persistence contract for carts and their line items.
///
/// Implementations must keep one cart per user and one line item per
/// (cart, product) pair, and must apply each method atomically.
#[async_trait]
pub trait CartRepository: Send + Sync {
    /// Find the user's cart, if any.
    async fn find_by_user(&self, user_id: UserId) -> Result<Option<Cart>, RepositoryError>;

    /// Return the user's cart, creating an empty one if absent.
    ///
    /// Idempotent: concurrent callers for the same user get the same cart.
    async fn get_or_create(&self, user_id: UserId) -> Result<Cart, RepositoryError>;

    /// Read the user's cart and every line item in one consistent snapshot,
    /// items ordered by ID.
    async fn find_with_items(
        &self,
        user_id: UserId,
    ) -> Result<Option<(Cart, Vec<CartItem>)>, RepositoryError>;

    /// Add `quantity` of a product, creating the cart and/or line item as
    /// needed and merging into an existing line item.
    ///
    /// Returns `RepositoryError::Conflict` if the merged quantity overflows.
    async fn add_or_increment(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: Quantity,
    ) -> Result<CartItem, RepositoryError>;

    /// Overwrite the quantity of an existing line item.
    ///
    /// Returns `None` if the user has no cart or the product is not in it.
    async fn set_quantity(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: Quantity,
    ) -> Result<Option<CartItem>, RepositoryError>;

    /// Delete a line item. Returns `false` if it did not exist.
    async fn remove(&self, user_id: UserId, product_id: ProductId)
    -> Result<bool, RepositoryError>;

    /// Delete every line item, keeping the cart. Returns the number deleted.
    async fn clear(&self, user_id: UserId) -> Result<u64, RepositoryError>;

    /// Delete the user's cart and, first, all of its line items.
    ///
    /// Returns `false` if the user had no cart.
    async fn delete_for_user(&self, user_id: UserId) -> Result<bool, RepositoryError>;
}

#[derive(sqlx::FromRow)]
struct CartRow {
    id: i64,
    user_id: i64,
    created_at: DateTime<Utc>,
}

impl From<CartRow> for Cart {
    fn from(row: CartRow) -> Self {
        Self {
            id: CartId::new(row.id),
            user_id: UserId::new(row.user_id),
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CartItemRow {
    id: i64,
    cart_id: i64,
    product_id: i64,
    quantity: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CartItemRow> for CartItem {
    type Error = RepositoryError;

    fn try_from(row: CartItemRow) -> Result<Self, Self::Error> {
        let quantity = Quantity::try_from(row.quantity).map_err(|e| {
            RepositoryError::DataCorruption(format!("cart item {} quantity: {e}", row.id))
        })?;

        Ok(Self {
            id: CartItemId::new(row.id),
            cart_id: CartId::new(row.cart_id),
            product_id: ProductId::new(row.product_id),
            quantity,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const QUANTITY_OUT_OF_RANGE: &str = "cart item quantity out of range";

/// `PostgreSQL` implementation of [`CartRepository`].
#[derive(Clone)]
pub struct PgCartRepository {
    pool: PgPool,
}

impl PgCartRepository {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Insert-if-absent, then read. Two statements so the read sees a cart
/// committed by a concurrent caller after our insert was skipped.
async fn get_or_create_in(
    conn: &mut PgConnection,
    user_id: UserId,
) -> Result<Cart, RepositoryError> {
    sqlx::query(
        r"
        INSERT INTO carts (user_id)
        VALUES ($1)
        ON CONFLICT (user_id) DO NOTHING
        ",
    )
    .bind(user_id.as_i64())
    .execute(&mut *conn)
    .await?;

    let row = sqlx::query_as::<_, CartRow>(
        r"
        SELECT id, user_id, created_at
        FROM carts
        WHERE user_id = $1
        ",
    )
    .bind(user_id.as_i64())
    .fetch_one(&mut *conn)
    .await?;

    Ok(row.into())
}

#[async_trait]
impl CartRepository for PgCartRepository {
    async fn find_by_user(&self, user_id: UserId) -> Result<Option<Cart>, RepositoryError> {
        let row = sqlx::query_as::<_, CartRow>(
            r"
            SELECT id, user_id, created_at
            FROM carts
            WHERE user_id = $1
            ",
        )
        .bind(user_id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Cart::from))
    }

    async fn get_or_create(&self, user_id: UserId) -> Result<Cart, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        get_or_create_in(&mut conn, user_id).await
    }

    async fn find_with_items(
        &self,
        user_id: UserId,
    ) -> Result<Option<(Cart, Vec<CartItem>)>, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;

        let Some(cart) = sqlx::query_as::<_, CartRow>(
            r"
            SELECT id, user_id, created_at
            FROM carts
            WHERE user_id = $1
            ",
        )
        .bind(user_id.as_i64())
        .fetch_optional(&mut *tx)
        .await?
        else {
            return Ok(None);
        };

        let rows = sqlx::query_as::<_, CartItemRow>(
            r"
            SELECT id, cart_id, product_id, quantity, created_at, updated_at
            FROM cart_items
            WHERE cart_id = $1
            ORDER BY id ASC
            ",
        )
        .bind(cart.id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        let items = rows
            .into_iter()
            .map(CartItem::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some((cart.into(), items)))
    }

    async fn add_or_increment(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: Quantity,
    ) -> Result<CartItem, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let cart = get_or_create_in(&mut tx, user_id).await?;

        let row = sqlx::query_as::<_, CartItemRow>(
            r"
            INSERT INTO cart_items (cart_id, product_id, quantity)
            VALUES ($1, $2, $3)
            ON CONFLICT (cart_id, product_id) DO UPDATE
            SET quantity = cart_items.quantity + EXCLUDED.quantity,
                updated_at = NOW()
            RETURNING id, cart_id, product_id, quantity, created_at, updated_at
            ",
        )
        .bind(cart.id.as_i64())
        .bind(product_id.as_i64())
        .bind(quantity.as_i32())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_constraint(e, QUANTITY_OUT_OF_RANGE))?;

        tx.commit().await?;

        row.try_into()
    }

    async fn set_quantity(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: Quantity,
    ) -> Result<Option<CartItem>, RepositoryError> {
        let row = sqlx::query_as::<_, CartItemRow>(
            r"
            UPDATE cart_items ci
            SET quantity = $3, updated_at = NOW()
            FROM carts c
            WHERE ci.cart_id = c.id
              AND c.user_id = $1
              AND ci.product_id = $2
            RETURNING ci.id, ci.cart_id, ci.product_id, ci.quantity,
                      ci.created_at, ci.updated_at
            ",
        )
        .bind(user_id.as_i64())
        .bind(product_id.as_i64())
        .bind(quantity.as_i32())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::from_constraint(e, QUANTITY_OUT_OF_RANGE))?;

        row.map(CartItem::try_from).transpose()
    }

    async fn remove(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM cart_items ci
            USING carts c
            WHERE ci.cart_id = c.id
              AND c.user_id = $1
              AND ci.product_id = $2
            ",
        )
        .bind(user_id.as_i64())
        .bind(product_id.as_i64())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn clear(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM cart_items ci
            USING carts c
            WHERE ci.cart_id = c.id
              AND c.user_id = $1
            ",
        )
        .bind(user_id.as_i64())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn delete_for_user(&self, user_id: UserId) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let cart_id: Option<i64> = sqlx::query_scalar(
            r"
            SELECT id FROM carts
            WHERE user_id = $1
            FOR UPDATE
            ",
        )
        .bind(user_id.as_i64())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(cart_id) = cart_id else {
            return Ok(false);
        };

        sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
            .bind(cart_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM carts WHERE id = $1")
            .bind(cart_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(true)
    }
}
