/// Cart model and database operations
///
/// One cart per user, created lazily. The storefront owns the cart contents
/// and replaces them wholesale on every change, so items live in a JSONB
/// column rather than a child table. Checkout reads the cart, snapshots it
/// into an order, then clears it.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE carts (
///     user_id UUID PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
///     items JSONB NOT NULL DEFAULT '[]',
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

/// One entry in a cart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: Uuid,

    pub quantity: i32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// A user's cart
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Cart {
    pub user_id: Uuid,

    pub items: Json<Vec<CartItem>>,

    pub updated_at: DateTime<Utc>,
}

impl Cart {
    /// Fetches the user's cart, creating an empty one on first touch
    pub async fn get_or_create(pool: &PgPool, user_id: Uuid) -> Result<Self, sqlx::Error> {
        let cart = sqlx::query_as::<_, Cart>(
            r#"
            INSERT INTO carts (user_id)
            VALUES ($1)
            ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id
            RETURNING user_id, items, updated_at
            "#,
        )
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        Ok(cart)
    }

    /// Replaces the cart contents wholesale
    pub async fn replace_items(
        pool: &PgPool,
        user_id: Uuid,
        items: Vec<CartItem>,
    ) -> Result<Self, sqlx::Error> {
        let cart = sqlx::query_as::<_, Cart>(
            r#"
            INSERT INTO carts (user_id, items)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO UPDATE SET items = EXCLUDED.items, updated_at = NOW()
            RETURNING user_id, items, updated_at
            "#,
        )
        .bind(user_id)
        .bind(Json(items))
        .fetch_one(pool)
        .await?;

        Ok(cart)
    }

    /// Empties the cart, called after a successful checkout
    pub async fn clear(pool: &PgPool, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE carts SET items = '[]'::jsonb, updated_at = NOW() WHERE user_id = $1",
        )
        .bind(user_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub fn is_empty(&self) -> bool {
        self.items.0.is_empty()
    }

    /// Total unit count across all lines
    pub fn total_quantity(&self) -> i32 {
        self.items.0.iter().map(|item| item.quantity).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cart_with(items: Vec<CartItem>) -> Cart {
        Cart {
            user_id: Uuid::new_v4(),
            items: Json(items),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_empty_cart() {
        let cart = cart_with(vec![]);
        assert!(cart.is_empty());
        assert_eq!(cart.total_quantity(), 0);
    }

    #[test]
    fn test_total_quantity() {
        let cart = cart_with(vec![
            CartItem {
                product_id: Uuid::new_v4(),
                quantity: 2,
                size: Some("M".to_string()),
                color: None,
            },
            CartItem {
                product_id: Uuid::new_v4(),
                quantity: 1,
                size: None,
                color: Some("navy".to_string()),
            },
        ]);

        assert!(!cart.is_empty());
        assert_eq!(cart.total_quantity(), 3);
    }
}
