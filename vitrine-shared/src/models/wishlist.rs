/// Wishlist model and database operations
///
/// Each user owns exactly one wishlist, created lazily on first touch. Items
/// are unique per (wishlist, product); adding a duplicate is reported to the
/// caller so the API can reject it instead of silently swallowing it.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE wishlists (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE TABLE wishlist_items (
///     wishlist_id UUID NOT NULL REFERENCES wishlists(id) ON DELETE CASCADE,
///     product_id UUID NOT NULL REFERENCES products(id) ON DELETE CASCADE,
///     added_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     PRIMARY KEY (wishlist_id, product_id)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::product::Product;

/// A user's wishlist
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Wishlist {
    pub id: Uuid,

    pub user_id: Uuid,

    pub created_at: DateTime<Utc>,
}

impl Wishlist {
    /// Fetches the user's wishlist, creating it if this is the first touch
    pub async fn get_or_create(pool: &PgPool, user_id: Uuid) -> Result<Self, sqlx::Error> {
        // ON CONFLICT keeps this race-free across concurrent first touches
        let wishlist = sqlx::query_as::<_, Wishlist>(
            r#"
            INSERT INTO wishlists (user_id)
            VALUES ($1)
            ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id
            RETURNING id, user_id, created_at
            "#,
        )
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        Ok(wishlist)
    }

    /// Lists the products on this wishlist, most recently added first
    pub async fn items(&self, pool: &PgPool) -> Result<Vec<Product>, sqlx::Error> {
        sqlx::query_as::<_, Product>(
            r#"
            SELECT p.id, p.title, p.slug, p.description, p.price, p.compare_at_price,
                   p.stock, p.sizes, p.colors, p.category_id, p.image_url,
                   p.rating_average, p.rating_count, p.created_at, p.updated_at
            FROM wishlist_items w
            JOIN products p ON p.id = w.product_id
            WHERE w.wishlist_id = $1
            ORDER BY w.added_at DESC
            "#,
        )
        .bind(self.id)
        .fetch_all(pool)
        .await
    }

    /// Adds a product to the wishlist
    ///
    /// Returns false when the product was already present.
    pub async fn add_item(&self, pool: &PgPool, product_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO wishlist_items (wishlist_id, product_id) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(self.id)
        .bind(product_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Removes a product from the wishlist
    ///
    /// Returns false when the product was not on the list.
    pub async fn remove_item(&self, pool: &PgPool, product_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM wishlist_items WHERE wishlist_id = $1 AND product_id = $2",
        )
        .bind(self.id)
        .bind(product_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Counts items on the wishlist
    pub async fn item_count(&self, pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM wishlist_items WHERE wishlist_id = $1")
                .bind(self.id)
                .fetch_one(pool)
                .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wishlist_serializes_without_items() {
        let wishlist = Wishlist {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(&wishlist).unwrap();
        assert!(json.get("items").is_none());
        assert!(json.get("user_id").is_some());
    }

    // Duplicate-add and get_or_create behavior are exercised against a real
    // database in vitrine-api/tests/
}
