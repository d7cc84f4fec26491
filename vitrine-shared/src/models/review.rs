/// Review model and database operations
///
/// A user may review a product at most once (unique constraint on the pair).
/// Ratings are whole stars 1..=5. Every write here is followed by a call to
/// `Product::recompute_rating` so the denormalized aggregate stays honest.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE reviews (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     product_id UUID NOT NULL REFERENCES products(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     rating INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
///     comment TEXT,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     UNIQUE (user_id, product_id)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

const REVIEW_COLUMNS: &str = "id, product_id, user_id, rating, comment, created_at, updated_at";

/// Product review
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Review {
    pub id: Uuid,

    pub product_id: Uuid,

    pub user_id: Uuid,

    /// Whole stars, 1 through 5
    pub rating: i32,

    pub comment: Option<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Input for creating a review
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateReview {
    pub product_id: Uuid,

    pub user_id: Uuid,

    pub rating: i32,

    pub comment: Option<String>,
}

/// Input for updating a review
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateReview {
    pub rating: Option<i32>,

    pub comment: Option<Option<String>>,
}

impl Review {
    /// Creates a review
    ///
    /// # Errors
    ///
    /// Returns a unique-constraint error if the user already reviewed this
    /// product, and a check-constraint error for ratings outside 1..=5.
    pub async fn create(pool: &PgPool, data: CreateReview) -> Result<Self, sqlx::Error> {
        let review = sqlx::query_as::<_, Review>(&format!(
            r#"
            INSERT INTO reviews (product_id, user_id, rating, comment)
            VALUES ($1, $2, $3, $4)
            RETURNING {REVIEW_COLUMNS}
            "#
        ))
        .bind(data.product_id)
        .bind(data.user_id)
        .bind(data.rating)
        .bind(data.comment)
        .fetch_one(pool)
        .await?;

        Ok(review)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Review>(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Finds the review a user left on a product, if any
    pub async fn find_by_user_and_product(
        pool: &PgPool,
        user_id: Uuid,
        product_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Review>(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE user_id = $1 AND product_id = $2"
        ))
        .bind(user_id)
        .bind(product_id)
        .fetch_optional(pool)
        .await
    }

    /// Lists reviews for a product, newest first
    pub async fn list_by_product(
        pool: &PgPool,
        product_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Review>(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE product_id = $1 \
             ORDER BY created_at DESC LIMIT $2 OFFSET $3"
        ))
        .bind(product_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    /// Updates a review's rating and/or comment
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateReview,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE reviews SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.rating.is_some() {
            bind_count += 1;
            query.push_str(&format!(", rating = ${}", bind_count));
        }
        if data.comment.is_some() {
            bind_count += 1;
            query.push_str(&format!(", comment = ${}", bind_count));
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {REVIEW_COLUMNS}"));

        let mut q = sqlx::query_as::<_, Review>(&query).bind(id);

        if let Some(rating) = data.rating {
            q = q.bind(rating);
        }
        if let Some(comment) = data.comment {
            q = q.bind(comment);
        }

        q.fetch_optional(pool).await
    }

    /// Deletes a review, returning it so the caller knows which product's
    /// aggregate to recompute
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Review>(&format!(
            "DELETE FROM reviews WHERE id = $1 RETURNING {REVIEW_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Counts reviews for a product
    pub async fn count_by_product(pool: &PgPool, product_id: Uuid) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM reviews WHERE product_id = $1")
                .bind(product_id)
                .fetch_one(pool)
                .await?;

        Ok(count)
    }
}

/// Validates a rating value before hitting the database constraint
pub fn valid_rating(rating: i32) -> bool {
    (1..=5).contains(&rating)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_rating_bounds() {
        assert!(valid_rating(1));
        assert!(valid_rating(5));
        assert!(!valid_rating(0));
        assert!(!valid_rating(6));
        assert!(!valid_rating(-3));
    }

    #[test]
    fn test_update_defaults_to_noop() {
        let update = UpdateReview::default();
        assert!(update.rating.is_none());
        assert!(update.comment.is_none());
    }
}
