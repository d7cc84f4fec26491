/// Category model and database operations
///
/// Categories are a flat taxonomy; the slug is derived from the name on
/// create and whenever the name changes.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE categories (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     slug VARCHAR(255) NOT NULL UNIQUE,
///     description TEXT,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::slug::slugify;

/// Product category
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    pub id: Uuid,

    pub name: String,

    /// URL-safe identifier derived from the name
    pub slug: String,

    pub description: Option<String>,

    pub created_at: DateTime<Utc>,
}

/// Input for creating a category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCategory {
    pub name: String,

    pub description: Option<String>,
}

/// Input for updating a category
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCategory {
    pub name: Option<String>,

    pub description: Option<Option<String>>,
}

impl Category {
    /// Creates a new category, deriving the slug from the name
    pub async fn create(pool: &PgPool, data: CreateCategory) -> Result<Self, sqlx::Error> {
        let slug = slugify(&data.name);

        let category = sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (name, slug, description)
            VALUES ($1, $2, $3)
            RETURNING id, name, slug, description, created_at
            "#,
        )
        .bind(data.name)
        .bind(slug)
        .bind(data.description)
        .fetch_one(pool)
        .await?;

        Ok(category)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Category>(
            "SELECT id, name, slug, description, created_at FROM categories WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Category>(
            "SELECT id, name, slug, description, created_at FROM categories WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(pool)
        .await
    }

    /// Lists all categories, alphabetically
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Category>(
            "SELECT id, name, slug, description, created_at FROM categories ORDER BY name",
        )
        .fetch_all(pool)
        .await
    }

    /// Updates a category; a name change re-derives the slug
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateCategory,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE categories SET id = id");
        let mut bind_count = 1;
        let slug = data.name.as_deref().map(slugify);

        if data.name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", name = ${}", bind_count));
            bind_count += 1;
            query.push_str(&format!(", slug = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }

        query.push_str(" WHERE id = $1 RETURNING id, name, slug, description, created_at");

        let mut q = sqlx::query_as::<_, Category>(&query).bind(id);

        if let Some(name) = data.name {
            q = q.bind(name).bind(slug.unwrap_or_default());
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }

        q.fetch_optional(pool).await
    }

    /// Deletes a category; products keep a NULL category afterwards
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_category_struct() {
        let data = CreateCategory {
            name: "Home & Garden".to_string(),
            description: None,
        };

        assert_eq!(slugify(&data.name), "home-garden");
    }

    #[test]
    fn test_update_defaults_to_noop() {
        let update = UpdateCategory::default();
        assert!(update.name.is_none());
        assert!(update.description.is_none());
    }
}
