/// Product model and database operations
///
/// Products are the catalog core: priced, stocked (with optional per-size
/// variant stock), categorized, and carrying a denormalized rating aggregate
/// that is recomputed from reviews on every review write.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE products (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title VARCHAR(255) NOT NULL,
///     slug VARCHAR(255) NOT NULL UNIQUE,
///     description TEXT,
///     price DOUBLE PRECISION NOT NULL CHECK (price >= 0),
///     compare_at_price DOUBLE PRECISION,
///     stock INTEGER NOT NULL DEFAULT 0 CHECK (stock >= 0),
///     sizes JSONB NOT NULL DEFAULT '[]',
///     colors JSONB NOT NULL DEFAULT '[]',
///     category_id UUID REFERENCES categories(id) ON DELETE SET NULL,
///     image_url VARCHAR(512),
///     rating_average DOUBLE PRECISION NOT NULL DEFAULT 0,
///     rating_count INTEGER NOT NULL DEFAULT 0,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use vitrine_shared::models::product::{CreateProduct, Product};
/// use vitrine_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let product = Product::create(&pool, CreateProduct {
///     title: "Linen Shirt".to_string(),
///     description: Some("Breathable summer shirt".to_string()),
///     price: 49.0,
///     compare_at_price: Some(65.0),
///     stock: 12,
///     sizes: vec![],
///     colors: vec!["navy".to_string(), "white".to_string()],
///     category_id: None,
///     image_url: None,
/// }).await?;
///
/// assert_eq!(product.slug, "linen-shirt");
/// assert!(product.in_stock());
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::slug::slugify;

const PRODUCT_COLUMNS: &str = "id, title, slug, description, price, compare_at_price, stock, \
     sizes, colors, category_id, image_url, rating_average, rating_count, created_at, updated_at";

/// Per-size stock variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizeVariant {
    /// Size label (e.g., "S", "M", "42")
    pub name: String,

    /// Units available for this size
    pub stock: i32,
}

/// Sort order for product listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    /// Newest first (default)
    #[default]
    Newest,

    PriceAsc,

    PriceDesc,

    /// Best rated first
    Rating,
}

impl ProductSort {
    fn order_by(self) -> &'static str {
        match self {
            ProductSort::Newest => "created_at DESC",
            ProductSort::PriceAsc => "price ASC",
            ProductSort::PriceDesc => "price DESC",
            ProductSort::Rating => "rating_average DESC, rating_count DESC",
        }
    }
}

/// Filter for product listings
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    /// Restrict to a category
    pub category_id: Option<Uuid>,

    /// Case-insensitive substring match on title
    pub search: Option<String>,

    pub min_price: Option<f64>,

    pub max_price: Option<f64>,

    /// Only products with stock > 0
    pub in_stock_only: bool,

    pub sort: ProductSort,
}

/// Product model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: Uuid,

    pub title: String,

    /// URL-safe identifier derived from the title on save
    pub slug: String,

    pub description: Option<String>,

    /// Unit price (plain floating sums, no currency rounding)
    pub price: f64,

    /// Original price when discounted; None means no discount
    pub compare_at_price: Option<f64>,

    /// Total units available; never negative
    pub stock: i32,

    /// Per-size variant stock (JSONB array)
    pub sizes: Json<Vec<SizeVariant>>,

    /// Available colors (JSONB array of strings)
    pub colors: Json<Vec<String>>,

    pub category_id: Option<Uuid>,

    pub image_url: Option<String>,

    /// Arithmetic mean of all review ratings; 0 when unreviewed
    pub rating_average: f64,

    /// Number of reviews feeding the average
    pub rating_count: i32,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Input for creating a product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProduct {
    pub title: String,

    pub description: Option<String>,

    pub price: f64,

    pub compare_at_price: Option<f64>,

    pub stock: i32,

    #[serde(default)]
    pub sizes: Vec<SizeVariant>,

    #[serde(default)]
    pub colors: Vec<String>,

    pub category_id: Option<Uuid>,

    pub image_url: Option<String>,
}

/// Input for updating a product; only non-None fields are written
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProduct {
    /// New title; changing it re-derives the slug
    pub title: Option<String>,

    pub description: Option<Option<String>>,

    pub price: Option<f64>,

    pub compare_at_price: Option<Option<f64>>,

    pub sizes: Option<Vec<SizeVariant>>,

    pub colors: Option<Vec<String>>,

    pub category_id: Option<Option<Uuid>>,

    pub image_url: Option<Option<String>>,
}

impl Product {
    /// Whether any units are available
    pub fn in_stock(&self) -> bool {
        self.stock > 0
    }

    /// Discount percentage against `compare_at_price`, rounded down
    ///
    /// Returns None when there is no compare-at price or it does not exceed
    /// the current price.
    pub fn discount_percent(&self) -> Option<u32> {
        let compare_at = self.compare_at_price?;
        if compare_at <= self.price || compare_at <= 0.0 {
            return None;
        }
        Some(((1.0 - self.price / compare_at) * 100.0).floor() as u32)
    }

    /// Creates a new product, deriving the slug from the title
    ///
    /// # Errors
    ///
    /// Returns an error if the derived slug collides with an existing
    /// product (unique constraint) or the database write fails.
    pub async fn create(pool: &PgPool, data: CreateProduct) -> Result<Self, sqlx::Error> {
        let slug = slugify(&data.title);

        let product = sqlx::query_as::<_, Product>(&format!(
            r#"
            INSERT INTO products (title, slug, description, price, compare_at_price,
                                  stock, sizes, colors, category_id, image_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(data.title)
        .bind(slug)
        .bind(data.description)
        .bind(data.price)
        .bind(data.compare_at_price)
        .bind(data.stock)
        .bind(Json(data.sizes))
        .bind(Json(data.colors))
        .bind(data.category_id)
        .bind(data.image_url)
        .fetch_one(pool)
        .await?;

        Ok(product)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(pool)
        .await
    }

    /// Lists products matching a filter, paginated
    pub async fn list(
        pool: &PgPool,
        filter: &ProductFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let (where_sql, _) = filter_sql(filter, 1);

        let query = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products{} ORDER BY {} LIMIT {} OFFSET {}",
            where_sql,
            filter.sort.order_by(),
            // LIMIT/OFFSET bound after the filter binds
            format_args!("${}", filter_bind_count(filter) + 1),
            format_args!("${}", filter_bind_count(filter) + 2),
        );

        let q = sqlx::query_as::<_, Product>(&query);
        let q = bind_filter(q, filter).bind(limit).bind(offset);

        q.fetch_all(pool).await
    }

    /// Counts products matching a filter
    pub async fn count_filtered(
        pool: &PgPool,
        filter: &ProductFilter,
    ) -> Result<i64, sqlx::Error> {
        let (where_sql, _) = filter_sql(filter, 1);
        let query = format!("SELECT COUNT(*) FROM products{}", where_sql);

        let q = sqlx::query_as::<_, (i64,)>(&query);
        let (count,) = bind_filter(q, filter).fetch_one(pool).await?;

        Ok(count)
    }

    /// Updates a product; a title change re-derives the slug
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateProduct,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE products SET updated_at = NOW()");
        let mut bind_count = 1;
        let slug = data.title.as_deref().map(slugify);

        if data.title.is_some() {
            bind_count += 1;
            query.push_str(&format!(", title = ${}", bind_count));
            bind_count += 1;
            query.push_str(&format!(", slug = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if data.price.is_some() {
            bind_count += 1;
            query.push_str(&format!(", price = ${}", bind_count));
        }
        if data.compare_at_price.is_some() {
            bind_count += 1;
            query.push_str(&format!(", compare_at_price = ${}", bind_count));
        }
        if data.sizes.is_some() {
            bind_count += 1;
            query.push_str(&format!(", sizes = ${}", bind_count));
        }
        if data.colors.is_some() {
            bind_count += 1;
            query.push_str(&format!(", colors = ${}", bind_count));
        }
        if data.category_id.is_some() {
            bind_count += 1;
            query.push_str(&format!(", category_id = ${}", bind_count));
        }
        if data.image_url.is_some() {
            bind_count += 1;
            query.push_str(&format!(", image_url = ${}", bind_count));
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"));

        let mut q = sqlx::query_as::<_, Product>(&query).bind(id);

        if let Some(title) = data.title {
            q = q.bind(title).bind(slug.unwrap_or_default());
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(price) = data.price {
            q = q.bind(price);
        }
        if let Some(compare_at) = data.compare_at_price {
            q = q.bind(compare_at);
        }
        if let Some(sizes) = data.sizes {
            q = q.bind(Json(sizes));
        }
        if let Some(colors) = data.colors {
            q = q.bind(Json(colors));
        }
        if let Some(category_id) = data.category_id {
            q = q.bind(category_id);
        }
        if let Some(image_url) = data.image_url {
            q = q.bind(image_url);
        }

        q.fetch_optional(pool).await
    }

    /// Deletes a product by ID
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Sets the absolute stock level (admin stock update)
    ///
    /// The CHECK constraint rejects negative values at the database level;
    /// callers validate first for a friendlier error.
    pub async fn set_stock(
        pool: &PgPool,
        id: Uuid,
        stock: i32,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Product>(&format!(
            "UPDATE products SET stock = $2, updated_at = NOW() WHERE id = $1 \
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id)
        .bind(stock)
        .fetch_optional(pool)
        .await
    }

    /// Adjusts stock by a delta, clamping at zero
    ///
    /// Used by checkout to decrement sold quantities.
    pub async fn adjust_stock(
        pool: &PgPool,
        id: Uuid,
        delta: i32,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Product>(&format!(
            "UPDATE products SET stock = GREATEST(stock + $2, 0), updated_at = NOW() \
             WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id)
        .bind(delta)
        .fetch_optional(pool)
        .await
    }

    /// Recomputes the denormalized rating aggregate from reviews
    ///
    /// The average is the arithmetic mean of all review ratings for the
    /// product; with no reviews left it resets to {0, 0}. This runs as a
    /// separate statement after each review write, so a race between
    /// concurrent reviewers can produce a transiently stale average that
    /// self-corrects on the next review event.
    pub async fn recompute_rating(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Product>(&format!(
            r#"
            UPDATE products p
            SET rating_average = COALESCE(s.avg, 0),
                rating_count = COALESCE(s.cnt, 0),
                updated_at = NOW()
            FROM (
                SELECT AVG(rating)::double precision AS avg, COUNT(*)::int AS cnt
                FROM reviews
                WHERE product_id = $1
            ) s
            WHERE p.id = $1
            RETURNING p.id, p.title, p.slug, p.description, p.price, p.compare_at_price,
                      p.stock, p.sizes, p.colors, p.category_id, p.image_url,
                      p.rating_average, p.rating_count, p.created_at, p.updated_at
            "#
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Counts all products
    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }

    /// Lists products at or below a stock threshold (admin dashboard)
    pub async fn list_low_stock(
        pool: &PgPool,
        threshold: i32,
        limit: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE stock <= $1 \
             ORDER BY stock ASC LIMIT $2"
        ))
        .bind(threshold)
        .bind(limit)
        .fetch_all(pool)
        .await
    }
}

/// Builds the WHERE clause for a filter, starting at bind position `first`
fn filter_sql(filter: &ProductFilter, first: usize) -> (String, usize) {
    let mut clauses: Vec<String> = Vec::new();
    let mut next = first;

    if filter.category_id.is_some() {
        clauses.push(format!("category_id = ${}", next));
        next += 1;
    }
    if filter.search.is_some() {
        clauses.push(format!("title ILIKE ${}", next));
        next += 1;
    }
    if filter.min_price.is_some() {
        clauses.push(format!("price >= ${}", next));
        next += 1;
    }
    if filter.max_price.is_some() {
        clauses.push(format!("price <= ${}", next));
        next += 1;
    }
    if filter.in_stock_only {
        clauses.push("stock > 0".to_string());
    }

    if clauses.is_empty() {
        (String::new(), next)
    } else {
        (format!(" WHERE {}", clauses.join(" AND ")), next)
    }
}

fn filter_bind_count(filter: &ProductFilter) -> usize {
    [
        filter.category_id.is_some(),
        filter.search.is_some(),
        filter.min_price.is_some(),
        filter.max_price.is_some(),
    ]
    .iter()
    .filter(|b| **b)
    .count()
}

/// Binds filter values in the same order `filter_sql` numbered them
fn bind_filter<'q, O>(
    mut q: sqlx::query::QueryAs<'q, sqlx::Postgres, O, sqlx::postgres::PgArguments>,
    filter: &'q ProductFilter,
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, O, sqlx::postgres::PgArguments> {
    if let Some(category_id) = filter.category_id {
        q = q.bind(category_id);
    }
    if let Some(ref search) = filter.search {
        q = q.bind(format!("%{}%", search));
    }
    if let Some(min_price) = filter.min_price {
        q = q.bind(min_price);
    }
    if let Some(max_price) = filter.max_price {
        q = q.bind(max_price);
    }
    q
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_product() -> Product {
        Product {
            id: Uuid::new_v4(),
            title: "Linen Shirt".to_string(),
            slug: "linen-shirt".to_string(),
            description: None,
            price: 49.0,
            compare_at_price: Some(70.0),
            stock: 3,
            sizes: Json(vec![]),
            colors: Json(vec![]),
            category_id: None,
            image_url: None,
            rating_average: 0.0,
            rating_count: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_in_stock() {
        let mut product = sample_product();
        assert!(product.in_stock());

        product.stock = 0;
        assert!(!product.in_stock());
    }

    #[test]
    fn test_discount_percent() {
        let mut product = sample_product();
        // 49 / 70 => 30% off
        assert_eq!(product.discount_percent(), Some(30));

        product.compare_at_price = None;
        assert_eq!(product.discount_percent(), None);

        // Compare-at below current price is not a discount
        product.compare_at_price = Some(40.0);
        assert_eq!(product.discount_percent(), None);
    }

    #[test]
    fn test_filter_sql_empty() {
        let filter = ProductFilter::default();
        let (sql, next) = filter_sql(&filter, 1);
        assert_eq!(sql, "");
        assert_eq!(next, 1);
    }

    #[test]
    fn test_filter_sql_numbering() {
        let filter = ProductFilter {
            category_id: Some(Uuid::new_v4()),
            search: Some("shirt".to_string()),
            min_price: None,
            max_price: Some(100.0),
            in_stock_only: true,
            sort: ProductSort::PriceAsc,
        };

        let (sql, next) = filter_sql(&filter, 1);
        assert_eq!(
            sql,
            " WHERE category_id = $1 AND title ILIKE $2 AND price <= $3 AND stock > 0"
        );
        assert_eq!(next, 4);
        assert_eq!(filter_bind_count(&filter), 3);
    }

    #[test]
    fn test_sort_order_by() {
        assert_eq!(ProductSort::Newest.order_by(), "created_at DESC");
        assert_eq!(ProductSort::PriceAsc.order_by(), "price ASC");
    }

    #[test]
    fn test_size_variant_serde() {
        let variant = SizeVariant {
            name: "M".to_string(),
            stock: 4,
        };
        let json = serde_json::to_string(&variant).unwrap();
        assert_eq!(json, r#"{"name":"M","stock":4}"#);
    }
}
