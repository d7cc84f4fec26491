/// Product catalog endpoints
///
/// Browsing is public; mutations are admin-only (enforced by the router's
/// middleware stack). Every mutation publishes a store event so connected
/// storefronts update without polling.
///
/// # Endpoints
///
/// - `GET    /api/products` - List with filtering/sorting/pagination
/// - `GET    /api/products/:id` - Fetch one by id
/// - `GET    /api/products/slug/:slug` - Fetch one by slug
/// - `POST   /api/products` - Create (admin)
/// - `PUT    /api/products/:id` - Update (admin)
/// - `DELETE /api/products/:id` - Delete (admin)
/// - `PUT    /api/products/:id/stock` - Set stock level (admin)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;
use vitrine_shared::events::{product_stream_key, store_stream_key, EventKind, StoreEvent};
use vitrine_shared::models::product::{
    CreateProduct, Product, ProductFilter, ProductSort, SizeVariant, UpdateProduct,
};

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

/// Product list query parameters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListProductsQuery {
    /// Restrict to a category
    pub category_id: Option<Uuid>,

    /// Case-insensitive title search
    pub q: Option<String>,

    pub min_price: Option<f64>,

    pub max_price: Option<f64>,

    /// Only products currently in stock
    #[serde(default)]
    pub in_stock: bool,

    #[serde(default)]
    pub sort: ProductSort,

    /// 1-based page number
    pub page: Option<i64>,

    pub per_page: Option<i64>,
}

/// Paginated product list response
#[derive(Debug, Serialize, Deserialize)]
pub struct ProductListResponse {
    pub products: Vec<Product>,

    pub total: i64,

    pub page: i64,

    pub per_page: i64,
}

/// Create product request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    pub description: Option<String>,

    #[validate(range(min = 0.0, message = "Price must not be negative"))]
    pub price: f64,

    pub compare_at_price: Option<f64>,

    #[validate(range(min = 0, message = "Stock must not be negative"))]
    pub stock: i32,

    #[serde(default)]
    pub sizes: Vec<SizeVariant>,

    #[serde(default)]
    pub colors: Vec<String>,

    pub category_id: Option<Uuid>,

    pub image_url: Option<String>,
}

/// Update product request; absent fields are untouched
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProductRequest {
    pub title: Option<String>,

    pub description: Option<Option<String>>,

    pub price: Option<f64>,

    pub compare_at_price: Option<Option<f64>>,

    pub sizes: Option<Vec<SizeVariant>>,

    pub colors: Option<Vec<String>>,

    pub category_id: Option<Option<Uuid>>,

    pub image_url: Option<Option<String>>,
}

/// Set stock request
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateStockRequest {
    #[validate(range(min = 0, message = "Stock must not be negative"))]
    pub stock: i32,
}

/// List products with filtering and pagination
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ListProductsQuery>,
) -> ApiResult<Json<ProductListResponse>> {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query
        .per_page
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let offset = (page - 1) * per_page;

    let filter = ProductFilter {
        category_id: query.category_id,
        search: query.q,
        min_price: query.min_price,
        max_price: query.max_price,
        in_stock_only: query.in_stock,
        sort: query.sort,
    };

    let products = Product::list(&state.db, &filter, per_page, offset).await?;
    let total = Product::count_filtered(&state.db, &filter).await?;

    Ok(Json(ProductListResponse {
        products,
        total,
        page,
        per_page,
    }))
}

/// Fetch one product by id
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Product>> {
    let product = Product::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Product not found".to_string()))?;

    Ok(Json(product))
}

/// Fetch one product by slug
pub async fn get_product_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Json<Product>> {
    let product = Product::find_by_slug(&state.db, &slug)
        .await?
        .ok_or_else(|| ApiError::NotFound("Product not found".to_string()))?;

    Ok(Json(product))
}

/// Create a product (admin)
pub async fn create_product(
    State(state): State<AppState>,
    Json(req): Json<CreateProductRequest>,
) -> ApiResult<Json<Product>> {
    req.validate()?;

    if let Some(compare_at) = req.compare_at_price {
        if compare_at < req.price {
            return Err(ApiError::BadRequest(
                "compare_at_price must not be below price".to_string(),
            ));
        }
    }

    let product = Product::create(
        &state.db,
        CreateProduct {
            title: req.title,
            description: req.description,
            price: req.price,
            compare_at_price: req.compare_at_price,
            stock: req.stock,
            sizes: req.sizes,
            colors: req.colors,
            category_id: req.category_id,
            image_url: req.image_url,
        },
    )
    .await?;

    let event = StoreEvent::new(
        EventKind::ProductCreated,
        product.id,
        json!({"title": product.title, "slug": product.slug, "price": product.price}),
    );
    state
        .events
        .publish_best_effort(&[store_stream_key()], &event)
        .await;

    Ok(Json(product))
}

/// Update a product (admin)
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateProductRequest>,
) -> ApiResult<Json<Product>> {
    if let Some(price) = req.price {
        if price < 0.0 {
            return Err(ApiError::BadRequest("Price must not be negative".to_string()));
        }
    }

    let product = Product::update(
        &state.db,
        id,
        UpdateProduct {
            title: req.title,
            description: req.description,
            price: req.price,
            compare_at_price: req.compare_at_price,
            sizes: req.sizes,
            colors: req.colors,
            category_id: req.category_id,
            image_url: req.image_url,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Product not found".to_string()))?;

    let event = StoreEvent::new(
        EventKind::ProductUpdated,
        product.id,
        json!({"title": product.title, "slug": product.slug, "price": product.price}),
    );
    state
        .events
        .publish_best_effort(&[store_stream_key(), product_stream_key(product.id)], &event)
        .await;

    Ok(Json(product))
}

/// Delete a product (admin)
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let deleted = Product::delete(&state.db, id).await?;
    if !deleted {
        return Err(ApiError::NotFound("Product not found".to_string()));
    }

    let event = StoreEvent::new(EventKind::ProductDeleted, id, json!({}));
    state
        .events
        .publish_best_effort(&[store_stream_key(), product_stream_key(id)], &event)
        .await;

    Ok(Json(json!({"deleted": true})))
}

/// Set the stock level for a product (admin)
pub async fn update_stock(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateStockRequest>,
) -> ApiResult<Json<Product>> {
    req.validate()?;

    let product = Product::set_stock(&state.db, id, req.stock)
        .await?
        .ok_or_else(|| ApiError::NotFound("Product not found".to_string()))?;

    let event = StoreEvent::new(
        EventKind::StockUpdate,
        product.id,
        json!({"stock": product.stock, "title": product.title}),
    );
    state
        .events
        .publish_best_effort(&[store_stream_key(), product_stream_key(product.id)], &event)
        .await;

    Ok(Json(product))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_query_defaults() {
        let query = ListProductsQuery::default();
        assert!(query.category_id.is_none());
        assert!(!query.in_stock);
        assert_eq!(query.sort, ProductSort::Newest);
    }

    #[test]
    fn test_create_request_validation() {
        let req = CreateProductRequest {
            title: "".to_string(),
            description: None,
            price: -1.0,
            compare_at_price: None,
            stock: 0,
            sizes: vec![],
            colors: vec![],
            category_id: None,
            image_url: None,
        };

        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("title"));
        assert!(errors.field_errors().contains_key("price"));
    }
}
