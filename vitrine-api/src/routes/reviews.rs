/// Review endpoints
///
/// One review per user per product, enforced by a unique index. Every
/// mutation recomputes the product's rating aggregate and publishes an
/// event to the product feed.
///
/// # Endpoints
///
/// - `GET    /api/products/:id/reviews` - List a product's reviews (public)
/// - `POST   /api/reviews` - Create (authenticated)
/// - `PUT    /api/reviews/:id` - Update own review (admins may edit any)
/// - `DELETE /api/reviews/:id` - Delete own review (admins may delete any)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use vitrine_shared::auth::middleware::AuthContext;
use vitrine_shared::events::{product_stream_key, store_stream_key, EventKind, StoreEvent};
use vitrine_shared::models::product::Product;
use vitrine_shared::models::review::{self, CreateReview, Review, UpdateReview};

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

/// Create review request
#[derive(Debug, Deserialize)]
pub struct CreateReviewRequest {
    pub product_id: Uuid,

    /// 1 to 5 stars
    pub rating: i32,

    pub comment: Option<String>,
}

/// Update review request
#[derive(Debug, Default, Deserialize)]
pub struct UpdateReviewRequest {
    pub rating: Option<i32>,

    pub comment: Option<Option<String>>,
}

/// Review list query
#[derive(Debug, Default, Deserialize)]
pub struct ListReviewsQuery {
    pub page: Option<i64>,

    pub per_page: Option<i64>,
}

/// List a product's reviews, newest first
pub async fn list_product_reviews(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Query(query): Query<ListReviewsQuery>,
) -> ApiResult<Json<Vec<Review>>> {
    if Product::find_by_id(&state.db, product_id).await?.is_none() {
        return Err(ApiError::NotFound("Product not found".to_string()));
    }

    let page = query.page.unwrap_or(1).max(1);
    let per_page = query
        .per_page
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);

    let reviews =
        Review::list_by_product(&state.db, product_id, per_page, (page - 1) * per_page).await?;

    Ok(Json(reviews))
}

/// Create a review
///
/// # Errors
///
/// - `400 Bad Request`: Rating out of range or already reviewed
/// - `404 Not Found`: Unknown product
pub async fn create_review(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateReviewRequest>,
) -> ApiResult<Json<Review>> {
    if !review::valid_rating(req.rating) {
        return Err(ApiError::BadRequest(
            "Rating must be between 1 and 5".to_string(),
        ));
    }

    if Product::find_by_id(&state.db, req.product_id).await?.is_none() {
        return Err(ApiError::NotFound("Product not found".to_string()));
    }

    // Duplicate reviews surface as a unique violation and map to 400
    let created = Review::create(
        &state.db,
        CreateReview {
            product_id: req.product_id,
            user_id: auth.user_id,
            rating: req.rating,
            comment: req.comment,
        },
    )
    .await?;

    Product::recompute_rating(&state.db, created.product_id).await?;

    let event = StoreEvent::new(
        EventKind::ReviewAdded,
        created.id,
        json!({"product_id": created.product_id, "rating": created.rating}),
    );
    state
        .events
        .publish_best_effort(
            &[store_stream_key(), product_stream_key(created.product_id)],
            &event,
        )
        .await;

    Ok(Json(created))
}

/// Update a review
pub async fn update_review(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateReviewRequest>,
) -> ApiResult<Json<Review>> {
    if let Some(rating) = req.rating {
        if !review::valid_rating(rating) {
            return Err(ApiError::BadRequest(
                "Rating must be between 1 and 5".to_string(),
            ));
        }
    }

    let existing = Review::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Review not found".to_string()))?;

    if !auth.can_access(existing.user_id) {
        return Err(ApiError::Forbidden(
            "Cannot modify another user's review".to_string(),
        ));
    }

    let updated = Review::update(
        &state.db,
        id,
        UpdateReview {
            rating: req.rating,
            comment: req.comment,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Review not found".to_string()))?;

    Product::recompute_rating(&state.db, updated.product_id).await?;

    let event = StoreEvent::new(
        EventKind::ReviewUpdated,
        updated.id,
        json!({"product_id": updated.product_id, "rating": updated.rating}),
    );
    state
        .events
        .publish_best_effort(
            &[store_stream_key(), product_stream_key(updated.product_id)],
            &event,
        )
        .await;

    Ok(Json(updated))
}

/// Delete a review
pub async fn delete_review(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let existing = Review::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Review not found".to_string()))?;

    if !auth.can_access(existing.user_id) {
        return Err(ApiError::Forbidden(
            "Cannot delete another user's review".to_string(),
        ));
    }

    let deleted = Review::delete(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Review not found".to_string()))?;

    Product::recompute_rating(&state.db, deleted.product_id).await?;

    let event = StoreEvent::new(
        EventKind::ReviewDeleted,
        deleted.id,
        json!({"product_id": deleted.product_id}),
    );
    state
        .events
        .publish_best_effort(
            &[store_stream_key(), product_stream_key(deleted.product_id)],
            &event,
        )
        .await;

    Ok(Json(json!({"deleted": true})))
}
