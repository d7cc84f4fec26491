/// Wishlist endpoints
///
/// One wishlist per account, created lazily on first access. Membership
/// changes publish `wishlist_update` to the owner's feed only.
///
/// # Endpoints
///
/// - `GET    /api/wishlist` - Fetch own wishlist with full products
/// - `POST   /api/wishlist/:product_id` - Add a product
/// - `DELETE /api/wishlist/:product_id` - Remove a product

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;
use vitrine_shared::auth::middleware::AuthContext;
use vitrine_shared::events::{user_stream_key, EventKind, StoreEvent};
use vitrine_shared::models::product::Product;
use vitrine_shared::models::wishlist::Wishlist;

/// Wishlist response with resolved products
#[derive(Debug, Serialize)]
pub struct WishlistResponse {
    pub id: Uuid,

    pub products: Vec<Product>,
}

/// Fetch the caller's wishlist
pub async fn get_wishlist(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<WishlistResponse>> {
    let wishlist = Wishlist::get_or_create(&state.db, auth.user_id).await?;
    let products = wishlist.items(&state.db).await?;

    Ok(Json(WishlistResponse {
        id: wishlist.id,
        products,
    }))
}

/// Add a product to the caller's wishlist
///
/// # Errors
///
/// - `400 Bad Request`: Product already on the wishlist
/// - `404 Not Found`: Unknown product
pub async fn add_to_wishlist(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(product_id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    if Product::find_by_id(&state.db, product_id).await?.is_none() {
        return Err(ApiError::NotFound("Product not found".to_string()));
    }

    let wishlist = Wishlist::get_or_create(&state.db, auth.user_id).await?;
    let added = wishlist.add_item(&state.db, product_id).await?;
    if !added {
        return Err(ApiError::BadRequest(
            "Product is already on the wishlist".to_string(),
        ));
    }

    let event = StoreEvent::new(
        EventKind::WishlistUpdate,
        product_id,
        json!({"action": "added"}),
    );
    state
        .events
        .publish_best_effort(&[user_stream_key(auth.user_id)], &event)
        .await;

    Ok(Json(json!({"added": true})))
}

/// Remove a product from the caller's wishlist
pub async fn remove_from_wishlist(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(product_id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let wishlist = Wishlist::get_or_create(&state.db, auth.user_id).await?;
    let removed = wishlist.remove_item(&state.db, product_id).await?;
    if !removed {
        return Err(ApiError::NotFound(
            "Product is not on the wishlist".to_string(),
        ));
    }

    let event = StoreEvent::new(
        EventKind::WishlistUpdate,
        product_id,
        json!({"action": "removed"}),
    );
    state
        .events
        .publish_best_effort(&[user_stream_key(auth.user_id)], &event)
        .await;

    Ok(Json(json!({"removed": true})))
}
