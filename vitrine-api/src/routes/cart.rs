/// Cart endpoints
///
/// The storefront owns the cart contents and replaces them wholesale on
/// every change; the server validates quantities and that referenced
/// products exist.
///
/// # Endpoints
///
/// - `GET    /api/cart` - Fetch own cart (created lazily)
/// - `PUT    /api/cart` - Replace contents
/// - `DELETE /api/cart` - Empty the cart

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::State, Extension, Json};
use serde::Deserialize;
use serde_json::json;
use vitrine_shared::auth::middleware::AuthContext;
use vitrine_shared::models::cart::{Cart, CartItem};
use vitrine_shared::models::product::Product;

/// Replace cart request
#[derive(Debug, Deserialize)]
pub struct ReplaceCartRequest {
    pub items: Vec<CartItem>,
}

/// Fetch the caller's cart
pub async fn get_cart(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Cart>> {
    let cart = Cart::get_or_create(&state.db, auth.user_id).await?;
    Ok(Json(cart))
}

/// Replace the caller's cart contents
///
/// # Errors
///
/// - `400 Bad Request`: Non-positive quantity or unknown product
pub async fn replace_cart(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<ReplaceCartRequest>,
) -> ApiResult<Json<Cart>> {
    for item in &req.items {
        if item.quantity <= 0 {
            return Err(ApiError::BadRequest(
                "Item quantity must be positive".to_string(),
            ));
        }

        if Product::find_by_id(&state.db, item.product_id).await?.is_none() {
            return Err(ApiError::BadRequest(format!(
                "Unknown product: {}",
                item.product_id
            )));
        }
    }

    let cart = Cart::replace_items(&state.db, auth.user_id, req.items).await?;
    Ok(Json(cart))
}

/// Empty the caller's cart
pub async fn clear_cart(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<serde_json::Value>> {
    Cart::clear(&state.db, auth.user_id).await?;
    Ok(Json(json!({"cleared": true})))
}
