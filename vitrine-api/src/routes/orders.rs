/// Order endpoints (customer side)
///
/// Checkout snapshots the caller's cart into an order: prices are read from
/// the catalog at this moment, stock is decremented, totals are computed
/// from store settings, and the cart is cleared. Admin-side order management
/// lives under `/api/admin`.
///
/// # Endpoints
///
/// - `POST /api/orders` - Checkout the current cart
/// - `GET  /api/orders` - List own orders
/// - `GET  /api/orders/:id` - Fetch one own order (admins see all)
/// - `POST /api/orders/:id/cancel` - Cancel a not-yet-completed order

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
use vitrine_shared::events::{
    product_stream_key, store_stream_key, user_stream_key, EventKind, StoreEvent,
};
use vitrine_shared::models::cart::Cart;
use vitrine_shared::models::order::{CreateOrder, Order, OrderItem, OrderStatus};
use vitrine_shared::models::product::Product;
use vitrine_shared::models::setting::Setting;
use vitrine_shared::models::user::Address;

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

/// Checkout request
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub shipping_address: Address,
}

/// Order list query
#[derive(Debug, Default, Deserialize)]
pub struct ListOrdersQuery {
    pub page: Option<i64>,

    pub per_page: Option<i64>,
}

/// Checkout: turn the caller's cart into an order
///
/// # Flow
///
/// 1. Read the cart; an empty cart is a client error
/// 2. Price each line from the catalog and check stock
/// 3. Compute tax and shipping from store settings
/// 4. Create the order, decrement stock, clear the cart
/// 5. Publish `new_order` to the store and user feeds
///
/// # Errors
///
/// - `400 Bad Request`: Empty cart, unknown product, or insufficient stock
pub async fn create_order(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateOrderRequest>,
) -> ApiResult<Json<Order>> {
    let cart = Cart::get_or_create(&state.db, auth.user_id).await?;
    if cart.is_empty() {
        return Err(ApiError::BadRequest("Cart is empty".to_string()));
    }

    // Snapshot each line at current catalog prices
    let mut items = Vec::with_capacity(cart.items.0.len());
    let mut subtotal = 0.0;

    for line in &cart.items.0 {
        let product = Product::find_by_id(&state.db, line.product_id)
            .await?
            .ok_or_else(|| {
                ApiError::BadRequest(format!("Unknown product: {}", line.product_id))
            })?;

        if product.stock < line.quantity {
            return Err(ApiError::BadRequest(format!(
                "Insufficient stock for {}: {} available",
                product.title, product.stock
            )));
        }

        subtotal += product.price * line.quantity as f64;
        items.push(OrderItem {
            product_id: product.id,
            title: product.title,
            price: product.price,
            quantity: line.quantity,
            size: line.size.clone(),
            color: line.color.clone(),
        });
    }

    let settings = Setting::get(&state.db).await?;
    let tax = settings.tax_for(subtotal);
    let shipping = settings.shipping_for(subtotal);
    let total = subtotal + tax + shipping;

    let order = Order::create(
        &state.db,
        CreateOrder {
            user_id: auth.user_id,
            items: items.clone(),
            subtotal,
            tax,
            shipping,
            total,
            shipping_address: req.shipping_address,
        },
    )
    .await?;

    // Decrement stock per line and announce the new levels
    for item in &items {
        if let Some(product) =
            Product::adjust_stock(&state.db, item.product_id, -item.quantity).await?
        {
            let event = StoreEvent::new(
                EventKind::StockUpdate,
                product.id,
                json!({"stock": product.stock, "title": product.title}),
            );
            state
                .events
                .publish_best_effort(
                    &[store_stream_key(), product_stream_key(product.id)],
                    &event,
                )
                .await;
        }
    }

    Cart::clear(&state.db, auth.user_id).await?;

    let event = StoreEvent::new(
        EventKind::NewOrder,
        order.id,
        json!({"total": order.total, "item_count": order.items.0.len()}),
    );
    state
        .events
        .publish_best_effort(&[store_stream_key(), user_stream_key(auth.user_id)], &event)
        .await;

    tracing::info!(order_id = %order.id, user_id = %auth.user_id, total = order.total, "Order placed");

    Ok(Json(order))
}

/// List the caller's own orders, newest first
pub async fn list_my_orders(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<ListOrdersQuery>,
) -> ApiResult<Json<Vec<Order>>> {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query
        .per_page
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);

    let orders =
        Order::list_by_user(&state.db, auth.user_id, per_page, (page - 1) * per_page).await?;

    Ok(Json(orders))
}

/// Fetch one order
///
/// Customers see only their own orders; admins see all.
pub async fn get_order(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Order>> {
    let order = Order::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Order not found".to_string()))?;

    if !auth.can_access(order.user_id) {
        return Err(ApiError::Forbidden(
            "Cannot access another user's order".to_string(),
        ));
    }

    Ok(Json(order))
}

/// Cancel an order
///
/// Owners may cancel while the order is not in a terminal state; the status
/// machine rejects everything else.
pub async fn cancel_order(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Order>> {
    let order = Order::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Order not found".to_string()))?;

    if !auth.can_access(order.user_id) {
        return Err(ApiError::Forbidden(
            "Cannot cancel another user's order".to_string(),
        ));
    }

    let cancelled = Order::update_status(&state.db, id, OrderStatus::Cancelled)
        .await?
        .ok_or_else(|| ApiError::NotFound("Order not found".to_string()))?;

    // Return the reserved units to stock
    for item in &cancelled.items.0 {
        Product::adjust_stock(&state.db, item.product_id, item.quantity).await?;
    }

    let event = StoreEvent::new(
        EventKind::OrderStatusUpdate,
        cancelled.id,
        json!({"status": cancelled.status}),
    );
    state
        .events
        .publish_best_effort(
            &[store_stream_key(), user_stream_key(cancelled.user_id)],
            &event,
        )
        .await;

    Ok(Json(cancelled))
}
