/// Admin endpoints
///
/// Everything under `/api/admin` sits behind the admin middleware layer;
/// handlers here can assume the caller is an authenticated admin.
///
/// # Endpoints
///
/// - `GET    /api/admin/dashboard` - Store metrics snapshot
/// - `GET    /api/admin/orders` - List all orders, filterable by status
/// - `PUT    /api/admin/orders/:id/status` - Advance an order's status
/// - `GET    /api/admin/users` - List accounts
/// - `GET    /api/admin/users/:id` - Fetch one account
/// - `DELETE /api/admin/users/:id` - Delete an account
/// - `GET    /api/admin/settings` - Fetch store settings
/// - `PUT    /api/admin/settings` - Update store settings

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;
use vitrine_shared::auth::middleware::AuthContext;
use vitrine_shared::events::{store_stream_key, user_stream_key, EventKind, StoreEvent};
use vitrine_shared::models::order::{Order, OrderStatus};
use vitrine_shared::models::product::Product;
use vitrine_shared::models::setting::{Setting, UpdateSetting};
use vitrine_shared::models::user::{User, UserRole};

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

const LOW_STOCK_THRESHOLD: i32 = 5;

/// Dashboard metrics snapshot
#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub product_count: i64,

    pub order_count: i64,

    pub user_count: i64,

    /// Sum of totals across paid orders
    pub revenue: f64,

    pub recent_orders: Vec<Order>,

    pub low_stock_products: Vec<Product>,
}

/// Admin order list query
#[derive(Debug, Default, Deserialize)]
pub struct AdminOrdersQuery {
    pub status: Option<OrderStatus>,

    pub page: Option<i64>,

    pub per_page: Option<i64>,
}

/// Order status change request
#[derive(Debug, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

/// Admin user list query
#[derive(Debug, Default, Deserialize)]
pub struct AdminUsersQuery {
    pub page: Option<i64>,

    pub per_page: Option<i64>,
}

/// Account summary for the admin user list
#[derive(Debug, Serialize)]
pub struct AdminUserSummary {
    pub id: Uuid,

    pub email: String,

    pub name: Option<String>,

    pub role: UserRole,

    pub created_at: chrono::DateTime<chrono::Utc>,

    pub last_login_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Settings update request
#[derive(Debug, Default, Deserialize)]
pub struct UpdateSettingsRequest {
    pub currency: Option<String>,

    pub tax_rate: Option<f64>,

    pub shipping_fee: Option<f64>,

    pub free_shipping_threshold: Option<Option<f64>>,

    pub features: Option<serde_json::Value>,
}

/// Store metrics for the admin dashboard
pub async fn dashboard(State(state): State<AppState>) -> ApiResult<Json<DashboardResponse>> {
    let product_count = Product::count(&state.db).await?;
    let order_count = Order::count(&state.db).await?;
    let user_count = User::count(&state.db).await?;
    let revenue = Order::revenue(&state.db).await?;
    let recent_orders = Order::list(&state.db, None, 5, 0).await?;
    let low_stock_products = Product::list_low_stock(&state.db, LOW_STOCK_THRESHOLD, 10).await?;

    Ok(Json(DashboardResponse {
        product_count,
        order_count,
        user_count,
        revenue,
        recent_orders,
        low_stock_products,
    }))
}

/// List all orders, newest first
pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<AdminOrdersQuery>,
) -> ApiResult<Json<Vec<Order>>> {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query
        .per_page
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);

    let orders = Order::list(&state.db, query.status, per_page, (page - 1) * per_page).await?;

    Ok(Json(orders))
}

/// Advance an order through the status machine
///
/// # Errors
///
/// - `400 Bad Request`: The transition is not allowed
pub async fn update_order_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateOrderStatusRequest>,
) -> ApiResult<Json<Order>> {
    let order = Order::update_status(&state.db, id, req.status)
        .await?
        .ok_or_else(|| ApiError::NotFound("Order not found".to_string()))?;

    // Cancellation frees the reserved stock
    if req.status == OrderStatus::Cancelled {
        for item in &order.items.0 {
            Product::adjust_stock(&state.db, item.product_id, item.quantity).await?;
        }
    }

    let event = StoreEvent::new(
        EventKind::OrderStatusUpdate,
        order.id,
        json!({"status": order.status}),
    );
    state
        .events
        .publish_best_effort(
            &[store_stream_key(), user_stream_key(order.user_id)],
            &event,
        )
        .await;

    tracing::info!(order_id = %order.id, status = %order.status, "Order status updated");

    Ok(Json(order))
}

/// List accounts, newest first
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<AdminUsersQuery>,
) -> ApiResult<Json<Vec<AdminUserSummary>>> {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query
        .per_page
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);

    let users = User::list(&state.db, per_page, (page - 1) * per_page).await?;

    let summaries = users
        .into_iter()
        .map(|u| AdminUserSummary {
            id: u.id,
            email: u.email,
            name: u.name,
            role: u.role,
            created_at: u.created_at,
            last_login_at: u.last_login_at,
        })
        .collect();

    Ok(Json(summaries))
}

/// Fetch one account
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<AdminUserSummary>> {
    let user = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(AdminUserSummary {
        id: user.id,
        email: user.email,
        name: user.name,
        role: user.role,
        created_at: user.created_at,
        last_login_at: user.last_login_at,
    }))
}

/// Delete an account
///
/// Admins cannot delete themselves; demote first, then let another admin
/// remove the account.
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    if id == auth.user_id {
        return Err(ApiError::BadRequest(
            "Cannot delete your own account".to_string(),
        ));
    }

    let deleted = User::delete(&state.db, id).await?;
    if !deleted {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    Ok(Json(json!({"deleted": true})))
}

/// Fetch store settings
pub async fn get_settings(State(state): State<AppState>) -> ApiResult<Json<Setting>> {
    let settings = Setting::get(&state.db).await?;
    Ok(Json(settings))
}

/// Update store settings
pub async fn update_settings(
    State(state): State<AppState>,
    Json(req): Json<UpdateSettingsRequest>,
) -> ApiResult<Json<Setting>> {
    if let Some(tax_rate) = req.tax_rate {
        if !(0.0..=1.0).contains(&tax_rate) {
            return Err(ApiError::BadRequest(
                "tax_rate must be a fraction between 0 and 1".to_string(),
            ));
        }
    }

    if let Some(shipping_fee) = req.shipping_fee {
        if shipping_fee < 0.0 {
            return Err(ApiError::BadRequest(
                "shipping_fee must not be negative".to_string(),
            ));
        }
    }

    let settings = Setting::update(
        &state.db,
        UpdateSetting {
            currency: req.currency,
            tax_rate: req.tax_rate,
            shipping_fee: req.shipping_fee,
            free_shipping_threshold: req.free_shipping_threshold,
            features: req.features,
        },
    )
    .await?;

    Ok(Json(settings))
}
