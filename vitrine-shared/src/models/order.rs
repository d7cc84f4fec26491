/// Order model and database operations
///
/// Orders are immutable snapshots of a checkout: each item carries the title
/// and price at purchase time so later catalog edits never rewrite history.
/// Fulfilment state advances through a validated status machine and payment
/// state is tracked separately.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE order_status AS ENUM ('pending', 'processing', 'shipped', 'completed', 'cancelled');
/// CREATE TYPE payment_status AS ENUM ('pending', 'paid', 'failed');
///
/// CREATE TABLE orders (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     items JSONB NOT NULL,
///     subtotal DOUBLE PRECISION NOT NULL,
///     tax DOUBLE PRECISION NOT NULL DEFAULT 0,
///     shipping DOUBLE PRECISION NOT NULL DEFAULT 0,
///     total DOUBLE PRECISION NOT NULL,
///     status order_status NOT NULL DEFAULT 'pending',
///     payment_status payment_status NOT NULL DEFAULT 'pending',
///     payment_reference VARCHAR(255),
///     shipping_address JSONB NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::user::Address;

const ORDER_COLUMNS: &str = "id, user_id, items, subtotal, tax, shipping, total, status, \
     payment_status, payment_reference, shipping_address, created_at, updated_at";

/// Fulfilment status of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "order_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Placed, not yet picked up by fulfilment
    Pending,

    /// Being prepared for shipment
    Processing,

    /// Handed to the carrier
    Shipped,

    /// Delivered and closed
    Completed,

    /// Cancelled before completion
    Cancelled,
}

impl OrderStatus {
    /// Validates a status transition
    ///
    /// Orders advance pending -> processing -> shipped -> completed, and can
    /// be cancelled from any non-terminal state. Terminal states never leave.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Pending, OrderStatus::Processing)
                | (OrderStatus::Processing, OrderStatus::Shipped)
                | (OrderStatus::Shipped, OrderStatus::Completed)
                | (OrderStatus::Pending, OrderStatus::Cancelled)
                | (OrderStatus::Processing, OrderStatus::Cancelled)
                | (OrderStatus::Shipped, OrderStatus::Cancelled)
        )
    }

    /// Whether this is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        };
        write!(f, "{}", s)
    }
}

/// Payment state, tracked independently of fulfilment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,

    Paid,

    Failed,
}

/// Line item snapshotted at checkout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: Uuid,

    /// Title at purchase time
    pub title: String,

    /// Unit price at purchase time
    pub price: f64,

    pub quantity: i32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl OrderItem {
    pub fn line_total(&self) -> f64 {
        self.price * self.quantity as f64
    }
}

/// Order model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Order {
    pub id: Uuid,

    pub user_id: Uuid,

    /// Snapshotted line items (JSONB array)
    pub items: Json<Vec<OrderItem>>,

    pub subtotal: f64,

    pub tax: f64,

    pub shipping: f64,

    pub total: f64,

    pub status: OrderStatus,

    pub payment_status: PaymentStatus,

    /// Gateway transaction id once payment was initiated
    pub payment_reference: Option<String>,

    pub shipping_address: Json<Address>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Input for creating an order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrder {
    pub user_id: Uuid,

    pub items: Vec<OrderItem>,

    pub subtotal: f64,

    pub tax: f64,

    pub shipping: f64,

    pub total: f64,

    pub shipping_address: Address,
}

impl Order {
    /// Creates a new order in pending/pending state
    pub async fn create(pool: &PgPool, data: CreateOrder) -> Result<Self, sqlx::Error> {
        let order = sqlx::query_as::<_, Order>(&format!(
            r#"
            INSERT INTO orders (user_id, items, subtotal, tax, shipping, total, shipping_address)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(data.user_id)
        .bind(Json(data.items))
        .bind(data.subtotal)
        .bind(data.tax)
        .bind(data.shipping)
        .bind(data.total)
        .bind(Json(data.shipping_address))
        .fetch_one(pool)
        .await?;

        Ok(order)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Looks an order up by its gateway transaction id
    pub async fn find_by_payment_reference(
        pool: &PgPool,
        reference: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE payment_reference = $1"
        ))
        .bind(reference)
        .fetch_optional(pool)
        .await
    }

    /// Lists a user's own orders, newest first
    pub async fn list_by_user(
        pool: &PgPool,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 \
             ORDER BY created_at DESC LIMIT $2 OFFSET $3"
        ))
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    /// Lists all orders, optionally filtered by status (admin view)
    pub async fn list(
        pool: &PgPool,
        status: Option<OrderStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        match status {
            Some(status) => {
                sqlx::query_as::<_, Order>(&format!(
                    "SELECT {ORDER_COLUMNS} FROM orders WHERE status = $1 \
                     ORDER BY created_at DESC LIMIT $2 OFFSET $3"
                ))
                .bind(status)
                .bind(limit)
                .bind(offset)
                .fetch_all(pool)
                .await
            }
            None => {
                sqlx::query_as::<_, Order>(&format!(
                    "SELECT {ORDER_COLUMNS} FROM orders \
                     ORDER BY created_at DESC LIMIT $1 OFFSET $2"
                ))
                .bind(limit)
                .bind(offset)
                .fetch_all(pool)
                .await
            }
        }
    }

    /// Advances the order status after validating the transition
    ///
    /// Returns `Ok(None)` when the order is unknown and
    /// `Err(InvalidTransition)` when the state machine forbids the move.
    pub async fn update_status(
        pool: &PgPool,
        id: Uuid,
        next: OrderStatus,
    ) -> Result<Option<Self>, OrderError> {
        let Some(order) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };

        if !order.status.can_transition_to(next) {
            return Err(OrderError::InvalidTransition {
                from: order.status,
                to: next,
            });
        }

        let updated = sqlx::query_as::<_, Order>(&format!(
            "UPDATE orders SET status = $2, updated_at = NOW() WHERE id = $1 \
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(id)
        .bind(next)
        .fetch_optional(pool)
        .await?;

        Ok(updated)
    }

    /// Records the payment outcome and gateway reference
    pub async fn mark_payment(
        pool: &PgPool,
        id: Uuid,
        payment_status: PaymentStatus,
        payment_reference: Option<&str>,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Order>(&format!(
            "UPDATE orders SET payment_status = $2, \
             payment_reference = COALESCE($3, payment_reference), updated_at = NOW() \
             WHERE id = $1 RETURNING {ORDER_COLUMNS}"
        ))
        .bind(id)
        .bind(payment_status)
        .bind(payment_reference)
        .fetch_optional(pool)
        .await
    }

    /// Counts all orders
    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }

    /// Total revenue across paid orders (admin dashboard)
    pub async fn revenue(pool: &PgPool) -> Result<f64, sqlx::Error> {
        let (revenue,): (f64,) = sqlx::query_as(
            "SELECT COALESCE(SUM(total), 0)::double precision FROM orders \
             WHERE payment_status = 'paid'",
        )
        .fetch_one(pool)
        .await?;

        Ok(revenue)
    }
}

/// Errors from order operations beyond plain database failures
#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("cannot transition order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_transitions() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Processing));
        assert!(OrderStatus::Processing.can_transition_to(OrderStatus::Shipped));
        assert!(OrderStatus::Shipped.can_transition_to(OrderStatus::Completed));
    }

    #[test]
    fn test_cancellation_from_non_terminal() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Cancelled));
        assert!(OrderStatus::Processing.can_transition_to(OrderStatus::Cancelled));
        assert!(OrderStatus::Shipped.can_transition_to(OrderStatus::Cancelled));
    }

    #[test]
    fn test_terminal_states_are_final() {
        for next in [
            OrderStatus::Pending,
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::Completed,
            OrderStatus::Cancelled,
        ] {
            assert!(!OrderStatus::Completed.can_transition_to(next));
            assert!(!OrderStatus::Cancelled.can_transition_to(next));
        }

        assert!(OrderStatus::Completed.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(!OrderStatus::Pending.is_terminal());
    }

    #[test]
    fn test_no_skipping_states() {
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Shipped));
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Completed));
        assert!(!OrderStatus::Processing.can_transition_to(OrderStatus::Completed));
    }

    #[test]
    fn test_no_backward_transitions() {
        assert!(!OrderStatus::Shipped.can_transition_to(OrderStatus::Processing));
        assert!(!OrderStatus::Processing.can_transition_to(OrderStatus::Pending));
    }

    #[test]
    fn test_line_total() {
        let item = OrderItem {
            product_id: Uuid::new_v4(),
            title: "Linen Shirt".to_string(),
            price: 49.0,
            quantity: 3,
            size: Some("M".to_string()),
            color: None,
        };

        assert_eq!(item.line_total(), 147.0);
    }

    #[test]
    fn test_status_serde_lowercase() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::Processing).unwrap(),
            "\"processing\""
        );
        assert_eq!(
            serde_json::from_str::<PaymentStatus>("\"paid\"").unwrap(),
            PaymentStatus::Paid
        );
    }
}
