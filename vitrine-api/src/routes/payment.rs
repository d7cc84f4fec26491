/// Payment endpoints (PayU hosted checkout)
///
/// Initiation returns a signed form the storefront posts to the gateway;
/// the gateway then calls back with a signed outcome. Callback signatures
/// are always verified before any order state changes.
///
/// # Endpoints
///
/// - `POST /api/payment/initiate` - Sign a payment form for an order
/// - `POST /api/payment/callback/success` - Gateway result (hash-verified)
/// - `POST /api/payment/callback/failure` - Gateway result (hash-verified)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::State, Extension, Form, Json};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use vitrine_shared::auth::middleware::AuthContext;
use vitrine_shared::events::{store_stream_key, user_stream_key, EventKind, StoreEvent};
use vitrine_shared::models::order::{Order, PaymentStatus};
use vitrine_shared::models::user::User;
use vitrine_shared::payments::payu::{
    self, generate_txnid, verify_response_hash, PaymentRequest, PayuConfig,
};

/// Payment initiation request
#[derive(Debug, Deserialize)]
pub struct InitiatePaymentRequest {
    pub order_id: Uuid,
}

/// Gateway callback form
///
/// PayU posts these as `application/x-www-form-urlencoded`; unused udf
/// slots arrive as empty strings.
#[derive(Debug, Deserialize)]
pub struct PaymentCallbackForm {
    pub status: String,

    pub txnid: String,

    pub amount: String,

    pub productinfo: String,

    pub firstname: String,

    pub email: String,

    pub hash: String,

    #[serde(default)]
    pub udf1: String,

    #[serde(default)]
    pub udf2: String,

    #[serde(default)]
    pub udf3: String,

    #[serde(default)]
    pub udf4: String,

    #[serde(default)]
    pub udf5: String,
}

/// Sign a payment form for an order
///
/// Marks the order's payment as pending with the fresh transaction id, so
/// the callback can find it again. Re-initiating replaces the previous
/// transaction id.
///
/// # Errors
///
/// - `400 Bad Request`: Order already paid
/// - `403 Forbidden`: Not the order's owner
/// - `503 Service Unavailable`: Gateway credentials not configured
pub async fn initiate_payment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<InitiatePaymentRequest>,
) -> ApiResult<Json<PaymentRequest>> {
    let payment = state.config.payment.as_ref().ok_or_else(|| {
        ApiError::ServiceUnavailable("Payment gateway is not configured".to_string())
    })?;

    let order = Order::find_by_id(&state.db, req.order_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Order not found".to_string()))?;

    if order.user_id != auth.user_id {
        return Err(ApiError::Forbidden(
            "Cannot pay for another user's order".to_string(),
        ));
    }

    if order.payment_status == PaymentStatus::Paid {
        return Err(ApiError::BadRequest("Order is already paid".to_string()));
    }

    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let gateway = PayuConfig {
        merchant_key: payment.merchant_key.clone(),
        salt: payment.salt.clone(),
        base_url: payment.base_url.clone(),
    };

    let txnid = generate_txnid();
    let firstname = user.name.as_deref().unwrap_or("Customer");
    let productinfo = format!("Order {}", order.id);

    let request = PaymentRequest::build(
        &gateway,
        &txnid,
        order.total,
        &productinfo,
        firstname,
        &user.email,
        &format!("{}/api/payment/callback/success", payment.callback_base_url),
        &format!("{}/api/payment/callback/failure", payment.callback_base_url),
    )
    .map_err(|e| match e {
        payu::PayuError::InvalidAmount(_) => {
            ApiError::BadRequest("Order total cannot be paid".to_string())
        }
        payu::PayuError::MissingConfig(var) => {
            ApiError::ServiceUnavailable(format!("Payment gateway misconfigured: {var}"))
        }
    })?;

    Order::mark_payment(&state.db, order.id, PaymentStatus::Pending, Some(&txnid)).await?;

    tracing::info!(order_id = %order.id, txnid = %txnid, "Payment initiated");

    Ok(Json(request))
}

/// Gateway callback, mounted on both the success and failure URLs
///
/// Public endpoint; authenticity comes from the response hash, not from a
/// session. A bad signature is rejected before any lookup, and the outcome
/// is taken from the signed `status` field rather than from which URL the
/// gateway happened to hit.
///
/// # Errors
///
/// - `400 Bad Request`: Signature mismatch
/// - `404 Not Found`: No order carries the transaction id
pub async fn payment_callback(
    State(state): State<AppState>,
    Form(form): Form<PaymentCallbackForm>,
) -> ApiResult<Json<serde_json::Value>> {
    let payment = state.config.payment.as_ref().ok_or_else(|| {
        ApiError::ServiceUnavailable("Payment gateway is not configured".to_string())
    })?;

    let verified = verify_response_hash(
        &form.hash,
        &payment.salt,
        &form.status,
        &payment.merchant_key,
        &form.txnid,
        &form.amount,
        &form.productinfo,
        &form.firstname,
        &form.email,
        &[&form.udf1, &form.udf2, &form.udf3, &form.udf4, &form.udf5],
    );

    if !verified {
        tracing::warn!(txnid = %form.txnid, "Payment callback signature mismatch");
        return Err(ApiError::BadRequest(
            "Invalid payment signature".to_string(),
        ));
    }

    let order = Order::find_by_payment_reference(&state.db, &form.txnid)
        .await?
        .ok_or_else(|| ApiError::NotFound("Unknown transaction".to_string()))?;

    let payment_status = if form.status.eq_ignore_ascii_case("success") {
        PaymentStatus::Paid
    } else {
        PaymentStatus::Failed
    };

    let updated = Order::mark_payment(&state.db, order.id, payment_status, None)
        .await?
        .ok_or_else(|| ApiError::NotFound("Order not found".to_string()))?;

    let event = StoreEvent::new(
        EventKind::OrderStatusUpdate,
        updated.id,
        json!({"status": updated.status, "payment_status": updated.payment_status}),
    );
    state
        .events
        .publish_best_effort(
            &[store_stream_key(), user_stream_key(updated.user_id)],
            &event,
        )
        .await;

    tracing::info!(
        order_id = %updated.id,
        txnid = %form.txnid,
        status = %form.status,
        "Payment callback processed"
    );

    Ok(Json(json!({
        "order_id": updated.id,
        "payment_status": updated.payment_status,
    })))
}
