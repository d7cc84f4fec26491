/// PayU hosted-checkout signing
///
/// PayU authenticates both directions with SHA-512 over pipe-joined fields:
///
/// Request (sent with the redirect form):
/// ```text
/// sha512(key|txnid|amount|productinfo|firstname|email|udf1|udf2|udf3|udf4|udf5||||||SALT)
/// ```
///
/// Response (callback from the gateway), same fields reversed with the salt
/// and status prepended:
/// ```text
/// sha512(SALT|status||||||udf5|udf4|udf3|udf2|udf1|email|firstname|productinfo|amount|txnid|key)
/// ```
///
/// Amounts are formatted with two decimals; the gateway hashes the literal
/// string, so both sides must agree on the formatting.
///
/// # Example
///
/// ```
/// use vitrine_shared::payments::payu::{request_hash, verify_response_hash};
///
/// let hash = request_hash(
///     "merchant_key", "txn123", "499.00", "Order txn123",
///     "Jo", "jo@example.com", &["", "", "", "", ""], "salt",
/// );
/// assert_eq!(hash.len(), 128); // hex-encoded SHA-512
/// ```

use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};
use thiserror::Error;

/// Payment configuration errors
#[derive(Error, Debug)]
pub enum PayuError {
    #[error("Missing PayU configuration: {0}")]
    MissingConfig(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(f64),
}

/// Merchant credentials and gateway endpoint
#[derive(Debug, Clone)]
pub struct PayuConfig {
    /// Merchant key, sent in the clear with the form
    pub merchant_key: String,

    /// Merchant salt, never leaves the server
    pub salt: String,

    /// Hosted checkout URL the form posts to
    pub base_url: String,
}

impl PayuConfig {
    /// Loads the configuration from environment variables
    ///
    /// # Environment Variables
    ///
    /// - `PAYU_MERCHANT_KEY` (required)
    /// - `PAYU_SALT` (required)
    /// - `PAYU_BASE_URL` (default: the PayU test endpoint)
    pub fn from_env() -> Result<Self, PayuError> {
        let merchant_key = std::env::var("PAYU_MERCHANT_KEY")
            .map_err(|_| PayuError::MissingConfig("PAYU_MERCHANT_KEY".to_string()))?;
        let salt = std::env::var("PAYU_SALT")
            .map_err(|_| PayuError::MissingConfig("PAYU_SALT".to_string()))?;
        let base_url = std::env::var("PAYU_BASE_URL")
            .unwrap_or_else(|_| "https://test.payu.in/_payment".to_string());

        Ok(Self {
            merchant_key,
            salt,
            base_url,
        })
    }
}

/// The signed form fields the browser posts to the gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRequest {
    /// URL the form must POST to
    pub payment_url: String,

    pub key: String,

    pub txnid: String,

    /// Amount as the exact string that was hashed
    pub amount: String,

    pub productinfo: String,

    pub firstname: String,

    pub email: String,

    pub surl: String,

    pub furl: String,

    pub hash: String,
}

/// Computes the request-side SHA-512 hash
///
/// `udfs` are the five user-defined fields in order; pass empty strings for
/// unused slots.
pub fn request_hash(
    key: &str,
    txnid: &str,
    amount: &str,
    productinfo: &str,
    firstname: &str,
    email: &str,
    udfs: &[&str; 5],
    salt: &str,
) -> String {
    let input = format!(
        "{}|{}|{}|{}|{}|{}|{}|{}|{}|{}|{}||||||{}",
        key, txnid, amount, productinfo, firstname, email, udfs[0], udfs[1], udfs[2], udfs[3],
        udfs[4], salt,
    );

    hex::encode(Sha512::digest(input.as_bytes()))
}

/// Verifies the hash on a gateway callback
///
/// The response hash reverses the field order and leads with the salt and
/// transaction status. Verification is mandatory; an unsigned or tampered
/// callback must never flip an order to paid.
#[allow(clippy::too_many_arguments)]
pub fn verify_response_hash(
    received_hash: &str,
    salt: &str,
    status: &str,
    key: &str,
    txnid: &str,
    amount: &str,
    productinfo: &str,
    firstname: &str,
    email: &str,
    udfs: &[&str; 5],
) -> bool {
    let input = format!(
        "{}|{}||||||{}|{}|{}|{}|{}|{}|{}|{}|{}|{}|{}",
        salt,
        status,
        udfs[4],
        udfs[3],
        udfs[2],
        udfs[1],
        udfs[0],
        email,
        firstname,
        productinfo,
        amount,
        txnid,
        key,
    );

    let expected = hex::encode(Sha512::digest(input.as_bytes()));

    // Case-insensitive compare, gateways differ on hex casing
    expected.eq_ignore_ascii_case(received_hash)
}

/// Generates a unique transaction id for a new payment attempt
///
/// Format: `txn` + 13-digit millis timestamp + 6 random alphanumerics.
pub fn generate_txnid() -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let mut rng = rand::thread_rng();
    let suffix: String = (0..6)
        .map(|_| {
            let chars = b"abcdefghijklmnopqrstuvwxyz0123456789";
            chars[rng.gen_range(0..chars.len())] as char
        })
        .collect();

    format!("txn{}{}", millis, suffix)
}

/// Formats an amount the way the gateway expects it hashed
pub fn format_amount(amount: f64) -> Result<String, PayuError> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(PayuError::InvalidAmount(amount));
    }
    Ok(format!("{:.2}", amount))
}

impl PaymentRequest {
    /// Builds the signed form for one transaction
    pub fn build(
        config: &PayuConfig,
        txnid: &str,
        amount: f64,
        productinfo: &str,
        firstname: &str,
        email: &str,
        surl: &str,
        furl: &str,
    ) -> Result<Self, PayuError> {
        let amount_str = format_amount(amount)?;

        let hash = request_hash(
            &config.merchant_key,
            txnid,
            &amount_str,
            productinfo,
            firstname,
            email,
            &["", "", "", "", ""],
            &config.salt,
        );

        Ok(Self {
            payment_url: config.base_url.clone(),
            key: config.merchant_key.clone(),
            txnid: txnid.to_string(),
            amount: amount_str,
            productinfo: productinfo.to_string(),
            firstname: firstname.to_string(),
            email: email.to_string(),
            surl: surl.to_string(),
            furl: furl.to_string(),
            hash,
        })
    }
}
