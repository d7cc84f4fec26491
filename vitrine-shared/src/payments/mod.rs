/// Payment gateway integration
///
/// The storefront posts a signed form to the gateway's hosted page; the
/// gateway redirects back with a signed response. All the server does is
/// compute and verify the signatures, so this module is pure hashing with
/// no outbound HTTP.

pub mod payu;

pub use payu::{
    generate_txnid, request_hash, verify_response_hash, PaymentRequest, PayuConfig, PayuError,
};
