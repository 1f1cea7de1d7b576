//! HTTP header encoding and decoding for x402 protocol messages.
//!
//! Both directions use standard base64 over compact JSON: `X-PAYMENT`
//! carries a [`PaymentPayload`], `X-PAYMENT-RESPONSE` a [`SettleResponse`].

use base64::prelude::*;
use s402::proto::SettleResponse;
use s402::proto::v1::PaymentPayload;

use crate::error::HttpError;

/// Encodes a [`PaymentPayload`] for the `X-PAYMENT` header.
///
/// # Errors
///
/// Returns [`HttpError::Serialize`] if JSON serialization fails.
pub fn encode_x_payment(payload: &PaymentPayload) -> Result<String, HttpError> {
    let json = serde_json::to_vec(payload)?;
    Ok(BASE64_STANDARD.encode(&json))
}

/// Decodes an `X-PAYMENT` header value.
///
/// # Errors
///
/// Returns [`HttpError`] on Base64 or JSON decode failure.
pub fn decode_x_payment(header_value: &[u8]) -> Result<PaymentPayload, HttpError> {
    let bytes = BASE64_STANDARD.decode(header_value.trim_ascii())?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Encodes a [`SettleResponse`] for the `X-PAYMENT-RESPONSE` header.
///
/// # Errors
///
/// Returns [`HttpError::Serialize`] if JSON serialization fails.
pub fn encode_payment_response(response: &SettleResponse) -> Result<String, HttpError> {
    let json = serde_json::to_vec(response)?;
    Ok(BASE64_STANDARD.encode(&json))
}

/// Decodes an `X-PAYMENT-RESPONSE` header value.
///
/// # Errors
///
/// Returns [`HttpError`] on Base64 or JSON decode failure.
pub fn decode_payment_response(header_value: &str) -> Result<SettleResponse, HttpError> {
    let bytes = BASE64_STANDARD.decode(header_value.trim())?;
    Ok(serde_json::from_slice(&bytes)?)
}
