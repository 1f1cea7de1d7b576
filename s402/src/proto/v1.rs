//! Protocol version 1 (V1) types for x402.
//!
//! V1 identifies networks by name (e.g. `"solana-devnet"`) and carries the
//! payment payload in the `X-PAYMENT` header.
//!
//! # Key Types
//!
//! - [`X402Version1`] - Version marker that serializes as `1`
//! - [`PaymentPayload`] - Signed payment envelope submitted by the buyer
//! - [`PaymentRequirements`] - Payment terms set by the seller
//! - [`PaymentRequired`] - HTTP 402 response body

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// The only payment scheme this protocol implementation understands.
pub const EXACT_SCHEME: &str = "exact";

/// Default MIME type advertised for a protected resource.
pub const DEFAULT_MIME_TYPE: &str = "application/json";

/// Default time window, in seconds, a client has to complete a payment.
pub const DEFAULT_MAX_TIMEOUT_SECONDS: u64 = 60;

/// Version marker for x402 protocol version 1.
///
/// Serializes as the integer `1` and rejects any other value on
/// deserialization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct X402Version1;

impl X402Version1 {
    /// Numeric value of this protocol version.
    pub const VALUE: u8 = 1;
}

impl fmt::Display for X402Version1 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Self::VALUE)
    }
}

impl Serialize for X402Version1 {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u8(Self::VALUE)
    }
}

impl<'de> Deserialize<'de> for X402Version1 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = u64::deserialize(deserializer)?;
        if value == u64::from(Self::VALUE) {
            Ok(Self)
        } else {
            Err(serde::de::Error::custom(format!(
                "unsupported x402Version {value}, expected {}",
                Self::VALUE
            )))
        }
    }
}

/// A payment envelope submitted by the buyer.
///
/// The scheme-specific `payload` is kept as raw JSON here; chain crates
/// interpret it (for Solana it carries a base64 transaction).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPayload<TPayload = serde_json::Value> {
    /// Protocol version (always 1).
    pub x402_version: X402Version1,
    /// The payment scheme (e.g. "exact").
    pub scheme: String,
    /// The network name (e.g. "solana-devnet").
    pub network: String,
    /// The scheme-specific signed payload.
    pub payload: TPayload,
}

/// Payment requirements set by the seller.
///
/// Built fresh for every request and never mutated afterwards.
/// `max_amount_required` is a decimal integer string in the asset's smallest
/// unit so that it survives JSON round trips without precision loss.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequirements {
    /// The payment scheme (e.g. "exact").
    pub scheme: String,
    /// The network name (e.g. "solana-devnet").
    pub network: String,
    /// The amount required for payment, in the asset's smallest unit.
    pub max_amount_required: String,
    /// The resource URL being paid for.
    pub resource: String,
    /// Human-readable description of the resource.
    pub description: String,
    /// MIME type of the resource.
    pub mime_type: String,
    /// Optional JSON schema for the resource output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<serde_json::Value>,
    /// The recipient address for payment.
    pub pay_to: String,
    /// Maximum time in seconds for payment validity.
    pub max_timeout_seconds: u64,
    /// The token asset address.
    pub asset: String,
    /// Scheme-specific extra data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<serde_json::Value>,
}

/// HTTP 402 Payment Required response body for V1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequired {
    /// Protocol version (always 1).
    pub x402_version: X402Version1,
    /// Machine-readable reason the previous attempt was rejected, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// List of acceptable payment methods.
    #[serde(default)]
    pub accepts: Vec<PaymentRequirements>,
}

impl PaymentRequired {
    /// Builds a 402 body offering the given requirements.
    #[must_use]
    pub const fn new(accepts: Vec<PaymentRequirements>, error: Option<String>) -> Self {
        Self {
            x402_version: X402Version1,
            error,
            accepts,
        }
    }
}
