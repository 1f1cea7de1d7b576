//! Protocol types for x402 payment messages.
//!
//! This module defines the wire format exchanged between buyers, sellers,
//! and facilitators. Only protocol version 1 is implemented.
//!
//! # Key Types
//!
//! - [`SupportedPaymentKind`] - Describes a payment method supported by a facilitator
//! - [`SupportedResponse`] - Response from facilitator's `/supported` endpoint
//! - [`VerifyRequest`] / [`VerifyResponse`] - Payment verification messages
//! - [`SettleRequest`] / [`SettleResponse`] - Payment settlement messages
//! - [`ErrorReason`] - Closed set of machine-readable failure reasons
//!
//! # Wire Format
//!
//! All types serialize to JSON using camelCase field names.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_with::{VecSkipError, serde_as};
use std::fmt;

pub mod v1;

/// Describes a payment method supported by a facilitator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportedPaymentKind {
    /// The x402 protocol version.
    pub x402_version: u8,
    /// The payment scheme identifier (e.g., "exact").
    pub scheme: String,
    /// The wire network name.
    pub network: String,
    /// Optional scheme-specific extra data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<serde_json::Value>,
}

/// Response from a facilitator's `/supported` endpoint.
///
/// Kinds that fail to parse are skipped rather than failing the whole
/// response, so a client keeps working against a facilitator that advertises
/// more than it understands.
#[serde_as]
#[derive(Clone, Default, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportedResponse {
    /// List of supported payment kinds.
    #[serde_as(as = "VecSkipError<_>")]
    pub kinds: Vec<SupportedPaymentKind>,
}

/// Request to verify a payment before settlement.
///
/// The top-level `x402Version` is optional on input and always `1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    /// Protocol version of the request envelope.
    #[serde(default)]
    pub x402_version: v1::X402Version1,
    /// The buyer's payment envelope.
    pub payment_payload: v1::PaymentPayload,
    /// The seller's payment terms the payload is checked against.
    pub payment_requirements: v1::PaymentRequirements,
}

impl VerifyRequest {
    /// Pairs a payment payload with the requirements it answers.
    #[must_use]
    pub const fn new(
        payment_payload: v1::PaymentPayload,
        payment_requirements: v1::PaymentRequirements,
    ) -> Self {
        Self {
            x402_version: v1::X402Version1,
            payment_payload,
            payment_requirements,
        }
    }
}

/// Request to settle a verified payment on-chain.
///
/// Structurally identical to [`VerifyRequest`] on the wire, but a distinct
/// type so a verify request cannot be passed where a settle request is
/// expected by accident.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SettleRequest(VerifyRequest);

impl SettleRequest {
    /// Returns the verification view of this request.
    ///
    /// Facilitators re-verify before broadcasting.
    #[must_use]
    pub const fn as_verify_request(&self) -> &VerifyRequest {
        &self.0
    }

    /// Returns the payment requirements carried by the request.
    #[must_use]
    pub const fn payment_requirements(&self) -> &v1::PaymentRequirements {
        &self.0.payment_requirements
    }
}

impl From<VerifyRequest> for SettleRequest {
    fn from(request: VerifyRequest) -> Self {
        Self(request)
    }
}

/// Machine-readable reason codes for payment failures.
///
/// This set is closed: every failure surfaced to a client is one of these,
/// spelled exactly as the snake_case variant name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorReason {
    /// The payload is missing, malformed, or does not encode a sufficient transfer.
    InvalidPayload,
    /// The payload network is unknown or differs from the requirements.
    InvalidNetwork,
    /// The payload scheme differs from the requirements.
    InvalidScheme,
    /// The payer's token balance does not cover the transfer.
    InsufficientFunds,
    /// The transaction was already processed by the ledger.
    InvalidTransactionState,
    /// The transaction's recent blockhash expired before submission.
    SettleExactSvmBlockHeightExceeded,
    /// Verification failed for a reason outside the taxonomy.
    UnexpectedVerifyError,
    /// Settlement failed for a reason outside the taxonomy.
    UnexpectedSettleError,
}

impl ErrorReason {
    /// Returns the wire spelling of this reason.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidPayload => "invalid_payload",
            Self::InvalidNetwork => "invalid_network",
            Self::InvalidScheme => "invalid_scheme",
            Self::InsufficientFunds => "insufficient_funds",
            Self::InvalidTransactionState => "invalid_transaction_state",
            Self::SettleExactSvmBlockHeightExceeded => "settle_exact_svm_block_height_exceeded",
            Self::UnexpectedVerifyError => "unexpected_verify_error",
            Self::UnexpectedSettleError => "unexpected_settle_error",
        }
    }
}

impl fmt::Display for ErrorReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result returned by a facilitator after verifying a payment payload
/// against the provided payment requirements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyResponse {
    /// The payload matches the requirements and passes all checks.
    Valid {
        /// The address of the payer, when it can be extracted.
        payer: Option<String>,
    },
    /// The payload failed verification.
    Invalid {
        /// Machine-readable reason verification failed.
        reason: ErrorReason,
        /// The payer address, if identifiable.
        payer: Option<String>,
    },
}

impl VerifyResponse {
    /// Constructs a successful verification response.
    #[must_use]
    pub const fn valid(payer: String) -> Self {
        Self::Valid { payer: Some(payer) }
    }

    /// Constructs a failed verification response.
    #[must_use]
    pub const fn invalid(reason: ErrorReason) -> Self {
        Self::Invalid {
            reason,
            payer: None,
        }
    }

    /// Returns `true` if the verification succeeded.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid { .. })
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VerifyResponseWire {
    is_valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    invalid_reason: Option<ErrorReason>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    payer: Option<String>,
}

impl Serialize for VerifyResponse {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let wire = match self {
            Self::Valid { payer } => VerifyResponseWire {
                is_valid: true,
                invalid_reason: None,
                payer: payer.clone(),
            },
            Self::Invalid { reason, payer } => VerifyResponseWire {
                is_valid: false,
                invalid_reason: Some(*reason),
                payer: payer.clone(),
            },
        };
        wire.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for VerifyResponse {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let wire = VerifyResponseWire::deserialize(deserializer)?;
        if wire.is_valid {
            Ok(Self::Valid { payer: wire.payer })
        } else {
            let reason = wire
                .invalid_reason
                .ok_or_else(|| serde::de::Error::missing_field("invalidReason"))?;
            Ok(Self::Invalid {
                reason,
                payer: wire.payer,
            })
        }
    }
}

/// Response from a payment settlement request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettleResponse {
    /// Settlement succeeded.
    Success {
        /// The ledger-assigned transaction signature.
        transaction: String,
        /// The wire network the transaction was submitted to.
        network: String,
        /// The address that paid, when it can be extracted.
        payer: Option<String>,
    },
    /// Settlement failed.
    Error {
        /// Machine-readable reason for failure.
        reason: ErrorReason,
        /// The wire network where settlement was attempted.
        network: String,
        /// The payer, when verification got far enough to identify it.
        payer: Option<String>,
    },
}

impl SettleResponse {
    /// Constructs a failed settlement response.
    #[must_use]
    pub const fn error(reason: ErrorReason, network: String) -> Self {
        Self::Error {
            reason,
            network,
            payer: None,
        }
    }

    /// Returns `true` if the settlement succeeded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettleResponseWire {
    success: bool,
    #[serde(default)]
    transaction: String,
    network: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error_reason: Option<ErrorReason>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    payer: Option<String>,
}

impl Serialize for SettleResponse {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let wire = match self {
            Self::Success {
                transaction,
                network,
                payer,
            } => SettleResponseWire {
                success: true,
                transaction: transaction.clone(),
                network: network.clone(),
                error_reason: None,
                payer: payer.clone(),
            },
            Self::Error {
                reason,
                network,
                payer,
            } => SettleResponseWire {
                success: false,
                transaction: String::new(),
                network: network.clone(),
                error_reason: Some(*reason),
                payer: payer.clone(),
            },
        };
        wire.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SettleResponse {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let wire = SettleResponseWire::deserialize(deserializer)?;
        if wire.success {
            Ok(Self::Success {
                transaction: wire.transaction,
                network: wire.network,
                payer: wire.payer,
            })
        } else {
            let reason = wire
                .error_reason
                .ok_or_else(|| serde::de::Error::missing_field("errorReason"))?;
            Ok(Self::Error {
                reason,
                network: wire.network,
                payer: wire.payer,
            })
        }
    }
}
