//! Error types for the x402 payment gate middleware.

use s402::proto::ErrorReason;

/// Reasons a paid request is not served.
///
/// Everything except [`PaygateError::Misconfigured`] becomes a
/// `402 Payment Required` carrying fresh requirements. Detail text is for
/// logs; clients only ever see [`PaygateError::reason`].
#[derive(Debug, thiserror::Error)]
pub enum PaygateError {
    /// No `X-PAYMENT` header was sent.
    #[error("X-PAYMENT header is required")]
    PaymentHeaderRequired,
    /// The `X-PAYMENT` header is not base64 JSON of a payment payload.
    #[error("Invalid or malformed payment header")]
    InvalidPaymentHeader,
    /// The facilitator could not be asked to verify.
    #[error("Verification request failed: {0}")]
    VerifyUnavailable(String),
    /// The facilitator rejected the payment.
    #[error("Verification failed: {0}")]
    VerificationFailed(ErrorReason),
    /// The facilitator could not be asked to settle.
    #[error("Settlement request failed: {0}")]
    SettleUnavailable(String),
    /// The facilitator reported a failed settlement.
    #[error("Settlement failed: {0}")]
    SettlementFailed(ErrorReason),
    /// Payment requirements could not be built for the route.
    #[error("Payment requirements are misconfigured: {0}")]
    Misconfigured(String),
}

impl PaygateError {
    /// The reason reported in the 402 body, if any.
    #[must_use]
    pub const fn reason(&self) -> Option<ErrorReason> {
        match self {
            Self::PaymentHeaderRequired | Self::Misconfigured(_) => None,
            Self::InvalidPaymentHeader => Some(ErrorReason::InvalidPayload),
            Self::VerifyUnavailable(_) => Some(ErrorReason::UnexpectedVerifyError),
            Self::SettleUnavailable(_) => Some(ErrorReason::UnexpectedSettleError),
            Self::VerificationFailed(reason) | Self::SettlementFailed(reason) => Some(*reason),
        }
    }
}
