//! Error types for the facilitator HTTP endpoints.
//!
//! Verify and settle failures are still protocol answers: they are sent as
//! `200 OK` with an `unexpected_*` reason and the detail goes to the log only.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use s402::proto::{ErrorReason, SettleResponse, VerifyResponse};

/// Errors that can occur while serving a facilitator request.
#[derive(Debug, thiserror::Error)]
pub enum FacilitatorError {
    /// The `/verify` body is not a verify request.
    #[error("invalid verify request body: {0}")]
    InvalidVerifyBody(#[source] serde_json::Error),

    /// The `/settle` body is not a settle request.
    #[error("invalid settle request body: {source}")]
    InvalidSettleBody {
        /// Network recovered from the body, for the response.
        network: String,
        /// The parse failure.
        #[source]
        source: serde_json::Error,
    },

    /// The facilitator failed to produce a verdict.
    #[error("verification failed: {0}")]
    Verify(String),

    /// The facilitator failed to produce a settlement outcome.
    #[error("settlement failed: {detail}")]
    Settle {
        /// Network the settlement was attempted on.
        network: String,
        /// Underlying failure, for logs.
        detail: String,
    },

    /// The supported kinds could not be listed.
    #[error("supported kinds unavailable: {0}")]
    Supported(String),
}

impl IntoResponse for FacilitatorError {
    fn into_response(self) -> Response {
        tracing::warn!(error = %self, "facilitator request failed");
        match self {
            Self::InvalidVerifyBody(_) | Self::Verify(_) => {
                Json(VerifyResponse::invalid(ErrorReason::UnexpectedVerifyError)).into_response()
            }
            Self::InvalidSettleBody { network, .. } | Self::Settle { network, .. } => Json(
                SettleResponse::error(ErrorReason::UnexpectedSettleError, network),
            )
            .into_response(),
            Self::Supported(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": "Supported kinds unavailable" })),
            )
                .into_response(),
        }
    }
}
