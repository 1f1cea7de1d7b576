//! Axum route handlers for the facilitator service.
//!
//! Bodies are read as raw bytes and parsed here, so a malformed request still
//! gets a protocol-shaped answer instead of axum's extractor rejection.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::routing::{get, post};
use s402::facilitator::Facilitator;
use s402::proto::{SettleRequest, SettleResponse, SupportedResponse, VerifyRequest, VerifyResponse};
use s402_svm::WIRE_SOLANA_DEVNET;

use crate::error::FacilitatorError;

/// `POST /verify` - Checks a payment payload against its requirements.
///
/// # Errors
///
/// Returns [`FacilitatorError`] for an unreadable body or facilitator failure;
/// both render as an `unexpected_verify_error` verdict.
pub async fn post_verify<F>(
    State(facilitator): State<F>,
    body: Bytes,
) -> Result<Json<VerifyResponse>, FacilitatorError>
where
    F: Facilitator,
{
    let request: VerifyRequest =
        serde_json::from_slice(&body).map_err(FacilitatorError::InvalidVerifyBody)?;
    let response = facilitator
        .verify(&request)
        .await
        .map_err(|e| FacilitatorError::Verify(e.to_string()))?;
    Ok(Json(response))
}

/// `POST /settle` - Re-verifies a payment and broadcasts it.
///
/// # Errors
///
/// Returns [`FacilitatorError`] for an unreadable body or facilitator failure;
/// both render as an `unexpected_settle_error` outcome.
pub async fn post_settle<F>(
    State(facilitator): State<F>,
    body: Bytes,
) -> Result<Json<SettleResponse>, FacilitatorError>
where
    F: Facilitator,
{
    let request: SettleRequest =
        serde_json::from_slice(&body).map_err(|source| FacilitatorError::InvalidSettleBody {
            network: requested_network(&body),
            source,
        })?;
    let response = facilitator
        .settle(&request)
        .await
        .map_err(|e| FacilitatorError::Settle {
            network: request.payment_requirements().network.clone(),
            detail: e.to_string(),
        })?;
    Ok(Json(response))
}

/// `GET /supported` - Lists the accepted payment kinds.
///
/// # Errors
///
/// Returns [`FacilitatorError::Supported`] if the facilitator cannot list them.
pub async fn get_supported<F>(
    State(facilitator): State<F>,
) -> Result<Json<SupportedResponse>, FacilitatorError>
where
    F: Facilitator,
{
    facilitator
        .supported()
        .await
        .map(Json)
        .map_err(|e| FacilitatorError::Supported(e.to_string()))
}

/// `GET /health` - Liveness probe.
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Best-effort `paymentRequirements.network` from a body that failed to parse.
fn requested_network(body: &[u8]) -> String {
    serde_json::from_slice::<serde_json::Value>(body)
        .ok()
        .as_ref()
        .and_then(|value| value.pointer("/paymentRequirements/network"))
        .and_then(serde_json::Value::as_str)
        .unwrap_or(WIRE_SOLANA_DEVNET)
        .to_owned()
}

/// Creates an Axum [`axum::Router`] with all facilitator endpoints.
///
/// Endpoints:
/// - `GET /supported` - list supported payment kinds
/// - `POST /verify` - verify a payment
/// - `POST /settle` - settle a payment
/// - `GET /health` - liveness probe
pub fn facilitator_router<F>(facilitator: F) -> axum::Router
where
    F: Facilitator + Clone + Send + Sync + 'static,
{
    axum::Router::new()
        .route("/supported", get(get_supported::<F>))
        .route("/verify", post(post_verify::<F>))
        .route("/settle", post(post_settle::<F>))
        .route("/health", get(health))
        .with_state(facilitator)
}
