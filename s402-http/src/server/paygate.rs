//! Core payment gate logic for enforcing x402 payments.
//!
//! The [`Paygate`] struct handles the per-request payment lifecycle:
//! extracting the header, verifying with the facilitator, settling, and
//! returning 402 responses when payment is required.
//!
//! The inner service sees the successful [`SettleResponse`] as a request
//! extension.

use axum_core::body::Body;
use axum_core::extract::Request;
use axum_core::response::{IntoResponse, Response};
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderValue, StatusCode};
use s402::facilitator::Facilitator;
use s402::proto::v1::{PaymentPayload, PaymentRequired, PaymentRequirements};
use s402::proto::{SettleRequest, SettleResponse, VerifyRequest, VerifyResponse};
use serde::Serialize;
use std::convert::Infallible;
use tower::Service;
use url::Url;

#[cfg(feature = "telemetry")]
use tracing::Instrument;
#[cfg(feature = "telemetry")]
use tracing::instrument;

use super::error::PaygateError;
use crate::constants::{X_PAYMENT_HEADER, X_PAYMENT_REQUIRED_HEADER, X_PAYMENT_RESPONSE_HEADER};
use crate::headers::{decode_x_payment, encode_payment_response};

/// Route-level overrides for the advertised resource.
#[derive(Debug, Clone, Default)]
pub struct ResourceInfo {
    /// Description used when the price tag has none.
    pub description: Option<String>,
    /// MIME type used when the price tag has none.
    pub mime_type: Option<String>,
    /// Explicit URL of the protected resource.
    pub url: Option<String>,
}

impl ResourceInfo {
    /// Determines the resource URL for a request.
    ///
    /// An explicit `url` wins. Otherwise the base URL, or `http://{Host}`
    /// when none is configured, is combined with the request path and query.
    #[must_use]
    pub fn resource_url(&self, base_url: Option<&Url>, req: &Request) -> String {
        if let Some(url) = &self.url {
            return url.clone();
        }
        let uri = req.uri();
        let origin = match base_url {
            Some(base) => Some(base.clone()),
            None => {
                let host = req
                    .headers()
                    .get(http::header::HOST)
                    .and_then(|h| h.to_str().ok())
                    .unwrap_or("localhost");
                #[cfg(feature = "telemetry")]
                tracing::debug!(host, "base_url is not configured; using Host header as origin");
                Url::parse(&format!("http://{host}")).ok()
            }
        };
        match origin {
            Some(mut url) => {
                url.set_path(uri.path());
                url.set_query(uri.query());
                url.to_string()
            }
            None => format!("http://localhost{}", uri.path()),
        }
    }
}

/// A verify request the facilitator accepted.
///
/// Only [`Paygate::verify`] constructs it, so settlement cannot be reached
/// without a successful verification.
struct VerifiedRequest(SettleRequest);

/// Payment gate for one request.
#[allow(missing_debug_implementations)]
pub struct Paygate<TFacilitator> {
    /// The facilitator for verifying and settling payments
    pub facilitator: TFacilitator,
    /// Requirements built for this request
    pub requirements: PaymentRequirements,
}

impl<TFacilitator> Paygate<TFacilitator> {
    /// Calls the inner service with proper telemetry instrumentation.
    async fn call_inner<
        ReqBody,
        ResBody,
        S: Service<http::Request<ReqBody>, Response = http::Response<ResBody>>,
    >(
        mut inner: S,
        req: http::Request<ReqBody>,
    ) -> Result<http::Response<ResBody>, S::Error>
    where
        S::Future: Send,
    {
        #[cfg(feature = "telemetry")]
        {
            inner
                .call(req)
                .instrument(tracing::info_span!("inner"))
                .await
        }
        #[cfg(not(feature = "telemetry"))]
        {
            inner.call(req).await
        }
    }
}

impl<TFacilitator> Paygate<TFacilitator>
where
    TFacilitator: Facilitator + Sync,
{
    /// Handles an incoming request, processing payment if required.
    ///
    /// Any payment failure becomes a 402 response with fresh requirements;
    /// otherwise the inner service's response is returned with the
    /// settlement receipt attached.
    ///
    /// # Errors
    ///
    /// This method is infallible (`Infallible` error type).
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "x402.handle_request", skip_all, fields(network = %self.requirements.network))
    )]
    pub async fn handle_request<
        ReqBody,
        ResBody,
        S: Service<http::Request<ReqBody>, Response = http::Response<ResBody>>,
    >(
        self,
        inner: S,
        req: http::Request<ReqBody>,
    ) -> Result<Response, Infallible>
    where
        S::Response: IntoResponse,
        S::Error: IntoResponse,
        S::Future: Send,
    {
        match self.handle_request_fallible(inner, req).await {
            Ok(response) => Ok(response),
            Err(err) => {
                #[cfg(feature = "telemetry")]
                tracing::info!(error = %err, "payment required");
                Ok(payment_required_response(&self.requirements, &err))
            }
        }
    }

    /// Handles an incoming request, returning errors as `PaygateError`.
    ///
    /// # Errors
    ///
    /// Returns [`PaygateError`] if payment processing fails.
    pub async fn handle_request_fallible<
        ReqBody,
        ResBody,
        S: Service<http::Request<ReqBody>, Response = http::Response<ResBody>>,
    >(
        &self,
        inner: S,
        mut req: http::Request<ReqBody>,
    ) -> Result<Response, PaygateError>
    where
        S::Response: IntoResponse,
        S::Error: IntoResponse,
        S::Future: Send,
    {
        let header =
            extract_payment_header(req.headers()).ok_or(PaygateError::PaymentHeaderRequired)?;
        let payload: PaymentPayload =
            decode_x_payment(header).map_err(|_| PaygateError::InvalidPaymentHeader)?;

        let verified = self
            .verify(VerifyRequest::new(payload, self.requirements.clone()))
            .await?;
        let settlement = self.settle(verified).await?;
        let header_value = settlement_to_header(&settlement)?;
        req.extensions_mut().insert(settlement);

        let mut response = match Self::call_inner(inner, req).await {
            Ok(response) => response.into_response(),
            Err(err) => return Ok(err.into_response()),
        };
        response
            .headers_mut()
            .insert(X_PAYMENT_RESPONSE_HEADER, header_value);
        Ok(response)
    }

    async fn verify(&self, request: VerifyRequest) -> Result<VerifiedRequest, PaygateError> {
        let response = self
            .facilitator
            .verify(&request)
            .await
            .map_err(|e| PaygateError::VerifyUnavailable(e.to_string()))?;
        match response {
            VerifyResponse::Valid { .. } => Ok(VerifiedRequest(SettleRequest::from(request))),
            VerifyResponse::Invalid { reason, .. } => Err(PaygateError::VerificationFailed(reason)),
        }
    }

    async fn settle(&self, verified: VerifiedRequest) -> Result<SettleResponse, PaygateError> {
        let settlement = self
            .facilitator
            .settle(&verified.0)
            .await
            .map_err(|e| PaygateError::SettleUnavailable(e.to_string()))?;
        match settlement {
            SettleResponse::Error { reason, .. } => Err(PaygateError::SettlementFailed(reason)),
            success @ SettleResponse::Success { .. } => Ok(success),
        }
    }
}

/// Extracts the payment header value from the header map.
fn extract_payment_header(header_map: &HeaderMap) -> Option<&[u8]> {
    header_map.get(X_PAYMENT_HEADER).map(HeaderValue::as_bytes)
}

/// Converts a [`SettleResponse`] into an `X-PAYMENT-RESPONSE` header value.
fn settlement_to_header(settlement: &SettleResponse) -> Result<HeaderValue, PaygateError> {
    let encoded = encode_payment_response(settlement)
        .map_err(|e| PaygateError::SettleUnavailable(e.to_string()))?;
    HeaderValue::from_str(&encoded).map_err(|e| PaygateError::SettleUnavailable(e.to_string()))
}

fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response {
    let bytes = serde_json::to_vec(body).unwrap_or_default();
    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

/// Builds the `402 Payment Required` response for a failed attempt.
#[must_use]
pub fn payment_required_response(requirements: &PaymentRequirements, err: &PaygateError) -> Response {
    let body = PaymentRequired::new(
        vec![requirements.clone()],
        err.reason().map(|reason| reason.to_string()),
    );
    let mut response = json_response(StatusCode::PAYMENT_REQUIRED, &body);
    response
        .headers_mut()
        .insert(X_PAYMENT_REQUIRED_HEADER, HeaderValue::from_static("true"));
    response
}

/// Builds the `500` response for a route whose requirements cannot be built.
#[must_use]
pub fn misconfigured_response() -> Response {
    json_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        &serde_json::json!({ "error": "Payment requirements unavailable" }),
    )
}
