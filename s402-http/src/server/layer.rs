//! Tower layer and service wiring the [`Paygate`] into a route.
//!
//! [`X402Middleware`] is created once per application. Each protected route
//! gets its own [`X402LayerBuilder`] through [`X402Middleware::with_route`]
//! or [`X402Middleware::with_dynamic_route`].

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum_core::extract::Request;
use axum_core::response::Response;
use http::{HeaderMap, Uri};
use s402::facilitator::Facilitator;
use s402_svm::NetworkTable;
use s402_svm::exact::SolanaPriceTag;
use tower::util::BoxCloneSyncService;
use tower::{Layer, Service};
use url::Url;

use super::error::PaygateError;
use super::facilitator_client::{FacilitatorClient, FacilitatorClientError};
use super::paygate::{Paygate, ResourceInfo, misconfigured_response};
use super::route_source::{DynamicRoute, RouteSource, StaticRoute};

/// The main X402 middleware instance for enforcing x402 payments on routes.
///
/// Create a single instance per application and use it to build payment layers
/// for protected routes.
pub struct X402Middleware<F> {
    facilitator: F,
    table: Arc<NetworkTable>,
    base_url: Option<Url>,
}

impl<F: Clone> Clone for X402Middleware<F> {
    fn clone(&self) -> Self {
        Self {
            facilitator: self.facilitator.clone(),
            table: Arc::clone(&self.table),
            base_url: self.base_url.clone(),
        }
    }
}

impl<F: std::fmt::Debug> std::fmt::Debug for X402Middleware<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("X402Middleware")
            .field("facilitator", &self.facilitator)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl<F> X402Middleware<F> {
    /// Creates a middleware verifying through `facilitator` and pricing
    /// against `table`.
    pub const fn new(facilitator: F, table: Arc<NetworkTable>) -> Self {
        Self {
            facilitator,
            table,
            base_url: None,
        }
    }

    /// Returns a reference to the underlying facilitator.
    pub const fn facilitator(&self) -> &F {
        &self.facilitator
    }

    /// Returns the network table requirements are built from.
    pub fn table(&self) -> &NetworkTable {
        &self.table
    }
}

impl X402Middleware<Arc<FacilitatorClient>> {
    /// Creates a middleware instance talking to a remote facilitator.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn try_new(url: &str, table: Arc<NetworkTable>) -> Result<Self, FacilitatorClientError> {
        let facilitator = FacilitatorClient::try_from(url)?;
        Ok(Self::new(Arc::new(facilitator), table))
    }

    /// Returns the configured facilitator URL.
    #[must_use]
    pub fn facilitator_url(&self) -> &Url {
        self.facilitator.base_url()
    }
}

impl<F> X402Middleware<F>
where
    F: Clone,
{
    /// Sets the base URL used to construct resource URLs dynamically.
    ///
    /// If [`X402LayerBuilder::with_resource`] is not called, this base URL is combined with
    /// each request's path/query to compute the resource. If not set, the
    /// request's `Host` header is used.
    #[must_use]
    pub fn with_base_url(&self, base_url: Url) -> Self {
        let mut this = self.clone();
        this.base_url = Some(base_url);
        this
    }

    /// Prices the protected route with a fixed tag.
    #[must_use]
    pub fn with_route(&self, tag: SolanaPriceTag) -> X402LayerBuilder<StaticRoute, F> {
        self.builder(StaticRoute::new(tag))
    }

    /// Prices the protected route per request.
    ///
    /// The `callback` receives request headers and URI and returns the tag.
    #[must_use]
    pub fn with_dynamic_route<C, Fut>(&self, callback: C) -> X402LayerBuilder<DynamicRoute, F>
    where
        C: Fn(&HeaderMap, &Uri) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = SolanaPriceTag> + Send + 'static,
    {
        self.builder(DynamicRoute::new(callback))
    }

    fn builder<TSource>(&self, source: TSource) -> X402LayerBuilder<TSource, F> {
        X402LayerBuilder {
            facilitator: self.facilitator.clone(),
            table: Arc::clone(&self.table),
            base_url: self.base_url.clone().map(Arc::new),
            source,
            resource: Arc::new(ResourceInfo::default()),
        }
    }
}

/// Builder for configuring the X402 middleware layer.
///
/// Generic over `TSource` which implements [`RouteSource`] to support
/// both static and dynamic pricing strategies.
#[derive(Clone)]
#[allow(missing_debug_implementations)] // generic types may not implement Debug
pub struct X402LayerBuilder<TSource, TFacilitator> {
    facilitator: TFacilitator,
    table: Arc<NetworkTable>,
    base_url: Option<Arc<Url>>,
    source: TSource,
    resource: Arc<ResourceInfo>,
}

impl<TSource, TFacilitator> X402LayerBuilder<TSource, TFacilitator> {
    /// Sets a description of what the payment grants access to.
    ///
    /// Used when the price tag carries none.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.resource).description = Some(description.into());
        self
    }

    /// Sets the MIME type of the protected resource.
    ///
    /// Defaults to `application/json` if neither this nor the tag sets one.
    #[must_use]
    pub fn with_mime_type(mut self, mime: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.resource).mime_type = Some(mime.into());
        self
    }

    /// Sets the full URL of the protected resource.
    ///
    /// When set, this URL is used directly instead of constructing it from the base URL
    /// and request URI. This is the preferred approach in production.
    #[must_use]
    #[allow(clippy::needless_pass_by_value)] // Url consumed via to_string()
    pub fn with_resource(mut self, resource: Url) -> Self {
        Arc::make_mut(&mut self.resource).url = Some(resource.to_string());
        self
    }
}

impl<S, TSource, TFacilitator> Layer<S> for X402LayerBuilder<TSource, TFacilitator>
where
    S: Service<Request, Response = Response, Error = Infallible> + Clone + Send + Sync + 'static,
    S::Future: Send + 'static,
    TFacilitator: Facilitator + Clone,
    TSource: RouteSource,
{
    type Service = X402MiddlewareService<TSource, TFacilitator>;

    fn layer(&self, inner: S) -> Self::Service {
        X402MiddlewareService {
            facilitator: self.facilitator.clone(),
            table: Arc::clone(&self.table),
            base_url: self.base_url.clone(),
            source: self.source.clone(),
            resource: Arc::clone(&self.resource),
            inner: BoxCloneSyncService::new(inner),
        }
    }
}

/// Tower service that enforces x402 payments on incoming requests.
#[derive(Clone)]
#[allow(missing_debug_implementations)] // BoxCloneSyncService does not implement Debug
pub struct X402MiddlewareService<TSource, TFacilitator> {
    /// Payment facilitator (local or remote)
    facilitator: TFacilitator,
    /// Mint and recipient lookup for requirements
    table: Arc<NetworkTable>,
    /// Base URL for constructing resource URLs
    base_url: Option<Arc<Url>>,
    /// Route pricing, static or dynamic
    source: TSource,
    /// Resource overrides
    resource: Arc<ResourceInfo>,
    /// The inner service being wrapped
    inner: BoxCloneSyncService<Request, Response, Infallible>,
}

impl<TSource, TFacilitator> Service<Request> for X402MiddlewareService<TSource, TFacilitator>
where
    TSource: RouteSource,
    TFacilitator: Facilitator + Clone + Send + Sync + 'static,
{
    type Response = Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Response, Infallible>> + Send>>;

    /// Delegates readiness polling to the wrapped inner service.
    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    /// Builds fresh requirements for the request and runs the payment gate.
    #[cfg_attr(not(feature = "telemetry"), allow(unused_variables))] // err is needed for tracing only
    fn call(&mut self, req: Request) -> Self::Future {
        let source = self.source.clone();
        let facilitator = self.facilitator.clone();
        let table = Arc::clone(&self.table);
        let base_url = self.base_url.clone();
        let resource = Arc::clone(&self.resource);
        let inner = self.inner.clone();

        Box::pin(async move {
            let mut tag = source.resolve(req.headers(), req.uri()).await;
            if tag.description.is_none() {
                tag.description.clone_from(&resource.description);
            }
            if tag.mime_type.is_none() {
                tag.mime_type.clone_from(&resource.mime_type);
            }
            let resource_url = resource.resource_url(base_url.as_deref(), &req);

            let requirements = match tag.requirements(&table, &resource_url) {
                Ok(requirements) => requirements,
                Err(err) => {
                    let err = PaygateError::Misconfigured(err.to_string());
                    #[cfg(feature = "telemetry")]
                    tracing::error!(error = %err, "cannot build payment requirements");
                    return Ok(misconfigured_response());
                }
            };

            let gate = Paygate {
                facilitator,
                requirements,
            };
            gate.handle_request(inner, req).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{X_PAYMENT_HEADER, X_PAYMENT_RESPONSE_HEADER};
    use crate::headers::encode_x_payment;
    use axum_core::body::Body;
    use http::StatusCode;
    use s402::proto::v1::{PaymentPayload, X402Version1};
    use s402::proto::{
        SettleRequest, SettleResponse, SupportedResponse, VerifyRequest, VerifyResponse,
    };
    use std::sync::Mutex;
    use tower::ServiceExt;

    /// Accepts everything and remembers the requirements it was shown.
    #[derive(Default)]
    struct RecordingFacilitator {
        seen: Mutex<Vec<String>>,
    }

    impl Facilitator for RecordingFacilitator {
        type Error = Infallible;

        async fn verify(&self, request: &VerifyRequest) -> Result<VerifyResponse, Infallible> {
            let reqs = &request.payment_requirements;
            self.seen
                .lock()
                .unwrap()
                .push(format!("{} {} {}", reqs.network, reqs.resource, reqs.description));
            Ok(VerifyResponse::valid("payer".into()))
        }

        async fn settle(&self, request: &SettleRequest) -> Result<SettleResponse, Infallible> {
            Ok(SettleResponse::Success {
                transaction: "sig".into(),
                network: request.payment_requirements().network.clone(),
                payer: Some("payer".into()),
            })
        }

        async fn supported(&self) -> Result<SupportedResponse, Infallible> {
            Ok(SupportedResponse::default())
        }
    }

    fn handler() -> impl Service<Request, Response = Response, Error = Infallible, Future: Send + 'static>
    + Clone
    + Send
    + Sync
    + 'static {
        tower::service_fn(|_req: Request| async {
            Ok::<_, Infallible>(Response::new(Body::from("ok")))
        })
    }

    fn payment(network: &str) -> String {
        encode_x_payment(&PaymentPayload {
            x402_version: X402Version1,
            scheme: "exact".into(),
            network: network.into(),
            payload: serde_json::json!({ "transaction": "AQID" }),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn static_route_issues_requirements() {
        let middleware = X402Middleware::new(
            Arc::new(RecordingFacilitator::default()),
            Arc::new(NetworkTable::default()),
        )
        .with_base_url(Url::parse("https://shop.example").unwrap());
        let service = middleware
            .with_route(SolanaPriceTag::new("solana", "$2"))
            .with_description("Two dollars")
            .layer(handler());

        let req = http::Request::builder()
            .uri("/item?id=3")
            .body(Body::empty())
            .unwrap();
        let response = service.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        let accepts = &body["accepts"][0];
        assert_eq!(accepts["network"], "solana");
        assert_eq!(accepts["maxAmountRequired"], "2000000");
        assert_eq!(accepts["resource"], "https://shop.example/item?id=3");
        assert_eq!(accepts["description"], "Two dollars");
    }

    #[tokio::test]
    async fn dynamic_route_prices_each_request() {
        let facilitator = Arc::new(RecordingFacilitator::default());
        let service = X402Middleware::new(Arc::clone(&facilitator), Arc::new(NetworkTable::default()))
            .with_dynamic_route(|headers: &HeaderMap, _uri: &Uri| {
                let network = s402_svm::SolanaNetwork::from_hint(
                    headers.get("X-Network").and_then(|v| v.to_str().ok()),
                );
                async move { SolanaPriceTag::for_network(network, "$0.01") }
            })
            .with_resource(Url::parse("https://shop.example/gatya").unwrap())
            .layer(handler());

        let req = http::Request::builder()
            .uri("/gatya")
            .header("X-Network", "mainnet")
            .header(X_PAYMENT_HEADER, payment("solana"))
            .body(Body::empty())
            .unwrap();
        let response = service.clone().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(X_PAYMENT_RESPONSE_HEADER));

        let req = http::Request::builder()
            .uri("/gatya")
            .header(X_PAYMENT_HEADER, payment("solana-devnet"))
            .body(Body::empty())
            .unwrap();
        let response = service.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        assert_eq!(
            *facilitator.seen.lock().unwrap(),
            [
                "solana https://shop.example/gatya ",
                "solana-devnet https://shop.example/gatya ",
            ]
        );
    }

    #[tokio::test]
    async fn unknown_network_is_a_server_error() {
        let service = X402Middleware::new(
            Arc::new(RecordingFacilitator::default()),
            Arc::new(NetworkTable::default()),
        )
        .with_route(SolanaPriceTag::new("ethereum", "$1"))
        .layer(handler());

        let req = http::Request::builder()
            .uri("/item")
            .body(Body::empty())
            .unwrap();
        let response = service.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
