//! Route pricing for the x402 payment gate.
//!
//! Abstracts over static and dynamic pricing strategies via the
//! [`RouteSource`] trait.

use http::{HeaderMap, Uri};
use s402_svm::exact::SolanaPriceTag;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Trait for types that can price a request.
///
/// Implementations are infallible: a misconfigured tag surfaces later, when
/// requirements are built from it.
pub trait RouteSource: Clone + Send + Sync + 'static {
    /// Resolves the price tag for the given request context.
    fn resolve(&self, headers: &HeaderMap, uri: &Uri)
    -> impl Future<Output = SolanaPriceTag> + Send;
}

/// Static route pricing - returns the same tag for every request.
#[derive(Clone, Debug)]
pub struct StaticRoute {
    tag: Arc<SolanaPriceTag>,
}

impl StaticRoute {
    /// Creates a static source from a price tag.
    #[must_use]
    pub fn new(tag: SolanaPriceTag) -> Self {
        Self { tag: Arc::new(tag) }
    }

    /// Returns the stored price tag.
    #[must_use]
    pub fn tag(&self) -> &SolanaPriceTag {
        &self.tag
    }
}

impl RouteSource for StaticRoute {
    async fn resolve(&self, _headers: &HeaderMap, _uri: &Uri) -> SolanaPriceTag {
        (*self.tag).clone()
    }
}

/// Internal type alias for the boxed dynamic pricing callback.
///
/// Uses higher-ranked trait bounds (HRTB) to express that the callback
/// works with any lifetime of the input references.
type BoxedDynamicRouteCallback = dyn for<'a> Fn(
        &'a HeaderMap,
        &'a Uri,
    ) -> Pin<Box<dyn Future<Output = SolanaPriceTag> + Send + 'a>>
    + Send
    + Sync;

/// Dynamic route pricing - computes the tag per request via callback.
///
/// Lets a route pick its network or price from request headers or the URI.
#[derive(Clone)]
pub struct DynamicRoute {
    callback: Arc<BoxedDynamicRouteCallback>,
}

impl std::fmt::Debug for DynamicRoute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamicRoute")
            .field("callback", &"<callback>")
            .finish()
    }
}

impl DynamicRoute {
    /// Creates a dynamic source from an async closure.
    pub fn new<F, Fut>(callback: F) -> Self
    where
        F: Fn(&HeaderMap, &Uri) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = SolanaPriceTag> + Send + 'static,
    {
        Self {
            callback: Arc::new(move |headers, uri| Box::pin(callback(headers, uri))),
        }
    }
}

impl RouteSource for DynamicRoute {
    async fn resolve(&self, headers: &HeaderMap, uri: &Uri) -> SolanaPriceTag {
        (self.callback)(headers, uri).await
    }
}
