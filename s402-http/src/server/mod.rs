//! Tower middleware for enforcing [x402](https://www.x402.org) payments on protected routes.
//!
//! Every request to a protected route is priced by a [`RouteSource`] and
//! answered with `402 Payment Required` unless it carries an `X-PAYMENT`
//! header that the configured facilitator verifies and settles. The wrapped
//! handler runs only after settlement succeeded, and its response gets the
//! settlement receipt in `X-PAYMENT-RESPONSE`.
//!
//! ## Configuration Notes
//!
//! - **[`X402Middleware::with_route`]** prices a route statically.
//! - **[`X402Middleware::with_dynamic_route`]** prices each request through a callback.
//! - **[`X402Middleware::with_base_url`]** sets the origin used to build resource URLs.
//!   If not set, the request's `Host` header is used.
//! - **[`X402LayerBuilder::with_description`]** and **[`X402LayerBuilder::with_mime_type`]**
//!   fill in what the price tag leaves unset.
//! - **[`X402LayerBuilder::with_resource`]** pins the resource URL.
//!
//! For talking to a remote facilitator, see [`facilitator_client::FacilitatorClient`].

pub mod error;
pub mod facilitator_client;
pub mod layer;
pub mod paygate;
pub mod route_source;

pub use error::PaygateError;
pub use facilitator_client::FacilitatorClient;
pub use layer::{X402LayerBuilder, X402Middleware, X402MiddlewareService};
pub use paygate::Paygate;
pub use route_source::{DynamicRoute, RouteSource, StaticRoute};
