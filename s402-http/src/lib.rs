#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! HTTP transport layer for the x402 payment protocol.
//!
//! Provides header encoding/decoding, constants, and (feature-gated)
//! server middleware plus a remote facilitator client.
//!
//! # Modules
//!
//! - [`constants`] - HTTP header names
//! - [`headers`] - Base64 JSON encoding for `X-PAYMENT` and `X-PAYMENT-RESPONSE`
//! - [`error`] - HTTP transport error types
//! - [`server`] - Tower payment gate and facilitator client (feature: `server`)

pub mod constants;
pub mod error;
pub mod headers;

#[cfg(feature = "server")]
pub mod server;
