//! x402 Solana facilitator server.
//!
//! Serves the facilitator API (`/verify`, `/settle`, `/supported`, `/health`)
//! over an in-process [`s402_svm::exact::SolanaExactFacilitator`], plus a
//! paywalled demo resource at `/api/gatya`.
//!
//! # Modules
//!
//! - [`config`] - TOML configuration with environment variable expansion
//! - [`demo`] - The paid gatya resource
//! - [`error`] - Facilitator endpoint error types
//! - [`handlers`] - Axum route handlers and router builder
//! - [`util`] - Graceful shutdown

pub mod config;
pub mod demo;
pub mod error;
pub mod handlers;
pub mod util;

pub use handlers::facilitator_router;
