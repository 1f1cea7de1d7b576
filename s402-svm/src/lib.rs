#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Solana chain support for the x402 payment protocol.
//!
//! Implements the "exact" scheme: the buyer signs a transaction containing an
//! SPL Token `TransferChecked` to the seller's associated token account, and
//! the facilitator checks it structurally before submitting it as-is.
//!
//! # Architecture
//!
//! - [`networks`] - clusters, wire names and the per-deployment [`NetworkTable`]
//! - [`exact`] - requirements, decoding, verification and settlement
//!
//! # Feature Flags
//!
//! - `facilitator` - decoding, verification and RPC submission (default)
//! - `telemetry` - `tracing` events for rejected and settled payments
//!
//! # Example
//!
//! ```
//! use s402_svm::{NetworkTable, SolanaNetwork};
//! use s402_svm::exact::SolanaPriceTag;
//!
//! let table = NetworkTable::default();
//! let tag = SolanaPriceTag::for_network(SolanaNetwork::Devnet, "$0.01");
//! let requirements = tag.requirements(&table, "https://example.com/paid").unwrap();
//! assert_eq!(requirements.network, "solana-devnet");
//! assert_eq!(requirements.max_amount_required, "10000");
//! ```

pub mod exact;
pub mod networks;

pub use networks::*;
