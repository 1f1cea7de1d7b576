//! Solana "exact" payment scheme.
//!
//! A payment is a client-signed transaction containing an SPL Token
//! `TransferChecked` instruction that moves at least the required amount of
//! the network's mint into the recipient's associated token account.
//!
//! The pipeline is split in stages, each in its own module:
//!
//! - [`requirements`] - builds the requirements a 402 response advertises
//! - [`codec`] - parses the untrusted base64 transaction envelope
//! - [`verify`] - structural checks producing a [`VerifiedPayment`]
//! - [`settle`] - submits a [`VerifiedPayment`] and classifies node errors
//! - [`facilitator`] - the stages above behind the `Facilitator` trait

use serde::{Deserialize, Serialize};
use solana_pubkey::{Pubkey, pubkey};

use crate::networks::SolanaNetwork;

pub mod error;
pub use error::*;

pub mod requirements;
pub use requirements::SolanaPriceTag;

#[cfg(feature = "facilitator")]
pub mod codec;
#[cfg(feature = "facilitator")]
pub mod facilitator;
#[cfg(feature = "facilitator")]
pub mod settle;
#[cfg(feature = "facilitator")]
pub mod verify;

#[cfg(all(test, feature = "facilitator"))]
mod fixtures;

#[cfg(feature = "facilitator")]
pub use facilitator::SolanaExactFacilitator;
#[cfg(feature = "facilitator")]
pub use settle::{RpcSender, SubmitPolicy, TransactionSender};
#[cfg(feature = "facilitator")]
pub use verify::VerifiedPayment;

/// Associated Token Account program public key.
pub const ATA_PROGRAM_PUBKEY: Pubkey = pubkey!("ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL");

/// Discriminator byte of the SPL Token `TransferChecked` instruction.
pub const TRANSFER_CHECKED_DISCRIMINATOR: u8 = 12;

/// Solana exact payment payload containing a serialized transaction.
///
/// A missing `transaction` field reads as empty so that it is reported as
/// an invalid payload rather than a malformed request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExactSolanaPayload {
    /// Base64-encoded serialized Solana transaction.
    #[serde(default)]
    pub transaction: String,
}

/// Scheme-specific `extra` carried by requirements and supported kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportedPaymentKindExtra {
    /// The account expected to pay transaction fees.
    pub fee_payer: String,
    /// Cluster behind a shared wire name, such as testnet under `solana-devnet`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster: Option<SolanaNetwork>,
}
