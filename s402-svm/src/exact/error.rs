//! Error types for the Solana "exact" payment scheme.
//!
//! Every verification failure maps onto one wire-level
//! [`ErrorReason`](s402::proto::ErrorReason). The detailed variant is kept
//! for logs only and never sent to clients.

use s402::amount::MoneyAmountParseError;
use s402::proto::ErrorReason;

/// Payment requirements could not be built from the route configuration.
#[derive(Debug, thiserror::Error)]
pub enum RequirementsError {
    /// The wire network name is not one this deployment serves.
    #[error("Unknown network: {0}")]
    UnknownNetwork(String),
    /// The price string could not be converted to token units.
    #[error("Invalid price {price:?}: {source}")]
    InvalidPrice {
        /// The configured price.
        price: String,
        /// Why it was rejected.
        #[source]
        source: MoneyAmountParseError,
    },
    /// The recipient is not a valid Solana address.
    #[error("Invalid recipient address: {0}")]
    InvalidRecipient(String),
}

/// The transaction envelope could not be parsed.
///
/// Intentionally carries no detail: the input is untrusted and callers
/// must not learn which format was tried or why it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Can not decode transaction")]
pub struct DecodeError;

/// Reasons a payment fails structural verification.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerifyError {
    /// The network is not a supported wire name.
    #[error("Unsupported network: {0}")]
    UnknownNetwork(String),
    /// Payload and requirements name different networks.
    #[error("Payload network {payload} does not match required network {required}")]
    NetworkMismatch {
        /// Network declared by the payload.
        payload: String,
        /// Network declared by the requirements.
        required: String,
    },
    /// Payload and requirements name different schemes, or not "exact".
    #[error("Unsupported or mismatched scheme: {0}")]
    SchemeMismatch(String),
    /// The scheme payload is not shaped like an exact Solana payload.
    #[error("Malformed scheme payload")]
    MalformedPayload,
    /// The transaction field is absent or empty.
    #[error("Missing transaction")]
    MissingTransaction,
    /// The transaction could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),
    /// No signature slot carries a real signature.
    #[error("Transaction carries no signature")]
    Unsigned,
    /// No SPL Token `TransferChecked` instruction was found.
    #[error("No TransferChecked instruction in transaction")]
    NoTransferInstruction,
    /// The transfer instruction references too few or out-of-range accounts.
    #[error("TransferChecked instruction has an invalid account list")]
    AccountShape,
    /// The transfer instruction data could not be unpacked.
    #[error("Invalid token instruction data")]
    InvalidTokenInstruction,
    /// The transfer moves a different token than the network's asset.
    #[error("Transfer mint does not match the network asset")]
    MintMismatch,
    /// `payTo` is not a valid address.
    #[error("Invalid payTo address: {0}")]
    InvalidRecipient(String),
    /// The transfer does not credit the recipient's associated token account.
    #[error("Transfer destination is not the recipient's token account")]
    DestinationMismatch,
    /// `maxAmountRequired` is not a non-negative integer.
    #[error("Invalid required amount: {0}")]
    InvalidRequiredAmount(String),
    /// The transfer moves less than required.
    #[error("Transfer amount {amount} is below required {required}")]
    InsufficientAmount {
        /// Amount moved by the transaction.
        amount: u64,
        /// Amount demanded by the requirements.
        required: String,
    },
}

impl VerifyError {
    /// The wire-level reason reported to clients.
    #[must_use]
    pub const fn reason(&self) -> ErrorReason {
        match self {
            Self::UnknownNetwork(_) | Self::NetworkMismatch { .. } => ErrorReason::InvalidNetwork,
            Self::SchemeMismatch(_) => ErrorReason::InvalidScheme,
            Self::MalformedPayload
            | Self::MissingTransaction
            | Self::Decode(_)
            | Self::Unsigned
            | Self::NoTransferInstruction
            | Self::AccountShape
            | Self::InvalidTokenInstruction
            | Self::MintMismatch
            | Self::InvalidRecipient(_)
            | Self::DestinationMismatch
            | Self::InvalidRequiredAmount(_)
            | Self::InsufficientAmount { .. } => ErrorReason::InvalidPayload,
        }
    }
}
