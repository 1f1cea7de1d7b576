//! Settlement of verified payments.
//!
//! A [`VerifiedPayment`] is submitted once through a [`TransactionSender`].
//! Node-side retries are bounded by the submission config; nothing here
//! loops. A submission that reached the node is not rolled back if the
//! caller goes away afterwards.

use async_trait::async_trait;
use regex::Regex;
use s402::proto::{ErrorReason, SettleResponse};
use solana_client::client_error::ClientError;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_config::RpcSendTransactionConfig;
use solana_commitment_config::CommitmentConfig;
use solana_signature::Signature;
use solana_transaction::versioned::VersionedTransaction;
use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter};
use std::sync::{Arc, LazyLock};

use super::verify::VerifiedPayment;
use crate::networks::{NetworkTable, SolanaNetwork};

/// Retries the node performs on its own while forwarding a submission.
pub const MAX_SEND_RETRIES: usize = 3;

/// Submission failed; carries the node's error text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct SendError(pub String);

impl From<ClientError> for SendError {
    fn from(error: ClientError) -> Self {
        Self(error.to_string())
    }
}

/// Submits signed transactions to a cluster.
#[async_trait]
pub trait TransactionSender: Send + Sync {
    /// Submits `transaction` to `network` and returns its signature.
    async fn send(
        &self,
        network: SolanaNetwork,
        transaction: &VersionedTransaction,
    ) -> Result<Signature, SendError>;
}

#[async_trait]
impl<T: TransactionSender + ?Sized> TransactionSender for Arc<T> {
    async fn send(
        &self,
        network: SolanaNetwork,
        transaction: &VersionedTransaction,
    ) -> Result<Signature, SendError> {
        (**self).send(network, transaction).await
    }
}

/// Whether the node simulates a transaction before forwarding it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SubmitPolicy {
    /// Node-side simulation; failing transactions are rejected before broadcast.
    #[default]
    Preflight,
    /// Direct broadcast without simulation.
    SkipPreflight,
}

impl SubmitPolicy {
    /// `Preflight` when `enabled`, else `SkipPreflight`.
    #[must_use]
    pub const fn from_preflight(enabled: bool) -> Self {
        if enabled {
            Self::Preflight
        } else {
            Self::SkipPreflight
        }
    }
}

/// [`TransactionSender`] backed by one JSON-RPC client per cluster.
pub struct RpcSender {
    clients: BTreeMap<SolanaNetwork, Arc<RpcClient>>,
    policy: SubmitPolicy,
}

impl Debug for RpcSender {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcSender")
            .field("networks", &self.clients.keys().collect::<Vec<_>>())
            .field("policy", &self.policy)
            .finish()
    }
}

impl RpcSender {
    /// Creates a client for every cluster in `table`, at `confirmed` commitment.
    #[must_use]
    pub fn new(table: &NetworkTable, policy: SubmitPolicy) -> Self {
        let clients = table
            .iter()
            .map(|(network, config)| {
                let client = RpcClient::new_with_commitment(
                    config.rpc_url.clone(),
                    CommitmentConfig::confirmed(),
                );
                (network, Arc::new(client))
            })
            .collect();
        Self { clients, policy }
    }

    /// The submission policy in effect.
    #[must_use]
    pub const fn policy(&self) -> SubmitPolicy {
        self.policy
    }
}

#[async_trait]
impl TransactionSender for RpcSender {
    async fn send(
        &self,
        network: SolanaNetwork,
        transaction: &VersionedTransaction,
    ) -> Result<Signature, SendError> {
        let client = self
            .clients
            .get(&network)
            .ok_or_else(|| SendError(format!("No RPC client for {network}")))?;
        let config = RpcSendTransactionConfig {
            skip_preflight: self.policy == SubmitPolicy::SkipPreflight,
            max_retries: Some(MAX_SEND_RETRIES),
            ..RpcSendTransactionConfig::default()
        };
        let signature = client
            .send_transaction_with_config(transaction, config)
            .await?;
        Ok(signature)
    }
}

/// Node error fragments and the reason each maps to, matched in order.
///
/// Matching runs on free-form node text and is therefore advisory. SPL Token
/// reports insufficient funds as custom error `0x1`; `0x10` and up are other
/// errors.
static SETTLE_ERROR_PATTERNS: LazyLock<[(Regex, ErrorReason); 6]> = LazyLock::new(|| {
    let pattern = |re: &str| Regex::new(re).expect("valid settle error pattern");
    [
        (pattern("already been processed"), ErrorReason::InvalidTransactionState),
        (pattern("AlreadyProcessed"), ErrorReason::InvalidTransactionState),
        (pattern("insufficient funds"), ErrorReason::InsufficientFunds),
        (pattern(r"custom program error: 0x1\b"), ErrorReason::InsufficientFunds),
        (
            pattern("Blockhash not found"),
            ErrorReason::SettleExactSvmBlockHeightExceeded,
        ),
        (
            pattern("BlockhashNotFound"),
            ErrorReason::SettleExactSvmBlockHeightExceeded,
        ),
    ]
});

/// Maps node error text to a wire reason.
#[must_use]
pub fn classify_send_error(message: &str) -> ErrorReason {
    SETTLE_ERROR_PATTERNS
        .iter()
        .find(|(pattern, _)| pattern.is_match(message))
        .map_or(ErrorReason::UnexpectedSettleError, |(_, reason)| *reason)
}

/// Submits a verified payment and reports the outcome.
pub async fn settle_payment(
    sender: &dyn TransactionSender,
    payment: VerifiedPayment,
) -> SettleResponse {
    let network = payment.wire_network().to_owned();
    match sender.send(payment.network(), payment.transaction()).await {
        Ok(signature) => {
            #[cfg(feature = "telemetry")]
            tracing::info!(%signature, network = %network, payer = %payment.payer(), "payment settled");
            SettleResponse::Success {
                transaction: signature.to_string(),
                network,
                payer: Some(payment.payer().to_string()),
            }
        }
        Err(error) => {
            let reason = classify_send_error(&error.0);
            #[cfg(feature = "telemetry")]
            tracing::warn!(error = %error, reason = %reason, network = %network, "settlement failed");
            SettleResponse::Error {
                reason,
                network,
                payer: Some(payment.payer().to_string()),
            }
        }
    }
}
