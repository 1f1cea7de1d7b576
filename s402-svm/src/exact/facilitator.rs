//! In-process facilitator for the Solana exact scheme.
//!
//! Wraps [`verify_payment`] and [`settle_payment`] behind the
//! [`Facilitator`] trait. Business failures come back as tagged responses,
//! so the error type is [`Infallible`].

use s402::facilitator::Facilitator;
use s402::proto::v1::{EXACT_SCHEME, X402Version1};
use s402::proto::{
    SettleRequest, SettleResponse, SupportedPaymentKind, SupportedResponse, VerifyRequest,
    VerifyResponse,
};
use std::convert::Infallible;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use super::SupportedPaymentKindExtra;
use super::settle::{TransactionSender, settle_payment};
use super::verify::verify_payment;
use crate::networks::{NetworkTable, WIRE_SOLANA, WIRE_SOLANA_DEVNET};

/// Verifies and settles exact Solana payments against a [`NetworkTable`].
#[derive(Clone)]
pub struct SolanaExactFacilitator {
    table: Arc<NetworkTable>,
    sender: Arc<dyn TransactionSender>,
}

impl Debug for SolanaExactFacilitator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SolanaExactFacilitator")
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}

impl SolanaExactFacilitator {
    /// Creates a facilitator submitting through `sender`.
    pub fn new(table: Arc<NetworkTable>, sender: Arc<dyn TransactionSender>) -> Self {
        Self { table, sender }
    }

    /// The network table this facilitator verifies against.
    #[must_use]
    pub fn table(&self) -> &NetworkTable {
        &self.table
    }
}

impl Facilitator for SolanaExactFacilitator {
    type Error = Infallible;

    async fn verify(&self, request: &VerifyRequest) -> Result<VerifyResponse, Self::Error> {
        match verify_payment(&self.table, request) {
            Ok(payment) => Ok(VerifyResponse::valid(payment.payer().to_string())),
            Err(error) => {
                #[cfg(feature = "telemetry")]
                tracing::debug!(%error, reason = %error.reason(), "payment rejected");
                Ok(VerifyResponse::invalid(error.reason()))
            }
        }
    }

    async fn settle(&self, request: &SettleRequest) -> Result<SettleResponse, Self::Error> {
        match verify_payment(&self.table, request.as_verify_request()) {
            Ok(payment) => Ok(settle_payment(self.sender.as_ref(), payment).await),
            Err(error) => {
                #[cfg(feature = "telemetry")]
                tracing::debug!(%error, reason = %error.reason(), "settlement refused");
                Ok(SettleResponse::error(
                    error.reason(),
                    request.payment_requirements().network.clone(),
                ))
            }
        }
    }

    async fn supported(&self) -> Result<SupportedResponse, Self::Error> {
        let extra = serde_json::to_value(SupportedPaymentKindExtra {
            fee_payer: self.table.recipient().to_string(),
            cluster: None,
        })
        .ok();
        let kinds = [WIRE_SOLANA_DEVNET, WIRE_SOLANA]
            .into_iter()
            .map(|network| SupportedPaymentKind {
                x402_version: X402Version1::VALUE,
                scheme: EXACT_SCHEME.to_owned(),
                network: network.to_owned(),
                extra: extra.clone(),
            })
            .collect();
        Ok(SupportedResponse { kinds })
    }
}
