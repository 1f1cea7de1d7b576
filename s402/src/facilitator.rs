//! Core trait defining the verification and settlement interface for x402 facilitators.
//!
//! Implementors validate incoming payment payloads against payment
//! requirements ([`Facilitator::verify`]) and submit the transfer to the
//! ledger ([`Facilitator::settle`]). The same trait covers an in-process
//! facilitator and an HTTP client talking to a remote one.

use std::fmt::{Debug, Display};
use std::sync::Arc;

use crate::proto;

/// Asynchronous interface for x402 payment facilitators.
///
/// A business-level rejection is never an `Err`: it is reported as
/// [`proto::VerifyResponse::Invalid`] or [`proto::SettleResponse::Error`].
/// `Err` is reserved for failures to obtain an answer at all, such as a
/// remote facilitator being unreachable.
pub trait Facilitator {
    /// The error type returned by this facilitator.
    type Error: Debug + Display;

    /// Verifies a proposed payment payload against its requirements.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if no verdict could be obtained.
    fn verify(
        &self,
        request: &proto::VerifyRequest,
    ) -> impl Future<Output = Result<proto::VerifyResponse, Self::Error>> + Send;

    /// Settles a payment on-chain.
    ///
    /// Implementations re-validate the payment before broadcasting it.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if no settlement outcome could be obtained.
    fn settle(
        &self,
        request: &proto::SettleRequest,
    ) -> impl Future<Output = Result<proto::SettleResponse, Self::Error>> + Send;

    /// Lists the payment kinds this facilitator accepts.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the list could not be obtained.
    fn supported(
        &self,
    ) -> impl Future<Output = Result<proto::SupportedResponse, Self::Error>> + Send;
}

impl<T: Facilitator + Sync + Send> Facilitator for Arc<T> {
    type Error = T::Error;

    fn verify(
        &self,
        request: &proto::VerifyRequest,
    ) -> impl Future<Output = Result<proto::VerifyResponse, Self::Error>> + Send {
        self.as_ref().verify(request)
    }

    fn settle(
        &self,
        request: &proto::SettleRequest,
    ) -> impl Future<Output = Result<proto::SettleResponse, Self::Error>> + Send {
        self.as_ref().settle(request)
    }

    fn supported(
        &self,
    ) -> impl Future<Output = Result<proto::SupportedResponse, Self::Error>> + Send {
        self.as_ref().supported()
    }
}
