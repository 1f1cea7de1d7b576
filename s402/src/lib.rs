#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Core types for the x402 payment protocol.
//!
//! This crate provides the chain-agnostic pieces of the x402 protocol: the
//! version 1 wire format, the closed set of failure reasons, price parsing,
//! and the [`facilitator::Facilitator`] trait. Solana specifics live in
//! `s402-svm`, HTTP transport in `s402-http`.
//!
//! # Overview
//!
//! When a client requests a paid resource without paying, the server answers
//! `402 Payment Required` with the payment requirements. The client builds and
//! signs a transfer, resubmits it, and a facilitator verifies and settles it
//! before the resource is served.
//!
//! # Modules
//!
//! - [`amount`] - Human-readable price parsing and token unit amounts
//! - [`facilitator`] - Core trait for payment verification and settlement
//! - [`proto`] - Wire format types and failure reasons

pub mod amount;
pub mod facilitator;
pub mod proto;
