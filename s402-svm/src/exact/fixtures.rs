//! Signed transfer transactions for scheme tests.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as b64;
use s402::proto::VerifyRequest;
use s402::proto::v1::{PaymentPayload, X402Version1};
use solana_keypair::Keypair;
use solana_message::compiled_instruction::CompiledInstruction;
use solana_message::{Message, MessageHeader, VersionedMessage};
use solana_pubkey::Pubkey;
use solana_signature::Signature;
use solana_signer::Signer;
use solana_transaction::versioned::VersionedTransaction;
use std::sync::Mutex;

use super::TRANSFER_CHECKED_DISCRIMINATOR;
use super::requirements::SolanaPriceTag;
use super::settle::{SendError, TransactionSender};
use super::verify::associated_token_account;
use crate::networks::{NetworkTable, SolanaNetwork, USDC_DECIMALS};

pub const RESOURCE: &str = "https://api.example.com/api/gatya";

/// `TransferChecked` instruction data.
pub fn transfer_checked_data(amount: u64) -> Vec<u8> {
    let mut data = vec![TRANSFER_CHECKED_DISCRIMINATOR];
    data.extend_from_slice(&amount.to_le_bytes());
    data.push(USDC_DECIMALS);
    data
}

/// A token transfer signed by its own authority.
pub struct Transfer {
    pub authority: Keypair,
    pub source: Pubkey,
    pub mint: Pubkey,
    pub destination: Pubkey,
    pub amount: u64,
}

impl Transfer {
    /// Pays `amount` of the network's mint to the default recipient.
    pub fn to_recipient(network: SolanaNetwork, amount: u64) -> Self {
        let table = NetworkTable::default();
        let mint = table.get(network).mint;
        Self {
            authority: Keypair::new(),
            source: Pubkey::new_from_array([3; 32]),
            mint,
            destination: associated_token_account(table.recipient(), &mint),
            amount,
        }
    }

    /// Keys: authority, source, destination, mint, token program.
    pub fn message(&self) -> Message {
        Message {
            header: MessageHeader {
                num_required_signatures: 1,
                num_readonly_signed_accounts: 0,
                num_readonly_unsigned_accounts: 2,
            },
            account_keys: vec![
                self.authority.pubkey(),
                self.source,
                self.destination,
                self.mint,
                spl_token::ID,
            ],
            recent_blockhash: Default::default(),
            instructions: vec![CompiledInstruction {
                program_id_index: 4,
                accounts: vec![1, 3, 2, 0],
                data: transfer_checked_data(self.amount),
            }],
        }
    }

    pub fn signed(&self) -> VersionedTransaction {
        sign(&self.authority, self.message())
    }

    pub fn encoded(&self) -> String {
        encode(&self.signed())
    }
}

pub fn sign(signer: &Keypair, message: Message) -> VersionedTransaction {
    VersionedTransaction {
        signatures: vec![signer.sign_message(&message.serialize())],
        message: VersionedMessage::Legacy(message),
    }
}

pub fn encode(tx: &VersionedTransaction) -> String {
    b64.encode(bincode::serialize(tx).unwrap())
}

/// A verify request paying the default recipient on `network`.
pub fn request(network: SolanaNetwork, required: &str, transaction: String) -> VerifyRequest {
    let mut requirements = SolanaPriceTag::for_network(network, "$0.01")
        .requirements(&NetworkTable::default(), RESOURCE)
        .unwrap();
    requirements.max_amount_required = required.to_owned();
    let payload = PaymentPayload {
        x402_version: X402Version1,
        scheme: requirements.scheme.clone(),
        network: requirements.network.clone(),
        payload: serde_json::json!({ "transaction": transaction }),
    };
    VerifyRequest::new(payload, requirements)
}

/// Returns a canned outcome and records the networks it was asked to send to.
pub struct MockSender {
    outcome: Result<Signature, SendError>,
    sent: Mutex<Vec<SolanaNetwork>>,
}

impl MockSender {
    pub fn ok(signature: Signature) -> Self {
        Self {
            outcome: Ok(signature),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            outcome: Err(SendError(message.to_owned())),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn sent(&self) -> Vec<SolanaNetwork> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl TransactionSender for MockSender {
    async fn send(
        &self,
        network: SolanaNetwork,
        _transaction: &VersionedTransaction,
    ) -> Result<Signature, SendError> {
        self.sent.lock().unwrap().push(network);
        self.outcome.clone()
    }
}
