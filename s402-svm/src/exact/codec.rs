//! Decoding of client-supplied Solana transactions.
//!
//! The input is untrusted. Decoding is attempted as a versioned transaction
//! first and as a legacy transaction second; every failure collapses into the
//! opaque [`DecodeError`]. No semantic checks happen here, and every accessor
//! is bounds-checked so malformed indices surface as `None`.
//!
//! Input must fit a single packet and be consumed exactly; padding after a
//! valid transaction is a decode failure.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as b64;
use bincode::Options;
use serde::de::DeserializeOwned;
use solana_message::compiled_instruction::CompiledInstruction;
use solana_pubkey::Pubkey;
use solana_signature::Signature;
use solana_transaction::Transaction;
use solana_transaction::versioned::VersionedTransaction;

use super::DecodeError;

/// Largest serialized transaction a cluster accepts: the IPv6 minimum MTU
/// less IP and UDP headers.
pub const PACKET_DATA_SIZE: usize = 1280 - 40 - 8;

/// Fixed-int bincode, limited to one packet, rejecting trailing bytes.
fn deserialize<T: DeserializeOwned>(bytes: &[u8]) -> bincode::Result<T> {
    bincode::options()
        .with_limit(PACKET_DATA_SIZE as u64)
        .with_fixint_encoding()
        .reject_trailing_bytes()
        .deserialize(bytes)
}

/// A structurally parsed transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedTransaction {
    inner: VersionedTransaction,
}

impl DecodedTransaction {
    /// Decodes a base64 transaction as carried in an exact payload.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] if the input is not base64 or not a transaction.
    #[cfg_attr(not(feature = "telemetry"), allow(unused_variables))] // e is needed for tracing only
    pub fn from_base64(encoded: &str) -> Result<Self, DecodeError> {
        let bytes = b64.decode(encoded.trim()).map_err(|e| {
            #[cfg(feature = "telemetry")]
            tracing::debug!(error = %e, "transaction is not valid base64");
            DecodeError
        })?;
        Self::from_bytes(&bytes)
    }

    /// Decodes wire bytes, trying the versioned format before the legacy one.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] if neither format matches.
    #[cfg_attr(not(feature = "telemetry"), allow(unused_variables))] // e is needed for tracing only
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        if let Ok(inner) = deserialize::<VersionedTransaction>(bytes) {
            return Ok(Self { inner });
        }
        match deserialize::<Transaction>(bytes) {
            Ok(legacy) => Ok(Self {
                inner: VersionedTransaction::from(legacy),
            }),
            Err(e) => {
                #[cfg(feature = "telemetry")]
                tracing::debug!(error = %e, len = bytes.len(), "transaction bytes match no known format");
                Err(DecodeError)
            }
        }
    }

    /// Signature slots, in signer order.
    #[must_use]
    pub fn signatures(&self) -> &[Signature] {
        &self.inner.signatures
    }

    /// Accounts listed directly in the message.
    #[must_use]
    pub fn account_keys(&self) -> &[Pubkey] {
        self.inner.message.static_account_keys()
    }

    /// Compiled instructions, in execution order.
    #[must_use]
    pub fn instructions(&self) -> &[CompiledInstruction] {
        self.inner.message.instructions()
    }

    /// Resolves an account index, `None` when out of range.
    ///
    /// Accounts loaded through address lookup tables are not resolvable
    /// without a ledger round trip and are treated as out of range.
    #[must_use]
    pub fn account(&self, index: u8) -> Option<&Pubkey> {
        self.account_keys().get(usize::from(index))
    }

    /// The program an instruction invokes, `None` when its index is out of range.
    #[must_use]
    pub fn program_id(&self, instruction: &CompiledInstruction) -> Option<&Pubkey> {
        self.account(instruction.program_id_index)
    }

    /// Borrows the underlying transaction.
    #[must_use]
    pub const fn transaction(&self) -> &VersionedTransaction {
        &self.inner
    }

    /// Unwraps the underlying transaction.
    #[must_use]
    pub fn into_inner(self) -> VersionedTransaction {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_keypair::Keypair;
    use solana_message::{Message, MessageHeader, VersionedMessage};
    use solana_signer::Signer;

    fn sample_message(payer: &Pubkey) -> Message {
        Message {
            header: MessageHeader {
                num_required_signatures: 1,
                num_readonly_signed_accounts: 0,
                num_readonly_unsigned_accounts: 1,
            },
            account_keys: vec![*payer, Pubkey::new_from_array([7; 32])],
            recent_blockhash: Default::default(),
            instructions: vec![CompiledInstruction {
                program_id_index: 1,
                accounts: vec![0],
                data: vec![1, 2, 3],
            }],
        }
    }

    #[test]
    fn decodes_versioned_encoding() {
        let kp = Keypair::new();
        let message = sample_message(&kp.pubkey());
        let tx = VersionedTransaction {
            signatures: vec![kp.sign_message(&message.serialize())],
            message: VersionedMessage::Legacy(message),
        };
        let encoded = b64.encode(bincode::serialize(&tx).unwrap());

        let decoded = DecodedTransaction::from_base64(&encoded).unwrap();
        assert_eq!(decoded.signatures().len(), 1);
        assert_eq!(decoded.account_keys()[0], kp.pubkey());
        assert_eq!(decoded.instructions()[0].data, vec![1, 2, 3]);
        assert_eq!(decoded.transaction(), &tx);
    }

    #[test]
    fn decodes_legacy_encoding() {
        let kp = Keypair::new();
        let message = sample_message(&kp.pubkey());
        let legacy = Transaction {
            signatures: vec![kp.sign_message(&message.serialize())],
            message,
        };
        let decoded =
            DecodedTransaction::from_bytes(&bincode::serialize(&legacy).unwrap()).unwrap();
        assert_eq!(decoded.account_keys().len(), 2);
        assert_eq!(decoded.into_inner(), VersionedTransaction::from(legacy));
    }

    #[test]
    fn accessors_are_bounds_checked() {
        let kp = Keypair::new();
        let mut message = sample_message(&kp.pubkey());
        message.instructions[0].program_id_index = 9;
        let tx = VersionedTransaction {
            signatures: vec![Signature::default()],
            message: VersionedMessage::Legacy(message),
        };
        let decoded = DecodedTransaction::from_bytes(&bincode::serialize(&tx).unwrap()).unwrap();
        assert!(decoded.program_id(&decoded.instructions()[0]).is_none());
        assert!(decoded.account(200).is_none());
        assert_eq!(decoded.account(1), Some(&Pubkey::new_from_array([7; 32])));
    }

    #[test]
    fn rejects_garbage_opaquely() {
        assert_eq!(DecodedTransaction::from_base64("%%%"), Err(DecodeError));
        assert_eq!(
            DecodedTransaction::from_base64(&b64.encode([1u8, 2, 3])),
            Err(DecodeError)
        );
        assert_eq!(DecodedTransaction::from_bytes(&[]), Err(DecodeError));
    }

    #[test]
    fn rejects_trailing_bytes() {
        let kp = Keypair::new();
        let message = sample_message(&kp.pubkey());
        let tx = VersionedTransaction {
            signatures: vec![kp.sign_message(&message.serialize())],
            message: VersionedMessage::Legacy(message),
        };
        let mut bytes = bincode::serialize(&tx).unwrap();
        assert!(DecodedTransaction::from_bytes(&bytes).is_ok());

        bytes.push(0);
        assert_eq!(DecodedTransaction::from_bytes(&bytes), Err(DecodeError));
        assert_eq!(
            DecodedTransaction::from_base64(&b64.encode(&bytes)),
            Err(DecodeError)
        );
    }

    #[test]
    fn rejects_transactions_larger_than_a_packet() {
        let kp = Keypair::new();
        let mut message = sample_message(&kp.pubkey());
        message
            .account_keys
            .extend((0..40u8).map(|i| Pubkey::new_from_array([i; 32])));
        let tx = VersionedTransaction {
            signatures: vec![kp.sign_message(&message.serialize())],
            message: VersionedMessage::Legacy(message),
        };
        let bytes = bincode::serialize(&tx).unwrap();
        assert!(bytes.len() > PACKET_DATA_SIZE);
        assert_eq!(DecodedTransaction::from_bytes(&bytes), Err(DecodeError));
    }
}
