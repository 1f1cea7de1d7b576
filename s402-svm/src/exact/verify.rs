//! Structural verification of exact Solana payments.
//!
//! Checks run in a fixed order and stop at the first failure, so the
//! reported reason is always that of the earliest failing stage:
//!
//! 1. network match, 2. scheme match, 3. payload shape, 4. decoding,
//! 5. signature presence, 6. transfer instruction, 7. account shape,
//! 8. mint, 9. destination, 10. amount.
//!
//! Nothing here touches the network. A successful run yields a
//! [`VerifiedPayment`], the only input settlement accepts.

use s402::amount::TokenAmount;
use s402::proto::VerifyRequest;
use s402::proto::v1::EXACT_SCHEME;
use serde::Deserialize;
use solana_message::compiled_instruction::CompiledInstruction;
use solana_pubkey::Pubkey;
use solana_signature::Signature;
use solana_transaction::versioned::VersionedTransaction;
use spl_token::instruction::TokenInstruction;
use std::str::FromStr;

use super::codec::DecodedTransaction;
use super::{ATA_PROGRAM_PUBKEY, ExactSolanaPayload, TRANSFER_CHECKED_DISCRIMINATOR, VerifyError};
use crate::networks::{NetworkTable, SolanaNetwork};

/// A payment that passed every structural check.
///
/// Fields are private to this module: the only way to obtain a value is
/// [`verify_payment`].
#[derive(Debug, Clone)]
pub struct VerifiedPayment {
    transaction: VersionedTransaction,
    network: SolanaNetwork,
    wire_network: String,
    payer: Pubkey,
    amount: u64,
}

impl VerifiedPayment {
    /// The client-signed transaction to broadcast.
    #[must_use]
    pub const fn transaction(&self) -> &VersionedTransaction {
        &self.transaction
    }

    /// The cluster the payment targets.
    #[must_use]
    pub const fn network(&self) -> SolanaNetwork {
        self.network
    }

    /// The wire network name the payment was made on.
    #[must_use]
    pub fn wire_network(&self) -> &str {
        &self.wire_network
    }

    /// The transfer authority.
    #[must_use]
    pub const fn payer(&self) -> &Pubkey {
        &self.payer
    }

    /// Token units moved by the transfer.
    #[must_use]
    pub const fn amount(&self) -> u64 {
        self.amount
    }
}

/// Accounts of a located `TransferChecked` instruction.
struct TransferAccounts<'a> {
    mint: Pubkey,
    destination: Pubkey,
    authority: Pubkey,
    data: &'a [u8],
}

/// Derives the associated token account of `owner` for `mint`.
#[must_use]
pub fn associated_token_account(owner: &Pubkey, mint: &Pubkey) -> Pubkey {
    let (ata, _) = Pubkey::find_program_address(
        &[owner.as_ref(), spl_token::ID.as_ref(), mint.as_ref()],
        &ATA_PROGRAM_PUBKEY,
    );
    ata
}

/// Runs every check against `request`.
///
/// # Errors
///
/// Returns the [`VerifyError`] of the first failing check.
pub fn verify_payment(
    table: &NetworkTable,
    request: &VerifyRequest,
) -> Result<VerifiedPayment, VerifyError> {
    let payload = &request.payment_payload;
    let requirements = &request.payment_requirements;

    let network = check_network(
        &payload.network,
        &requirements.network,
        requirements.extra.as_ref(),
    )?;
    check_scheme(&payload.scheme, &requirements.scheme)?;

    let exact = ExactSolanaPayload::deserialize(&payload.payload)
        .map_err(|_| VerifyError::MalformedPayload)?;
    if exact.transaction.trim().is_empty() {
        return Err(VerifyError::MissingTransaction);
    }

    let decoded = DecodedTransaction::from_base64(&exact.transaction)?;
    check_signatures(decoded.signatures())?;

    let transfer = locate_transfer(&decoded)?;
    let config = table.get(network);
    if transfer.mint != config.mint {
        return Err(VerifyError::MintMismatch);
    }

    let pay_to = Pubkey::from_str(&requirements.pay_to)
        .map_err(|_| VerifyError::InvalidRecipient(requirements.pay_to.clone()))?;
    if transfer.destination != associated_token_account(&pay_to, &config.mint) {
        return Err(VerifyError::DestinationMismatch);
    }

    let amount = match TokenInstruction::unpack(transfer.data) {
        Ok(TokenInstruction::TransferChecked { amount, .. }) => amount,
        _ => return Err(VerifyError::InvalidTokenInstruction),
    };
    let required = requirements
        .max_amount_required
        .parse::<TokenAmount>()
        .map_err(|_| VerifyError::InvalidRequiredAmount(requirements.max_amount_required.clone()))?;
    if TokenAmount::from(amount) < required {
        return Err(VerifyError::InsufficientAmount {
            amount,
            required: required.to_string(),
        });
    }

    let authority = transfer.authority;
    Ok(VerifiedPayment {
        transaction: decoded.into_inner(),
        network,
        wire_network: requirements.network.clone(),
        payer: authority,
        amount,
    })
}

/// The `cluster` entry of the requirements' `extra`, if any.
#[derive(Deserialize)]
struct ClusterExtra {
    #[serde(default)]
    cluster: Option<SolanaNetwork>,
}

fn check_network(
    payload: &str,
    required: &str,
    extra: Option<&serde_json::Value>,
) -> Result<SolanaNetwork, VerifyError> {
    if payload != required {
        return Err(VerifyError::NetworkMismatch {
            payload: payload.to_owned(),
            required: required.to_owned(),
        });
    }
    let unknown = || VerifyError::UnknownNetwork(required.to_owned());
    let cluster = match extra {
        Some(extra) if extra.is_object() => {
            ClusterExtra::deserialize(extra).map_err(|_| unknown())?.cluster
        }
        _ => None,
    };
    SolanaNetwork::resolve_wire_name(required, cluster).ok_or_else(unknown)
}

fn check_scheme(payload: &str, required: &str) -> Result<(), VerifyError> {
    if payload == required && required == EXACT_SCHEME {
        Ok(())
    } else {
        Err(VerifyError::SchemeMismatch(payload.to_owned()))
    }
}

/// At least one slot, and at least one slot carrying a real signature.
///
/// An all-zero fee payer slot is accepted next to a genuine signer; for a
/// single-signer transaction this rejects an all-zero signature.
fn check_signatures(signatures: &[Signature]) -> Result<(), VerifyError> {
    let unsigned = Signature::default();
    if signatures.iter().any(|signature| *signature != unsigned) {
        Ok(())
    } else {
        Err(VerifyError::Unsigned)
    }
}

fn is_transfer_checked(decoded: &DecodedTransaction, instruction: &CompiledInstruction) -> bool {
    decoded.program_id(instruction) == Some(&spl_token::ID)
        && instruction.data.first() == Some(&TRANSFER_CHECKED_DISCRIMINATOR)
}

fn locate_transfer(decoded: &DecodedTransaction) -> Result<TransferAccounts<'_>, VerifyError> {
    let instruction = decoded
        .instructions()
        .iter()
        .find(|instruction| is_transfer_checked(decoded, instruction))
        .ok_or(VerifyError::NoTransferInstruction)?;

    let accounts = instruction
        .accounts
        .iter()
        .map(|index| decoded.account(*index).copied())
        .collect::<Option<Vec<_>>>()
        .ok_or(VerifyError::AccountShape)?;
    let [_source, mint, destination, authority, ..] = accounts.as_slice() else {
        return Err(VerifyError::AccountShape);
    };

    Ok(TransferAccounts {
        mint: *mint,
        destination: *destination,
        authority: *authority,
        data: &instruction.data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exact::fixtures::{self, Transfer, encode, request, sign};
    use crate::networks::{DEFAULT_RECIPIENT, USDC_DEVNET};
    use s402::proto::ErrorReason;
    use solana_keypair::Keypair;
    use solana_message::{Message, MessageHeader, VersionedMessage};
    use solana_signer::Signer;

    fn verify(request: &VerifyRequest) -> Result<VerifiedPayment, VerifyError> {
        verify_payment(&NetworkTable::default(), request)
    }

    #[test]
    fn accepts_exact_amount() {
        let transfer = Transfer::to_recipient(SolanaNetwork::Devnet, 10_000);
        let verified = verify(&request(SolanaNetwork::Devnet, "10000", transfer.encoded())).unwrap();
        assert_eq!(verified.payer(), &transfer.authority.pubkey());
        assert_eq!(verified.amount(), 10_000);
        assert_eq!(verified.network(), SolanaNetwork::Devnet);
        assert_eq!(verified.wire_network(), "solana-devnet");
        assert_eq!(verified.transaction(), &transfer.signed());
    }

    #[test]
    fn accepts_overpayment_and_max_amount() {
        let transfer = Transfer::to_recipient(SolanaNetwork::Devnet, 20_000);
        assert!(verify(&request(SolanaNetwork::Devnet, "10000", transfer.encoded())).is_ok());

        let transfer = Transfer::to_recipient(SolanaNetwork::MainnetBeta, u64::MAX);
        let required = u64::MAX.to_string();
        assert!(verify(&request(SolanaNetwork::MainnetBeta, &required, transfer.encoded())).is_ok());
    }

    #[test]
    fn rejects_one_unit_short() {
        let transfer = Transfer::to_recipient(SolanaNetwork::Devnet, 9_999);
        let err = verify(&request(SolanaNetwork::Devnet, "10000", transfer.encoded())).unwrap_err();
        assert_eq!(
            err,
            VerifyError::InsufficientAmount {
                amount: 9_999,
                required: "10000".into()
            }
        );
        assert_eq!(err.reason(), ErrorReason::InvalidPayload);
    }

    #[test]
    fn required_amount_beyond_u64_is_never_met() {
        let transfer = Transfer::to_recipient(SolanaNetwork::Devnet, u64::MAX);
        let err = verify(&request(
            SolanaNetwork::Devnet,
            "18446744073709551616",
            transfer.encoded(),
        ))
        .unwrap_err();
        assert!(matches!(err, VerifyError::InsufficientAmount { .. }));
    }

    #[test]
    fn rejects_malformed_required_amount() {
        let transfer = Transfer::to_recipient(SolanaNetwork::Devnet, 10_000);
        let err = verify(&request(SolanaNetwork::Devnet, "1e4", transfer.encoded())).unwrap_err();
        assert_eq!(err, VerifyError::InvalidRequiredAmount("1e4".into()));
    }

    #[test]
    fn network_mismatch_wins_over_garbage_transaction() {
        let mut req = request(SolanaNetwork::Devnet, "10000", "not base64 at all".into());
        req.payment_payload.network = "solana".into();
        let err = verify(&req).unwrap_err();
        assert!(matches!(err, VerifyError::NetworkMismatch { .. }));
        assert_eq!(err.reason(), ErrorReason::InvalidNetwork);
    }

    #[test]
    fn unknown_wire_network_is_invalid_network() {
        let mut req = request(SolanaNetwork::Devnet, "10000", "AA==".into());
        req.payment_payload.network = "solana-testnet".into();
        req.payment_requirements.network = "solana-testnet".into();
        assert_eq!(
            verify(&req).unwrap_err(),
            VerifyError::UnknownNetwork("solana-testnet".into())
        );
    }

    #[test]
    fn testnet_requirements_verify_on_testnet() {
        let transfer = Transfer::to_recipient(SolanaNetwork::Testnet, 10_000);
        let req = request(SolanaNetwork::Testnet, "10000", transfer.encoded());
        assert_eq!(req.payment_requirements.network, "solana-devnet");
        let verified = verify(&req).unwrap();
        assert_eq!(verified.network(), SolanaNetwork::Testnet);
        assert_eq!(verified.wire_network(), "solana-devnet");
    }

    #[test]
    fn cluster_outside_its_wire_name_is_invalid_network() {
        let transfer = Transfer::to_recipient(SolanaNetwork::MainnetBeta, 10_000);
        let mut req = request(SolanaNetwork::MainnetBeta, "10000", transfer.encoded());
        req.payment_requirements.extra = Some(serde_json::json!({ "cluster": "testnet" }));
        assert_eq!(
            verify(&req).unwrap_err(),
            VerifyError::UnknownNetwork("solana".into())
        );

        req.payment_requirements.extra = Some(serde_json::json!({ "cluster": "localnet" }));
        assert_eq!(verify(&req).unwrap_err().reason(), ErrorReason::InvalidNetwork);
    }

    #[test]
    fn scheme_must_be_exact_on_both_sides() {
        let mut req = request(SolanaNetwork::Devnet, "10000", "AA==".into());
        req.payment_payload.scheme = "upto".into();
        assert_eq!(verify(&req).unwrap_err().reason(), ErrorReason::InvalidScheme);

        req.payment_requirements.scheme = "upto".into();
        assert_eq!(verify(&req).unwrap_err().reason(), ErrorReason::InvalidScheme);
    }

    #[test]
    fn payload_shape_is_checked_before_decoding() {
        let mut req = request(SolanaNetwork::Devnet, "10000", String::new());
        assert_eq!(verify(&req).unwrap_err(), VerifyError::MissingTransaction);

        req.payment_payload.payload = serde_json::json!({});
        assert_eq!(verify(&req).unwrap_err(), VerifyError::MissingTransaction);

        req.payment_payload.payload = serde_json::json!("AAAA");
        assert_eq!(verify(&req).unwrap_err(), VerifyError::MalformedPayload);

        req.payment_payload.payload = serde_json::json!({ "transaction": "@@@" });
        assert_eq!(
            verify(&req).unwrap_err(),
            VerifyError::Decode(crate::exact::DecodeError)
        );
    }

    #[test]
    fn rejects_zero_signature() {
        let transfer = Transfer::to_recipient(SolanaNetwork::Devnet, 10_000);
        let mut tx = transfer.signed();
        tx.signatures[0] = Signature::default();
        let err = verify(&request(SolanaNetwork::Devnet, "10000", encode(&tx))).unwrap_err();
        assert_eq!(err, VerifyError::Unsigned);

        tx.signatures.clear();
        let err = verify(&request(SolanaNetwork::Devnet, "10000", encode(&tx))).unwrap_err();
        assert_eq!(err, VerifyError::Unsigned);
    }

    #[test]
    fn tolerates_empty_fee_payer_slot_next_to_real_signer() {
        let authority = Keypair::new();
        let fee_payer = DEFAULT_RECIPIENT;
        let destination = associated_token_account(&DEFAULT_RECIPIENT, &USDC_DEVNET);
        let message = Message {
            header: MessageHeader {
                num_required_signatures: 2,
                num_readonly_signed_accounts: 0,
                num_readonly_unsigned_accounts: 2,
            },
            account_keys: vec![
                fee_payer,
                authority.pubkey(),
                Pubkey::new_from_array([3; 32]),
                destination,
                USDC_DEVNET,
                spl_token::ID,
            ],
            recent_blockhash: Default::default(),
            instructions: vec![CompiledInstruction {
                program_id_index: 5,
                accounts: vec![2, 4, 3, 1],
                data: fixtures::transfer_checked_data(10_000),
            }],
        };
        let tx = VersionedTransaction {
            signatures: vec![
                Signature::default(),
                authority.sign_message(&message.serialize()),
            ],
            message: VersionedMessage::Legacy(message),
        };
        let verified = verify(&request(SolanaNetwork::Devnet, "10000", encode(&tx))).unwrap();
        assert_eq!(verified.payer(), &authority.pubkey());
    }

    #[test]
    fn rejects_wrong_mint() {
        let mut transfer = Transfer::to_recipient(SolanaNetwork::Devnet, 10_000);
        transfer.mint = Pubkey::new_from_array([9; 32]);
        let err = verify(&request(SolanaNetwork::Devnet, "10000", transfer.encoded())).unwrap_err();
        assert_eq!(err, VerifyError::MintMismatch);
    }

    #[test]
    fn mainnet_mint_is_wrong_on_devnet() {
        let transfer = Transfer::to_recipient(SolanaNetwork::MainnetBeta, 10_000);
        let err = verify(&request(SolanaNetwork::Devnet, "10000", transfer.encoded())).unwrap_err();
        assert_eq!(err, VerifyError::MintMismatch);
    }

    #[test]
    fn rejects_wrong_destination() {
        let mut transfer = Transfer::to_recipient(SolanaNetwork::Devnet, 10_000);
        transfer.destination = associated_token_account(&Keypair::new().pubkey(), &USDC_DEVNET);
        let err = verify(&request(SolanaNetwork::Devnet, "10000", transfer.encoded())).unwrap_err();
        assert_eq!(err, VerifyError::DestinationMismatch);
    }

    #[test]
    fn rejects_unparsable_pay_to() {
        let transfer = Transfer::to_recipient(SolanaNetwork::Devnet, 10_000);
        let mut req = request(SolanaNetwork::Devnet, "10000", transfer.encoded());
        req.payment_requirements.pay_to = "nobody".into();
        assert_eq!(
            verify(&req).unwrap_err(),
            VerifyError::InvalidRecipient("nobody".into())
        );
    }

    #[test]
    fn ignores_non_token_instructions() {
        let transfer = Transfer::to_recipient(SolanaNetwork::Devnet, 10_000);
        let mut message = transfer.message();
        message.account_keys[4] = Pubkey::new_from_array([5; 32]);
        let tx = sign(&transfer.authority, message);
        let err = verify(&request(SolanaNetwork::Devnet, "10000", encode(&tx))).unwrap_err();
        assert_eq!(err, VerifyError::NoTransferInstruction);

        let mut message = transfer.message();
        message.instructions[0].data[0] = 3;
        let tx = sign(&transfer.authority, message);
        let err = verify(&request(SolanaNetwork::Devnet, "10000", encode(&tx))).unwrap_err();
        assert_eq!(err, VerifyError::NoTransferInstruction);
    }

    #[test]
    fn out_of_range_indices_never_match() {
        let transfer = Transfer::to_recipient(SolanaNetwork::Devnet, 10_000);
        let mut message = transfer.message();
        message.instructions[0].program_id_index = 42;
        let tx = sign(&transfer.authority, message);
        let err = verify(&request(SolanaNetwork::Devnet, "10000", encode(&tx))).unwrap_err();
        assert_eq!(err, VerifyError::NoTransferInstruction);

        let mut message = transfer.message();
        message.instructions[0].accounts[2] = 42;
        let tx = sign(&transfer.authority, message);
        let err = verify(&request(SolanaNetwork::Devnet, "10000", encode(&tx))).unwrap_err();
        assert_eq!(err, VerifyError::AccountShape);
    }

    #[test]
    fn requires_four_accounts() {
        let transfer = Transfer::to_recipient(SolanaNetwork::Devnet, 10_000);
        let mut message = transfer.message();
        message.instructions[0].accounts.truncate(3);
        let tx = sign(&transfer.authority, message);
        let err = verify(&request(SolanaNetwork::Devnet, "10000", encode(&tx))).unwrap_err();
        assert_eq!(err, VerifyError::AccountShape);
    }

    #[test]
    fn truncated_instruction_data_is_rejected() {
        let transfer = Transfer::to_recipient(SolanaNetwork::Devnet, 10_000);
        let mut message = transfer.message();
        message.instructions[0].data.truncate(4);
        let tx = sign(&transfer.authority, message);
        let err = verify(&request(SolanaNetwork::Devnet, "10000", encode(&tx))).unwrap_err();
        assert_eq!(err, VerifyError::InvalidTokenInstruction);
    }

    #[test]
    fn requirements_survive_the_wire() {
        let transfer = Transfer::to_recipient(SolanaNetwork::Devnet, 10_000);
        let req = request(SolanaNetwork::Devnet, "10000", transfer.encoded());
        let json = serde_json::to_string(&req).unwrap();
        let parsed: VerifyRequest = serde_json::from_str(&json).unwrap();
        let verified = verify(&parsed).unwrap();
        assert_eq!(verified.amount(), 10_000);
    }
}
