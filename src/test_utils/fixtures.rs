// SPDX-License-Identifier: AGPL-3.0-or-later

//! `rstest` fixtures which can be injected into tests.
use ed25519_dalek::SigningKey;
use rand::Rng;
use rstest::fixture;

use crate::address::Ed25519Address;
use crate::block::Block;
use crate::identifier::{BlockId, TransactionId};
use crate::input::UtxoInput;
use crate::output::{BasicOutput, Output};
use crate::payload::{Payload, TaggedDataPayload, TransactionEssence, TransactionPayload};
use crate::protocol::ProtocolParameters;
use crate::signature::Ed25519Signature;
use crate::test_utils::constants::{AMOUNT, PRIVATE_KEY, TAG};
use crate::unlock::SignatureUnlock;
use crate::unlock_condition::AddressUnlockCondition;

/// Fixture which injects the default private key into a test method.
#[fixture]
pub fn private_key() -> [u8; 32] {
    PRIVATE_KEY
}

/// Fixture which injects a random block id into a test method.
#[fixture]
pub fn random_block_id() -> BlockId {
    BlockId::from_bytes(rand::thread_rng().gen())
}

/// Fixture which injects a random transaction id into a test method.
#[fixture]
pub fn random_transaction_id() -> TransactionId {
    TransactionId::from_bytes(rand::thread_rng().gen())
}

/// Fixture which injects the address belonging to a private key into a test method. Defaults to
/// the address of [`PRIVATE_KEY`].
#[fixture]
pub fn ed25519_address(#[default(PRIVATE_KEY)] private_key: [u8; 32]) -> Ed25519Address {
    let public_key = SigningKey::from_bytes(&private_key).verifying_key();
    Ed25519Address::from_public_key(public_key.as_bytes())
}

/// Fixture which injects a basic output locked to the default address into a test method.
#[fixture]
pub fn basic_output(ed25519_address: Ed25519Address, #[default(AMOUNT)] amount: u64) -> Output {
    BasicOutput::new(
        amount,
        vec![AddressUnlockCondition::new(ed25519_address).into()],
    )
    .into()
}

/// Fixture which injects a tagged data payload into a test method.
#[fixture]
pub fn tagged_data_payload(#[default(b"Hello, tangle!".to_vec())] data: Vec<u8>) -> Payload {
    TaggedDataPayload::new(TAG.to_vec(), data).into()
}

/// Fixture which injects a transaction consuming one random output into a test method, signed
/// with the default private key.
#[fixture]
pub fn transaction(
    private_key: [u8; 32],
    random_transaction_id: TransactionId,
    basic_output: Output,
    tagged_data_payload: Payload,
) -> TransactionPayload {
    let network_id = ProtocolParameters::default().network_id();
    let input = UtxoInput::new(random_transaction_id, 0);
    let essence = TransactionEssence::new(
        network_id,
        vec![input.into()],
        [0; 32],
        vec![basic_output],
    )
    .with_payload(tagged_data_payload);

    let signing_hash = essence
        .signing_hash()
        .expect("essence of fixture can be encoded");
    let signature = Ed25519Signature::sign(&private_key, &signing_hash);

    TransactionPayload::new(essence, vec![SignatureUnlock::new(signature).into()])
}

/// Fixture which injects a block with two sorted random parents carrying a transaction into a
/// test method.
#[fixture]
pub fn block(transaction: TransactionPayload) -> Block {
    let mut parents = vec![random_block_id(), random_block_id()];
    parents.sort();
    parents.dedup();

    Block::new(parents, Some(transaction.into()), rand::thread_rng().gen())
}
