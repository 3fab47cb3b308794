// SPDX-License-Identifier: AGPL-3.0-or-later

//! Builds a signed transaction, wraps it into a block and encodes the block both as bytes and as
//! JSON.
//!
//! Run with `RUST_LOG=trace cargo run --example basic` to see what the decoder does.
use tangle_codec::address::{Address, Ed25519Address};
use tangle_codec::payload::{TaggedDataPayload, TransactionEssence, TransactionPayload};
use tangle_codec::signature::Ed25519Signature;
use tangle_codec::unlock::SignatureUnlock;
use tangle_codec::unlock_condition::AddressUnlockCondition;
use tangle_codec::{
    BasicOutput, Block, BlockId, DeSerializationMode, ProtocolParameters, TransactionId,
    UtxoInput,
};

const PRIVATE_KEY: [u8; 32] = [7; 32];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();

    let parameters = ProtocolParameters::default();

    let receiver = Ed25519Address::new([1; 32]);

    let output = BasicOutput::new(1_000_000, vec![AddressUnlockCondition::new(receiver).into()]);
    let essence = TransactionEssence::new(
        parameters.network_id(),
        vec![UtxoInput::new(TransactionId::from_bytes([2; 32]), 0).into()],
        [0; 32],
        vec![output.into()],
    )
    .with_payload(TaggedDataPayload::new(b"demo".to_vec(), b"Hello, tangle!".to_vec()));

    let signature = Ed25519Signature::sign(&PRIVATE_KEY, &essence.signing_hash()?);
    let sender = signature.address();
    let transaction =
        TransactionPayload::new(essence, vec![SignatureUnlock::new(signature).into()]);
    transaction.verify_signatures()?;
    println!(
        "transaction {} sent by {}",
        transaction.id()?,
        Address::from(sender).to_bech32(&parameters.bech32_hrp)?
    );

    let block = Block::new(
        vec![BlockId::from_bytes([4; 32]), BlockId::from_bytes([3; 32])],
        Some(transaction.into()),
        0,
    );

    let bytes = block.to_bytes()?;
    println!("block {} ({} bytes)", block.id()?, bytes.len());
    println!("{}", hex::encode(&bytes));

    let decoded = Block::from_bytes(&bytes, DeSerializationMode::PERFORM_VALIDATION)?;
    println!("{}", serde_json::to_string_pretty(&decoded)?);

    Ok(())
}
