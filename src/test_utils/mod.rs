// SPDX-License-Identifier: AGPL-3.0-or-later

//! Tools which can be used for testing code building on top of the protocol objects.
//!
//! Fixtures are `rstest` fixtures and can be injected into tests by naming them as arguments:
//!
//! ```
//! # #[cfg(test)]
//! # mod tests {
//! use rstest::rstest;
//! use tangle_codec::test_utils::fixtures::block;
//! use tangle_codec::{Block, DeSerializationMode};
//!
//! #[rstest]
//! fn decode(block: Block) {
//!     let bytes = block.to_bytes().unwrap();
//!     assert!(Block::from_bytes(&bytes, DeSerializationMode::PERFORM_VALIDATION).is_ok());
//! }
//! # }
//! ```
pub mod constants;
pub mod fixtures;

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use crate::block::Block;
    use crate::output::Output;
    use crate::payload::{Payload, TransactionPayload};
    use crate::serializer::{DeSerializationMode, Serializable};
    use crate::test_utils::fixtures::{basic_output, block, transaction};

    const VALIDATE: DeSerializationMode = DeSerializationMode::PERFORM_VALIDATION;

    #[rstest]
    fn valid_basic_output(basic_output: Output) {
        let bytes = basic_output.serialize(VALIDATE).unwrap();
        let (decoded, _) = Output::deserialize(&bytes, VALIDATE).unwrap();
        assert_eq!(decoded, basic_output);
    }

    #[rstest]
    fn signed_transaction(transaction: TransactionPayload) {
        assert!(transaction.verify_signatures().is_ok());
        assert_eq!(transaction.unlocks().len(), transaction.essence().inputs().len());
    }

    #[rstest]
    fn block_with_transaction(block: Block) {
        let bytes = block.to_bytes().unwrap();
        let decoded = Block::from_bytes(&bytes, VALIDATE).unwrap();
        assert_eq!(decoded, block);

        let Some(Payload::Transaction(transaction)) = decoded.payload() else {
            panic!("expected transaction payload");
        };
        assert!(transaction.verify_signatures().is_ok());
    }

    #[rstest]
    fn block_json(block: Block) {
        let json = serde_json::to_string(&block).unwrap();
        let decoded: Block = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, block);
        assert_eq!(decoded.id().unwrap(), block.id().unwrap());
    }
}
