// SPDX-License-Identifier: AGPL-3.0-or-later

#![no_main]

use libfuzzer_sys::fuzz_target;
use tangle_codec::{Block, DeSerializationMode, Serializable};

// Decode arbitrary bytes into a block, every block which passes validation must re-encode into
// exactly the bytes it was decoded from.
fuzz_target!(|data: &[u8]| {
    let Ok(block) = Block::from_bytes(data, DeSerializationMode::PERFORM_VALIDATION) else {
        return;
    };

    assert_eq!(block.size(), data.len());

    let bytes = block
        .serialize(DeSerializationMode::PERFORM_VALIDATION)
        .expect("valid block encoding");
    assert_eq!(bytes, data);

    // Decoding without validation must yield the same block
    let unchecked =
        Block::from_bytes(data, DeSerializationMode::NO_VALIDATION).expect("block decoding");
    assert_eq!(unchecked, block);
});
