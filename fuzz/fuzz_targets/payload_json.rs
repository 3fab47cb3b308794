// SPDX-License-Identifier: AGPL-3.0-or-later

#![no_main]

use libfuzzer_sys::fuzz_target;
use tangle_codec::{DeSerializationMode, Payload, Serializable};

// Payloads decoded from arbitrary bytes survive a round trip through their JSON representation.
fuzz_target!(|data: &[u8]| {
    let Ok((payload, _)) = Payload::deserialize(data, DeSerializationMode::PERFORM_VALIDATION)
    else {
        return;
    };

    let json = serde_json::to_string(&payload).expect("payload json encoding");
    let payload_again: Payload = serde_json::from_str(&json).expect("payload json decoding");
    assert_eq!(payload, payload_again);
});
