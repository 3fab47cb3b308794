// SPDX-License-Identifier: AGPL-3.0-or-later

//! Constants used across the test_utils module for default values.

/// The default private key, used for signing transactions in fixtures.
pub const PRIVATE_KEY: [u8; 32] = [
    0xeb, 0x85, 0x2f, 0xef, 0xa7, 0x03, 0x90, 0x1e, 0x42, 0xf1, 0x7c, 0xdc, 0x2a, 0xa5, 0x07, 0x94,
    0x7f, 0x39, 0x2a, 0x72, 0x10, 0x1b, 0x2c, 0x1a, 0x6d, 0x30, 0x02, 0x3a, 0xf1, 0x4f, 0x75, 0xe2,
];

/// The default amount of base tokens held by outputs in fixtures.
pub const AMOUNT: u64 = 1_000_000;

/// The default tag of tagged data payloads in fixtures.
pub const TAG: &[u8] = b"tangle-codec";
