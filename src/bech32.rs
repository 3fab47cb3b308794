// SPDX-License-Identifier: AGPL-3.0-or-later

//! Bech32 encoding of binary data, as used for human readable addresses.
//!
//! A bech32 string consists of a human readable part (the network's HRP, see
//! [`ProtocolParameters`](crate::protocol::ProtocolParameters)), the separator `1` and the data
//! in a 32 character alphabet followed by a six character checksum.
use thiserror::Error;

use crate::protocol::MAX_BECH32_HRP_LENGTH;
use crate::serializer::SerializationError;

/// Maximum length of a bech32 string.
pub const MAX_STRING_LENGTH: usize = 90;

const CHECKSUM_LENGTH: usize = 6;

const SEPARATOR: char = '1';

const CHARSET: &[u8; 32] = b"qpzry9x8gf2tvdw0s3jn54khce6mua7l";

const GENERATOR: [u32; 5] = [0x3b6a57b2, 0x26508e6d, 0x1ea119fa, 0x3d4233dd, 0x2a1462b3];

/// Encodes `data` under the human readable part `hrp`.
pub fn encode(hrp: &str, data: &[u8]) -> Result<String, Bech32Error> {
    validate_hrp(hrp)?;
    if hrp.bytes().any(|byte| byte.is_ascii_uppercase()) {
        return Err(Bech32Error::MixedCase);
    }

    let mut values = convert_bits(data, 8, 5, true)?;
    let length = hrp.len() + 1 + values.len() + CHECKSUM_LENGTH;
    if length > MAX_STRING_LENGTH {
        return Err(Bech32Error::InvalidLength(length));
    }

    let checksum = create_checksum(hrp.as_bytes(), &values);
    values.extend_from_slice(&checksum);

    let mut encoded = String::with_capacity(length);
    encoded.push_str(hrp);
    encoded.push(SEPARATOR);
    encoded.extend(values.iter().map(|value| char::from(CHARSET[usize::from(*value)])));
    Ok(encoded)
}

/// Decodes a bech32 string into its human readable part and data.
pub fn decode(value: &str) -> Result<(String, Vec<u8>), Bech32Error> {
    if value.len() > MAX_STRING_LENGTH {
        return Err(Bech32Error::InvalidLength(value.len()));
    }

    let has_lowercase = value.bytes().any(|byte| byte.is_ascii_lowercase());
    let has_uppercase = value.bytes().any(|byte| byte.is_ascii_uppercase());
    if has_lowercase && has_uppercase {
        return Err(Bech32Error::MixedCase);
    }
    let value = value.to_ascii_lowercase();

    let separator = value.rfind(SEPARATOR).ok_or(Bech32Error::MissingSeparator)?;
    let (hrp, data) = (&value[..separator], &value[separator + 1..]);
    validate_hrp(hrp)?;
    if data.len() < CHECKSUM_LENGTH {
        return Err(Bech32Error::InvalidLength(value.len()));
    }

    let values = data
        .chars()
        .map(|character| {
            u8::try_from(character)
                .ok()
                .and_then(|byte| CHARSET.iter().position(|candidate| *candidate == byte))
                .and_then(|position| u8::try_from(position).ok())
                .ok_or(Bech32Error::InvalidCharacter(character))
        })
        .collect::<Result<Vec<u8>, _>>()?;

    if polymod(&[expand_hrp(hrp.as_bytes()), values.clone()].concat()) != 1 {
        return Err(Bech32Error::InvalidChecksum);
    }

    let data = convert_bits(&values[..values.len() - CHECKSUM_LENGTH], 5, 8, false)?;
    Ok((hrp.to_string(), data))
}

fn validate_hrp(hrp: &str) -> Result<(), Bech32Error> {
    let is_valid = !hrp.is_empty()
        && hrp.len() <= MAX_BECH32_HRP_LENGTH
        && hrp.bytes().all(|byte| (33..=126).contains(&byte));
    if !is_valid {
        return Err(Bech32Error::InvalidHrp(hrp.to_string()));
    }

    Ok(())
}

fn polymod(values: &[u8]) -> u32 {
    values.iter().fold(1u32, |checksum, value| {
        let top = checksum >> 25;
        let checksum = ((checksum & 0x1ff_ffff) << 5) ^ u32::from(*value);
        GENERATOR
            .iter()
            .enumerate()
            .filter(|(index, _)| (top >> index) & 1 == 1)
            .fold(checksum, |checksum, (_, generator)| checksum ^ generator)
    })
}

fn expand_hrp(hrp: &[u8]) -> Vec<u8> {
    let mut expanded = Vec::with_capacity(hrp.len() * 2 + 1);
    expanded.extend(hrp.iter().map(|byte| byte >> 5));
    expanded.push(0);
    expanded.extend(hrp.iter().map(|byte| byte & 31));
    expanded
}

fn create_checksum(hrp: &[u8], values: &[u8]) -> [u8; CHECKSUM_LENGTH] {
    let mut input = expand_hrp(hrp);
    input.extend_from_slice(values);
    input.extend_from_slice(&[0; CHECKSUM_LENGTH]);
    let polymod = polymod(&input) ^ 1;

    let mut checksum = [0; CHECKSUM_LENGTH];
    for (index, value) in checksum.iter_mut().enumerate() {
        // Masked to five bits
        *value = ((polymod >> (5 * (5 - index))) & 31) as u8;
    }
    checksum
}

/// Regroups bits, for example from bytes into the 5-bit values of the bech32 alphabet.
fn convert_bits(data: &[u8], from: u32, to: u32, pad: bool) -> Result<Vec<u8>, Bech32Error> {
    let max_value = (1u32 << to) - 1;
    let max_accumulator = (1u32 << (from + to - 1)) - 1;

    let mut accumulator = 0u32;
    let mut bits = 0u32;
    let mut converted = Vec::with_capacity(data.len() * from as usize / to as usize + 1);

    for value in data {
        accumulator = ((accumulator << from) | u32::from(*value)) & max_accumulator;
        bits += from;
        while bits >= to {
            bits -= to;
            converted.push(((accumulator >> bits) & max_value) as u8);
        }
    }

    if pad {
        if bits > 0 {
            converted.push(((accumulator << (to - bits)) & max_value) as u8);
        }
    } else if bits >= from || ((accumulator << (to - bits)) & max_value) != 0 {
        return Err(Bech32Error::InvalidPadding);
    }

    Ok(converted)
}

/// Errors which can occur while encoding or decoding bech32 strings.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Bech32Error {
    #[error("invalid human readable part '{0}'")]
    InvalidHrp(String),

    #[error("bech32 string of length {0} is too short or too long")]
    InvalidLength(usize),

    #[error("bech32 string is missing the separator")]
    MissingSeparator,

    #[error("bech32 string mixes upper and lower case")]
    MixedCase,

    #[error("invalid character '{0}' in data part")]
    InvalidCharacter(char),

    #[error("invalid checksum")]
    InvalidChecksum,

    #[error("data part has invalid padding")]
    InvalidPadding,

    /// Data part does not hold a valid address.
    #[error("invalid address: {0}")]
    InvalidAddress(#[from] SerializationError),
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{decode, encode, Bech32Error};

    #[rstest]
    #[case("a12uel5l", "a")]
    #[case("A12UEL5L", "a")]
    fn empty_data(#[case] value: &str, #[case] hrp: &str) {
        assert_eq!(decode(value), Ok((hrp.to_string(), vec![])));
        assert_eq!(encode(hrp, &[]).unwrap(), "a12uel5l");
    }

    #[test]
    fn round_trip() {
        let data: Vec<u8> = (0..33).collect();
        let encoded = encode("smr", &data).unwrap();
        assert!(encoded.starts_with("smr1"));
        assert_eq!(decode(&encoded), Ok(("smr".to_string(), data)));
    }

    #[test]
    fn invalid_strings() {
        let encoded = encode("rms", &[7; 33]).unwrap();

        // Flip one character of the data part
        let mut tampered = encoded.clone().into_bytes();
        let last = tampered.len() - 1;
        tampered[last] = if tampered[last] == b'q' { b'p' } else { b'q' };
        let tampered = String::from_utf8(tampered).unwrap();
        assert_eq!(decode(&tampered), Err(Bech32Error::InvalidChecksum));

        let mut mixed = encoded.clone();
        mixed.replace_range(..1, "R");
        assert_eq!(decode(&mixed), Err(Bech32Error::MixedCase));

        assert_eq!(
            decode(&encoded.replace('1', "")),
            Err(Bech32Error::MissingSeparator)
        );
        assert_eq!(decode("rms1b00000"), Err(Bech32Error::InvalidCharacter('b')));
        assert!(matches!(
            encode("", &[1]),
            Err(Bech32Error::InvalidHrp(_))
        ));
        assert!(matches!(
            encode("rms", &[0; 64]),
            Err(Bech32Error::InvalidLength(_))
        ));
    }
}
