//! Base58 and Base58Check.
//!
//! Base58Check is `payload || first4(SHA256d(payload))` rendered in the
//! Bitcoin alphabet. Addresses, WIF keys and extended keys all use it.

use crate::error::EncodingError;
use crate::primitives::hash::sha256d;

const CHECKSUM_LEN: usize = 4;

/// Encodes bytes in the Bitcoin Base58 alphabet.
pub fn encode(data: &[u8]) -> String {
    bs58::encode(data).with_alphabet(bs58::Alphabet::BITCOIN).into_string()
}

/// Decodes a Base58 string. Leading '1's become leading zero bytes.
pub fn decode(s: &str) -> Result<Vec<u8>, EncodingError> {
    bs58::decode(s)
        .with_alphabet(bs58::Alphabet::BITCOIN)
        .into_vec()
        .map_err(|e| EncodingError::InvalidBase58(e.to_string()))
}

/// Appends the 4-byte double-SHA256 checksum and encodes.
pub fn check_encode(data: &[u8]) -> String {
    let checksum = sha256d(data);
    let mut payload = Vec::with_capacity(data.len() + CHECKSUM_LEN);
    payload.extend_from_slice(data);
    payload.extend_from_slice(&checksum[..CHECKSUM_LEN]);
    encode(&payload)
}

/// Base58Check with a single version byte in front of `payload`.
pub fn check_encode_versioned(version: u8, payload: &[u8]) -> String {
    let mut data = Vec::with_capacity(1 + payload.len());
    data.push(version);
    data.extend_from_slice(payload);
    check_encode(&data)
}

/// Decodes and verifies the checksum, returning the data without it.
pub fn check_decode(s: &str) -> Result<Vec<u8>, EncodingError> {
    let decoded = decode(s)?;
    if decoded.len() < CHECKSUM_LEN {
        return Err(EncodingError::InvalidLength {
            expected: CHECKSUM_LEN,
            got: decoded.len(),
        });
    }
    let (payload, checksum) = decoded.split_at(decoded.len() - CHECKSUM_LEN);
    if checksum != &sha256d(payload)[..CHECKSUM_LEN] {
        return Err(EncodingError::ChecksumMismatch);
    }
    Ok(payload.to_vec())
}

/// Splits a checked payload into its version byte and body.
pub fn check_decode_versioned(s: &str) -> Result<(u8, Vec<u8>), EncodingError> {
    let mut data = check_decode(s)?;
    if data.is_empty() {
        return Err(EncodingError::InvalidLength { expected: 1, got: 0 });
    }
    let version = data.remove(0);
    Ok((version, data))
}
