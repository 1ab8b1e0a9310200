//! Segwit address encoding (BIP173).
//!
//! Only witness version 0 is produced or accepted: 20-byte programs for
//! P2WPKH and 32-byte programs for P2WSH.

use crate::error::EncodingError;
use bech32::{u5, FromBase32, ToBase32, Variant};

/// A decoded segwit address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WitnessProgram {
    pub hrp: String,
    pub version: u8,
    pub program: Vec<u8>,
}

fn check_program(version: u8, program: &[u8]) -> Result<(), EncodingError> {
    match (version, program.len()) {
        (0, 20) | (0, 32) => Ok(()),
        (version, length) => Err(EncodingError::UnsupportedWitness { version, length }),
    }
}

/// Encodes a witness program under `hrp`.
pub fn encode(hrp: &str, version: u8, program: &[u8]) -> Result<String, EncodingError> {
    check_program(version, program)?;

    let version = u5::try_from_u8(version).map_err(|e| EncodingError::InvalidBech32(e.to_string()))?;
    let mut data = Vec::with_capacity(1 + (program.len() * 8 + 4) / 5);
    data.push(version);
    data.extend(program.to_base32());

    bech32::encode(hrp, data, Variant::Bech32).map_err(|e| EncodingError::InvalidBech32(e.to_string()))
}

/// Decodes a segwit address, verifying checksum, variant, version and
/// program length.
///
/// A failed checksum is [`EncodingError::ChecksumMismatch`]; any other
/// malformation is [`EncodingError::InvalidBech32`]. Non-zero witness
/// versions are [`EncodingError::UnsupportedWitness`] whichever checksum
/// variant they carry.
pub fn decode(address: &str) -> Result<WitnessProgram, EncodingError> {
    let (hrp, data, variant) = bech32::decode(address).map_err(|e| match e {
        bech32::Error::InvalidChecksum => EncodingError::ChecksumMismatch,
        other => EncodingError::InvalidBech32(other.to_string()),
    })?;

    let (version, payload) = data
        .split_first()
        .ok_or_else(|| EncodingError::InvalidBech32("empty data part".to_string()))?;
    let version = version.to_u8();

    let program =
        Vec::<u8>::from_base32(payload).map_err(|e| EncodingError::InvalidBech32(e.to_string()))?;
    check_program(version, &program)?;

    if variant != Variant::Bech32 {
        return Err(EncodingError::InvalidBech32(
            "witness version 0 requires bech32, got bech32m".to_string(),
        ));
    }

    Ok(WitnessProgram { hrp, version, program })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_p2wpkh_reference_vector() {
        let program = hex::decode("751e76e8199196d454941c45d1b3a323f1433bd6").unwrap();
        let encoded = encode("bc", 0, &program).unwrap();
        assert_eq!(encoded, "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4");

        let decoded = decode("BC1QW508D6QEJXTDG4Y5R3ZARVARY0C5XW7KV8F3T4").unwrap();
        assert_eq!(decoded.hrp, "bc");
        assert_eq!(decoded.version, 0);
        assert_eq!(decoded.program, program);
    }

    #[test]
    fn test_p2wsh_reference_vector() {
        let decoded = decode("tb1qrp33g0q5c5txsp9arysrx4k6zdkfs4nce4xj0gdcccefvpysxf3q0sl5k7").unwrap();
        assert_eq!(decoded.hrp, "tb");
        assert_eq!(
            hex::encode(&decoded.program),
            "1863143c14c5166804bd19203356da136c985678cd4d27a1b8c6329604903262"
        );
    }

    #[test]
    fn test_bad_checksum() {
        assert_eq!(
            decode("bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t5"),
            Err(EncodingError::ChecksumMismatch)
        );
        // A character outside the charset is malformed, not corrupted.
        assert!(matches!(
            decode("bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3tb"),
            Err(EncodingError::InvalidBech32(_))
        ));
    }

    #[test]
    fn test_bech32m_versions_unsupported() {
        assert_eq!(
            decode("bc1p0xlxvlhemja6c4dqv22uapctqupfhlxm9h8z3k2e72q4k9hcz7vqzk5jj0"),
            Err(EncodingError::UnsupportedWitness { version: 1, length: 32 })
        );
    }

    #[test]
    fn test_mixed_case_rejected() {
        assert!(decode("tb1qrp33g0q5c5txsp9arysrx4k6zdkfs4nce4xj0gdcccefvpysxf3q0sL5k7").is_err());
    }

    #[test]
    fn test_wrong_program_length_for_v0() {
        assert_eq!(
            decode("BC1QR508D6QEJXTDG4Y5R3ZARVARYV98GJ9P"),
            Err(EncodingError::UnsupportedWitness { version: 0, length: 16 })
        );
    }

    #[test]
    fn test_non_zero_version_rejected() {
        assert!(matches!(
            decode("bc1zw508d6qejxtdg4y5r3zarvaryvg6kdaj"),
            Err(EncodingError::UnsupportedWitness { version: 2, .. })
        ));
        assert!(encode("bc", 1, &[0u8; 32]).is_err());
        assert!(encode("bc", 0, &[0u8; 21]).is_err());
    }
}
