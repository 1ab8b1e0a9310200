//! secp256k1 operations used by key derivation.
//!
//! Keys cross this module as raw big-endian bytes so that callers never hold
//! a half-validated scalar. The heavy lifting is done by `secp256k1` with its
//! global context.

use crate::error::KeyError;
use secp256k1::{PublicKey, Scalar, SecretKey, SECP256K1};

/// Order `n` of the secp256k1 group, big-endian.
pub const CURVE_ORDER: [u8; 32] = [
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xfe,
    0xba, 0xae, 0xdc, 0xe6, 0xaf, 0x48, 0xa0, 0x3b, 0xbf, 0xd2, 0x5e, 0x8c, 0xd0, 0x36, 0x41, 0x41,
];

/// Checks `0 < k < n` and returns the key as a `SecretKey`.
pub fn validate_private_key(private_key: &[u8; 32]) -> Result<SecretKey, KeyError> {
    SecretKey::from_slice(private_key).map_err(|_| KeyError::InvalidPrivateKey)
}

/// Compressed public point `k*G` for a private scalar.
pub fn derive_public_key(private_key: &[u8; 32]) -> Result<[u8; 33], KeyError> {
    let secret = validate_private_key(private_key)?;
    Ok(PublicKey::from_secret_key(SECP256K1, &secret).serialize())
}

/// `(tweak + key) mod n`.
///
/// Returns `None` when `tweak >= n`, when `key` is not a valid private key,
/// or when the sum is zero. BIP32 treats each of those as an unusable child
/// index; the caller decides what to do next.
pub fn add_scalars_mod_n(tweak: &[u8; 32], key: &[u8; 32]) -> Option<[u8; 32]> {
    let tweak = Scalar::from_be_bytes(*tweak).ok()?;
    let key = SecretKey::from_slice(key).ok()?;
    key.add_tweak(&tweak).ok().map(|k| k.secret_bytes())
}

/// `point + tweak*G` on a compressed point, for public child derivation.
///
/// Returns `None` when `tweak >= n` or the result is the point at infinity.
pub fn add_tweak_to_point(point: &[u8; 33], tweak: &[u8; 32]) -> Result<Option<[u8; 33]>, KeyError> {
    let public = parse_public_key(point)?;
    let Ok(tweak) = Scalar::from_be_bytes(*tweak) else {
        return Ok(None);
    };
    Ok(public
        .add_exp_tweak(SECP256K1, &tweak)
        .ok()
        .map(|p| p.serialize()))
}

/// SEC1 compressed form of an affine point: parity prefix then `x`.
pub fn compress_point(x: &[u8; 32], y: &[u8; 32]) -> [u8; 33] {
    let mut out = [0u8; 33];
    out[0] = if y[31] & 1 == 0 { 0x02 } else { 0x03 };
    out[1..].copy_from_slice(x);
    out
}

/// Parses a compressed or uncompressed SEC1 point.
pub fn parse_public_key(bytes: &[u8]) -> Result<PublicKey, KeyError> {
    PublicKey::from_slice(bytes).map_err(|e| KeyError::InvalidPublicKey(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n_minus(k: u8) -> [u8; 32] {
        let mut v = CURVE_ORDER;
        v[31] -= k;
        v
    }

    fn n_plus_one() -> [u8; 32] {
        let mut v = CURVE_ORDER;
        v[31] += 1;
        v
    }

    fn scalar(v: u8) -> [u8; 32] {
        let mut out = [0u8; 32];
        out[31] = v;
        out
    }

    #[test]
    fn test_private_key_range() {
        assert_eq!(derive_public_key(&[0u8; 32]), Err(KeyError::InvalidPrivateKey));
        assert_eq!(derive_public_key(&CURVE_ORDER), Err(KeyError::InvalidPrivateKey));
        assert_eq!(derive_public_key(&n_plus_one()), Err(KeyError::InvalidPrivateKey));
        assert_eq!(derive_public_key(&[0xff; 32]), Err(KeyError::InvalidPrivateKey));
        assert!(derive_public_key(&n_minus(1)).is_ok());
        assert!(derive_public_key(&scalar(1)).is_ok());
    }

    #[test]
    fn test_generator_point() {
        let g = derive_public_key(&scalar(1)).unwrap();
        assert_eq!(
            hex::encode(g),
            "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798"
        );
    }

    #[test]
    fn test_known_public_key() {
        // Mastering Bitcoin example key.
        let key = hex::decode("1e99423a4ed27608a15a2616a2b0e9e52ced330ac530edcc32c8ffc6a526aedd").unwrap();
        let key: [u8; 32] = key.try_into().unwrap();
        assert_eq!(
            hex::encode(derive_public_key(&key).unwrap()),
            "03f028892bad7ed57d2fb57bf33081d5cfcf6f9ed3d3d7f159c2e2fff579dc341a"
        );
    }

    #[test]
    fn test_compress_point_matches_library() {
        for k in [1u8, 2, 3, 7, 200] {
            let secret = validate_private_key(&scalar(k)).unwrap();
            let uncompressed = PublicKey::from_secret_key(SECP256K1, &secret).serialize_uncompressed();
            let x: [u8; 32] = uncompressed[1..33].try_into().unwrap();
            let y: [u8; 32] = uncompressed[33..65].try_into().unwrap();
            assert_eq!(compress_point(&x, &y), derive_public_key(&scalar(k)).unwrap());
        }
    }

    #[test]
    fn test_scalar_addition() {
        assert_eq!(add_scalars_mod_n(&scalar(2), &scalar(3)), Some(scalar(5)));
        // Wraps around n.
        assert_eq!(add_scalars_mod_n(&scalar(2), &n_minus(1)), Some(scalar(1)));
        // Zero tweak is allowed, the key is unchanged.
        assert_eq!(add_scalars_mod_n(&[0u8; 32], &scalar(9)), Some(scalar(9)));
    }

    #[test]
    fn test_scalar_addition_degenerate() {
        // Sum is exactly n.
        assert_eq!(add_scalars_mod_n(&n_minus(1), &scalar(1)), None);
        // Tweak out of range.
        assert_eq!(add_scalars_mod_n(&CURVE_ORDER, &scalar(1)), None);
        assert_eq!(add_scalars_mod_n(&[0xff; 32], &scalar(1)), None);
        // Invalid base key.
        assert_eq!(add_scalars_mod_n(&scalar(1), &[0u8; 32]), None);
    }

    #[test]
    fn test_point_tweak_matches_scalar_addition() {
        let base = scalar(11);
        let tweak = scalar(31);
        let point = derive_public_key(&base).unwrap();
        let tweaked = add_tweak_to_point(&point, &tweak).unwrap().unwrap();
        let sum = add_scalars_mod_n(&tweak, &base).unwrap();
        assert_eq!(tweaked, derive_public_key(&sum).unwrap());

        assert_eq!(add_tweak_to_point(&point, &CURVE_ORDER).unwrap(), None);
        assert!(add_tweak_to_point(&[0u8; 33], &tweak).is_err());
    }
}
