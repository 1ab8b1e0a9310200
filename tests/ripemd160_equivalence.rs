//! The portable RIPEMD160 must be a drop-in for the native one.

use hdkeys_rs::primitives::hash::{hash160, Hasher, Ripemd160Backend};
use hdkeys_rs::primitives::ripemd160::{self, Ripemd160};
use proptest::prelude::*;

const VECTORS: &[(&str, &str)] = &[
    ("", "9c1185a5c5e9fc54612808977ee8f548b2258d31"),
    ("a", "0bdc9d2d256b3ee9daae347be6f4dc835a467ffe"),
    ("abc", "8eb208f7e05d987a9b044a8e98c6b087f15a0bfc"),
    ("message digest", "5d0689ef49d2fae572b881b123a85ffa21595f36"),
    ("abcdefghijklmnopqrstuvwxyz", "f71c27109c692c1b56bbdceb5b9d2865b3708dbc"),
    (
        "abcdbcdecdefdefgefghfghighijhijkijkljklmklmnlmnomnopnopq",
        "12a053384a9c0c88e405a06c27dcf49ada62eb2b",
    ),
    (
        "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789",
        "b0e20b6e3116640286ed3a87a5713079b21f5189",
    ),
];

#[test]
fn test_portable_reference_vectors() {
    let portable = Hasher::with_backend(Ripemd160Backend::Portable).unwrap();
    for (input, expected) in VECTORS {
        assert_eq!(hex::encode(portable.ripemd160(input.as_bytes())), *expected, "{:?}", input);
    }
}

#[test]
fn test_streaming_long_input() {
    let data = vec![b'a'; 10_000];
    let mut hasher = Ripemd160::new();
    for chunk in data.chunks(333) {
        hasher.update(chunk);
    }
    assert_eq!(hasher.finalize(), ripemd160::digest(&data));
}

#[test]
fn test_detected_backend_is_available() {
    let backend = Ripemd160Backend::detect();
    assert!(backend.is_available());
    assert_eq!(Hasher::detect().backend(), backend);
    assert_eq!(
        hex::encode(hash160(b"")),
        "b472a266d0bd89c13706a4132ccfb16f7c3b9fcb"
    );
}

#[cfg(feature = "native-ripemd160")]
mod native {
    use super::*;

    fn both(data: &[u8]) -> ([u8; 20], [u8; 20]) {
        let native = Hasher::with_backend(Ripemd160Backend::Native).unwrap();
        let portable = Hasher::with_backend(Ripemd160Backend::Portable).unwrap();
        (native.ripemd160(data), portable.ripemd160(data))
    }

    #[test]
    fn test_backends_agree_on_fixed_inputs() {
        let long = vec![b'a'; 10_000];
        let inputs: [&[u8]; 3] = [b"", b"abcdefghijklmnopqrstuvwxyz", &long];
        for data in inputs {
            let (native, portable) = both(data);
            assert_eq!(native, portable);
        }
        for (input, expected) in VECTORS {
            assert_eq!(hex::encode(both(input.as_bytes()).0), *expected);
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        #[test]
        fn backends_agree(data in prop::collection::vec(any::<u8>(), 0..1024)) {
            let (native, portable) = both(&data);
            prop_assert_eq!(native, portable);
        }
    }
}

#[cfg(not(feature = "native-ripemd160"))]
#[test]
fn test_native_backend_unavailable() {
    assert!(Hasher::with_backend(Ripemd160Backend::Native).is_err());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn split_point_does_not_matter(data in prop::collection::vec(any::<u8>(), 0..512), split in any::<prop::sample::Index>()) {
        let at = split.index(data.len() + 1);
        let mut hasher = Ripemd160::new();
        hasher.update(&data[..at]);
        hasher.update(&data[at..]);
        prop_assert_eq!(hasher.finalize(), ripemd160::digest(&data));
    }
}
