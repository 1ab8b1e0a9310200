//! Bitcoin key and address primitives.

pub mod address;
pub mod base58;
pub mod bech32;
pub mod bip32;
pub mod ec;
pub mod hash;
pub mod ripemd160;
