//! # hdkeys-rs
//!
//! Hierarchical deterministic Bitcoin keys from BIP39 mnemonics.
//!
//! The crate turns a mnemonic phrase into a seed (BIP39), derives child keys
//! along a textual path (BIP32), and renders them as P2PKH, P2SH-P2WPKH or
//! P2WPKH addresses and WIF private keys. Everything in the derivation
//! pipeline is a pure function of its inputs; the wordlist is a value passed
//! by reference rather than global state.
//!
//! ## Quick Start
//!
//! ```rust
//! use hdkeys_rs::{derive_path, mnemonic_to_seed, to_address, to_wif, AddressType};
//!
//! let seed = mnemonic_to_seed(
//!     "hard split scrap crater tomorrow during panda shoot adjust glance prepare hawk",
//!     "",
//! );
//! let key = derive_path(seed.as_bytes(), "m/0/0").unwrap();
//!
//! assert_eq!(to_address(&key, AddressType::P2pkh), "1PaL9hZ5iTareT4Gg9fxwHDXEudwyWpfCp");
//! assert_eq!(
//!     to_wif(key.private_key(), true).unwrap(),
//!     "KzTJEkSQWmb74U58fKFtm7A41Am4tZ599e21g7myzdN7GBraW5Yo"
//! );
//! ```
//!
//! ## Architecture Overview
//!
//! - [`bip39`]: wordlists, mnemonic validation and generation, seed stretching
//! - [`primitives`]: hashing (with a selectable RIPEMD160 backend), secp256k1
//!   helpers, BIP32, Base58Check, Bech32, addresses and WIF
//! - [`scheme`]: batch generation over standard derivation layouts
//! - [`api`]: flat functions over the pipeline, re-exported at the root
//! - [`types`] and [`utils`]: configuration and logging
//!
//! ## Features
//!
//! - `native-ripemd160` (default): hash160 uses the `ripemd` crate. Without
//!   it, the in-crate RIPEMD160 is used; both produce identical digests.

pub mod api;
pub mod bip39;
pub mod error;
pub mod network;
pub mod primitives;
pub mod scheme;
pub mod types;
pub mod utils;

pub use api::{derive_path, load_wordlist, mnemonic_to_seed, to_address, to_wif, validate_mnemonic};
pub use bip39::{Language, Mnemonic, Seed, Wordlist};
pub use error::{EncodingError, HdError, KeyError, MnemonicError, PathError, Result, WordlistError};
pub use network::Network;
pub use primitives::address::{Address, AddressType, Wif};
pub use primitives::bip32::{ChildNumber, DerivationPath, ExtendedPrivateKey, ExtendedPublicKey};
pub use primitives::hash::{Hasher, Ripemd160Backend};
pub use scheme::{AddressGenerator, AddressScheme, DerivedAddress, SchemePreset};
pub use types::HdConfig;

use utils::logging::{init_logging, LoggingConfig};

/// Initializes logging and resolves the configured hash backend.
///
/// Safe to call more than once; only the first call installs the logger.
/// Returns the [`Hasher`] selected by `config.ripemd160`.
///
/// # Examples
///
/// ```rust
/// use hdkeys_rs::{init, HdConfig};
///
/// let hasher = init(&HdConfig::default()).expect("default config is valid");
/// println!("hash160 via {}", hasher.backend());
/// ```
pub fn init(config: &HdConfig) -> Result<Hasher> {
    config.validate()?;

    // A logger may already be installed by the host application.
    init_logging(&LoggingConfig::with_level(config.log_level));

    let hasher = config.hasher()?;
    log::info!(
        "hdkeys initialized: network={}, ripemd160={}, schemes={:?}",
        config.network,
        hasher.backend(),
        config.schemes
    );
    Ok(hasher)
}
