//! Flat entry points over the key-derivation pipeline.
//!
//! Each function is a thin wrapper around the typed API in [`crate::bip39`]
//! and [`crate::primitives`], fixed to Bitcoin mainnet and the detected
//! RIPEMD160 backend.

use crate::bip39::{self, Seed, Wordlist};
use crate::error::{KeyError, MnemonicError, PathError, WordlistError};
use crate::primitives::address::{self, Address, AddressType};
use crate::primitives::bip32::{DerivationPath, ExtendedPrivateKey};
use crate::Network;

/// Builds a wordlist from CSV (first column) or newline-separated text.
pub fn load_wordlist(source: &str) -> Result<Wordlist, WordlistError> {
    Wordlist::parse(source)
}

pub fn validate_mnemonic<S: AsRef<str>>(wordlist: &Wordlist, words: &[S]) -> Result<(), MnemonicError> {
    bip39::validate_mnemonic(wordlist, words)
}

/// PBKDF2 seed; the checksum is not verified here.
pub fn mnemonic_to_seed(mnemonic_text: &str, passphrase: &str) -> Seed {
    bip39::mnemonic_to_seed(mnemonic_text, passphrase)
}

/// Master key from `seed`, then each step of `path_text` in order.
pub fn derive_path(seed: &[u8], path_text: &str) -> Result<ExtendedPrivateKey, PathError> {
    let path: DerivationPath = path_text.parse()?;
    ExtendedPrivateKey::new_master(seed, Network::Bitcoin)?.derive_path(&path)
}

/// Address of `extended_key` on its own network.
pub fn to_address(extended_key: &ExtendedPrivateKey, address_type: AddressType) -> String {
    Address::from_public_key(extended_key.public_key(), address_type, extended_key.network()).into_string()
}

/// Mainnet WIF for a raw private key.
pub fn to_wif(private_key: &[u8; 32], compressed: bool) -> Result<String, KeyError> {
    address::to_wif(private_key, compressed, Network::Bitcoin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bip39::Language;

    const HARD_SPLIT: &str =
        "hard split scrap crater tomorrow during panda shoot adjust glance prepare hawk";

    #[test]
    fn test_pipeline() {
        let wordlist = Language::English.wordlist();
        let words: Vec<&str> = HARD_SPLIT.split(' ').collect();
        validate_mnemonic(&wordlist, &words).unwrap();

        let seed = mnemonic_to_seed(HARD_SPLIT, "");
        let key = derive_path(seed.as_bytes(), "m/0/0").unwrap();
        assert_eq!(to_address(&key, AddressType::P2pkh), "1PaL9hZ5iTareT4Gg9fxwHDXEudwyWpfCp");
        assert_eq!(
            to_wif(key.private_key(), true).unwrap(),
            "KzTJEkSQWmb74U58fKFtm7A41Am4tZ599e21g7myzdN7GBraW5Yo"
        );
    }

    #[test]
    fn test_derive_path_errors() {
        let seed = [0x42u8; 64];
        assert!(matches!(derive_path(&seed, "44'/0'"), Err(PathError::Malformed(_))));
        assert!(matches!(derive_path(&seed, "m/x"), Err(PathError::Malformed(_))));
        assert!(matches!(derive_path(&seed, "m//1"), Err(PathError::Malformed(_))));
        assert_eq!(derive_path(&seed, "m").unwrap().depth(), 0);
    }

    #[test]
    fn test_wif_rejects_out_of_range() {
        assert_eq!(to_wif(&[0u8; 32], true), Err(KeyError::InvalidPrivateKey));
        assert_eq!(to_wif(&[0xffu8; 32], false), Err(KeyError::InvalidPrivateKey));
    }

    #[test]
    fn test_load_wordlist_rejects_short_list() {
        assert!(matches!(load_wordlist("abandon\nability\n"), Err(WordlistError::WrongLength(2))));
    }
}
