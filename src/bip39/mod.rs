//! BIP39 Mnemonic code for generating deterministic keys.
//!
//! Validation rebuilds the entropy and checksum bitstream from 11-bit word
//! indices. Seed derivation is PBKDF2-HMAC-SHA512 over the normalised
//! phrase and does not look at the checksum at all.

pub mod wordlist;

pub use self::wordlist::{Wordlist, WORDLIST_LEN};

use crate::error::MnemonicError;
use crate::primitives::hash::{pbkdf2_sha512, sha256};
use rand::{thread_rng, RngCore};
use std::fmt;

/// Number of PBKDF2 iterations for mnemonic-to-seed conversion
pub const PBKDF2_ROUNDS: u32 = 2048;

/// Valid mnemonic lengths in words.
pub const WORD_COUNTS: [usize; 5] = [12, 15, 18, 21, 24];

/// Supported languages for BIP39 mnemonics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    English,
}

impl Language {
    /// Builds a fresh wordlist for this language.
    pub fn wordlist(&self) -> Wordlist {
        match self {
            Language::English => Wordlist::english(),
        }
    }
}

/// Collapses whitespace runs to single spaces and lowercases.
pub fn normalize_phrase(phrase: &str) -> String {
    phrase
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

fn check_entropy_len(len: usize) -> Result<(), MnemonicError> {
    match len {
        16 | 20 | 24 | 28 | 32 => Ok(()),
        other => Err(MnemonicError::InvalidEntropy(other)),
    }
}

/// Splits a word sequence into its entropy bytes and embedded checksum.
fn unpack<S: AsRef<str>>(wordlist: &Wordlist, words: &[S]) -> Result<(Vec<u8>, u8), MnemonicError> {
    if !WORD_COUNTS.contains(&words.len()) {
        return Err(MnemonicError::WrongLength(words.len()));
    }

    let checksum_bits = words.len() / 3;
    let entropy_len = checksum_bits * 4;

    let mut bytes = Vec::with_capacity(entropy_len + 1);
    let mut buffer = 0u32;
    let mut buffered = 0u32;

    for (position, word) in words.iter().enumerate() {
        let word = word.as_ref().to_lowercase();
        let index = wordlist
            .index_of(&word)
            .ok_or(MnemonicError::UnknownWord { position, word })?;

        buffer = (buffer << 11) | u32::from(index);
        buffered += 11;
        while buffered >= 8 {
            buffered -= 8;
            bytes.push((buffer >> buffered) as u8);
        }
        buffer &= (1 << buffered) - 1;
    }

    // Either the checksum filled a whole byte (24 words) or its bits are
    // what is left in the buffer.
    let checksum = if buffered == 0 {
        bytes.pop().unwrap_or_default()
    } else {
        buffer as u8
    };
    debug_assert_eq!(bytes.len(), entropy_len);

    Ok((bytes, checksum))
}

fn expected_checksum(entropy: &[u8]) -> u8 {
    let checksum_bits = entropy.len() / 4;
    sha256(entropy)[0] >> (8 - checksum_bits)
}

/// Checks word count, membership and the embedded checksum.
pub fn validate_mnemonic<S: AsRef<str>>(wordlist: &Wordlist, words: &[S]) -> Result<(), MnemonicError> {
    let (entropy, checksum) = unpack(wordlist, words)?;
    if checksum != expected_checksum(&entropy) {
        return Err(MnemonicError::BadChecksum);
    }
    Ok(())
}

/// BIP39 seed for a phrase and optional passphrase.
///
/// The phrase is normalised with [`normalize_phrase`]; the checksum is not
/// verified, so any phrase produces a seed.
pub fn mnemonic_to_seed(phrase: &str, passphrase: &str) -> Seed {
    let password = normalize_phrase(phrase);
    let salt = format!("mnemonic{}", passphrase);
    Seed(pbkdf2_sha512(password.as_bytes(), salt.as_bytes(), PBKDF2_ROUNDS))
}

/// Represents a BIP39 mnemonic phrase
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mnemonic {
    words: Vec<String>,
}

impl Mnemonic {
    /// Generate a new mnemonic with the specified entropy length in bits
    pub fn generate(wordlist: &Wordlist, entropy_bits: usize) -> Result<Self, MnemonicError> {
        if entropy_bits % 8 != 0 {
            return Err(MnemonicError::InvalidEntropy(entropy_bits / 8));
        }
        check_entropy_len(entropy_bits / 8)?;

        let mut entropy = vec![0u8; entropy_bits / 8];
        thread_rng().fill_bytes(&mut entropy);
        Self::from_entropy(wordlist, &entropy)
    }

    /// Create a mnemonic from 16, 20, 24, 28 or 32 bytes of entropy
    pub fn from_entropy(wordlist: &Wordlist, entropy: &[u8]) -> Result<Self, MnemonicError> {
        check_entropy_len(entropy.len())?;

        let word_count = entropy.len() * 3 / 4;
        let checksum = sha256(entropy)[0];

        let mut words = Vec::with_capacity(word_count);
        let mut buffer = 0u32;
        let mut buffered = 0u32;

        for &byte in entropy.iter().chain(std::iter::once(&checksum)) {
            buffer = (buffer << 8) | u32::from(byte);
            buffered += 8;
            while buffered >= 11 && words.len() < word_count {
                buffered -= 11;
                let index = ((buffer >> buffered) & 0x7ff) as u16;
                words.push(wordlist.word(index).unwrap_or_default().to_string());
            }
            buffer &= (1 << buffered) - 1;
        }

        Ok(Mnemonic { words })
    }

    /// Parse and validate a phrase against `wordlist`
    pub fn parse(wordlist: &Wordlist, phrase: &str) -> Result<Self, MnemonicError> {
        let words: Vec<String> = normalize_phrase(phrase)
            .split(' ')
            .filter(|w| !w.is_empty())
            .map(str::to_string)
            .collect();
        validate_mnemonic(wordlist, &words)?;
        Ok(Mnemonic { words })
    }

    /// Re-checks the phrase against `wordlist`
    pub fn validate(&self, wordlist: &Wordlist) -> Result<(), MnemonicError> {
        validate_mnemonic(wordlist, &self.words)
    }

    /// Get the entropy that generated this mnemonic
    pub fn to_entropy(&self, wordlist: &Wordlist) -> Result<Vec<u8>, MnemonicError> {
        unpack(wordlist, &self.words).map(|(entropy, _)| entropy)
    }

    pub fn to_seed(&self, passphrase: &str) -> Seed {
        mnemonic_to_seed(&self.phrase(), passphrase)
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    pub fn phrase(&self) -> String {
        self.words.join(" ")
    }
}

impl fmt::Display for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.words.join(" "))
    }
}

/// Represents a BIP39 seed derived from a mnemonic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seed(pub [u8; 64]);

impl Seed {
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl AsRef<[u8]> for Seed {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 64]> for Seed {
    fn from(bytes: [u8; 64]) -> Self {
        Seed(bytes)
    }
}
