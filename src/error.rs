use thiserror::Error;

/// Problems with a wordlist handed to [`crate::bip39::Wordlist`].
///
/// These are fatal at startup: nothing can be validated without a complete list.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WordlistError {
    #[error("Invalid wordlist length: {0}, expected 2048")]
    WrongLength(usize),

    #[error("Duplicate word in wordlist: {0}")]
    Duplicate(String),
}

/// Reasons a mnemonic phrase fails validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MnemonicError {
    #[error("Invalid mnemonic length: {0} words. Must be 12, 15, 18, 21, or 24 words")]
    WrongLength(usize),

    /// `position` counts from 0.
    #[error("Invalid word at position {position}: {word}")]
    UnknownWord { position: usize, word: String },

    #[error("Invalid mnemonic checksum")]
    BadChecksum,

    #[error("Invalid entropy length: {0} bytes. Must be one of: 16, 20, 24, 28, 32 bytes")]
    InvalidEntropy(usize),
}

/// secp256k1 key errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("Invalid private key: scalar must satisfy 0 < k < n")]
    InvalidPrivateKey,

    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    /// The derived key for this index is unusable; per BIP32 the caller
    /// moves on to the next index.
    #[error("Invalid child key at index {index:#010x}")]
    InvalidChildKey { index: u32 },

    #[error("Cannot derive hardened child {index:#010x} from a public key")]
    HardenedFromPublic { index: u32 },

    #[error("Maximum derivation depth reached")]
    DepthOverflow,
}

/// Errors from [`crate::api::derive_path`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("Malformed derivation path: {0}")]
    Malformed(String),

    #[error("Invalid child key at depth {depth}, index {index:#010x}")]
    InvalidChildKey { depth: u8, index: u32 },

    #[error("Seed produced an invalid master key")]
    InvalidMasterKey,

    #[error("Derivation path too deep: {0} steps")]
    TooDeep(usize),
}

/// Decoding errors for Base58Check, Bech32, WIF and extended keys.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    #[error("Checksum mismatch")]
    ChecksumMismatch,

    #[error("Invalid base58: {0}")]
    InvalidBase58(String),

    #[error("Invalid bech32: {0}")]
    InvalidBech32(String),

    #[error("Invalid length: expected {expected}, got {got}")]
    InvalidLength { expected: usize, got: usize },

    #[error("Unknown version byte(s): {0}")]
    UnknownVersion(String),

    #[error("Unknown human-readable part: {0}")]
    UnknownHrp(String),

    #[error("Unsupported witness version {version} with {length}-byte program")]
    UnsupportedWitness { version: u8, length: usize },

    /// WIF suffix byte after the key; only 0x01 is defined.
    #[error("Invalid WIF compression flag: {0:#04x}")]
    InvalidCompressionFlag(u8),

    #[error("Invalid key data: {0}")]
    InvalidKey(#[from] KeyError),
}

/// Crate-wide error type.
#[derive(Error, Debug)]
pub enum HdError {
    #[error(transparent)]
    Wordlist(#[from] WordlistError),

    #[error(transparent)]
    Mnemonic(#[from] MnemonicError),

    #[error(transparent)]
    Key(#[from] KeyError),

    #[error(transparent)]
    Path(#[from] PathError),

    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("JSON serialization/deserialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Hex decoding error: {0}")]
    Hex(#[from] hex::FromHexError),
}

impl HdError {
    /// Whether a batch caller can skip this input and keep going.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, HdError::Wordlist(_) | HdError::Io(_))
    }
}

pub type Result<T> = std::result::Result<T, HdError>;
