//! BIP32 Hierarchical Deterministic Keys.

use crate::error::{EncodingError, KeyError, PathError};
use crate::network::Network;
use crate::primitives::base58;
use crate::primitives::ec;
use crate::primitives::hash::{hmac_sha512, hmac_sha512_parts, Hasher};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const BIP32_MASTER_KEY: &[u8] = b"Bitcoin seed";

/// Child numbers at or above this value are hardened.
pub const HARDENED_OFFSET: u32 = 0x8000_0000;

/// Length of a serialized extended key before the checksum.
const EXTENDED_KEY_LEN: usize = 78;

/// Chain code for BIP32 key derivation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChainCode(pub [u8; 32]);

impl ChainCode {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

/// Key fingerprint (first 4 bytes of HASH160 of public key)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Fingerprint(pub [u8; 4]);

impl Fingerprint {
    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    /// Calculate fingerprint from a compressed public key
    pub fn from_public_key(hasher: &Hasher, public_key: &[u8; 33]) -> Self {
        let hash = hasher.hash160(public_key);
        let mut fingerprint = [0u8; 4];
        fingerprint.copy_from_slice(&hash[..4]);
        Fingerprint(fingerprint)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// One step of a derivation path: a 31-bit index and a hardened flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChildNumber {
    index: u32,
    hardened: bool,
}

impl ChildNumber {
    /// An index of 2^31 or more is taken as already hardened.
    pub fn new(index: u32, hardened: bool) -> Self {
        Self::from_raw(if hardened { index | HARDENED_OFFSET } else { index })
    }

    pub fn normal(index: u32) -> Self {
        Self::new(index, false)
    }

    pub fn hardened(index: u32) -> Self {
        Self::new(index, true)
    }

    /// From the 32-bit serialized form.
    pub fn from_raw(raw: u32) -> Self {
        Self {
            index: raw & !HARDENED_OFFSET,
            hardened: raw & HARDENED_OFFSET != 0,
        }
    }

    /// The 32-bit serialized form, `index + 2^31` when hardened.
    pub fn to_raw(&self) -> u32 {
        if self.hardened {
            self.index | HARDENED_OFFSET
        } else {
            self.index
        }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn is_hardened(&self) -> bool {
        self.hardened
    }
}

impl fmt::Display for ChildNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hardened {
            write!(f, "{}'", self.index)
        } else {
            write!(f, "{}", self.index)
        }
    }
}

impl FromStr for ChildNumber {
    type Err = PathError;

    fn from_str(segment: &str) -> Result<Self, PathError> {
        let malformed = || PathError::Malformed(format!("invalid path segment '{}'", segment));

        let (digits, hardened) = match segment.strip_suffix(['\'', 'h', 'H']) {
            Some(digits) => (digits, true),
            None => (segment, false),
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }

        let index: u32 = digits.parse().map_err(|_| malformed())?;
        if index >= HARDENED_OFFSET {
            return Err(PathError::Malformed(format!("index {} out of range", index)));
        }
        Ok(ChildNumber::new(index, hardened))
    }
}

/// Derivation path for BIP32 key derivation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct DerivationPath {
    steps: Vec<ChildNumber>,
}

impl DerivationPath {
    pub fn new(steps: Vec<ChildNumber>) -> Self {
        DerivationPath { steps }
    }

    /// The empty path, `m`.
    pub fn master() -> Self {
        DerivationPath { steps: Vec::new() }
    }

    pub fn steps(&self) -> &[ChildNumber] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Last step, if any.
    pub fn last(&self) -> Option<ChildNumber> {
        self.steps.last().copied()
    }

    pub fn parent(&self) -> Option<DerivationPath> {
        let (_, parent) = self.steps.split_last()?;
        Some(DerivationPath::new(parent.to_vec()))
    }

    pub fn child(&self, child: ChildNumber) -> DerivationPath {
        let mut steps = self.steps.clone();
        steps.push(child);
        DerivationPath::new(steps)
    }
}

impl FromStr for DerivationPath {
    type Err = PathError;

    /// Parses `m/44'/0'/0'/0/5`. The leading `m` is required; `'`, `h`
    /// and `H` mark hardened steps.
    fn from_str(s: &str) -> Result<Self, PathError> {
        let mut segments = s.split('/');
        if segments.next() != Some("m") {
            return Err(PathError::Malformed(format!("path must start with 'm': '{}'", s)));
        }

        let steps = segments
            .map(|segment| {
                if segment.is_empty() {
                    Err(PathError::Malformed(format!("empty segment in '{}'", s)))
                } else {
                    segment.parse::<ChildNumber>()
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        if steps.len() > u8::MAX as usize {
            return Err(PathError::TooDeep(steps.len()));
        }
        Ok(DerivationPath { steps })
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m")?;
        for step in &self.steps {
            write!(f, "/{}", step)?;
        }
        Ok(())
    }
}

impl From<Vec<ChildNumber>> for DerivationPath {
    fn from(steps: Vec<ChildNumber>) -> Self {
        DerivationPath { steps }
    }
}

fn split_hmac(i: &[u8; 64]) -> ([u8; 32], ChainCode) {
    let mut il = [0u8; 32];
    let mut ir = [0u8; 32];
    il.copy_from_slice(&i[..32]);
    ir.copy_from_slice(&i[32..]);
    (il, ChainCode(ir))
}

fn path_error(err: KeyError, depth: u8, child: ChildNumber, path: &DerivationPath) -> PathError {
    match err {
        KeyError::DepthOverflow => PathError::TooDeep(path.len()),
        _ => PathError::InvalidChildKey {
            depth,
            index: child.to_raw(),
        },
    }
}

/// Extended private key
///
/// Created from a seed or from exactly one parent; never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendedPrivateKey {
    network: Network,
    depth: u8,
    parent_fingerprint: Fingerprint,
    child_number: ChildNumber,
    private_key: [u8; 32],
    public_key: [u8; 33],
    chain_code: ChainCode,
}

impl ExtendedPrivateKey {
    /// Master key from a BIP39 seed: `HMAC-SHA512("Bitcoin seed", seed)`.
    pub fn new_master(seed: &[u8], network: Network) -> Result<Self, PathError> {
        let (key, chain_code) = split_hmac(&hmac_sha512(BIP32_MASTER_KEY, seed));
        let public_key = ec::derive_public_key(&key).map_err(|_| PathError::InvalidMasterKey)?;

        Ok(ExtendedPrivateKey {
            network,
            depth: 0,
            parent_fingerprint: Fingerprint::default(),
            child_number: ChildNumber::from_raw(0),
            private_key: key,
            public_key,
            chain_code,
        })
    }

    /// Derive a child private key with the default hasher.
    ///
    /// `hardened` or an `index >= 2^31` selects hardened derivation.
    pub fn derive_child(&self, index: u32, hardened: bool) -> Result<Self, KeyError> {
        self.derive_child_with(&Hasher::default(), ChildNumber::new(index, hardened))
    }

    /// Derive a child private key.
    ///
    /// Returns [`KeyError::InvalidChildKey`] when `IL >= n` or the child key
    /// is zero; per BIP32 the caller should move on to the next index.
    pub fn derive_child_with(&self, hasher: &Hasher, child: ChildNumber) -> Result<Self, KeyError> {
        let depth = self.depth.checked_add(1).ok_or(KeyError::DepthOverflow)?;
        let raw = child.to_raw();

        let i = if child.is_hardened() {
            hmac_sha512_parts(&self.chain_code.0, &[&[0u8], &self.private_key, &raw.to_be_bytes()])
        } else {
            hmac_sha512_parts(&self.chain_code.0, &[&self.public_key, &raw.to_be_bytes()])
        };
        let (il, chain_code) = split_hmac(&i);

        let private_key =
            ec::add_scalars_mod_n(&il, &self.private_key).ok_or(KeyError::InvalidChildKey { index: raw })?;
        let public_key = ec::derive_public_key(&private_key)?;

        Ok(ExtendedPrivateKey {
            network: self.network,
            depth,
            parent_fingerprint: Fingerprint::from_public_key(hasher, &self.public_key),
            child_number: child,
            private_key,
            public_key,
            chain_code,
        })
    }

    /// Derive a key from a derivation path with the default hasher
    pub fn derive_path(&self, path: &DerivationPath) -> Result<Self, PathError> {
        self.derive_path_with(&Hasher::default(), path)
    }

    /// Folds [`Self::derive_child_with`] over the path, left to right.
    pub fn derive_path_with(&self, hasher: &Hasher, path: &DerivationPath) -> Result<Self, PathError> {
        path.steps().iter().try_fold(self.clone(), |key, &child| {
            key.derive_child_with(hasher, child)
                .map_err(|e| path_error(e, key.depth.saturating_add(1), child, path))
        })
    }

    /// Get the corresponding extended public key
    pub fn extended_public_key(&self) -> ExtendedPublicKey {
        ExtendedPublicKey {
            network: self.network,
            depth: self.depth,
            parent_fingerprint: self.parent_fingerprint,
            child_number: self.child_number,
            public_key: self.public_key,
            chain_code: self.chain_code,
        }
    }

    /// Get the fingerprint of this key
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::from_public_key(&Hasher::default(), &self.public_key)
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn depth(&self) -> u8 {
        self.depth
    }

    pub fn parent_fingerprint(&self) -> Fingerprint {
        self.parent_fingerprint
    }

    pub fn child_number(&self) -> ChildNumber {
        self.child_number
    }

    pub fn private_key(&self) -> &[u8; 32] {
        &self.private_key
    }

    /// Compressed public key.
    pub fn public_key(&self) -> &[u8; 33] {
        &self.public_key
    }

    pub fn chain_code(&self) -> &ChainCode {
        &self.chain_code
    }

    /// Same key material on another network.
    pub fn with_network(mut self, network: Network) -> Self {
        self.network = network;
        self
    }

    /// Serialize to extended private key format (xprv/tprv)
    pub fn encode(&self) -> String {
        let mut data = Vec::with_capacity(EXTENDED_KEY_LEN);
        data.extend_from_slice(&self.network.private_version_bytes());
        data.push(self.depth);
        data.extend_from_slice(self.parent_fingerprint.as_bytes());
        data.extend_from_slice(&self.child_number.to_raw().to_be_bytes());
        data.extend_from_slice(self.chain_code.as_bytes());
        data.push(0x00);
        data.extend_from_slice(&self.private_key);
        base58::check_encode(&data)
    }
}

/// Header fields shared by xprv and xpub payloads.
struct RawExtendedKey<'a> {
    version: [u8; 4],
    depth: u8,
    parent_fingerprint: Fingerprint,
    child_number: ChildNumber,
    chain_code: ChainCode,
    key: &'a [u8],
}

fn parse_extended(data: &[u8]) -> Result<RawExtendedKey<'_>, EncodingError> {
    if data.len() != EXTENDED_KEY_LEN {
        return Err(EncodingError::InvalidLength {
            expected: EXTENDED_KEY_LEN,
            got: data.len(),
        });
    }

    let mut version = [0u8; 4];
    version.copy_from_slice(&data[0..4]);
    let mut parent_fingerprint = [0u8; 4];
    parent_fingerprint.copy_from_slice(&data[5..9]);
    let child_number = u32::from_be_bytes([data[9], data[10], data[11], data[12]]);
    let mut chain_code = [0u8; 32];
    chain_code.copy_from_slice(&data[13..45]);

    Ok(RawExtendedKey {
        version,
        depth: data[4],
        parent_fingerprint: Fingerprint(parent_fingerprint),
        child_number: ChildNumber::from_raw(child_number),
        chain_code: ChainCode(chain_code),
        key: &data[45..78],
    })
}

impl FromStr for ExtendedPrivateKey {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, EncodingError> {
        let data = base58::check_decode(s)?;
        let raw = parse_extended(&data)?;

        let network = Network::from_private_version(raw.version)
            .ok_or_else(|| EncodingError::UnknownVersion(hex::encode(raw.version)))?;

        if raw.key[0] != 0x00 {
            return Err(KeyError::InvalidPrivateKey.into());
        }
        let mut private_key = [0u8; 32];
        private_key.copy_from_slice(&raw.key[1..]);
        let public_key = ec::derive_public_key(&private_key)?;

        Ok(ExtendedPrivateKey {
            network,
            depth: raw.depth,
            parent_fingerprint: raw.parent_fingerprint,
            child_number: raw.child_number,
            private_key,
            public_key,
            chain_code: raw.chain_code,
        })
    }
}

impl fmt::Display for ExtendedPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

/// Extended public key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExtendedPublicKey {
    network: Network,
    depth: u8,
    parent_fingerprint: Fingerprint,
    child_number: ChildNumber,
    public_key: [u8; 33],
    chain_code: ChainCode,
}

impl ExtendedPublicKey {
    /// Derive a non-hardened child public key with the default hasher
    pub fn derive_child(&self, index: u32) -> Result<Self, KeyError> {
        self.derive_child_with(&Hasher::default(), index)
    }

    /// Derive a non-hardened child: `K + IL*G`.
    pub fn derive_child_with(&self, hasher: &Hasher, index: u32) -> Result<Self, KeyError> {
        if index >= HARDENED_OFFSET {
            return Err(KeyError::HardenedFromPublic { index });
        }
        let depth = self.depth.checked_add(1).ok_or(KeyError::DepthOverflow)?;

        let i = hmac_sha512_parts(&self.chain_code.0, &[&self.public_key, &index.to_be_bytes()]);
        let (il, chain_code) = split_hmac(&i);

        let public_key =
            ec::add_tweak_to_point(&self.public_key, &il)?.ok_or(KeyError::InvalidChildKey { index })?;

        Ok(ExtendedPublicKey {
            network: self.network,
            depth,
            parent_fingerprint: Fingerprint::from_public_key(hasher, &self.public_key),
            child_number: ChildNumber::normal(index),
            public_key,
            chain_code,
        })
    }

    /// Derive along a path of non-hardened steps
    pub fn derive_path(&self, path: &DerivationPath) -> Result<Self, PathError> {
        let hasher = Hasher::default();
        path.steps().iter().try_fold(self.clone(), |key, &child| {
            if child.is_hardened() {
                return Err(PathError::Malformed(format!(
                    "hardened step {} cannot be derived from a public key",
                    child
                )));
            }
            key.derive_child_with(&hasher, child.index())
                .map_err(|e| path_error(e, key.depth.saturating_add(1), child, path))
        })
    }

    /// Get the fingerprint of this key
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::from_public_key(&Hasher::default(), &self.public_key)
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn depth(&self) -> u8 {
        self.depth
    }

    pub fn parent_fingerprint(&self) -> Fingerprint {
        self.parent_fingerprint
    }

    pub fn child_number(&self) -> ChildNumber {
        self.child_number
    }

    pub fn public_key(&self) -> &[u8; 33] {
        &self.public_key
    }

    pub fn chain_code(&self) -> &ChainCode {
        &self.chain_code
    }

    /// Serialize to extended public key format (xpub/tpub)
    pub fn encode(&self) -> String {
        let mut data = Vec::with_capacity(EXTENDED_KEY_LEN);
        data.extend_from_slice(&self.network.public_version_bytes());
        data.push(self.depth);
        data.extend_from_slice(self.parent_fingerprint.as_bytes());
        data.extend_from_slice(&self.child_number.to_raw().to_be_bytes());
        data.extend_from_slice(self.chain_code.as_bytes());
        data.extend_from_slice(&self.public_key);
        base58::check_encode(&data)
    }
}

impl FromStr for ExtendedPublicKey {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, EncodingError> {
        let data = base58::check_decode(s)?;
        let raw = parse_extended(&data)?;

        let network = Network::from_public_version(raw.version)
            .ok_or_else(|| EncodingError::UnknownVersion(hex::encode(raw.version)))?;

        // Only compressed points are valid here.
        if raw.key[0] != 0x02 && raw.key[0] != 0x03 {
            return Err(KeyError::InvalidPublicKey("expected compressed point".to_string()).into());
        }
        ec::parse_public_key(raw.key)?;
        let mut public_key = [0u8; 33];
        public_key.copy_from_slice(raw.key);

        Ok(ExtendedPublicKey {
            network,
            depth: raw.depth,
            parent_fingerprint: raw.parent_fingerprint,
            child_number: raw.child_number,
            public_key,
            chain_code: raw.chain_code,
        })
    }
}

impl fmt::Display for ExtendedPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}
