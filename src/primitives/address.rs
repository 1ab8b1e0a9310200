//! Bitcoin addresses and WIF private keys.
//!
//! Three single-key address forms are supported: legacy P2PKH, P2SH-wrapped
//! P2WPKH and native P2WPKH. All of them commit to `hash160` of the
//! compressed public key; the [`Hasher`] passed in decides which RIPEMD-160
//! backend computes it.

use crate::error::{EncodingError, KeyError};
use crate::network::Network;
use crate::primitives::hash::Hasher;
use crate::primitives::{base58, bech32, ec};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const OP_0: u8 = 0x00;
const OP_PUSHBYTES_20: u8 = 0x14;
const OP_DUP: u8 = 0x76;
const OP_HASH160: u8 = 0xa9;
const OP_EQUAL: u8 = 0x87;
const OP_EQUALVERIFY: u8 = 0x88;
const OP_CHECKSIG: u8 = 0xac;

/// Script type an address pays to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AddressType {
    /// Pay-to-Pubkey-Hash, Base58Check.
    #[serde(rename = "p2pkh")]
    P2pkh,
    /// P2WPKH nested in Pay-to-Script-Hash, Base58Check.
    #[serde(rename = "p2sh-p2wpkh")]
    P2shP2wpkh,
    /// Native segwit v0 key hash, Bech32.
    #[serde(rename = "p2wpkh")]
    P2wpkh,
}

impl AddressType {
    pub const ALL: [AddressType; 3] = [AddressType::P2pkh, AddressType::P2shP2wpkh, AddressType::P2wpkh];

    pub fn as_str(&self) -> &'static str {
        match self {
            AddressType::P2pkh => "p2pkh",
            AddressType::P2shP2wpkh => "p2sh-p2wpkh",
            AddressType::P2wpkh => "p2wpkh",
        }
    }
}

impl fmt::Display for AddressType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AddressType {
    type Err = crate::HdError;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "p2pkh" | "legacy" => Ok(AddressType::P2pkh),
            "p2sh-p2wpkh" | "p2wpkh-p2sh" | "nested-segwit" => Ok(AddressType::P2shP2wpkh),
            "p2wpkh" | "segwit" | "native-segwit" => Ok(AddressType::P2wpkh),
            other => Err(crate::HdError::InvalidInput(format!("Unknown address type: {}", other))),
        }
    }
}

/// `OP_0 <20-byte key hash>`: the witness program of P2WPKH, which is also
/// the redeem script of P2SH-P2WPKH.
pub fn p2wpkh_script(key_hash: &[u8; 20]) -> [u8; 22] {
    let mut script = [0u8; 22];
    script[0] = OP_0;
    script[1] = OP_PUSHBYTES_20;
    script[2..].copy_from_slice(key_hash);
    script
}

/// An encoded address together with its script type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address {
    network: Network,
    address_type: AddressType,
    /// Key hash for P2PKH/P2WPKH, script hash for P2SH.
    hash: [u8; 20],
    encoded: String,
}

impl Address {
    /// Address for a compressed public key using the default hasher.
    pub fn from_public_key(public_key: &[u8; 33], address_type: AddressType, network: Network) -> Self {
        Self::from_public_key_with(&Hasher::default(), public_key, address_type, network)
    }

    pub fn from_public_key_with(
        hasher: &Hasher,
        public_key: &[u8; 33],
        address_type: AddressType,
        network: Network,
    ) -> Self {
        let key_hash = hasher.hash160(public_key);
        match address_type {
            AddressType::P2pkh => Self::p2pkh(key_hash, network),
            AddressType::P2shP2wpkh => {
                let script_hash = hasher.hash160(&p2wpkh_script(&key_hash));
                Self::p2sh(script_hash, network)
            }
            AddressType::P2wpkh => Self::p2wpkh(key_hash, network),
        }
    }

    fn p2pkh(key_hash: [u8; 20], network: Network) -> Self {
        Address {
            network,
            address_type: AddressType::P2pkh,
            hash: key_hash,
            encoded: base58::check_encode_versioned(network.p2pkh_version(), &key_hash),
        }
    }

    fn p2sh(script_hash: [u8; 20], network: Network) -> Self {
        Address {
            network,
            address_type: AddressType::P2shP2wpkh,
            hash: script_hash,
            encoded: base58::check_encode_versioned(network.p2sh_version(), &script_hash),
        }
    }

    fn p2wpkh(key_hash: [u8; 20], network: Network) -> Self {
        let encoded = bech32::encode(network.bech32_hrp(), 0, &key_hash)
            .expect("network HRPs and 20-byte v0 programs always encode");
        Address {
            network,
            address_type: AddressType::P2wpkh,
            hash: key_hash,
            encoded,
        }
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn address_type(&self) -> AddressType {
        self.address_type
    }

    /// The 20-byte hash the address commits to.
    pub fn hash(&self) -> &[u8; 20] {
        &self.hash
    }

    pub fn as_str(&self) -> &str {
        &self.encoded
    }

    pub fn into_string(self) -> String {
        self.encoded
    }

    /// Locking script for this address.
    pub fn script_pubkey(&self) -> Vec<u8> {
        match self.address_type {
            AddressType::P2pkh => {
                let mut script = Vec::with_capacity(25);
                script.extend_from_slice(&[OP_DUP, OP_HASH160, OP_PUSHBYTES_20]);
                script.extend_from_slice(&self.hash);
                script.extend_from_slice(&[OP_EQUALVERIFY, OP_CHECKSIG]);
                script
            }
            AddressType::P2shP2wpkh => {
                let mut script = Vec::with_capacity(23);
                script.extend_from_slice(&[OP_HASH160, OP_PUSHBYTES_20]);
                script.extend_from_slice(&self.hash);
                script.push(OP_EQUAL);
                script
            }
            AddressType::P2wpkh => p2wpkh_script(&self.hash).to_vec(),
        }
    }

    fn from_bech32(s: &str) -> Result<Self, EncodingError> {
        let decoded = bech32::decode(s)?;
        let network =
            Network::from_bech32_hrp(&decoded.hrp).ok_or_else(|| EncodingError::UnknownHrp(decoded.hrp.clone()))?;

        // P2WSH programs are valid segwit but not a single-key address.
        let key_hash: [u8; 20] = decoded.program.as_slice().try_into().map_err(|_| {
            EncodingError::UnsupportedWitness {
                version: decoded.version,
                length: decoded.program.len(),
            }
        })?;
        Ok(Self::p2wpkh(key_hash, network))
    }

    fn from_base58(s: &str) -> Result<Self, EncodingError> {
        let (version, payload) = base58::check_decode_versioned(s)?;
        let hash: [u8; 20] = payload.as_slice().try_into().map_err(|_| EncodingError::InvalidLength {
            expected: 20,
            got: payload.len(),
        })?;

        if let Some(network) = Network::from_p2pkh_version(version) {
            Ok(Self::p2pkh(hash, network))
        } else if let Some(network) = Network::from_p2sh_version(version) {
            Ok(Self::p2sh(hash, network))
        } else {
            Err(EncodingError::UnknownVersion(format!("{:#04x}", version)))
        }
    }
}

impl FromStr for Address {
    type Err = EncodingError;

    /// Decodes any of the three address types, detecting the network.
    ///
    /// P2SH addresses come back tagged [`AddressType::P2shP2wpkh`], the only
    /// P2SH form this crate produces.
    fn from_str(s: &str) -> Result<Self, EncodingError> {
        let is_segwit = s
            .rfind('1')
            .map(|sep| Network::from_bech32_hrp(&s[..sep].to_ascii_lowercase()).is_some())
            .unwrap_or(false);

        if is_segwit {
            Self::from_bech32(s)
        } else {
            Self::from_base58(s)
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encoded)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.encoded
    }
}

/// Wallet Import Format private key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wif {
    pub network: Network,
    pub private_key: [u8; 32],
    pub compressed: bool,
}

impl Wif {
    /// Validates the key range before wrapping it.
    pub fn new(private_key: [u8; 32], compressed: bool, network: Network) -> Result<Self, KeyError> {
        ec::validate_private_key(&private_key)?;
        Ok(Wif {
            network,
            private_key,
            compressed,
        })
    }

    /// `version || key || [0x01] || checksum`, Base58.
    pub fn encode(&self) -> String {
        let mut payload = Vec::with_capacity(33);
        payload.extend_from_slice(&self.private_key);
        if self.compressed {
            payload.push(0x01);
        }
        base58::check_encode_versioned(self.network.wif_version(), &payload)
    }

    /// Public key in the form the WIF flag asks for.
    pub fn public_key(&self) -> Result<Vec<u8>, KeyError> {
        let secret = ec::validate_private_key(&self.private_key)?;
        let public = secp256k1::PublicKey::from_secret_key(secp256k1::SECP256K1, &secret);
        Ok(if self.compressed {
            public.serialize().to_vec()
        } else {
            public.serialize_uncompressed().to_vec()
        })
    }
}

impl FromStr for Wif {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, EncodingError> {
        let (version, payload) = base58::check_decode_versioned(s)?;
        let network = Network::from_wif_version(version)
            .ok_or_else(|| EncodingError::UnknownVersion(format!("{:#04x}", version)))?;

        let compressed = match payload.len() {
            32 => false,
            33 if payload[32] == 0x01 => true,
            33 => return Err(EncodingError::InvalidCompressionFlag(payload[32])),
            got => return Err(EncodingError::InvalidLength { expected: 33, got }),
        };

        let mut private_key = [0u8; 32];
        private_key.copy_from_slice(&payload[..32]);
        Ok(Wif::new(private_key, compressed, network)?)
    }
}

impl fmt::Display for Wif {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

/// Encodes a private key as WIF after checking `0 < k < n`.
pub fn to_wif(private_key: &[u8; 32], compressed: bool, network: Network) -> Result<String, KeyError> {
    Wif::new(*private_key, compressed, network).map(|wif| wif.encode())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::hash::Ripemd160Backend;

    // Mastering Bitcoin, chapter 4.
    const MB_PRIVATE_KEY: &str = "1e99423a4ed27608a15a2616a2b0e9e52ced330ac530edcc32c8ffc6a526aedd";

    fn mb_key() -> [u8; 32] {
        hex::decode(MB_PRIVATE_KEY).unwrap().try_into().unwrap()
    }

    fn key_one_pubkey() -> [u8; 33] {
        let mut one = [0u8; 32];
        one[31] = 1;
        ec::derive_public_key(&one).unwrap()
    }

    #[test]
    fn test_p2pkh_address() {
        let public_key = ec::derive_public_key(&mb_key()).unwrap();
        let address = Address::from_public_key(&public_key, AddressType::P2pkh, Network::Bitcoin);
        assert_eq!(address.to_string(), "1J7mdg5rbQyUHENYdx39WVWK7fsLpEoXZy");
        assert_eq!(address.address_type(), AddressType::P2pkh);
    }

    #[test]
    fn test_generator_addresses() {
        // Private key 1, compressed.
        let pk = key_one_pubkey();
        assert_eq!(
            Address::from_public_key(&pk, AddressType::P2pkh, Network::Bitcoin).as_str(),
            "1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMH"
        );
        assert_eq!(
            Address::from_public_key(&pk, AddressType::P2wpkh, Network::Bitcoin).as_str(),
            "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4"
        );
        assert_eq!(
            Address::from_public_key(&pk, AddressType::P2wpkh, Network::Testnet).as_str(),
            "tb1qw508d6qejxtdg4y5r3zarvary0c5xw7kxpjzsx"
        );
    }

    #[test]
    fn test_script_pubkeys() {
        let pk = key_one_pubkey();
        let hash = "751e76e8199196d454941c45d1b3a323f1433bd6";

        let p2pkh = Address::from_public_key(&pk, AddressType::P2pkh, Network::Bitcoin);
        assert_eq!(hex::encode(p2pkh.script_pubkey()), format!("76a914{}88ac", hash));

        let p2wpkh = Address::from_public_key(&pk, AddressType::P2wpkh, Network::Bitcoin);
        assert_eq!(hex::encode(p2wpkh.script_pubkey()), format!("0014{}", hash));

        let p2sh = Address::from_public_key(&pk, AddressType::P2shP2wpkh, Network::Bitcoin);
        let script = p2sh.script_pubkey();
        assert_eq!(script.len(), 23);
        assert_eq!(script[0], OP_HASH160);
        assert_eq!(script[22], OP_EQUAL);
        assert_eq!(&script[2..22], &Hasher::default().hash160(&p2wpkh_script(p2wpkh.hash()))[..]);
    }

    #[test]
    fn test_backend_choice_does_not_change_addresses() {
        let pk = key_one_pubkey();
        let portable = Hasher::with_backend(Ripemd160Backend::Portable).unwrap();
        for address_type in AddressType::ALL {
            assert_eq!(
                Address::from_public_key_with(&portable, &pk, address_type, Network::Bitcoin),
                Address::from_public_key(&pk, address_type, Network::Bitcoin)
            );
        }
    }

    #[test]
    fn test_decode_roundtrip_all_types() {
        let pk = key_one_pubkey();
        for network in Network::ALL {
            for address_type in AddressType::ALL {
                let address = Address::from_public_key(&pk, address_type, network);
                let decoded: Address = address.as_str().parse().unwrap();
                assert_eq!(decoded, address);
                assert_eq!(decoded.network(), network);
            }
        }
    }

    #[test]
    fn test_decode_errors() {
        assert_eq!(
            "1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMi".parse::<Address>(),
            Err(EncodingError::ChecksumMismatch)
        );
        // P2WSH is valid segwit but not a key address.
        assert_eq!(
            "tb1qrp33g0q5c5txsp9arysrx4k6zdkfs4nce4xj0gdcccefvpysxf3q0sl5k7".parse::<Address>(),
            Err(EncodingError::UnsupportedWitness { version: 0, length: 32 })
        );
        assert_eq!(
            "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t5".parse::<Address>(),
            Err(EncodingError::ChecksumMismatch)
        );
        // One substituted character in an otherwise valid P2WPKH address.
        assert_eq!(
            "bc1qnc9umhdc04u0u5qfg0qu3aj75wvfps4z4sj7g7".parse::<Address>(),
            Err(EncodingError::ChecksumMismatch)
        );
        // Version byte 0x30 (Litecoin P2PKH).
        let foreign = base58::check_encode_versioned(0x30, &[0u8; 20]);
        assert!(matches!(foreign.parse::<Address>(), Err(EncodingError::UnknownVersion(_))));
    }

    #[test]
    fn test_wif_encoding() {
        let key = mb_key();
        assert_eq!(
            to_wif(&key, false, Network::Bitcoin).unwrap(),
            "5J3mBbAH58CpQ3Y5RNJpUKPE62SQ5tfcvU2JpbnkeyhfsYB1Jcn"
        );
        assert_eq!(
            to_wif(&key, true, Network::Bitcoin).unwrap(),
            "KxFC1jmwwCoACiCAWZ3eXa96mBM6tb3TYzGmf6YwgdGWZgawvrtJ"
        );
    }

    #[test]
    fn test_wif_rejects_invalid_keys() {
        assert_eq!(to_wif(&[0u8; 32], true, Network::Bitcoin), Err(KeyError::InvalidPrivateKey));
        assert_eq!(to_wif(&ec::CURVE_ORDER, true, Network::Bitcoin), Err(KeyError::InvalidPrivateKey));
    }

    #[test]
    fn test_wif_decoding() {
        let wif: Wif = "KxFC1jmwwCoACiCAWZ3eXa96mBM6tb3TYzGmf6YwgdGWZgawvrtJ".parse().unwrap();
        assert_eq!(wif.private_key, mb_key());
        assert!(wif.compressed);
        assert_eq!(wif.network, Network::Bitcoin);
        assert_eq!(wif.public_key().unwrap().len(), 33);

        let wif: Wif = "5J3mBbAH58CpQ3Y5RNJpUKPE62SQ5tfcvU2JpbnkeyhfsYB1Jcn".parse().unwrap();
        assert!(!wif.compressed);
        assert_eq!(wif.public_key().unwrap().len(), 65);

        let testnet = to_wif(&mb_key(), true, Network::Testnet).unwrap();
        assert!(testnet.starts_with('c'));
        assert_eq!(testnet.parse::<Wif>().unwrap().network, Network::Testnet);
    }

    #[test]
    fn test_wif_bad_compression_flag() {
        let mut payload = mb_key().to_vec();
        payload.push(0x02);
        let encoded = base58::check_encode_versioned(0x80, &payload);
        assert_eq!(
            encoded.parse::<Wif>(),
            Err(EncodingError::InvalidCompressionFlag(0x02))
        );

        // Wrong lengths still report the length.
        let mut payload = mb_key().to_vec();
        payload.extend_from_slice(&[0x01, 0x01]);
        let encoded = base58::check_encode_versioned(0x80, &payload);
        assert_eq!(
            encoded.parse::<Wif>(),
            Err(EncodingError::InvalidLength { expected: 33, got: 34 })
        );
    }

    #[test]
    fn test_address_type_names() {
        assert_eq!("P2SH-P2WPKH".parse::<AddressType>().unwrap(), AddressType::P2shP2wpkh);
        assert_eq!("p2wpkh".parse::<AddressType>().unwrap(), AddressType::P2wpkh);
        assert!("p2tr".parse::<AddressType>().is_err());
        assert_eq!(serde_json::to_string(&AddressType::P2shP2wpkh).unwrap(), "\"p2sh-p2wpkh\"");
    }
}
