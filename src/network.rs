//! Bitcoin network parameters.
//!
//! Every encoder in the crate takes its version bytes and human-readable
//! parts from here.

use crate::{HdError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Network type for key derivation and address encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Bitcoin,
    Testnet,
}

impl Network {
    pub const ALL: [Network; 2] = [Network::Bitcoin, Network::Testnet];

    /// Base58Check version byte for P2PKH addresses.
    pub fn p2pkh_version(&self) -> u8 {
        match self {
            Network::Bitcoin => 0x00,
            Network::Testnet => 0x6f,
        }
    }

    /// Base58Check version byte for P2SH addresses.
    pub fn p2sh_version(&self) -> u8 {
        match self {
            Network::Bitcoin => 0x05,
            Network::Testnet => 0xc4,
        }
    }

    /// Bech32 human-readable part for segwit addresses.
    pub fn bech32_hrp(&self) -> &'static str {
        match self {
            Network::Bitcoin => "bc",
            Network::Testnet => "tb",
        }
    }

    /// WIF prefix byte.
    pub fn wif_version(&self) -> u8 {
        match self {
            Network::Bitcoin => 0x80,
            Network::Testnet => 0xef,
        }
    }

    /// Extended private key version (xprv/tprv).
    pub fn private_version_bytes(&self) -> [u8; 4] {
        match self {
            Network::Bitcoin => [0x04, 0x88, 0xAD, 0xE4],
            Network::Testnet => [0x04, 0x35, 0x83, 0x94],
        }
    }

    /// Extended public key version (xpub/tpub).
    pub fn public_version_bytes(&self) -> [u8; 4] {
        match self {
            Network::Bitcoin => [0x04, 0x88, 0xB2, 0x1E],
            Network::Testnet => [0x04, 0x35, 0x87, 0xCF],
        }
    }

    pub fn from_p2pkh_version(version: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|n| n.p2pkh_version() == version)
    }

    pub fn from_p2sh_version(version: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|n| n.p2sh_version() == version)
    }

    pub fn from_bech32_hrp(hrp: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|n| n.bech32_hrp() == hrp)
    }

    pub fn from_wif_version(version: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|n| n.wif_version() == version)
    }

    pub fn from_private_version(version: [u8; 4]) -> Option<Self> {
        Self::ALL.into_iter().find(|n| n.private_version_bytes() == version)
    }

    pub fn from_public_version(version: [u8; 4]) -> Option<Self> {
        Self::ALL.into_iter().find(|n| n.public_version_bytes() == version)
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Bitcoin => write!(f, "bitcoin"),
            Network::Testnet => write!(f, "testnet"),
        }
    }
}

impl FromStr for Network {
    type Err = HdError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "bitcoin" | "mainnet" => Ok(Network::Bitcoin),
            "testnet" => Ok(Network::Testnet),
            other => Err(HdError::InvalidInput(format!("Unknown network: {}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_lookups() {
        assert_eq!(Network::from_p2pkh_version(0x00), Some(Network::Bitcoin));
        assert_eq!(Network::from_p2pkh_version(0x6f), Some(Network::Testnet));
        assert_eq!(Network::from_p2sh_version(0xc4), Some(Network::Testnet));
        assert_eq!(Network::from_p2sh_version(0x00), None);
        assert_eq!(Network::from_bech32_hrp("bc"), Some(Network::Bitcoin));
        assert_eq!(Network::from_bech32_hrp("bcrt"), None);
        assert_eq!(Network::from_wif_version(0xef), Some(Network::Testnet));
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!("mainnet".parse::<Network>().unwrap(), Network::Bitcoin);
        assert_eq!("Testnet".parse::<Network>().unwrap(), Network::Testnet);
        assert!("liquid".parse::<Network>().is_err());
        assert_eq!(Network::Testnet.to_string(), "testnet");
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&Network::Bitcoin).unwrap();
        assert_eq!(json, "\"bitcoin\"");
        let network: Network = serde_json::from_str("\"testnet\"").unwrap();
        assert_eq!(network, Network::Testnet);
    }
}
