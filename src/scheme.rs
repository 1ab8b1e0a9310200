//! Batch address generation over common derivation layouts.
//!
//! An [`AddressScheme`] is a base path plus the address types to render at
//! each index below it. The presets cover the layouts wallets commonly use:
//!
//! | preset   | path                    | address types            |
//! |----------|-------------------------|--------------------------|
//! | `legacy` | `m/0'/0'/i'`            | P2PKH                    |
//! | `bip44`  | `m/44'/c'/0'/0/i'`      | P2PKH                    |
//! | `bip49`  | `m/49'/c'/0'/0/i'`      | P2SH-P2WPKH              |
//! | `bip84`  | `m/84'/c'/0'/0/i'`      | P2WPKH                   |
//! | `simple` | `m/0/i'`                | P2SH-P2WPKH, P2WPKH      |
//!
//! `c` is the coin type, `0` on mainnet and `1` on testnet. The final index
//! is hardened by default; [`AddressScheme::with_hardened_index`] switches
//! it off.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::bip39::{Mnemonic, Seed, Wordlist};
use crate::error::{KeyError, PathError};
use crate::primitives::address::{Address, AddressType, Wif};
use crate::primitives::bip32::{ChildNumber, DerivationPath, ExtendedPrivateKey};
use crate::primitives::hash::Hasher;
use crate::types::HdConfig;
use crate::utils::logging::PerformanceTimer;
use crate::{HdError, Network, Result};

/// Named scheme layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemePreset {
    Legacy,
    Bip44,
    Bip49,
    Bip84,
    Simple,
}

impl SchemePreset {
    pub const ALL: [SchemePreset; 5] = [
        SchemePreset::Legacy,
        SchemePreset::Bip44,
        SchemePreset::Bip49,
        SchemePreset::Bip84,
        SchemePreset::Simple,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SchemePreset::Legacy => "legacy",
            SchemePreset::Bip44 => "bip44",
            SchemePreset::Bip49 => "bip49",
            SchemePreset::Bip84 => "bip84",
            SchemePreset::Simple => "simple",
        }
    }

    pub fn scheme(&self, network: Network) -> AddressScheme {
        let coin_type = match network {
            Network::Bitcoin => 0,
            Network::Testnet => 1,
        };
        let account = |purpose: u32| {
            vec![
                ChildNumber::hardened(purpose),
                ChildNumber::hardened(coin_type),
                ChildNumber::hardened(0),
                ChildNumber::normal(0),
            ]
        };

        let (steps, address_types) = match self {
            SchemePreset::Legacy => (
                vec![ChildNumber::hardened(0), ChildNumber::hardened(0)],
                vec![AddressType::P2pkh],
            ),
            SchemePreset::Bip44 => (account(44), vec![AddressType::P2pkh]),
            SchemePreset::Bip49 => (account(49), vec![AddressType::P2shP2wpkh]),
            SchemePreset::Bip84 => (account(84), vec![AddressType::P2wpkh]),
            SchemePreset::Simple => (
                vec![ChildNumber::normal(0)],
                vec![AddressType::P2shP2wpkh, AddressType::P2wpkh],
            ),
        };

        AddressScheme {
            name: self.name().to_string(),
            base_path: DerivationPath::new(steps),
            address_types,
            hardened_index: true,
        }
    }
}

impl fmt::Display for SchemePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SchemePreset {
    type Err = HdError;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_ascii_lowercase();
        SchemePreset::ALL
            .into_iter()
            .find(|preset| preset.name() == lower)
            .ok_or_else(|| HdError::InvalidInput(format!("unknown address scheme: {}", s)))
    }
}

/// A base path and the address types rendered for each index under it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressScheme {
    pub name: String,
    pub base_path: DerivationPath,
    pub address_types: Vec<AddressType>,
    /// Whether the final index segment is hardened
    pub hardened_index: bool,
}

impl AddressScheme {
    pub fn new(name: &str, base_path: DerivationPath, address_types: Vec<AddressType>) -> Self {
        Self {
            name: name.to_string(),
            base_path,
            address_types,
            hardened_index: true,
        }
    }

    pub fn with_hardened_index(mut self, hardened_index: bool) -> Self {
        self.hardened_index = hardened_index;
        self
    }

    fn child_number(&self, index: u32) -> Result<ChildNumber> {
        if index >= crate::primitives::bip32::HARDENED_OFFSET {
            return Err(PathError::Malformed(format!("index {} out of range", index)).into());
        }
        Ok(ChildNumber::new(index, self.hardened_index))
    }

    /// Full path of the key at `index`.
    pub fn path_for(&self, index: u32) -> Result<DerivationPath> {
        Ok(self.base_path.child(self.child_number(index)?))
    }
}

/// One generated address with its key material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedAddress {
    pub scheme: String,
    pub path: String,
    #[serde(rename = "script_type")]
    pub address_type: AddressType,
    pub address: String,
    pub public_key: String,
    pub private_key: String,
    pub wif: String,
}

/// Derives addresses for schemes from a single seed.
///
/// The seed is stretched once at construction; every later call only runs
/// BIP32 derivation.
pub struct AddressGenerator {
    master: ExtendedPrivateKey,
    hasher: Hasher,
}

impl AddressGenerator {
    pub fn from_seed(seed: &Seed, network: Network, hasher: Hasher) -> Result<Self> {
        let master = ExtendedPrivateKey::new_master(seed.as_bytes(), network)?;
        Ok(Self { master, hasher })
    }

    /// Validates `phrase` against `wordlist` before deriving the seed.
    pub fn from_mnemonic(
        wordlist: &Wordlist,
        phrase: &str,
        passphrase: &str,
        network: Network,
        hasher: Hasher,
    ) -> Result<Self> {
        let mnemonic = Mnemonic::parse(wordlist, phrase)?;

        let timer = PerformanceTimer::start("mnemonic_to_seed");
        let seed = mnemonic.to_seed(passphrase);
        timer.stop();

        Self::from_seed(&seed, network, hasher)
    }

    /// Like [`Self::from_mnemonic`], with network and backend from `config`.
    pub fn from_config(wordlist: &Wordlist, phrase: &str, passphrase: &str, config: &HdConfig) -> Result<Self> {
        config.validate()?;
        Self::from_mnemonic(wordlist, phrase, passphrase, config.network, config.hasher()?)
    }

    pub fn network(&self) -> Network {
        self.master.network()
    }

    pub fn master(&self) -> &ExtendedPrivateKey {
        &self.master
    }

    /// Addresses for `count` consecutive indices starting at `start`.
    ///
    /// A degenerate child key aborts the batch with
    /// [`PathError::InvalidChildKey`] naming the failing index.
    pub fn generate_range(&self, scheme: &AddressScheme, start: u32, count: u32) -> Result<Vec<DerivedAddress>> {
        let timer = PerformanceTimer::start(&format!("generate {}", scheme.name));

        let base = self.master.derive_path_with(&self.hasher, &scheme.base_path)?;
        let end = start
            .checked_add(count)
            .ok_or_else(|| HdError::InvalidInput(format!("index range {}+{} overflows", start, count)))?;

        let mut derived = Vec::with_capacity(count as usize * scheme.address_types.len());
        for index in start..end {
            let child = scheme.child_number(index)?;
            let key = base.derive_child_with(&self.hasher, child).map_err(|e| match e {
                KeyError::InvalidChildKey { index } => HdError::from(PathError::InvalidChildKey {
                    depth: base.depth().saturating_add(1),
                    index,
                }),
                other => other.into(),
            })?;
            let path = scheme.base_path.child(child).to_string();
            let wif = Wif::new(*key.private_key(), true, self.network())?.encode();

            for &address_type in &scheme.address_types {
                let address =
                    Address::from_public_key_with(&self.hasher, key.public_key(), address_type, self.network());
                derived.push(DerivedAddress {
                    scheme: scheme.name.clone(),
                    path: path.clone(),
                    address_type,
                    address: address.into_string(),
                    public_key: hex::encode(key.public_key()),
                    private_key: hex::encode(key.private_key()),
                    wif: wif.clone(),
                });
            }
        }

        let elapsed = timer.stop();
        log::info!(
            "Derived {} addresses for scheme '{}' in {:?}",
            derived.len(),
            scheme.name,
            elapsed
        );
        Ok(derived)
    }

    pub fn generate(&self, scheme: &AddressScheme, count: u32) -> Result<Vec<DerivedAddress>> {
        self.generate_range(scheme, 0, count)
    }

    /// Runs every preset in order on this generator's network.
    pub fn generate_presets(&self, presets: &[SchemePreset], count: u32) -> Result<Vec<DerivedAddress>> {
        let mut all = Vec::new();
        for preset in presets {
            all.extend(self.generate(&preset.scheme(self.network()), count)?);
        }
        Ok(all)
    }

    /// Runs `config.schemes` with `config.address_count` indices each.
    ///
    /// The network comes from the generator, not from `config`.
    pub fn generate_configured(&self, config: &HdConfig) -> Result<Vec<DerivedAddress>> {
        config.validate()?;
        self.generate_presets(&config.schemes, config.address_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bip39::Language;
    use crate::error::MnemonicError;

    const MOTOR_VENTURE: &str =
        "motor venture dilemma quote subject magnet keep large dry gossip bean paper";

    fn generator() -> AddressGenerator {
        AddressGenerator::from_mnemonic(
            &Language::English.wordlist(),
            MOTOR_VENTURE,
            "",
            Network::Bitcoin,
            Hasher::detect(),
        )
        .unwrap()
    }

    #[test]
    fn test_preset_paths() {
        let bip44 = SchemePreset::Bip44.scheme(Network::Bitcoin);
        assert_eq!(bip44.path_for(0).unwrap().to_string(), "m/44'/0'/0'/0/0'");

        let testnet = SchemePreset::Bip84.scheme(Network::Testnet);
        assert_eq!(testnet.path_for(3).unwrap().to_string(), "m/84'/1'/0'/0/3'");

        let simple = SchemePreset::Simple.scheme(Network::Bitcoin).with_hardened_index(false);
        assert_eq!(simple.path_for(7).unwrap().to_string(), "m/0/7");

        assert!(bip44.path_for(0x8000_0000).is_err());
    }

    #[test]
    fn test_preset_names() {
        for preset in SchemePreset::ALL {
            assert_eq!(preset.name().parse::<SchemePreset>().unwrap(), preset);
        }
        assert_eq!("BIP84".parse::<SchemePreset>().unwrap(), SchemePreset::Bip84);
        assert!("bip32".parse::<SchemePreset>().is_err());
    }

    #[test]
    fn test_first_addresses_per_preset() {
        let generator = generator();

        let legacy = generator.generate(&SchemePreset::Legacy.scheme(Network::Bitcoin), 1).unwrap();
        assert_eq!(legacy[0].address, "1GyNWR7LPXdLSHeN4nE4b9P3gNEcjZkmzd");

        let bip49 = generator.generate(&SchemePreset::Bip49.scheme(Network::Bitcoin), 1).unwrap();
        assert_eq!(bip49[0].address, "33ML21FE9QSqh9wizdQbZsHfE41vwkRT78");
        assert_eq!(bip49[0].wif, "L29EPxkvYEucHGyXz5sHnzmkU9VQQDHG98wB2kMRG5U4Gxmb2PeA");

        let simple = generator.generate(&SchemePreset::Simple.scheme(Network::Bitcoin), 1).unwrap();
        assert_eq!(simple.len(), 2);
        assert_eq!(simple[0].address, "3HWZMAtc7MyENWguyhWaLrLjXpWTMpfZLh");
        assert_eq!(simple[1].address, "bc1qe59ssevhzy9v76syff0508ml97xm0rstcfdw0y");
        assert_eq!(simple[0].path, "m/0/0'");
        assert_eq!(simple[0].public_key, simple[1].public_key);
    }

    #[test]
    fn test_range_matches_individual_paths() {
        let generator = generator();
        let scheme = SchemePreset::Bip84.scheme(Network::Bitcoin);

        let batch = generator.generate_range(&scheme, 2, 3).unwrap();
        assert_eq!(batch.len(), 3);
        assert_eq!(batch[0].path, "m/84'/0'/0'/0/2'");

        let direct = generator.master().derive_path(&scheme.path_for(4).unwrap()).unwrap();
        assert_eq!(batch[2].private_key, hex::encode(direct.private_key()));
    }

    #[test]
    fn test_presets_and_serialization() {
        let generator = generator();
        let all = generator.generate_presets(&SchemePreset::ALL, 2).unwrap();
        // simple renders two address types per index
        assert_eq!(all.len(), 2 * 4 + 4);

        let json = serde_json::to_value(&all[0]).unwrap();
        assert_eq!(json["script_type"], "p2pkh");
        assert_eq!(json["scheme"], "legacy");
        assert_eq!(json["path"], "m/0'/0'/0'");
    }

    #[test]
    fn test_generate_configured() {
        let generator = generator();
        let config = HdConfig {
            address_count: 3,
            schemes: vec![SchemePreset::Bip84, SchemePreset::Simple],
            ..HdConfig::default()
        };
        let derived = generator.generate_configured(&config).unwrap();
        assert_eq!(derived.len(), 3 + 3 * 2);
        assert_eq!(derived[0].address, "bc1qnc9umhdc04u0u5qfg0qu3aj75wvfps4z4sj7g6");
        assert_eq!(derived[2].path, "m/84'/0'/0'/0/2'");
        assert_eq!(derived[3].scheme, "simple");

        let empty = HdConfig {
            schemes: Vec::new(),
            ..HdConfig::default()
        };
        assert!(matches!(generator.generate_configured(&empty), Err(HdError::InvalidInput(_))));
    }

    #[test]
    fn test_invalid_mnemonic_rejected() {
        let result = AddressGenerator::from_mnemonic(
            &Language::English.wordlist(),
            "motor venture dilemma quote subject magnet keep large dry gossip bean papers",
            "",
            Network::Bitcoin,
            Hasher::detect(),
        );
        assert!(matches!(result, Err(HdError::Mnemonic(MnemonicError::UnknownWord { position: 11, .. }))));
    }

    #[test]
    fn test_testnet_generation() {
        let config = HdConfig {
            network: Network::Testnet,
            ..HdConfig::default()
        };
        let generator =
            AddressGenerator::from_config(&Language::English.wordlist(), MOTOR_VENTURE, "", &config).unwrap();
        let derived = generator.generate(&SchemePreset::Bip84.scheme(Network::Testnet), 1).unwrap();
        assert!(derived[0].address.starts_with("tb1q"));
        assert!(derived[0].wif.starts_with('c'));
    }
}
