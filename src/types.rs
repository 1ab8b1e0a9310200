use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::primitives::hash::{Hasher, Ripemd160Backend};
use crate::scheme::SchemePreset;
use crate::{HdError, Network, Result};

// Re-export logging types
pub use crate::utils::logging::LogLevel;

/// Upper bound on `address_count`.
pub const MAX_ADDRESS_COUNT: u32 = 10_000;

/// RIPEMD-160 backend selection as written in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RipemdSetting {
    /// Use the best backend compiled in.
    #[default]
    Auto,
    Native,
    Portable,
}

impl RipemdSetting {
    /// Turn the setting into a hasher, failing when `native` is requested
    /// from a build without the `native-ripemd160` feature.
    pub fn resolve(self) -> Result<Hasher> {
        let hasher = match self {
            RipemdSetting::Auto => Hasher::detect(),
            RipemdSetting::Native => Hasher::with_backend(Ripemd160Backend::Native)?,
            RipemdSetting::Portable => Hasher::with_backend(Ripemd160Backend::Portable)?,
        };
        log::debug!("RIPEMD160 backend: {}", hasher.backend());
        Ok(hasher)
    }
}

impl fmt::Display for RipemdSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RipemdSetting::Auto => f.write_str("auto"),
            RipemdSetting::Native => f.write_str("native"),
            RipemdSetting::Portable => f.write_str("portable"),
        }
    }
}

impl FromStr for RipemdSetting {
    type Err = HdError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(RipemdSetting::Auto),
            "native" => Ok(RipemdSetting::Native),
            "portable" => Ok(RipemdSetting::Portable),
            other => Err(HdError::InvalidInput(format!("unknown RIPEMD160 setting: {}", other))),
        }
    }
}

/// Library configuration, usually loaded through
/// [`ConfigManager`](crate::utils::config::ConfigManager).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct HdConfig {
    pub log_level: LogLevel,
    pub network: Network,
    pub ripemd160: RipemdSetting,
    /// Addresses generated per scheme
    pub address_count: u32,
    pub schemes: Vec<SchemePreset>,
}

impl Default for HdConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Warn,
            network: Network::Bitcoin,
            ripemd160: RipemdSetting::Auto,
            address_count: 5,
            schemes: SchemePreset::ALL.to_vec(),
        }
    }
}

impl HdConfig {
    pub fn validate(&self) -> Result<()> {
        if self.address_count == 0 || self.address_count > MAX_ADDRESS_COUNT {
            return Err(HdError::InvalidInput(format!(
                "address_count must be between 1 and {}, got {}",
                MAX_ADDRESS_COUNT, self.address_count
            )));
        }
        if self.schemes.is_empty() {
            return Err(HdError::InvalidInput("at least one address scheme is required".to_string()));
        }
        Ok(())
    }

    pub fn hasher(&self) -> Result<Hasher> {
        self.ripemd160.resolve()
    }
}
