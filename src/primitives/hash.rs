//! Bitcoin hashing utilities.
//!
//! SHA-256 and SHA-512 come from `sha2`; HMAC and PBKDF2 from `hmac` and
//! `pbkdf2`. RIPEMD-160 goes through a [`Ripemd160Backend`] chosen once and
//! carried by a [`Hasher`], so that the native and portable implementations
//! are interchangeable at every call site that needs `hash160`.

use crate::primitives::ripemd160;
use crate::{HdError, Result};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha512};
use std::fmt;
use std::str::FromStr;

type HmacSha512 = Hmac<Sha512>;

/// SHA256(data).
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// A standard Double-SHA256 is SHA256(SHA256(data)).
pub fn sha256d(data: &[u8]) -> [u8; 32] {
    Sha256::digest(Sha256::digest(data)).into()
}

/// SHA512(data).
pub fn sha512(data: &[u8]) -> [u8; 64] {
    Sha512::digest(data).into()
}

/// HMAC-SHA512 with the given key.
pub fn hmac_sha512(key: &[u8], data: &[u8]) -> [u8; 64] {
    hmac_sha512_parts(key, &[data])
}

/// HMAC-SHA512 over the concatenation of `parts`, without building the
/// concatenated buffer.
pub fn hmac_sha512_parts(key: &[u8], parts: &[&[u8]]) -> [u8; 64] {
    let mut mac = HmacSha512::new_from_slice(key).expect("HMAC accepts any key length");
    for part in parts {
        mac.update(part);
    }
    mac.finalize().into_bytes().into()
}

/// PBKDF2-HMAC-SHA512 producing a 64-byte key.
pub fn pbkdf2_sha512(password: &[u8], salt: &[u8], rounds: u32) -> [u8; 64] {
    let mut out = [0u8; 64];
    pbkdf2::pbkdf2_hmac::<Sha512>(password, salt, rounds, &mut out);
    out
}

/// Which RIPEMD-160 implementation to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ripemd160Backend {
    /// The `ripemd` crate (requires the `native-ripemd160` feature).
    Native,
    /// The in-crate implementation in [`crate::primitives::ripemd160`].
    Portable,
}

impl Ripemd160Backend {
    /// Best backend compiled into this build.
    pub const fn detect() -> Self {
        if cfg!(feature = "native-ripemd160") {
            Ripemd160Backend::Native
        } else {
            Ripemd160Backend::Portable
        }
    }

    /// Whether this backend is compiled in.
    pub const fn is_available(self) -> bool {
        match self {
            Ripemd160Backend::Native => cfg!(feature = "native-ripemd160"),
            Ripemd160Backend::Portable => true,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Ripemd160Backend::Native => "native",
            Ripemd160Backend::Portable => "portable",
        }
    }

    pub fn digest(self, data: &[u8]) -> [u8; 20] {
        match self {
            Ripemd160Backend::Native => native_ripemd160(data),
            Ripemd160Backend::Portable => ripemd160::digest(data),
        }
    }
}

impl Default for Ripemd160Backend {
    fn default() -> Self {
        Self::detect()
    }
}

impl fmt::Display for Ripemd160Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Ripemd160Backend {
    type Err = HdError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "native" => Ok(Ripemd160Backend::Native),
            "portable" => Ok(Ripemd160Backend::Portable),
            other => Err(HdError::InvalidInput(format!("Unknown RIPEMD160 backend: {}", other))),
        }
    }
}

#[cfg(feature = "native-ripemd160")]
fn native_ripemd160(data: &[u8]) -> [u8; 20] {
    use ripemd::Ripemd160;
    Ripemd160::digest(data).into()
}

// `Native` cannot be selected through `Hasher::with_backend` in this build,
// but the enum is still matchable; answer with the identical portable digest.
#[cfg(not(feature = "native-ripemd160"))]
fn native_ripemd160(data: &[u8]) -> [u8; 20] {
    ripemd160::digest(data)
}

/// Hash context carrying the selected RIPEMD-160 backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hasher {
    ripemd160: Ripemd160Backend,
}

impl Hasher {
    /// Hasher using the best backend in this build.
    pub const fn detect() -> Self {
        Self {
            ripemd160: Ripemd160Backend::detect(),
        }
    }

    /// Hasher pinned to `backend`; fails if it was not compiled in.
    pub fn with_backend(backend: Ripemd160Backend) -> Result<Self> {
        if !backend.is_available() {
            return Err(HdError::InvalidInput(format!(
                "RIPEMD160 backend '{}' is not available in this build",
                backend
            )));
        }
        Ok(Self { ripemd160: backend })
    }

    pub fn backend(&self) -> Ripemd160Backend {
        self.ripemd160
    }

    pub fn ripemd160(&self, data: &[u8]) -> [u8; 20] {
        self.ripemd160.digest(data)
    }

    /// A standard Hash160 is RIPEMD160(SHA256(data)).
    pub fn hash160(&self, data: &[u8]) -> [u8; 20] {
        self.ripemd160(&sha256(data))
    }
}

impl Default for Hasher {
    fn default() -> Self {
        Self::detect()
    }
}

/// RIPEMD160(data) with the detected backend.
pub fn ripemd160(data: &[u8]) -> [u8; 20] {
    Hasher::detect().ripemd160(data)
}

/// RIPEMD160(SHA256(data)) with the detected backend.
pub fn hash160(data: &[u8]) -> [u8; 20] {
    Hasher::detect().hash160(data)
}
