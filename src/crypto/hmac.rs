use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::{Sha256, Sha384, Sha512};
use std::fmt;
use subtle::ConstantTimeEq;

use crate::error::{Error, Result};

/// Digest used for keyed signatures. Unknown names fall back to SHA-512.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HmacAlgorithm {
    Sha1,
    Sha256,
    Sha384,
    #[default]
    Sha512,
}

impl HmacAlgorithm {
    /// Parse `hs1`, `hs256`, `hs384`, `hs512` (or `sha*` spellings), case-insensitively.
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "hs1" | "sha1" => Self::Sha1,
            "hs256" | "sha256" => Self::Sha256,
            "hs384" | "sha384" => Self::Sha384,
            _ => Self::Sha512,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sha1 => "hs1",
            Self::Sha256 => "hs256",
            Self::Sha384 => "hs384",
            Self::Sha512 => "hs512",
        }
    }
}

impl fmt::Display for HmacAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

macro_rules! keyed_digest {
    ($digest:ty, $key:expr, $data:expr) => {{
        let mut mac = Hmac::<$digest>::new_from_slice($key)
            .map_err(|_| Error::invalid_input("hmac key rejected"))?;
        mac.update($data);
        mac.finalize().into_bytes().to_vec()
    }};
}

/// Raw HMAC digest of `data` keyed by `key`.
///
/// # Errors
/// Returns `InvalidInput` if the key is rejected by the MAC (HMAC accepts any length).
pub fn sign(algorithm: HmacAlgorithm, key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    let digest = match algorithm {
        HmacAlgorithm::Sha1 => keyed_digest!(Sha1, key, data),
        HmacAlgorithm::Sha256 => keyed_digest!(Sha256, key, data),
        HmacAlgorithm::Sha384 => keyed_digest!(Sha384, key, data),
        HmacAlgorithm::Sha512 => keyed_digest!(Sha512, key, data),
    };
    Ok(digest)
}

/// Lower-case hex HMAC digest of `data` keyed by `key`.
///
/// # Errors
/// See [`sign`].
pub fn sign_hex(algorithm: HmacAlgorithm, key: &str, data: &str) -> Result<String> {
    sign(algorithm, key.as_bytes(), data.as_bytes()).map(hex::encode)
}

/// Constant-time comparison of two signature strings.
pub(crate) fn signatures_match(expected: &str, candidate: &str) -> bool {
    expected.as_bytes().ct_eq(candidate.as_bytes()).into()
}
