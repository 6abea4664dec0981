//! Encrypted, signed session-cookie values: `MARKER|ciphertext|hmac`.
//!
//! Unprotecting fails open. A value that is not ours, cannot be decrypted, or
//! carries a bad signature comes back unchanged; the session token remains the
//! security boundary.

pub mod layer;

use std::sync::Arc;
use tracing::debug;

use crate::config::TokenConfig;
use crate::crypto::{CryptoProvider, HmacAlgorithm};
use crate::error::Result;

const SEPARATOR: char = '|';

#[derive(Clone, Debug)]
pub struct CookieProtector {
    crypto: Arc<CryptoProvider>,
    marker: String,
}

impl CookieProtector {
    #[must_use]
    pub fn new(crypto: Arc<CryptoProvider>, marker: impl Into<String>) -> Self {
        Self {
            crypto,
            marker: marker.into(),
        }
    }

    #[must_use]
    pub fn from_config(crypto: Arc<CryptoProvider>, config: &TokenConfig) -> Self {
        Self::new(crypto, config.cookie_marker())
    }

    #[must_use]
    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// # Errors
    /// Returns `Encryption` if the cipher fails.
    pub fn protect_cookie(&self, raw: &str) -> Result<String> {
        let ciphertext = self.crypto.aes_encrypt(raw, None)?;
        let signature = self.crypto.sign(raw, HmacAlgorithm::Sha256)?;
        Ok(format!(
            "{}{SEPARATOR}{ciphertext}{SEPARATOR}{signature}",
            self.marker
        ))
    }

    /// Recover the raw value, or return `value` untouched when it is not a
    /// valid protected cookie.
    #[must_use]
    pub fn unprotect_cookie(&self, value: &str) -> String {
        self.try_unprotect(value)
            .unwrap_or_else(|| value.to_string())
    }

    /// Like [`CookieProtector::unprotect_cookie`], but reports whether the value
    /// was recovered.
    #[must_use]
    pub fn try_unprotect(&self, value: &str) -> Option<String> {
        let fields: Vec<&str> = value.split(SEPARATOR).collect();
        let [marker, ciphertext, signature] = fields.as_slice() else {
            return None;
        };
        if *marker != self.marker {
            return None;
        }

        let Ok(raw) = self.crypto.aes_decrypt(ciphertext, None) else {
            debug!("protected cookie could not be decrypted");
            return None;
        };
        match self.crypto.verify(&raw, signature, HmacAlgorithm::Sha256) {
            Ok(true) => Some(raw),
            _ => {
                debug!("protected cookie signature mismatch");
                None
            }
        }
    }
}
