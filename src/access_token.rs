//! Two-layer encrypted envelope carrying a user's [`Claims`].
//!
//! The claims are encrypted under a one-time AES key, the one-time key is sealed
//! with the process RSA key, and the resulting envelope is encrypted again under
//! the master-secret key. The token is opaque to everything outside this module.

use base64ct::{Base64UrlUnpadded, Encoding};
use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::claims::Claims;
use crate::crypto::CryptoProvider;
use crate::error::{Error, Result};

pub const ENVELOPE_VERSION: u8 = 1;

const ONE_TIME_KEY_BYTES: usize = 32;

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    v: u8,
    #[serde(rename = "EncryptedKey")]
    encrypted_key: String,
    #[serde(rename = "EncryptedData")]
    encrypted_data: String,
}

#[derive(Clone, Debug)]
pub struct AccessTokenCodec {
    crypto: Arc<CryptoProvider>,
}

impl AccessTokenCodec {
    #[must_use]
    pub const fn new(crypto: Arc<CryptoProvider>) -> Self {
        Self { crypto }
    }

    /// Encode `claims` into an access token.
    ///
    /// # Errors
    /// Returns `InvalidInput` when the user id is blank, or `Encryption` if a
    /// cipher fails.
    #[instrument(skip_all, fields(user_id = %claims.user_id))]
    pub fn encode(&self, claims: &Claims) -> Result<String> {
        if claims.user_id.trim().is_empty() {
            return Err(Error::invalid_input("claims must carry a user id"));
        }

        let json = serde_json::to_string(claims).map_err(|_| Error::Encryption)?;
        let one_time_key = generate_one_time_key();

        let envelope = Envelope {
            v: ENVELOPE_VERSION,
            encrypted_key: self.crypto.rsa_encrypt(&one_time_key)?,
            encrypted_data: self.crypto.aes_encrypt(&json, Some(&one_time_key))?,
        };
        let envelope = serde_json::to_string(&envelope).map_err(|_| Error::Encryption)?;

        self.crypto.aes_encrypt(&envelope, None)
    }

    /// Decode an access token back into its claims.
    ///
    /// # Errors
    /// Every failure is `InvalidToken` with a short reason.
    #[instrument(skip_all)]
    pub fn decode(&self, token: &str) -> Result<Claims> {
        let envelope = self
            .crypto
            .aes_decrypt(token, None)
            .map_err(|_| Error::invalid_token("cannot decrypt"))?;

        let envelope: Envelope = serde_json::from_str(&envelope).map_err(|err| {
            debug!(error = %err, "access token envelope is malformed");
            Error::invalid_token("cannot parse")
        })?;
        if envelope.v != ENVELOPE_VERSION {
            return Err(Error::invalid_token("unsupported version"));
        }

        let one_time_key = self
            .crypto
            .rsa_decrypt(&envelope.encrypted_key)
            .map_err(|_| Error::invalid_token("cannot decrypt"))?;
        let json = self
            .crypto
            .aes_decrypt(&envelope.encrypted_data, Some(&one_time_key))
            .map_err(|_| Error::invalid_token("cannot decrypt"))?;

        serde_json::from_str(&json).map_err(|err| {
            debug!(error = %err, "access token claims are malformed");
            Error::invalid_token("cannot deserialize")
        })
    }
}

fn generate_one_time_key() -> String {
    let mut bytes = [0u8; ONE_TIME_KEY_BYTES];
    OsRng.fill_bytes(&mut bytes);
    Base64UrlUnpadded::encode_string(&bytes)
}
