//! Key derivation and the symmetric, asymmetric and keyed-hash primitives every
//! codec builds on.
//!
//! Symmetric keys are a pure function of a secret string and an optional
//! context, so processes sharing the master secret decrypt each other's output.
//! The provider is built once at startup and is read-only afterwards; share it
//! behind an `Arc`.

mod aes;
pub mod hmac;
mod keys;

use base64ct::{Base64, Encoding};
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha384};
use std::fmt;
use tracing::debug;

use crate::config::TokenConfig;
use crate::error::{Error, Result};

pub use self::hmac::HmacAlgorithm;
pub use self::keys::{PublicKeyInfo, seal_private_key};
use self::keys::{KeyPair, SEALED_KEY_CONTEXT};

/// A 256-bit AES key and a 128-bit IV derived from secret material.
#[derive(Clone, PartialEq, Eq)]
pub struct SymmetricKey {
    key: [u8; 32],
    iv: [u8; 16],
}

impl SymmetricKey {
    /// Derive key and IV from `material`, optionally scoped by `context`.
    /// Blank contexts are ignored.
    #[must_use]
    pub fn derive(material: &str, context: Option<&str>) -> Self {
        let mut hasher = Sha384::new();
        hasher.update(material.as_bytes());
        if let Some(context) = context.filter(|c| !c.trim().is_empty()) {
            hasher.update(b":");
            hasher.update(context.as_bytes());
        }
        let digest = hasher.finalize();
        let (key_bytes, iv_bytes) = digest.split_at(32);

        let mut key = [0u8; 32];
        key.copy_from_slice(key_bytes);
        let mut iv = [0u8; 16];
        iv.copy_from_slice(iv_bytes);
        Self { key, iv }
    }

    #[must_use]
    pub const fn key(&self) -> &[u8; 32] {
        &self.key
    }

    #[must_use]
    pub const fn iv(&self) -> &[u8; 16] {
        &self.iv
    }
}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SymmetricKey(REDACTED)")
    }
}

pub struct CryptoProvider {
    master_secret: SecretString,
    default_key: SymmetricKey,
    key_pair: KeyPair,
}

impl fmt::Debug for CryptoProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CryptoProvider")
            .field("key_pair", &self.key_pair)
            .finish_non_exhaustive()
    }
}

impl CryptoProvider {
    /// Build the provider from the master secret and the sealed RSA key blob.
    ///
    /// # Errors
    /// Returns `KeyInitialization` if the secret is blank or the key blob cannot
    /// be unsealed and parsed.
    pub fn new(master_secret: SecretString, sealed_rsa_key: &str) -> Result<Self> {
        let secret = master_secret.expose_secret();
        if secret.trim().is_empty() {
            return Err(Error::KeyInitialization(
                "master secret is empty".to_string(),
            ));
        }

        let sealing_key = SymmetricKey::derive(secret, Some(SEALED_KEY_CONTEXT));
        let key_pair = KeyPair::unseal(sealed_rsa_key, &sealing_key)?;
        let default_key = SymmetricKey::derive(secret, None);

        debug!(modulus_bits = key_pair.info().modulus.len() * 4, "key pair unsealed");

        Ok(Self {
            master_secret,
            default_key,
            key_pair,
        })
    }

    /// # Errors
    /// See [`CryptoProvider::new`].
    pub fn from_config(config: &TokenConfig) -> Result<Self> {
        Self::new(config.master_secret().clone(), config.sealed_rsa_key())
    }

    /// Derive the key/IV pair for `context` from the master secret.
    #[must_use]
    pub fn derive_symmetric_key(&self, context: Option<&str>) -> SymmetricKey {
        match context.filter(|c| !c.trim().is_empty()) {
            Some(context) => SymmetricKey::derive(self.master_secret.expose_secret(), Some(context)),
            None => self.default_key.clone(),
        }
    }

    /// Encrypt `plaintext`, returning standard base64. Without `key` (or with a
    /// blank one) the master-secret key is used.
    ///
    /// # Errors
    /// Returns `Encryption` if the cipher fails.
    pub fn aes_encrypt(&self, plaintext: &str, key: Option<&str>) -> Result<String> {
        let sealed = aes::seal(&self.resolve_key(key), plaintext.as_bytes())?;
        Ok(Base64::encode_string(&sealed))
    }

    /// # Errors
    /// Returns `Decryption` on malformed base64, a wrong key, tampering, or a
    /// plaintext that is not UTF-8.
    pub fn aes_decrypt(&self, ciphertext: &str, key: Option<&str>) -> Result<String> {
        let bytes = Base64::decode_vec(ciphertext).map_err(|_| Error::Decryption)?;
        let plaintext = aes::open(&self.resolve_key(key), &bytes)?;
        String::from_utf8(plaintext).map_err(|_| Error::Decryption)
    }

    /// # Errors
    /// Returns `Encryption` if the plaintext is too long for the key.
    pub fn rsa_encrypt(&self, plaintext: &str) -> Result<String> {
        let ciphertext = self.key_pair.encrypt(plaintext.as_bytes())?;
        Ok(Base64::encode_string(&ciphertext))
    }

    /// # Errors
    /// Returns `Decryption` on malformed input or a key mismatch.
    pub fn rsa_decrypt(&self, ciphertext: &str) -> Result<String> {
        let bytes = Base64::decode_vec(ciphertext).map_err(|_| Error::Decryption)?;
        let plaintext = self.key_pair.decrypt(&bytes)?;
        String::from_utf8(plaintext).map_err(|_| Error::Decryption)
    }

    /// Hex HMAC of `data` keyed by an arbitrary string.
    ///
    /// # Errors
    /// See [`hmac::sign`].
    pub fn hmac(&self, data: &str, key: &str, algorithm: HmacAlgorithm) -> Result<String> {
        hmac::sign_hex(algorithm, key, data)
    }

    /// Hex HMAC of `data` keyed by the master secret.
    ///
    /// # Errors
    /// See [`hmac::sign`].
    pub fn sign(&self, data: &str, algorithm: HmacAlgorithm) -> Result<String> {
        hmac::sign_hex(algorithm, self.master_secret.expose_secret(), data)
    }

    /// Constant-time check of a master-keyed signature.
    ///
    /// # Errors
    /// See [`hmac::sign`].
    pub fn verify(&self, data: &str, signature: &str, algorithm: HmacAlgorithm) -> Result<bool> {
        let expected = self.sign(data, algorithm)?;
        Ok(hmac::signatures_match(&expected, signature))
    }

    #[must_use]
    pub fn public_key(&self) -> &PublicKeyInfo {
        self.key_pair.info()
    }

    /// Master secret with its characters reversed; keys session-ID encryption
    /// apart from payload encryption.
    pub(crate) fn reversed_secret(&self) -> SecretString {
        SecretString::from(
            self.master_secret
                .expose_secret()
                .chars()
                .rev()
                .collect::<String>(),
        )
    }

    /// Raw HMAC of `data` keyed by the master secret.
    pub(crate) fn derive_signing_key(&self, data: &str) -> Result<Vec<u8>> {
        hmac::sign(
            HmacAlgorithm::Sha512,
            self.master_secret.expose_secret().as_bytes(),
            data.as_bytes(),
        )
    }

    fn resolve_key(&self, key: Option<&str>) -> SymmetricKey {
        match key.filter(|k| !k.trim().is_empty()) {
            Some(key) => SymmetricKey::derive(key, None),
            None => self.default_key.clone(),
        }
    }
}
