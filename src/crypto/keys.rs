use base64ct::{Base64, Encoding};
use rand::rngs::OsRng;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::traits::PublicKeyParts;
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::fmt;

use super::{SymmetricKey, aes};
use crate::error::{Error, Result};

/// Derivation context for the key that seals the RSA private key at rest.
pub(crate) const SEALED_KEY_CONTEXT: &str = "rsa-key";

/// Public half of the process key pair, published to clients so they can
/// encrypt material only this service can read.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PublicKeyInfo {
    /// Upper-case hex of the big-endian modulus.
    pub modulus: String,
    /// Upper-case hex of the big-endian public exponent.
    pub exponent: String,
}

impl PublicKeyInfo {
    fn from_public_key(public_key: &RsaPublicKey) -> Self {
        Self {
            modulus: hex::encode_upper(public_key.n().to_bytes_be()),
            exponent: hex::encode_upper(public_key.e().to_bytes_be()),
        }
    }
}

pub(crate) struct KeyPair {
    private_key: RsaPrivateKey,
    public_key: RsaPublicKey,
    info: PublicKeyInfo,
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("modulus_bits", &(self.public_key.size() * 8))
            .finish_non_exhaustive()
    }
}

impl KeyPair {
    /// Unseal a key blob produced by [`seal_private_key`].
    pub(crate) fn unseal(sealed: &str, sealing_key: &SymmetricKey) -> Result<Self> {
        let sealed_bytes = Base64::decode_vec(sealed.trim())
            .map_err(|_| Error::KeyInitialization("sealed key is not base64".to_string()))?;
        let plaintext = aes::open(sealing_key, &sealed_bytes).map_err(|_| {
            Error::KeyInitialization("sealed key cannot be opened with this secret".to_string())
        })?;
        let der_or_pem = unwrap_key_text(&plaintext)?;
        Self::from_pem_or_der(&der_or_pem)
    }

    pub(crate) fn from_pem_or_der(pem_or_der: &[u8]) -> Result<Self> {
        let private_key = decode_private_key(pem_or_der)?;
        let public_key = RsaPublicKey::from(&private_key);
        let info = PublicKeyInfo::from_public_key(&public_key);
        Ok(Self {
            private_key,
            public_key,
            info,
        })
    }

    pub(crate) const fn info(&self) -> &PublicKeyInfo {
        &self.info
    }

    pub(crate) fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        self.public_key
            .encrypt(&mut OsRng, Oaep::new::<Sha256>(), plaintext)
            .map_err(|_| Error::Encryption)
    }

    pub(crate) fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        self.private_key
            .decrypt(Oaep::new::<Sha256>(), ciphertext)
            .map_err(|_| Error::Decryption)
    }
}

/// Seal an RSA private key (PKCS#8 or PKCS#1, PEM or DER) under the key derived
/// from `master_secret`, producing the blob accepted by `--rsa-key`.
///
/// # Errors
/// Returns `KeyInitialization` if the key cannot be parsed, or `Encryption` if
/// sealing fails.
pub fn seal_private_key(master_secret: &str, pem_or_der: &[u8]) -> Result<String> {
    // Refuse to seal something that would not unseal into a usable key.
    decode_private_key(pem_or_der)?;

    let text = if pem_or_der.starts_with(b"-----BEGIN") {
        pem_or_der.to_vec()
    } else {
        Base64::encode_string(pem_or_der).into_bytes()
    };
    let sealing_key = SymmetricKey::derive(master_secret, Some(SEALED_KEY_CONTEXT));
    let sealed = aes::seal(&sealing_key, &text)?;
    Ok(Base64::encode_string(&sealed))
}

// PEM stays as text; DER travels base64-encoded inside the sealed blob.
fn unwrap_key_text(plaintext: &[u8]) -> Result<Vec<u8>> {
    if plaintext.starts_with(b"-----BEGIN") {
        return Ok(plaintext.to_vec());
    }
    let text = std::str::from_utf8(plaintext)
        .map_err(|_| Error::KeyInitialization("sealed key is not text".to_string()))?;
    Base64::decode_vec(text.trim())
        .map_err(|_| Error::KeyInitialization("sealed key payload is not base64".to_string()))
}

fn decode_private_key(pem_or_der: &[u8]) -> Result<RsaPrivateKey> {
    let parse_error = || Error::KeyInitialization("failed to parse RSA private key".to_string());

    if pem_or_der.starts_with(b"-----BEGIN") {
        let s = std::str::from_utf8(pem_or_der).map_err(|_| parse_error())?;
        if let Ok(k) = RsaPrivateKey::from_pkcs8_pem(s) {
            return Ok(k);
        }
        if let Ok(k) = RsaPrivateKey::from_pkcs1_pem(s) {
            return Ok(k);
        }
        return Err(parse_error());
    }

    if let Ok(k) = RsaPrivateKey::from_pkcs8_der(pem_or_der) {
        return Ok(k);
    }
    if let Ok(k) = RsaPrivateKey::from_pkcs1_der(pem_or_der) {
        return Ok(k);
    }
    Err(parse_error())
}
