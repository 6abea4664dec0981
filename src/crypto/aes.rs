use aes_gcm::{
    Aes256Gcm, Key, Nonce,
    aead::{Aead, KeyInit, Payload},
};
use rand::{RngCore, rngs::OsRng};

use super::SymmetricKey;
use crate::error::{Error, Result};

const NONCE_LEN: usize = 12;

/// Encrypts with AES-256-GCM under `key`, binding the derived IV as AAD.
/// Returns `nonce (12 bytes) || ciphertext || tag`.
///
/// # Errors
/// Returns `Encryption` if the cipher rejects the input.
#[allow(deprecated)]
pub(crate) fn seal(key: &SymmetricKey, plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.key()));

    let mut nonce_bytes = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let payload = Payload {
        msg: plaintext,
        aad: key.iv(),
    };
    let ciphertext = cipher
        .encrypt(nonce, payload)
        .map_err(|_| Error::Encryption)?;

    let mut result = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    result.extend_from_slice(&nonce_bytes);
    result.extend_from_slice(&ciphertext);
    Ok(result)
}

/// Reverses [`seal`]. Expects `nonce (12 bytes) || ciphertext || tag`.
///
/// # Errors
/// Returns `Decryption` if the input is too short or fails authentication.
#[allow(deprecated)]
pub(crate) fn open(key: &SymmetricKey, data: &[u8]) -> Result<Vec<u8>> {
    if data.len() < NONCE_LEN {
        return Err(Error::Decryption);
    }

    let (nonce_bytes, ciphertext) = data.split_at(NONCE_LEN);
    let nonce = Nonce::from_slice(nonce_bytes);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.key()));

    let payload = Payload {
        msg: ciphertext,
        aad: key.iv(),
    };
    cipher.decrypt(nonce, payload).map_err(|_| Error::Decryption)
}
