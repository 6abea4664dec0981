//! Deterministic keyed hash for built-in account passwords.
//!
//! The account identifier doubles as the salt, so stored hashes can be compared
//! directly without a separate salt store.

use base64ct::{Base64UrlUnpadded, Encoding};
use regex::Regex;

use crate::crypto::hmac::{self, HmacAlgorithm};
use crate::error::{Error, Result};

const ID_PREFIX_LEN: usize = 13;

/// Account identifiers are UUIDs, with or without dashes.
fn valid_id(id: &str) -> bool {
    Regex::new(
        r"^(?:[0-9a-f]{32}|[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12})$",
    )
    .is_ok_and(|re| re.is_match(id))
}

/// Hash `password` for the account `id`.
///
/// # Errors
/// Returns `InvalidInput` if `id` is not UUID-shaped or `password` is blank.
pub fn hash_password(id: &str, password: &str) -> Result<String> {
    let id = id.trim().to_lowercase();
    if password.trim().is_empty() || !valid_id(&id) {
        return Err(Error::invalid_input("account id or password is invalid"));
    }

    let prefix: String = id.chars().take(ID_PREFIX_LEN).collect();
    let data = format!("{prefix}:{password}");
    let digest = hmac::sign(HmacAlgorithm::Sha512, id.as_bytes(), data.as_bytes())?;
    Ok(Base64UrlUnpadded::encode_string(&digest))
}

/// Compare `password` against a stored hash in constant time.
///
/// # Errors
/// Returns `InvalidInput` under the same conditions as [`hash_password`].
pub fn verify_password(id: &str, password: &str, stored_hash: &str) -> Result<bool> {
    let computed = hash_password(id, password)?;
    Ok(hmac::signatures_match(&computed, stored_hash))
}
