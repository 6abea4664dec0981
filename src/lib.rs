//! # Tessera (Identity Token Core)
//!
//! `tessera` turns an authenticated user's claims into tokens that other services
//! can trust, and turns those tokens back into claims on every request.
//!
//! ## Token Layers
//!
//! - **Access token:** the user's [`Claims`] serialized to JSON, encrypted under a
//!   one-time AES key, with that key sealed by the process RSA key pair. The whole
//!   envelope is then encrypted again under the master-secret key so any process
//!   sharing the master secret can peel it.
//! - **Session token:** a compact `header.payload.signature` token that binds an
//!   encrypted session identifier to an access token. It carries its issue time and
//!   a keyed cross-signature over `access_token@session_id`, so neither half can be
//!   replayed against another counterpart.
//! - **Session cookie:** the HTTP cookie value is encrypted and signed as
//!   `marker|ciphertext|hmac`. Unrecognized or forged cookies fail open (they are
//!   treated as absent), the session token remains the security boundary.
//!
//! ## Keys
//!
//! All symmetric keys derive deterministically from the master secret, so
//! independent processes configured with the same secret can read each other's
//! tokens. The RSA key pair is delivered sealed under a master-derived key and is
//! unsealed once at startup by [`CryptoProvider::new`].

pub mod access_token;
pub mod claims;
pub mod cli;
pub mod config;
pub mod cookie;
pub mod crypto;
pub mod error;
pub mod password;
pub mod server;
pub mod session;

#[cfg(test)]
pub(crate) mod test_support;

pub use access_token::AccessTokenCodec;
pub use claims::{Claims, Privilege, SystemRole};
pub use config::TokenConfig;
pub use cookie::CookieProtector;
pub use crypto::{CryptoProvider, HmacAlgorithm, PublicKeyInfo, SymmetricKey};
pub use error::{Error, RegistryError, Result};
pub use password::{hash_password, verify_password};
pub use session::{
    Clock, HttpSessionRegistry, Session, SessionRegistry, SessionTokenCodec, SystemClock,
    ValidatedSession,
};

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
