use std::time::Duration;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// Key material could not be loaded; the process cannot serve tokens.
    #[error("key initialization failed: {0}")]
    KeyInitialization(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("decryption failed")]
    Decryption,
    #[error("encryption failed")]
    Encryption,
    #[error("invalid token: {0}")]
    InvalidToken(String),
    /// A forged or tampered signature. Kept apart from `InvalidToken` so callers
    /// can report it as a security event.
    #[error("invalid token signature")]
    InvalidSignature,
    #[error("token expired")]
    TokenExpired,
    #[error(transparent)]
    Session(#[from] RegistryError),
}

impl Error {
    pub(crate) fn invalid_token(reason: impl Into<String>) -> Self {
        Self::InvalidToken(reason.into())
    }

    pub(crate) fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput(reason.into())
    }

    /// Whether this failure should be treated as a possible forgery attempt.
    #[must_use]
    pub const fn is_security_event(&self) -> bool {
        matches!(self, Self::InvalidSignature)
    }

    /// Short machine-readable kind, used in HTTP error bodies and log fields.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::KeyInitialization(_) => "key_initialization",
            Self::InvalidInput(_) => "invalid_input",
            Self::Decryption => "decryption",
            Self::Encryption => "encryption",
            Self::InvalidToken(_) => "invalid_token",
            Self::InvalidSignature => "invalid_signature",
            Self::TokenExpired => "token_expired",
            Self::Session(_) => "session",
        }
    }
}

/// Failures raised by a [`crate::SessionRegistry`] while confirming a session.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("session is not registered")]
    NotRegistered,
    #[error("session has been revoked")]
    Revoked,
    #[error("session registry did not answer within {0:?}")]
    Timeout(Duration),
    #[error("session registry unavailable: {0}")]
    Unavailable(String),
}
