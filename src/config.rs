//! Startup configuration shared by every codec.

use secrecy::SecretString;
use std::time::Duration;

use crate::crypto::HmacAlgorithm;

/// Observed freshness window for session tokens, in seconds.
pub const DEFAULT_TOKEN_TTL_SECONDS: i64 = 30;
pub const DEFAULT_COOKIE_MARKER: &str = "tessera";
pub const DEFAULT_COOKIE_NAME: &str = "tessera-session";
const DEFAULT_REGISTRY_TIMEOUT_SECONDS: u64 = 5;

#[derive(Clone, Debug)]
pub struct TokenConfig {
    master_secret: SecretString,
    signing_secret: SecretString,
    sealed_rsa_key: String,
    token_ttl_seconds: i64,
    signature_algorithm: HmacAlgorithm,
    cookie_marker: String,
    cookie_name: String,
    registry_timeout: Duration,
}

impl TokenConfig {
    #[must_use]
    pub fn new(
        master_secret: SecretString,
        signing_secret: SecretString,
        sealed_rsa_key: String,
    ) -> Self {
        Self {
            master_secret,
            signing_secret,
            sealed_rsa_key,
            token_ttl_seconds: DEFAULT_TOKEN_TTL_SECONDS,
            signature_algorithm: HmacAlgorithm::default(),
            cookie_marker: DEFAULT_COOKIE_MARKER.to_string(),
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            registry_timeout: Duration::from_secs(DEFAULT_REGISTRY_TIMEOUT_SECONDS),
        }
    }

    /// Windows below one second are raised to one second.
    #[must_use]
    pub fn with_token_ttl_seconds(mut self, seconds: i64) -> Self {
        self.token_ttl_seconds = seconds.max(1);
        self
    }

    #[must_use]
    pub fn with_signature_algorithm(mut self, algorithm: HmacAlgorithm) -> Self {
        self.signature_algorithm = algorithm;
        self
    }

    #[must_use]
    pub fn with_cookie_marker(mut self, marker: String) -> Self {
        self.cookie_marker = marker;
        self
    }

    /// Names that are blank or contain cookie separators (`;`, `=`, `,`, or
    /// whitespace) are ignored and the current name is kept.
    #[must_use]
    pub fn with_cookie_name(mut self, name: String) -> Self {
        if valid_cookie_name(&name) {
            self.cookie_name = name;
        }
        self
    }

    #[must_use]
    pub fn with_registry_timeout(mut self, timeout: Duration) -> Self {
        self.registry_timeout = timeout;
        self
    }

    #[must_use]
    pub const fn master_secret(&self) -> &SecretString {
        &self.master_secret
    }

    #[must_use]
    pub const fn signing_secret(&self) -> &SecretString {
        &self.signing_secret
    }

    #[must_use]
    pub fn sealed_rsa_key(&self) -> &str {
        &self.sealed_rsa_key
    }

    #[must_use]
    pub const fn token_ttl_seconds(&self) -> i64 {
        self.token_ttl_seconds
    }

    #[must_use]
    pub const fn signature_algorithm(&self) -> HmacAlgorithm {
        self.signature_algorithm
    }

    #[must_use]
    pub fn cookie_marker(&self) -> &str {
        &self.cookie_marker
    }

    #[must_use]
    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    #[must_use]
    pub const fn registry_timeout(&self) -> Duration {
        self.registry_timeout
    }
}

fn valid_cookie_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_graphic() && !matches!(c, ';' | '=' | ','))
}
