use anyhow::{Context, Result};
use secrecy::SecretString;
use std::sync::Arc;

use crate::cli::commands::secrets::{ARG_MASTER_SECRET, ARG_RSA_KEY, ARG_SIGNING_SECRET, Options};
use crate::config::TokenConfig;
use crate::crypto::{CryptoProvider, HmacAlgorithm};

/// Key material and token settings shared by every action.
#[derive(Clone)]
pub struct GlobalArgs {
    pub master_secret: Option<SecretString>,
    pub signing_secret: Option<SecretString>,
    pub rsa_key: Option<String>,
    pub token_ttl_seconds: i64,
    pub signature_algorithm: HmacAlgorithm,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(options: Options) -> Self {
        Self {
            master_secret: options.master_secret,
            signing_secret: options.signing_secret,
            rsa_key: options.rsa_key,
            token_ttl_seconds: options.token_ttl_seconds,
            signature_algorithm: options.signature_algorithm,
        }
    }

    /// # Errors
    /// Returns an error if `--master-secret` was not given.
    pub fn master_secret(&self) -> Result<&SecretString> {
        self.master_secret
            .as_ref()
            .with_context(|| format!("missing required argument: --{ARG_MASTER_SECRET}"))
    }

    /// # Errors
    /// Returns an error if the master secret, signing secret, or sealed RSA key
    /// is missing.
    pub fn token_config(&self) -> Result<TokenConfig> {
        let signing_secret = self
            .signing_secret
            .clone()
            .with_context(|| format!("missing required argument: --{ARG_SIGNING_SECRET}"))?;
        let rsa_key = self
            .rsa_key
            .clone()
            .with_context(|| format!("missing required argument: --{ARG_RSA_KEY}"))?;

        Ok(
            TokenConfig::new(self.master_secret()?.clone(), signing_secret, rsa_key)
                .with_token_ttl_seconds(self.token_ttl_seconds)
                .with_signature_algorithm(self.signature_algorithm),
        )
    }

    /// Unseal the key pair. Only the master secret and RSA key are needed.
    ///
    /// # Errors
    /// Returns an error if either is missing or the key cannot be unsealed.
    pub fn crypto(&self) -> Result<Arc<CryptoProvider>> {
        let rsa_key = self
            .rsa_key
            .as_deref()
            .with_context(|| format!("missing required argument: --{ARG_RSA_KEY}"))?;
        let crypto = CryptoProvider::new(self.master_secret()?.clone(), rsa_key)
            .context("Failed to initialize key material")?;
        Ok(Arc::new(crypto))
    }
}

impl std::fmt::Debug for GlobalArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlobalArgs")
            .field("master_secret", &"***")
            .field("signing_secret", &"***")
            .field("rsa_key", &self.rsa_key.as_ref().map(|_| "***"))
            .field("token_ttl_seconds", &self.token_ttl_seconds)
            .field("signature_algorithm", &self.signature_algorithm)
            .finish()
    }
}
