use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

use crate::config::DEFAULT_TOKEN_TTL_SECONDS;
use crate::crypto::HmacAlgorithm;

pub const ARG_MASTER_SECRET: &str = "master-secret";
pub const ARG_SIGNING_SECRET: &str = "signing-secret";
pub const ARG_RSA_KEY: &str = "rsa-key";
pub const ARG_TOKEN_TTL: &str = "token-ttl";
pub const ARG_SIGNATURE_ALGORITHM: &str = "signature-algorithm";

#[derive(Clone)]
pub struct Options {
    pub master_secret: Option<SecretString>,
    pub signing_secret: Option<SecretString>,
    pub rsa_key: Option<String>,
    pub token_ttl_seconds: i64,
    pub signature_algorithm: HmacAlgorithm,
}

impl std::fmt::Debug for Options {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Options")
            .field("master_secret", &self.master_secret.as_ref().map(|_| "***"))
            .field("signing_secret", &self.signing_secret.as_ref().map(|_| "***"))
            .field("rsa_key", &self.rsa_key.as_ref().map(|_| "***"))
            .field("token_ttl_seconds", &self.token_ttl_seconds)
            .field("signature_algorithm", &self.signature_algorithm)
            .finish()
    }
}

impl Options {
    /// Parse key material arguments from matches. Presence is checked by the
    /// actions that need each value.
    #[must_use]
    pub fn parse(matches: &ArgMatches) -> Self {
        // Helper to filter empty strings which clap might pass through if env vars are set to ""
        let get_non_empty = |id: &str| {
            matches
                .get_one::<String>(id)
                .cloned()
                .filter(|v| !v.trim().is_empty())
        };

        Self {
            master_secret: get_non_empty(ARG_MASTER_SECRET).map(SecretString::from),
            signing_secret: get_non_empty(ARG_SIGNING_SECRET).map(SecretString::from),
            rsa_key: get_non_empty(ARG_RSA_KEY),
            token_ttl_seconds: matches
                .get_one::<i64>(ARG_TOKEN_TTL)
                .copied()
                .unwrap_or(DEFAULT_TOKEN_TTL_SECONDS),
            signature_algorithm: get_non_empty(ARG_SIGNATURE_ALGORITHM)
                .map_or_else(HmacAlgorithm::default, |name| HmacAlgorithm::parse(&name)),
        }
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_MASTER_SECRET)
                .long(ARG_MASTER_SECRET)
                .help("Master secret every symmetric key is derived from")
                .env("TESSERA_MASTER_SECRET")
                .hide_env_values(true)
                .global(true),
        )
        .arg(
            Arg::new(ARG_SIGNING_SECRET)
                .long(ARG_SIGNING_SECRET)
                .help("Secret the session token signing key is derived from")
                .env("TESSERA_SIGNING_SECRET")
                .hide_env_values(true)
                .global(true),
        )
        .arg(
            Arg::new(ARG_RSA_KEY)
                .long(ARG_RSA_KEY)
                .help("Sealed RSA private key, as printed by `tessera seal-key`")
                .env("TESSERA_RSA_KEY")
                .hide_env_values(true)
                .global(true),
        )
        .arg(
            Arg::new(ARG_TOKEN_TTL)
                .long(ARG_TOKEN_TTL)
                .help("Session token freshness window in seconds")
                .env("TESSERA_TOKEN_TTL")
                .global(true)
                .default_value("30")
                .value_parser(clap::value_parser!(i64).range(1..)),
        )
        .arg(
            Arg::new(ARG_SIGNATURE_ALGORITHM)
                .long(ARG_SIGNATURE_ALGORITHM)
                .help("HMAC algorithm binding session ids to access tokens: hs1, hs256, hs384, hs512")
                .env("TESSERA_SIGNATURE_ALGORITHM")
                .global(true)
                .default_value("hs512"),
        )
}
