use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use crate::{
    cli::globals::GlobalArgs,
    cookie::CookieProtector,
    server::{self, AppState},
    session::{HttpSessionRegistry, SessionRegistry, SessionTokenCodec},
};

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub session_registry_url: Option<String>,
    pub globals: GlobalArgs,
}

/// Build the shared state for the HTTP service.
/// # Errors
/// Returns an error if key material is missing or invalid, or the registry URL
/// is not an http(s) base URL.
pub fn state(args: &Args) -> Result<Arc<AppState>> {
    let config = args.globals.token_config()?;
    let crypto = args.globals.crypto()?;

    let sessions = SessionTokenCodec::new(Arc::clone(&crypto), &config)
        .context("Failed to initialize session tokens")?;
    let cookies = CookieProtector::from_config(Arc::clone(&crypto), &config);

    let registry = match args.session_registry_url.as_deref() {
        Some(url) => {
            let registry = HttpSessionRegistry::new(url, config.registry_timeout())
                .with_context(|| format!("Invalid session registry URL: {url}"))?;
            info!(url, "Session registry enabled");
            Some(Arc::new(registry) as Arc<dyn SessionRegistry>)
        }
        None => None,
    };

    Ok(Arc::new(AppState {
        crypto,
        sessions: Arc::new(sessions),
        cookies: Arc::new(cookies),
        cookie_name: config.cookie_name().to_string(),
        registry,
    }))
}

/// Execute the server action.
/// # Errors
/// Returns an error if the state cannot be built or the server fails.
pub async fn execute(args: Args) -> Result<()> {
    let state = state(&args)?;
    server::new(args.port, state).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::crypto::HmacAlgorithm;
    use crate::test_support;

    fn args(session_registry_url: Option<&str>) -> Args {
        let config = test_support::config().unwrap();
        Args {
            port: 8080,
            session_registry_url: session_registry_url.map(ToString::to_string),
            globals: GlobalArgs {
                master_secret: Some(config.master_secret().clone()),
                signing_secret: Some(config.signing_secret().clone()),
                rsa_key: Some(config.sealed_rsa_key().to_string()),
                token_ttl_seconds: 30,
                signature_algorithm: HmacAlgorithm::Sha512,
            },
        }
    }

    #[test]
    fn test_state_without_registry() {
        let state = state(&args(None)).unwrap();
        assert!(state.registry.is_none());
        assert_eq!(state.cookie_name, "tessera-session");
    }

    #[test]
    fn test_state_with_registry() {
        let state = state(&args(Some("http://store:9000/api"))).unwrap();
        assert!(state.registry.is_some());
    }

    #[test]
    fn test_invalid_registry_url() {
        let err = state(&args(Some("ftp://store"))).unwrap_err();
        assert!(err.to_string().contains("Invalid session registry URL"));
    }

    #[test]
    fn test_missing_signing_secret() {
        let mut args = args(None);
        args.globals.signing_secret = None;
        assert!(state(&args).is_err());
    }
}
