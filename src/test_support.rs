use secrecy::SecretString;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use crate::config::TokenConfig;
use crate::crypto::{CryptoProvider, seal_private_key};
use crate::error::Result;
use crate::session::Clock;

pub const TEST_MASTER_SECRET: &str = "tessera-test-master-secret-0f3c";
pub const TEST_SIGNING_SECRET: &str = "tessera-test-signing-secret-9a1d";
pub const TEST_PRIVATE_KEY_PEM: &str = include_str!("../tests/fixtures/rsa_test_key.pem");

pub fn config() -> Result<TokenConfig> {
    let sealed = seal_private_key(TEST_MASTER_SECRET, TEST_PRIVATE_KEY_PEM.as_bytes())?;
    Ok(TokenConfig::new(
        SecretString::from(TEST_MASTER_SECRET.to_string()),
        SecretString::from(TEST_SIGNING_SECRET.to_string()),
        sealed,
    ))
}

pub fn provider() -> Result<Arc<CryptoProvider>> {
    Ok(Arc::new(CryptoProvider::from_config(&config()?)?))
}

/// Clock the tests can move by hand.
#[derive(Debug)]
pub struct ManualClock(AtomicI64);

impl ManualClock {
    pub fn at(now: i64) -> Arc<Self> {
        Arc::new(Self(AtomicI64::new(now)))
    }

    pub fn set(&self, now: i64) {
        self.0.store(now, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}
