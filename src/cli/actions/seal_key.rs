use anyhow::{Context, Result};
use secrecy::{ExposeSecret, SecretString};
use std::fs;

use crate::crypto::seal_private_key;

pub struct Args {
    pub master_secret: SecretString,
    pub pem_path: String,
}

impl std::fmt::Debug for Args {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Args")
            .field("master_secret", &"***")
            .field("pem_path", &self.pem_path)
            .finish()
    }
}

/// Read a private key file and seal it under the master secret.
/// # Errors
/// Returns an error if the file cannot be read or is not an RSA private key.
pub fn execute(args: &Args) -> Result<String> {
    let key = fs::read(&args.pem_path)
        .with_context(|| format!("Failed to read key file: {}", args.pem_path))?;
    seal_private_key(args.master_secret.expose_secret(), &key).context("Failed to seal key")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::crypto::CryptoProvider;
    use crate::test_support::TEST_MASTER_SECRET;

    fn args(path: &str) -> Args {
        Args {
            master_secret: SecretString::from(TEST_MASTER_SECRET.to_string()),
            pem_path: path.to_string(),
        }
    }

    #[test]
    fn test_sealed_key_unseals() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/rsa_test_key.pem");
        let sealed = execute(&args(path)).unwrap();
        let provider =
            CryptoProvider::new(SecretString::from(TEST_MASTER_SECRET.to_string()), &sealed);
        assert!(provider.is_ok());
    }

    #[test]
    fn test_missing_file() {
        let err = execute(&args("/nonexistent/key.pem")).unwrap_err();
        assert!(err.to_string().contains("Failed to read key file"));
    }

    #[test]
    fn test_not_a_key() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/Cargo.toml");
        assert!(execute(&args(path)).is_err());
    }
}
