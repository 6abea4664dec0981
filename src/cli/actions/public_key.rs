use anyhow::Result;

use crate::cli::globals::GlobalArgs;

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
}

/// Render the public key as JSON.
/// # Errors
/// Returns an error if the key material cannot be loaded.
pub fn execute(args: &Args) -> Result<String> {
    let crypto = args.globals.crypto()?;
    Ok(serde_json::to_string_pretty(crypto.public_key())?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::crypto::HmacAlgorithm;
    use crate::test_support;
    use serde_json::Value;

    #[test]
    fn test_public_key_json() {
        let config = test_support::config().unwrap();
        let args = Args {
            globals: GlobalArgs {
                master_secret: Some(config.master_secret().clone()),
                signing_secret: None,
                rsa_key: Some(config.sealed_rsa_key().to_string()),
                token_ttl_seconds: 30,
                signature_algorithm: HmacAlgorithm::Sha512,
            },
        };
        let value: Value = serde_json::from_str(&execute(&args).unwrap()).unwrap();
        assert_eq!(value["exponent"], "010001");
        assert_eq!(
            value["modulus"],
            test_support::provider().unwrap().public_key().modulus.as_str()
        );
    }
}
