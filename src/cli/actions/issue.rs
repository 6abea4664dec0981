use anyhow::{Context, Result, anyhow};

use crate::{
    claims::{Claims, SystemRole},
    cli::globals::GlobalArgs,
    session::SessionTokenCodec,
};

#[derive(Debug)]
pub struct Args {
    pub session_id: Option<String>,
    pub user_id: String,
    pub role: String,
    pub roles: Vec<String>,
    pub globals: GlobalArgs,
}

/// Issue a session token; a random session id is used when none is given.
/// # Errors
/// Returns an error if the role is unknown, key material is missing, or the
/// token cannot be encoded.
pub fn execute(args: &Args) -> Result<String> {
    let role: SystemRole = args.role.parse().map_err(|err: String| anyhow!(err))?;
    let claims = Claims::new(args.user_id.as_str(), role).with_roles(args.roles.iter().cloned());

    let config = args.globals.token_config()?;
    let codec = SessionTokenCodec::new(args.globals.crypto()?, &config)?;

    let session_id = args
        .session_id
        .clone()
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    codec
        .encode(&session_id, &claims)
        .context("Failed to issue session token")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::crypto::HmacAlgorithm;
    use crate::test_support;

    fn globals() -> GlobalArgs {
        let config = test_support::config().unwrap();
        GlobalArgs {
            master_secret: Some(config.master_secret().clone()),
            signing_secret: Some(config.signing_secret().clone()),
            rsa_key: Some(config.sealed_rsa_key().to_string()),
            token_ttl_seconds: 30,
            signature_algorithm: HmacAlgorithm::Sha512,
        }
    }

    fn args(session_id: Option<&str>, role: &str) -> Args {
        Args {
            session_id: session_id.map(ToString::to_string),
            user_id: "u1".to_string(),
            role: role.to_string(),
            roles: vec!["editor".to_string()],
            globals: globals(),
        }
    }

    #[tokio::test]
    async fn test_issued_token_validates() {
        let token = execute(&args(Some("sess-42"), "administrator")).unwrap();

        let config = test_support::config().unwrap();
        let codec = SessionTokenCodec::new(test_support::provider().unwrap(), &config).unwrap();
        let validated = codec.validate(&token, None).await.unwrap();
        assert_eq!(validated.session_id, "sess-42");
        assert_eq!(validated.claims.role, SystemRole::Administrator);
        assert_eq!(validated.claims.roles, vec!["editor".to_string()]);
    }

    #[tokio::test]
    async fn test_random_session_id() {
        let token = execute(&args(None, "authenticated")).unwrap();

        let config = test_support::config().unwrap();
        let codec = SessionTokenCodec::new(test_support::provider().unwrap(), &config).unwrap();
        let validated = codec.validate(&token, None).await.unwrap();
        assert!(uuid::Uuid::parse_str(&validated.session_id).is_ok());
    }

    #[test]
    fn test_unknown_role() {
        assert!(execute(&args(None, "superuser")).is_err());
    }
}
