use anyhow::{Context, Result};
use serde_json::json;

use crate::{cli::globals::GlobalArgs, session::SessionTokenCodec};

#[derive(Debug)]
pub struct Args {
    pub token: String,
    pub globals: GlobalArgs,
}

/// Validate a session token offline and render what it carries as JSON.
/// # Errors
/// Returns an error if key material is missing or the token is rejected.
pub async fn execute(args: &Args) -> Result<String> {
    let config = args.globals.token_config()?;
    let codec = SessionTokenCodec::new(args.globals.crypto()?, &config)?;

    let validated = codec
        .validate(args.token.trim(), None)
        .await
        .context("Session token rejected")?;

    Ok(serde_json::to_string_pretty(&json!({
        "session_id": validated.session_id,
        "user_id": validated.claims.user_id,
        "role": validated.claims.role,
        "roles": validated.claims.effective_roles(),
        "privileges": validated.claims.privileges,
    }))?)
}
