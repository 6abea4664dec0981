use anyhow::{Context, Result};

use crate::password::hash_password;

#[derive(Debug)]
pub struct Args {
    pub id: String,
    pub password: String,
}

/// Hash the password for the account id.
/// # Errors
/// Returns an error if the id is not a UUID or the password is blank.
pub fn execute(args: &Args) -> Result<String> {
    hash_password(&args.id, &args.password).context("Failed to hash password")
}
