pub mod hash_password;
pub mod issue;
pub mod public_key;
pub mod seal_key;
pub mod server;
pub mod verify;

// Internal "interpreter" for `Action`.
mod run;

#[derive(Debug)]
pub enum Action {
    Serve(server::Args),
    HashPassword(hash_password::Args),
    SealKey(seal_key::Args),
    PublicKey(public_key::Args),
    Issue(issue::Args),
    Verify(verify::Args),
}

impl Action {
    /// Execute the action.
    /// # Errors
    /// Returns an error if the action fails.
    pub async fn execute(self) -> anyhow::Result<()> {
        run::execute(self).await
    }
}
