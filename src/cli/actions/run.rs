use crate::cli::actions::{
    Action, hash_password, issue, public_key, seal_key, server, verify,
};
use anyhow::Result;

/// Execute the provided action.
/// # Errors
/// Returns an error if the action fails.
pub async fn execute(action: Action) -> Result<()> {
    match action {
        Action::Serve(args) => server::execute(args).await,
        Action::HashPassword(args) => print(hash_password::execute(&args)),
        Action::SealKey(args) => print(seal_key::execute(&args)),
        Action::PublicKey(args) => print(public_key::execute(&args)),
        Action::Issue(args) => print(issue::execute(&args)),
        Action::Verify(args) => print(verify::execute(&args).await),
    }
}

#[allow(clippy::print_stdout)]
fn print(output: Result<String>) -> Result<()> {
    println!("{}", output?);
    Ok(())
}
