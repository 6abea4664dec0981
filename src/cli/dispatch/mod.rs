//! Map validated CLI matches to the action to run.

use crate::cli::actions::{
    Action, hash_password, issue, public_key, seal_key, server, verify,
};
use crate::cli::commands::{
    CMD_HASH_PASSWORD, CMD_ISSUE, CMD_PUBLIC_KEY, CMD_SEAL_KEY, CMD_SERVE, CMD_VERIFY, secrets,
};
use crate::cli::globals::GlobalArgs;
use anyhow::{Context, Result, bail};
use clap::ArgMatches;

/// # Errors
/// Returns an error if a required argument is missing or the subcommand is unknown.
pub fn handler(matches: &ArgMatches) -> Result<Action> {
    let (name, sub) = matches.subcommand().context("missing subcommand")?;

    // Global arguments propagate to the subcommand matches.
    let globals = GlobalArgs::new(secrets::Options::parse(sub));

    let get_string = |id: &str| sub.get_one::<String>(id).cloned();
    let required = |id: &str| get_string(id).with_context(|| format!("missing required argument: --{id}"));

    let action = match name {
        CMD_SERVE => Action::Serve(server::Args {
            port: sub.get_one::<u16>("port").copied().unwrap_or(8080),
            session_registry_url: get_string("session-registry-url")
                .filter(|url| !url.trim().is_empty()),
            globals,
        }),
        CMD_HASH_PASSWORD => Action::HashPassword(hash_password::Args {
            id: required("id")?,
            password: required("password")?,
        }),
        CMD_SEAL_KEY => Action::SealKey(seal_key::Args {
            master_secret: globals.master_secret()?.clone(),
            pem_path: required("pem")?,
        }),
        CMD_PUBLIC_KEY => Action::PublicKey(public_key::Args { globals }),
        CMD_ISSUE => Action::Issue(issue::Args {
            session_id: get_string("session-id").filter(|id| !id.trim().is_empty()),
            user_id: required("user-id")?,
            role: get_string("role").unwrap_or_else(|| "authenticated".to_string()),
            roles: sub
                .get_many::<String>("roles")
                .map(|roles| {
                    roles
                        .map(|role| role.trim().to_string())
                        .filter(|role| !role.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            globals,
        }),
        CMD_VERIFY => Action::Verify(verify::Args {
            token: required("token")?,
            globals,
        }),
        other => bail!("unknown subcommand: {other}"),
    };

    Ok(action)
}
