pub mod logging;
pub mod secrets;

use clap::{
    Arg, ColorChoice, Command,
    builder::styling::{AnsiColor, Effects, Styles},
};

pub const CMD_SERVE: &str = "serve";
pub const CMD_HASH_PASSWORD: &str = "hash-password";
pub const CMD_SEAL_KEY: &str = "seal-key";
pub const CMD_PUBLIC_KEY: &str = "public-key";
pub const CMD_ISSUE: &str = "issue";
pub const CMD_VERIFY: &str = "verify";

fn serve() -> Command {
    Command::new(CMD_SERVE)
        .about("Run the session validation service")
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("8080")
                .env("TESSERA_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("session-registry-url")
                .long("session-registry-url")
                .help("Session store base URL; sessions are checked at {url}/sessions/{id}")
                .env("TESSERA_SESSION_REGISTRY_URL"),
        )
}

fn hash_password() -> Command {
    Command::new(CMD_HASH_PASSWORD)
        .about("Hash a password for an account id (UUID)")
        .arg(Arg::new("id").long("id").help("Account id").required(true))
        .arg(
            Arg::new("password")
                .long("password")
                .help("Password to hash")
                .env("TESSERA_PASSWORD")
                .hide_env_values(true)
                .required(true),
        )
}

fn seal_key() -> Command {
    Command::new(CMD_SEAL_KEY)
        .about("Seal an RSA private key (PKCS#8 or PKCS#1, PEM or DER) for --rsa-key")
        .arg(
            Arg::new("pem")
                .long("pem")
                .help("Path to the private key file")
                .required(true),
        )
}

fn public_key() -> Command {
    Command::new(CMD_PUBLIC_KEY).about("Print the RSA public key as hex modulus/exponent JSON")
}

fn issue() -> Command {
    Command::new(CMD_ISSUE)
        .about("Issue a session token")
        .arg(
            Arg::new("session-id")
                .long("session-id")
                .help("Session id (default: random UUID)"),
        )
        .arg(
            Arg::new("user-id")
                .long("user-id")
                .help("User id")
                .required(true),
        )
        .arg(
            Arg::new("role")
                .long("role")
                .help("System role: guest, authenticated, system, administrator")
                .default_value("authenticated"),
        )
        .arg(
            Arg::new("roles")
                .long("roles")
                .help("Comma-separated working roles")
                .value_delimiter(','),
        )
}

fn verify() -> Command {
    Command::new(CMD_VERIFY)
        .about("Validate a session token and print what it carries")
        .arg(
            Arg::new("token")
                .long("token")
                .help("Session token")
                .required(true),
        )
}

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("tessera")
        .about("Identity token issuance and validation")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(serve())
        .subcommand(hash_password())
        .subcommand(seal_key())
        .subcommand(public_key())
        .subcommand(issue())
        .subcommand(verify());

    let command = secrets::with_args(command);
    logging::with_args(command)
}
