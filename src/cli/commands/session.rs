use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

use crate::registrar::session::{DEFAULT_SESSION_SECRET, DEFAULT_SESSION_TTL_SECONDS};

pub const ARG_SESSION_SECRET: &str = "session-secret";
pub const ARG_SESSION_TTL: &str = "session-ttl";
pub const ARG_SESSION_COOKIE_SECURE: &str = "session-cookie-secure";
pub const ARG_PROVISION_USER_DATABASES: &str = "provision-user-databases";

/// One year.
pub const MAX_SESSION_TTL_SECONDS: u64 = 365 * 24 * 60 * 60;

#[derive(Debug, Clone)]
pub struct Options {
    pub secret: SecretString,
    pub ttl_seconds: u64,
    pub cookie_secure: bool,
    pub provision_user_databases: bool,
}

impl Options {
    /// Parse session and account arguments from matches.
    ///
    /// # Errors
    /// Returns an error if the session secret is missing.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let secret = matches
            .get_one::<String>(ARG_SESSION_SECRET)
            .cloned()
            .filter(|v| !v.is_empty())
            .with_context(|| format!("missing required argument: --{ARG_SESSION_SECRET}"))?;

        Ok(Self {
            secret: SecretString::from(secret),
            ttl_seconds: matches
                .get_one::<u64>(ARG_SESSION_TTL)
                .copied()
                .unwrap_or(DEFAULT_SESSION_TTL_SECONDS),
            cookie_secure: matches
                .get_one::<bool>(ARG_SESSION_COOKIE_SECURE)
                .copied()
                .unwrap_or(false),
            provision_user_databases: matches
                .get_one::<bool>(ARG_PROVISION_USER_DATABASES)
                .copied()
                .unwrap_or(true),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_SESSION_SECRET)
                .long(ARG_SESSION_SECRET)
                .help("Secret used to sign session cookies")
                .env("REGISTRAR_SESSION_SECRET")
                .hide_env_values(true)
                .default_value(DEFAULT_SESSION_SECRET),
        )
        .arg(
            Arg::new(ARG_SESSION_TTL)
                .long(ARG_SESSION_TTL)
                .help("Session lifetime in seconds")
                .env("REGISTRAR_SESSION_TTL")
                .default_value("43200")
                .value_parser(clap::value_parser!(u64).range(1..=MAX_SESSION_TTL_SECONDS)),
        )
        .arg(
            Arg::new(ARG_SESSION_COOKIE_SECURE)
                .long(ARG_SESSION_COOKIE_SECURE)
                .help("Only send the session cookie over HTTPS")
                .env("REGISTRAR_SESSION_COOKIE_SECURE")
                .default_value("false")
                .value_parser(clap::value_parser!(bool)),
        )
        .arg(
            Arg::new(ARG_PROVISION_USER_DATABASES)
                .long(ARG_PROVISION_USER_DATABASES)
                .help("Create a private database for every new user")
                .env("REGISTRAR_PROVISION_USER_DATABASES")
                .default_value("true")
                .value_parser(clap::value_parser!(bool)),
        )
}
