use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;
use std::time::Duration;

use crate::db::{
    schema::{RetryPolicy, DEFAULT_CONNECT_ATTEMPTS, DEFAULT_RETRY_DELAY_SECONDS},
    DatabaseConfig, DEFAULT_HOST, DEFAULT_NAME, DEFAULT_PASSWORD, DEFAULT_PORT, DEFAULT_USER,
};

pub const ARG_DB_HOST: &str = "db-host";
pub const ARG_DB_PORT: &str = "db-port";
pub const ARG_DB_USER: &str = "db-user";
pub const ARG_DB_PASSWORD: &str = "db-password";
pub const ARG_DB_NAME: &str = "db-name";
pub const ARG_DB_CONNECT_ATTEMPTS: &str = "db-connect-attempts";
pub const ARG_DB_RETRY_DELAY: &str = "db-retry-delay";

#[derive(Debug, Clone)]
pub struct Options {
    pub config: DatabaseConfig,
    pub retry: RetryPolicy,
}

impl Options {
    /// Parse database arguments from matches.
    ///
    /// # Errors
    /// Returns an error if an argument is missing.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let get_string = |id: &str| {
            matches
                .get_one::<String>(id)
                .cloned()
                .with_context(|| format!("missing required argument: --{id}"))
        };

        let port = matches
            .get_one::<u16>(ARG_DB_PORT)
            .copied()
            .unwrap_or(DEFAULT_PORT);
        let attempts = matches
            .get_one::<u32>(ARG_DB_CONNECT_ATTEMPTS)
            .copied()
            .unwrap_or(DEFAULT_CONNECT_ATTEMPTS);
        let delay = matches
            .get_one::<u64>(ARG_DB_RETRY_DELAY)
            .copied()
            .unwrap_or(DEFAULT_RETRY_DELAY_SECONDS);

        Ok(Self {
            config: DatabaseConfig {
                host: get_string(ARG_DB_HOST)?,
                port,
                user: get_string(ARG_DB_USER)?,
                password: SecretString::from(get_string(ARG_DB_PASSWORD)?),
                name: get_string(ARG_DB_NAME)?,
            },
            retry: RetryPolicy {
                attempts,
                delay: Duration::from_secs(delay),
            },
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_DB_HOST)
                .long(ARG_DB_HOST)
                .help("MySQL host")
                .env("MYSQL_HOST")
                .default_value(DEFAULT_HOST),
        )
        .arg(
            Arg::new(ARG_DB_PORT)
                .long(ARG_DB_PORT)
                .help("MySQL port")
                .env("MYSQL_PORT")
                .default_value("3306")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new(ARG_DB_USER)
                .long(ARG_DB_USER)
                .help("MySQL user, also used to create per-user databases")
                .env("MYSQL_USER")
                .default_value(DEFAULT_USER),
        )
        .arg(
            Arg::new(ARG_DB_PASSWORD)
                .long(ARG_DB_PASSWORD)
                .help("MySQL password")
                .env("MYSQL_PASSWORD")
                .hide_env_values(true)
                .default_value(DEFAULT_PASSWORD),
        )
        .arg(
            Arg::new(ARG_DB_NAME)
                .long(ARG_DB_NAME)
                .help("Database holding the users table")
                .env("MYSQL_DATABASE")
                .default_value(DEFAULT_NAME),
        )
        .arg(
            Arg::new(ARG_DB_CONNECT_ATTEMPTS)
                .long(ARG_DB_CONNECT_ATTEMPTS)
                .help("Connection attempts at startup before giving up")
                .env("REGISTRAR_DB_CONNECT_ATTEMPTS")
                .default_value("30")
                .value_parser(clap::value_parser!(u32).range(1..)),
        )
        .arg(
            Arg::new(ARG_DB_RETRY_DELAY)
                .long(ARG_DB_RETRY_DELAY)
                .help("Seconds to wait between startup connection attempts")
                .env("REGISTRAR_DB_RETRY_DELAY")
                .default_value("2")
                .value_parser(clap::value_parser!(u64)),
        )
}
