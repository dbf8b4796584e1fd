//! MySQL connection provider.
//!
//! Connections are opened on demand, one per request (see [`request`]), instead of
//! being pooled. [`Database`] only carries the connect options.

pub mod request;
pub mod schema;
pub mod users;

use anyhow::{Context, Result};
use secrecy::{ExposeSecret, SecretString};
use sqlx::{
    mysql::{MySqlConnectOptions, MySqlConnection},
    Connection,
};
use std::fmt;
use tracing::{debug, instrument};

pub const DEFAULT_HOST: &str = "db";
pub const DEFAULT_PORT: u16 = 3306;
pub const DEFAULT_USER: &str = "root";
pub const DEFAULT_PASSWORD: &str = "root";
pub const DEFAULT_NAME: &str = "registration_db";

#[derive(Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: SecretString,
    pub name: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            user: DEFAULT_USER.to_string(),
            password: SecretString::from(DEFAULT_PASSWORD.to_string()),
            name: DEFAULT_NAME.to_string(),
        }
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"***")
            .field("name", &self.name)
            .finish()
    }
}

/// Opens connections to the configured MySQL server.
#[derive(Clone)]
pub struct Database {
    server: MySqlConnectOptions,
    name: String,
    address: String,
}

impl Database {
    #[must_use]
    pub fn new(config: &DatabaseConfig) -> Self {
        let server = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(config.password.expose_secret());

        Self {
            server,
            name: config.name.clone(),
            address: format!("{}:{}", config.host, config.port),
        }
    }

    /// Name of the application database holding `users`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `host:port` of the server, for logs.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Connect with the application database selected.
    ///
    /// # Errors
    /// Returns an error if the server cannot be reached or rejects the login.
    #[instrument(skip(self), fields(db.name = %self.name))]
    pub async fn connect(&self) -> Result<MySqlConnection> {
        debug!("opening database connection");
        MySqlConnection::connect_with(&self.server.clone().database(&self.name))
            .await
            .with_context(|| format!("failed to connect to database {}", self.name))
    }

    /// Connect without selecting a default database, for `CREATE DATABASE`.
    ///
    /// # Errors
    /// Returns an error if the server cannot be reached or rejects the login.
    #[instrument(skip(self))]
    pub async fn connect_without_database(&self) -> Result<MySqlConnection> {
        debug!("opening server connection");
        MySqlConnection::connect_with(&self.server)
            .await
            .with_context(|| format!("failed to connect to {}", self.address))
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("address", &self.address)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}

/// Span wrapping a single statement.
pub(crate) fn query_span(operation: &str, statement: &str) -> tracing::Span {
    tracing::info_span!(
        "db.query",
        db.system = "mysql",
        db.operation = operation,
        db.statement = statement
    )
}
