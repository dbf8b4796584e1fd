//! Schema bootstrap and per-user database provisioning.

use anyhow::{bail, Context, Result};
use sqlx::{mysql::MySqlConnection, Connection, Executor};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, instrument, warn, Instrument};

use super::{query_span, Database};

pub const DEFAULT_CONNECT_ATTEMPTS: u32 = 30;
pub const DEFAULT_RETRY_DELAY_SECONDS: u64 = 2;

/// MySQL limit on database name length.
const MAX_DATABASE_NAME_LENGTH: usize = 64;
const NAMESPACE_PREFIX: &str = "user_";

const CREATE_USERS_TABLE: &str = r"
    CREATE TABLE IF NOT EXISTS users (
        id INT AUTO_INCREMENT PRIMARY KEY,
        username VARCHAR(100) UNIQUE NOT NULL,
        email VARCHAR(100) UNIQUE NOT NULL,
        password VARCHAR(255) NOT NULL,
        created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
    )
";

/// How long startup waits for the database.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_CONNECT_ATTEMPTS,
            delay: Duration::from_secs(DEFAULT_RETRY_DELAY_SECONDS),
        }
    }
}

/// Ensure the `users` table exists, waiting for the database to come up.
///
/// Safe to run on every start.
///
/// # Errors
/// Returns an error once `policy.attempts` consecutive attempts have failed. The
/// server must not start in that case.
#[instrument(skip(database), fields(db.address = %database.address(), db.name = %database.name()))]
pub async fn initialize(database: &Database, policy: RetryPolicy) -> Result<()> {
    let attempts = policy.attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        match create_users_table(database).await {
            Ok(()) => {
                info!("users table ready in database {}", database.name());
                return Ok(());
            }
            Err(e) if attempt >= attempts => {
                return Err(e).with_context(|| {
                    format!("failed to initialize database after {attempts} attempts")
                });
            }
            Err(e) => {
                warn!("waiting for database to be ready (attempt {attempt}/{attempts}): {e:#}");
                sleep(policy.delay).await;
            }
        }
    }
}

async fn create_users_table(database: &Database) -> Result<()> {
    let mut connection = database.connect().await?;

    sqlx::raw_sql(CREATE_USERS_TABLE)
        .execute(&mut connection)
        .instrument(query_span("CREATE TABLE", CREATE_USERS_TABLE))
        .await
        .context("failed to create users table")?;

    connection.close().await.context("failed to close connection")
}

/// Database name reserved for `username`.
///
/// Lowercased, spaces and hyphens become `_`, everything else outside
/// `[a-z0-9_]` is dropped, then prefixed with `user_`. Distinct usernames can map to
/// the same name (`a-b` and `a_b`); the second registration then shares the first
/// one's database.
///
/// # Errors
/// Returns an error if the result exceeds the MySQL identifier limit.
pub fn namespace_name(username: &str) -> Result<String> {
    let sanitized: String = username
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();

    let name = format!("{NAMESPACE_PREFIX}{sanitized}");
    if name.len() > MAX_DATABASE_NAME_LENGTH {
        bail!("database name for {username:?} exceeds {MAX_DATABASE_NAME_LENGTH} characters");
    }
    Ok(name)
}

/// Create `user_<name>` with its `user_data` table if they do not exist yet.
///
/// Runs on its own connection opened without a default database.
///
/// # Errors
/// Returns an error if the name is invalid or any DDL statement fails.
#[instrument(skip(database))]
pub async fn provision_user_namespace(database: &Database, username: &str) -> Result<String> {
    let name = namespace_name(username)?;
    let mut connection = database.connect_without_database().await?;

    let result = create_namespace(&mut connection, &name).await;

    if let Err(e) = connection.close().await {
        warn!("failed to close provisioning connection: {e}");
    }

    result.map(|()| {
        info!("created database {name} with user_data table");
        name
    })
}

async fn create_namespace(connection: &mut MySqlConnection, name: &str) -> Result<()> {
    // Identifiers cannot be bound; `name` is restricted to [a-z0-9_] above.
    let create_database = format!("CREATE DATABASE IF NOT EXISTS `{name}`");
    connection
        .execute(sqlx::raw_sql(&create_database))
        .instrument(query_span("CREATE DATABASE", &create_database))
        .await
        .with_context(|| format!("failed to create database {name}"))?;

    let create_table = format!(
        r"
        CREATE TABLE IF NOT EXISTS `{name}`.user_data (
            id INT AUTO_INCREMENT PRIMARY KEY,
            data_key VARCHAR(255) NOT NULL,
            data_value TEXT,
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP,
            INDEX idx_data_key (data_key)
        ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4 COLLATE=utf8mb4_unicode_ci
        "
    );
    connection
        .execute(sqlx::raw_sql(&create_table))
        .instrument(query_span("CREATE TABLE", &create_table))
        .await
        .with_context(|| format!("failed to create user_data table in {name}"))?;

    Ok(())
}
