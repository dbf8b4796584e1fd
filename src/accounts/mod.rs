//! Account registration and authentication.

pub mod password;
pub mod store;

#[cfg(test)]
pub(crate) mod memory;

use anyhow::Context;
use regex::Regex;
use std::{fmt, sync::OnceLock};
use thiserror::Error;
use tokio::task;
use tracing::{debug, info, instrument, warn};

use self::store::{InsertOutcome, UserStore};

pub const USERNAME_MAX_LENGTH: usize = 100;
pub const EMAIL_MAX_LENGTH: usize = 100;

#[derive(Debug, Error)]
pub enum AccountError {
    /// Username or email already registered. Deliberately does not name the field.
    #[error("registration failed, username or email may already exist")]
    Conflict,
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("{0}")]
    Invalid(&'static str),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Authenticated user, as kept in the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity(String);

impl Identity {
    #[must_use]
    pub fn new(username: impl Into<String>) -> Self {
        Self(username.into())
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AccountSettings {
    pub provision_user_databases: bool,
}

impl Default for AccountSettings {
    fn default() -> Self {
        Self {
            provision_user_databases: true,
        }
    }
}

pub struct AccountService<'a> {
    store: &'a dyn UserStore,
    settings: AccountSettings,
}

impl<'a> AccountService<'a> {
    #[must_use]
    pub fn new(store: &'a dyn UserStore, settings: AccountSettings) -> Self {
        Self { store, settings }
    }

    /// Create an account.
    ///
    /// # Errors
    /// [`AccountError::Invalid`] for malformed input, [`AccountError::Conflict`] when
    /// the username or email is taken, [`AccountError::Storage`] for database failures.
    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<(), AccountError> {
        validate_registration(username, email, password)?;

        let plaintext = password.to_string();
        let digest = task::spawn_blocking(move || password::hash(&plaintext))
            .await
            .context("password hashing task failed")??;

        match self.store.insert_user(username, email, &digest).await? {
            InsertOutcome::Conflict => {
                debug!("username or email already registered");
                return Err(AccountError::Conflict);
            }
            InsertOutcome::Created => info!("user registered"),
        }

        // The user row is already committed. A provisioning failure leaves the account
        // without its database; it is logged and not rolled back.
        if self.settings.provision_user_databases {
            match self.store.provision_namespace(username).await {
                Ok(name) => info!(database = %name, "user database provisioned"),
                Err(e) => warn!("user registered but database creation failed: {e:#}"),
            }
        }

        Ok(())
    }

    /// Verify a username/password pair.
    ///
    /// # Errors
    /// [`AccountError::InvalidCredentials`] for an unknown user or a wrong password,
    /// [`AccountError::Storage`] for database failures.
    #[instrument(skip(self, password))]
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Identity, AccountError> {
        let record = self.store.find_by_username(username).await?;

        // Unknown users are checked against a throwaway digest so both failure paths
        // cost one Argon2 verification.
        let stored = record.as_ref().map(|record| record.password_digest.clone());

        let plaintext = password.to_string();
        let matches = task::spawn_blocking(move || {
            let digest = stored.as_deref().unwrap_or_else(|| dummy_digest());
            password::verify(digest, &plaintext)
        })
        .await
        .context("password verification task failed")?;

        match record {
            Some(record) if matches => {
                debug!("login successful");
                Ok(Identity::new(record.username))
            }
            _ => {
                debug!("invalid credentials");
                Err(AccountError::InvalidCredentials)
            }
        }
    }
}

/// Computed on first use; only call from the blocking pool.
fn dummy_digest() -> &'static str {
    static DIGEST: OnceLock<String> = OnceLock::new();
    DIGEST.get_or_init(|| password::hash("registrar-dummy-password").unwrap_or_default())
}

/// Basic email format check.
pub(crate) fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|regex| regex.is_match(email))
}

fn validate_registration(username: &str, email: &str, password: &str) -> Result<(), AccountError> {
    if username.trim().is_empty() || email.trim().is_empty() || password.is_empty() {
        return Err(AccountError::Invalid(
            "Username, email and password are required.",
        ));
    }
    if username.chars().count() > USERNAME_MAX_LENGTH {
        return Err(AccountError::Invalid("Username is too long."));
    }
    if email.chars().count() > EMAIL_MAX_LENGTH {
        return Err(AccountError::Invalid("Email is too long."));
    }
    if !valid_email(email) {
        return Err(AccountError::Invalid("Invalid email address."));
    }
    Ok(())
}
