use secrecy::SecretString;
use std::fmt;

use crate::{
    db::{schema::RetryPolicy, DatabaseConfig},
    registrar::session::{DEFAULT_SESSION_SECRET, DEFAULT_SESSION_TTL_SECONDS},
};

/// Settings shared by the server and its handlers.
#[derive(Clone)]
pub struct GlobalArgs {
    pub database: DatabaseConfig,
    pub retry: RetryPolicy,
    pub session_secret: SecretString,
    pub session_ttl_seconds: u64,
    pub session_cookie_secure: bool,
    pub provision_user_databases: bool,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(database: DatabaseConfig) -> Self {
        Self {
            database,
            retry: RetryPolicy::default(),
            session_secret: SecretString::from(DEFAULT_SESSION_SECRET.to_string()),
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            session_cookie_secure: false,
            provision_user_databases: true,
        }
    }

    pub fn set_session_secret(&mut self, secret: SecretString) {
        self.session_secret = secret;
    }
}

impl fmt::Debug for GlobalArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlobalArgs")
            .field("database", &self.database)
            .field("retry", &self.retry)
            .field("session_secret", &"***")
            .field("session_ttl_seconds", &self.session_ttl_seconds)
            .field("session_cookie_secure", &self.session_cookie_secure)
            .field("provision_user_databases", &self.provision_user_databases)
            .finish()
    }
}
