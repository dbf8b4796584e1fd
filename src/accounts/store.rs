//! Storage seam for accounts.
//!
//! Handlers never talk to MySQL directly: middleware opens a request-scoped
//! [`UserStore`] from the configured [`StoreProvider`], handlers use it through the
//! [`RequestStore`] extension, and the middleware releases it once the response is
//! built.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::{ops::Deref, sync::Arc};

/// Row returned when looking a user up for login.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: u64,
    pub username: String,
    pub email: String,
    pub password_digest: String,
    pub created_at: DateTime<Utc>,
}

/// Outcome of inserting a new user row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Created,
    /// Username or email already taken. Storage does not say which.
    Conflict,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user row. Uniqueness must be enforced by the store itself.
    async fn insert_user(&self, username: &str, email: &str, digest: &str)
        -> Result<InsertOutcome>;

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>>;

    /// Create the per-user database and its `user_data` table; returns its name.
    async fn provision_namespace(&self, username: &str) -> Result<String>;

    /// Close anything held for the current request.
    async fn release(&self) {}
}

/// Opens one [`UserStore`] per request.
pub trait StoreProvider: Send + Sync {
    fn open(&self) -> Arc<dyn UserStore>;
}

/// Request extension holding the store opened for the current request.
#[derive(Clone)]
pub struct RequestStore(pub Arc<dyn UserStore>);

impl Deref for RequestStore {
    type Target = dyn UserStore;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}
