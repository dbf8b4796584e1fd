//! In-memory [`UserStore`] used by tests.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use super::store::{InsertOutcome, StoreProvider, UserRecord, UserStore};
use crate::db::schema::namespace_name;

#[derive(Default)]
struct Tables {
    users: Vec<UserRecord>,
    namespaces: Vec<String>,
}

#[derive(Clone, Default)]
pub(crate) struct MemoryBackend {
    tables: Arc<Mutex<Tables>>,
    releases: Arc<AtomicUsize>,
    fail_provisioning: bool,
    fail_storage: bool,
}

impl MemoryBackend {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_failing_provisioning(mut self) -> Self {
        self.fail_provisioning = true;
        self
    }

    pub(crate) fn with_failing_storage(mut self) -> Self {
        self.fail_storage = true;
        self
    }

    pub(crate) fn namespaces(&self) -> Vec<String> {
        self.lock().map(|t| t.namespaces.clone()).unwrap_or_default()
    }

    pub(crate) fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Tables>> {
        if self.fail_storage {
            return Err(anyhow!("connection refused"));
        }
        self.tables.lock().map_err(|_| anyhow!("memory store poisoned"))
    }
}

#[async_trait]
impl UserStore for MemoryBackend {
    async fn insert_user(
        &self,
        username: &str,
        email: &str,
        digest: &str,
    ) -> Result<InsertOutcome> {
        // Check and insert under one lock, like a UNIQUE index would.
        let mut tables = self.lock()?;
        if tables
            .users
            .iter()
            .any(|u| u.username == username || u.email == email)
        {
            return Ok(InsertOutcome::Conflict);
        }
        let id = tables.users.len() as u64 + 1;
        tables.users.push(UserRecord {
            id,
            username: username.to_string(),
            email: email.to_string(),
            password_digest: digest.to_string(),
            created_at: Utc::now(),
        });
        Ok(InsertOutcome::Created)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>> {
        let tables = self.lock()?;
        Ok(tables.users.iter().find(|u| u.username == username).cloned())
    }

    async fn provision_namespace(&self, username: &str) -> Result<String> {
        if self.fail_provisioning {
            return Err(anyhow!("access denied for CREATE DATABASE"));
        }
        let name = namespace_name(username)?;
        let mut tables = self.lock()?;
        if !tables.namespaces.contains(&name) {
            tables.namespaces.push(name.clone());
        }
        Ok(name)
    }

    async fn release(&self) {
        self.releases.fetch_add(1, Ordering::SeqCst);
    }
}

impl StoreProvider for MemoryBackend {
    fn open(&self) -> Arc<dyn UserStore> {
        Arc::new(self.clone())
    }
}
