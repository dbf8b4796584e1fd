//! Request-scoped connections.
//!
//! Every request gets a fresh [`RequestConnection`] from the `scope_store`
//! middleware. Nothing is opened until a handler calls [`RequestConnection::acquire`];
//! later calls in the same request reuse that connection. The middleware closes it
//! once the handler returns. On a panic the connection is dropped with the request,
//! which closes the socket.

use anyhow::{anyhow, Result};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use sqlx::{mysql::MySqlConnection, Connection};
use std::sync::Arc;
use tokio::sync::{MappedMutexGuard, Mutex, MutexGuard};
use tracing::{debug, warn};

use super::Database;
use crate::accounts::store::{RequestStore, StoreProvider, UserStore};

pub struct RequestConnection {
    database: Database,
    slot: Mutex<Option<MySqlConnection>>,
}

impl RequestConnection {
    #[must_use]
    pub fn new(database: Database) -> Self {
        Self {
            database,
            slot: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn database(&self) -> &Database {
        &self.database
    }

    /// Connection for this request, opened on first use.
    ///
    /// # Errors
    /// Returns an error if the connection cannot be opened.
    pub async fn acquire(&self) -> Result<MappedMutexGuard<'_, MySqlConnection>> {
        let mut slot = self.slot.lock().await;
        if slot.is_none() {
            *slot = Some(self.database.connect().await?);
        }
        MutexGuard::try_map(slot, Option::as_mut)
            .map_err(|_| anyhow!("request connection is not available"))
    }

    /// Whether a connection has been opened and not yet released.
    pub async fn is_open(&self) -> bool {
        self.slot.lock().await.is_some()
    }

    /// Close the connection if one was opened.
    pub async fn close(&self) {
        let Some(connection) = self.slot.lock().await.take() else {
            return;
        };
        match connection.close().await {
            Ok(()) => debug!("request connection closed"),
            Err(e) => warn!("failed to close request connection: {e}"),
        }
    }
}

impl StoreProvider for Database {
    fn open(&self) -> Arc<dyn UserStore> {
        Arc::new(RequestConnection::new(self.clone()))
    }
}

/// Open a store for the request, hand it to the handler, release it afterwards.
pub async fn scope_store(
    State(provider): State<Arc<dyn StoreProvider>>,
    mut request: Request,
    next: Next,
) -> Response {
    let store = provider.open();
    request
        .extensions_mut()
        .insert(RequestStore(Arc::clone(&store)));

    let response = next.run(request).await;

    store.release().await;

    response
}
