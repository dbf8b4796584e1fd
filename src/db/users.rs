//! `users` table queries.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{mysql::MySqlRow, Row};
use tracing::{instrument, Instrument};

use super::{is_unique_violation, query_span, request::RequestConnection, schema};
use crate::accounts::store::{InsertOutcome, UserRecord, UserStore};

const INSERT_USER: &str = "INSERT INTO users (username, email, password) VALUES (?, ?, ?)";
const SELECT_USER: &str =
    "SELECT id, username, email, password, created_at FROM users WHERE username = ?";

#[async_trait]
impl UserStore for RequestConnection {
    #[instrument(skip(self, digest))]
    async fn insert_user(
        &self,
        username: &str,
        email: &str,
        digest: &str,
    ) -> Result<InsertOutcome> {
        let mut connection = self.acquire().await?;

        let result = sqlx::query(INSERT_USER)
            .bind(username)
            .bind(email)
            .bind(digest)
            .execute(&mut *connection)
            .instrument(query_span("INSERT", INSERT_USER))
            .await;

        match result {
            Ok(_) => Ok(InsertOutcome::Created),
            Err(err) if is_unique_violation(&err) => Ok(InsertOutcome::Conflict),
            Err(err) => Err(err).context("failed to insert user"),
        }
    }

    #[instrument(skip(self))]
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>> {
        let mut connection = self.acquire().await?;

        let row = sqlx::query(SELECT_USER)
            .bind(username)
            .fetch_optional(&mut *connection)
            .instrument(query_span("SELECT", SELECT_USER))
            .await
            .context("failed to lookup user")?;

        row.map(|row| user_record(&row)).transpose()
    }

    async fn provision_namespace(&self, username: &str) -> Result<String> {
        schema::provision_user_namespace(self.database(), username).await
    }

    async fn release(&self) {
        self.close().await;
    }
}

fn user_record(row: &MySqlRow) -> Result<UserRecord> {
    let id: i32 = row.try_get("id").context("users.id")?;
    Ok(UserRecord {
        id: u64::try_from(id).context("users.id is negative")?,
        username: row.try_get("username").context("users.username")?,
        email: row.try_get("email").context("users.email")?,
        password_digest: row.try_get("password").context("users.password")?,
        created_at: row.try_get("created_at").context("users.created_at")?,
    })
}
