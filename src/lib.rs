//! # Registrar
//!
//! `registrar` is a small registration and login web service backed by MySQL.
//!
//! ## Flows
//!
//! - **Register:** `POST /register` hashes the password with Argon2id and inserts a
//!   row into `users`. Username and email uniqueness is enforced by the database, so
//!   two concurrent registrations of the same name cannot both succeed.
//! - **Login:** `POST /login` looks the user up by username and verifies the digest.
//!   Unknown users and wrong passwords produce the same error.
//! - **Logout:** `GET /logout` drops the server-side session and expires the cookie.
//!
//! ## Per-user databases
//!
//! When enabled, every successful registration also provisions a database named
//! `user_<sanitized username>` holding a `user_data` key/value table. Provisioning is
//! best-effort: a failure is logged and the account is kept.
//!
//! ## Startup
//!
//! The `users` table is created (if absent) before the listener is bound. The
//! database is retried a bounded number of times; exhausting the retries aborts startup.

pub mod accounts;
pub mod cli;
pub mod db;
pub mod registrar;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(
            GIT_COMMIT_HASH.len() >= 7,
            "GIT_COMMIT_HASH should be at least 7 characters long, got: {GIT_COMMIT_HASH}"
        );
    }
}
