//! Server-side sessions behind a signed cookie.
//!
//! The cookie carries a random token; the store keeps only its SHA-256 hash, mapped
//! to the username. The cookie is additionally signed with a key derived from the
//! configured session secret, so tampered cookies are dropped before any lookup.

use anyhow::{Context, Result};
use base64ct::{Base64UrlUnpadded, Encoding};
use rand::{rngs::OsRng, RngCore};
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256, Sha512};
use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::RwLock;
use tower_cookies::{cookie::SameSite, Cookie, Cookies, Key};
use tracing::debug;

use crate::accounts::Identity;

pub const SESSION_COOKIE_NAME: &str = "registrar_session";
pub const DEFAULT_SESSION_SECRET: &str = "supersecretkey";
pub const DEFAULT_SESSION_TTL_SECONDS: u64 = 12 * 60 * 60;

struct SessionEntry {
    identity: Identity,
    expires_at: Instant,
}

/// Token hash to identity, shared by all requests.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Vec<u8>, SessionEntry>>>,
}

impl SessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `identity` and return the raw token for the cookie.
    ///
    /// Expired sessions are dropped on every insert.
    ///
    /// # Errors
    /// Returns an error if the OS random source fails or `ttl` is out of range.
    pub async fn create(&self, identity: Identity, ttl: Duration) -> Result<String> {
        let now = Instant::now();
        let expires_at = now
            .checked_add(ttl)
            .with_context(|| format!("session ttl of {}s is out of range", ttl.as_secs()))?;
        let token = generate_session_token()?;

        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, entry| entry.expires_at > now);
        sessions.insert(
            hash_session_token(&token),
            SessionEntry {
                identity,
                expires_at,
            },
        );
        Ok(token)
    }

    /// Identity for `token`, dropping the entry if it has expired.
    pub async fn get(&self, token: &str) -> Option<Identity> {
        let key = hash_session_token(token);
        {
            let sessions = self.sessions.read().await;
            match sessions.get(&key) {
                None => return None,
                Some(entry) if entry.expires_at > Instant::now() => {
                    return Some(entry.identity.clone());
                }
                Some(_) => {}
            }
        }
        debug!("session expired");
        self.sessions.write().await.remove(&key);
        None
    }

    pub async fn destroy(&self, token: &str) {
        self.sessions
            .write()
            .await
            .remove(&hash_session_token(token));
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Maps a request's cookies to the signed-in user.
pub struct SessionGate {
    store: SessionStore,
    key: Key,
    ttl: Duration,
    secure: bool,
}

impl SessionGate {
    #[must_use]
    pub fn new(secret: &SecretString, ttl: Duration) -> Self {
        Self {
            store: SessionStore::new(),
            key: signing_key(secret),
            ttl,
            secure: false,
        }
    }

    /// Mark the cookie `Secure` (only sent over HTTPS).
    #[must_use]
    pub fn with_secure_cookie(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub async fn current_identity(&self, cookies: &Cookies) -> Option<Identity> {
        let cookie = cookies.signed(&self.key).get(SESSION_COOKIE_NAME)?;
        self.store.get(cookie.value()).await
    }

    /// Start a session for `identity` and set the cookie.
    ///
    /// # Errors
    /// Returns an error if a session token cannot be generated.
    pub async fn adopt(&self, cookies: &Cookies, identity: Identity) -> Result<()> {
        // Drop any session the client already had.
        if let Some(previous) = cookies.signed(&self.key).get(SESSION_COOKIE_NAME) {
            self.store.destroy(previous.value()).await;
        }

        let token = self.store.create(identity, self.ttl).await?;

        let mut cookie = Cookie::new(SESSION_COOKIE_NAME, token);
        cookie.set_path("/");
        cookie.set_http_only(true);
        cookie.set_same_site(SameSite::Lax);
        cookie.set_secure(self.secure);
        cookies.signed(&self.key).add(cookie);

        Ok(())
    }

    /// Forget the session and expire the cookie.
    pub async fn clear(&self, cookies: &Cookies) {
        if let Some(cookie) = cookies.signed(&self.key).get(SESSION_COOKIE_NAME) {
            self.store.destroy(cookie.value()).await;
        }

        let mut removal = Cookie::from(SESSION_COOKIE_NAME);
        removal.set_path("/");
        cookies.remove(removal);
    }
}

/// 64-byte cookie signing key from an arbitrary-length secret.
fn signing_key(secret: &SecretString) -> Key {
    let digest = Sha512::digest(secret.expose_secret().as_bytes());
    Key::from(digest.as_slice())
}

fn generate_session_token() -> Result<String> {
    let mut bytes = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to generate session token")?;
    Ok(Base64UrlUnpadded::encode_string(&bytes))
}

fn hash_session_token(token: &str) -> Vec<u8> {
    Sha256::digest(token.as_bytes()).to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_session_token_is_random_and_url_safe() -> Result<()> {
        let first = generate_session_token()?;
        let second = generate_session_token()?;
        assert_ne!(first, second);
        assert_eq!(Base64UrlUnpadded::decode_vec(&first).map(|b| b.len()), Ok(32));
        Ok(())
    }

    #[test]
    fn hash_session_token_stable() {
        assert_eq!(hash_session_token("token"), hash_session_token("token"));
        assert_ne!(hash_session_token("token"), hash_session_token("other"));
    }

    #[test]
    fn signing_key_depends_on_secret() {
        let a = signing_key(&SecretString::from("one".to_string()));
        let b = signing_key(&SecretString::from("two".to_string()));
        let a2 = signing_key(&SecretString::from("one".to_string()));
        assert_eq!(a.signing(), a2.signing());
        assert_ne!(a.signing(), b.signing());
    }

    #[tokio::test]
    async fn store_returns_identity_until_destroyed() -> Result<()> {
        let store = SessionStore::new();
        let token = store
            .create(Identity::new("alice"), Duration::from_secs(60))
            .await?;

        assert_eq!(store.get(&token).await, Some(Identity::new("alice")));
        assert_eq!(store.get("unknown").await, None);

        store.destroy(&token).await;
        assert_eq!(store.get(&token).await, None);
        assert!(store.is_empty().await);
        Ok(())
    }

    #[tokio::test]
    async fn store_drops_expired_sessions() -> Result<()> {
        let store = SessionStore::new();
        let token = store.create(Identity::new("alice"), Duration::ZERO).await?;

        assert_eq!(store.get(&token).await, None);
        assert!(store.is_empty().await);
        Ok(())
    }

    #[tokio::test]
    async fn create_prunes_abandoned_sessions() -> Result<()> {
        let store = SessionStore::new();
        for _ in 0..1000 {
            store.create(Identity::new("alice"), Duration::ZERO).await?;
        }

        let token = store
            .create(Identity::new("alice"), Duration::from_secs(60))
            .await?;

        assert_eq!(store.len().await, 1);
        assert_eq!(store.get(&token).await, Some(Identity::new("alice")));
        Ok(())
    }

    #[tokio::test]
    async fn create_rejects_overflowing_ttl() {
        let store = SessionStore::new();
        let result = store
            .create(Identity::new("alice"), Duration::from_secs(u64::MAX))
            .await;

        assert!(result.is_err());
        assert!(store.is_empty().await);
    }
}
