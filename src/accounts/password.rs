//! Password digests (Argon2id, PHC string format).

use anyhow::{anyhow, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Hash a plaintext password with a fresh random salt.
///
/// The returned string embeds the algorithm, parameters and salt, so it is all
/// `verify` needs.
///
/// # Errors
/// Returns an error if the hasher rejects the input (only for pathological lengths).
pub fn hash(plaintext: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|digest| digest.to_string())
        .map_err(|e| anyhow!("password hashing failed: {e}"))
}

/// Check `plaintext` against a digest produced by [`hash`].
///
/// A digest that does not parse never verifies.
#[must_use]
pub fn verify(digest: &str, plaintext: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(digest) else {
        return false;
    };

    Argon2::default()
        .verify_password(plaintext.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_accepts_matching_password() -> Result<()> {
        for password in ["pw123", "", "correct horse battery staple", "pässwörd"] {
            let digest = hash(password)?;
            assert!(verify(&digest, password), "failed for {password:?}");
        }
        Ok(())
    }

    #[test]
    fn verify_rejects_other_password() -> Result<()> {
        let digest = hash("pw123")?;
        assert!(!verify(&digest, "wrongpw"));
        assert!(!verify(&digest, "pw1234"));
        assert!(!verify(&digest, ""));
        Ok(())
    }

    #[test]
    fn hash_is_salted() -> Result<()> {
        let first = hash("pw123")?;
        let second = hash("pw123")?;
        assert_ne!(first, second);
        assert!(first.starts_with("$argon2id$"));
        Ok(())
    }

    #[test]
    fn verify_rejects_malformed_digest() {
        assert!(!verify("not-a-digest", "pw123"));
        assert!(!verify("", ""));
    }
}
