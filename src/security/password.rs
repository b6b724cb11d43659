use std::sync::OnceLock;

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher as _, PasswordVerifier as _};
use rand::rngs::OsRng;

const DECOY_PASSWORD: &str = "decoy-password-for-unknown-users";

/// Salted one-way hashing of user passwords (Argon2id, PHC string format).
pub struct PasswordHasher {
    argon2: Argon2<'static>,
    decoy: OnceLock<String>,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(Argon2::default())
    }
}

impl PasswordHasher {
    pub fn new(argon2: Argon2<'static>) -> Self {
        Self {
            argon2,
            decoy: OnceLock::new(),
        }
    }

    pub fn hash(&self, password: &str) -> anyhow::Result<String> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))
    }

    /// `false` on mismatch and on a stored hash that does not parse.
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        let parsed_hash = match PasswordHash::new(hash) {
            Ok(h) => h,
            Err(_) => return false,
        };

        self.argon2
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }

    /// Runs one verification against a decoy hash and always returns `false`.
    /// Login calls this for unknown usernames so they cost as much as a
    /// wrong password.
    pub fn verify_dummy(&self, password: &str) -> bool {
        match self.decoy_hash() {
            Some(decoy) => {
                let _ = self.verify(password, decoy);
            }
            // Same cost as a verification; the decoy is retried next time.
            None => {
                let _ = self.hash(password);
            }
        }
        false
    }

    /// Hashes the decoy on first use. A failed attempt is logged and not
    /// cached.
    fn decoy_hash(&self) -> Option<&str> {
        if let Some(decoy) = self.decoy.get() {
            return Some(decoy.as_str());
        }
        match self.hash(DECOY_PASSWORD) {
            Ok(hash) => Some(self.decoy.get_or_init(|| hash).as_str()),
            Err(e) => {
                tracing::error!(error = %e, "cannot prepare decoy password hash");
                None
            }
        }
    }
}

#[cfg(test)]
pub(crate) fn fast_hasher() -> PasswordHasher {
    use argon2::{Algorithm, Params, Version};

    let params = Params::new(Params::MIN_M_COST, 1, 1, None).unwrap();
    PasswordHasher::new(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hasher = fast_hasher();
        let hash = hasher.hash("secret123").unwrap();
        assert_ne!(hash, "secret123");
        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify("secret123", &hash));
        assert!(!hasher.verify("secret124", &hash));
    }

    #[test]
    fn hashes_are_salted() {
        let hasher = fast_hasher();
        let a = hasher.hash("same").unwrap();
        let b = hasher.hash("same").unwrap();
        assert_ne!(a, b);
        assert!(hasher.verify("same", &a) && hasher.verify("same", &b));
    }

    #[test]
    fn malformed_hash_is_a_mismatch() {
        let hasher = fast_hasher();
        assert!(!hasher.verify("secret123", ""));
        assert!(!hasher.verify("secret123", "not-a-phc-string"));
        assert!(!hasher.verify("secret123", "secret123"));
    }

    #[test]
    fn verifies_hashes_made_with_other_params() {
        let strong = PasswordHasher::default().hash("secret123").unwrap();
        assert!(fast_hasher().verify("secret123", &strong));
    }

    #[test]
    fn decoy_is_a_real_hash_made_once() {
        let hasher = fast_hasher();
        assert!(hasher.decoy.get().is_none());

        hasher.verify_dummy("anything");
        let decoy = hasher.decoy.get().cloned().unwrap();
        assert!(decoy.starts_with("$argon2id$"));
        assert!(hasher.verify(DECOY_PASSWORD, &decoy));

        hasher.verify_dummy("something else");
        assert_eq!(hasher.decoy_hash(), Some(decoy.as_str()));
    }

    #[test]
    fn decoy_never_matches() {
        let hasher = fast_hasher();
        assert!(!hasher.verify_dummy(DECOY_PASSWORD));
        assert!(!hasher.verify_dummy("anything"));
    }
}
