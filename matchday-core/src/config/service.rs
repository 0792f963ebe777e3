//! Service (moderator/admin) authentication.

use argon2::{Argon2, PasswordHash, PasswordVerifier};

/// Holds the argon2 hash of the service secret.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    secret_hash: String,
}

impl ServiceConfig {
    pub fn new(secret_hash: impl Into<String>) -> Self {
        Self {
            secret_hash: secret_hash.into(),
        }
    }

    /// Check a presented secret against the stored hash.
    ///
    /// An unparsable stored hash rejects everything.
    pub fn verify(&self, presented: &str) -> bool {
        let Ok(hash) = PasswordHash::new(&self.secret_hash) else {
            tracing::error!("service secret hash is not a valid PHC string");
            return false;
        };
        Argon2::default()
            .verify_password(presented.as_bytes(), &hash)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argon2::PasswordHasher;
    use argon2::password_hash::{SaltString, rand_core::OsRng};

    #[test]
    fn verifies_only_the_hashed_secret() {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(b"moderator-secret", &salt)
            .unwrap()
            .to_string();
        let config = ServiceConfig::new(hash);
        assert!(config.verify("moderator-secret"));
        assert!(!config.verify("wrong"));
    }

    #[test]
    fn garbage_hash_rejects() {
        assert!(!ServiceConfig::new("not-a-hash").verify("not-a-hash"));
    }
}
