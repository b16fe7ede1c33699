//! Credential Hashing
//!
//! One-way, salted hashing of user passwords with Argon2id.
//!
//! Hashes are stored in PHC string format (`$argon2id$v=19$m=...`), so the
//! parameters travel with each hash and a cost change only affects new
//! hashes. Verification never fails loudly: a stored hash that cannot be
//! parsed is reported as a mismatch, exactly like a wrong password.
//!
//! # Usage
//!
//! ```
//! use latchkey::password::CredentialHasher;
//!
//! let hasher = CredentialHasher::for_testing();
//! let hash = hasher.hash("correct horse battery").unwrap();
//!
//! assert!(hasher.verify("correct horse battery", &hash));
//! assert!(!hasher.verify("wrong password", &hash));
//! ```

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use thiserror::Error;

/// Default Argon2 time cost (iterations)
pub const DEFAULT_TIME_COST: u32 = 3;

/// Default Argon2 memory cost in KiB (19 MiB)
pub const DEFAULT_MEMORY_COST_KIB: u32 = 19 * 1024;

/// Errors raised while producing a hash
///
/// These indicate an environment problem (bad parameters, RNG or memory
/// failure), never a user mistake.
#[derive(Debug, Error)]
pub enum PasswordError {
    /// Argon2 rejected the configured cost parameters
    #[error("Invalid password hashing parameters: {0}")]
    InvalidParams(String),

    /// Hashing itself failed
    #[error("Password hashing failed: {0}")]
    Hash(String),

    /// The blocking hashing task could not complete
    #[error("Password hashing task failed: {0}")]
    Task(String),
}

/// Argon2id password hasher with a tunable cost factor
#[derive(Debug, Clone)]
pub struct CredentialHasher {
    params: Params,
}

impl Default for CredentialHasher {
    fn default() -> Self {
        Self {
            params: Params::new(DEFAULT_MEMORY_COST_KIB, DEFAULT_TIME_COST, 1, None)
                .unwrap_or_default(),
        }
    }
}

impl CredentialHasher {
    /// Create a hasher with the given time cost and the default memory cost
    pub fn new(time_cost: u32) -> Result<Self, PasswordError> {
        Self::with_costs(DEFAULT_MEMORY_COST_KIB, time_cost)
    }

    /// Create a hasher with explicit memory (KiB) and time costs
    pub fn with_costs(memory_cost_kib: u32, time_cost: u32) -> Result<Self, PasswordError> {
        let params = Params::new(memory_cost_kib, time_cost, 1, None)
            .map_err(|e| PasswordError::InvalidParams(e.to_string()))?;
        Ok(Self { params })
    }

    /// Cheapest parameters Argon2 accepts. Tests only.
    pub fn for_testing() -> Self {
        Self {
            params: Params::new(Params::MIN_M_COST, Params::MIN_T_COST, 1, None)
                .unwrap_or_default(),
        }
    }

    /// Configured time cost
    pub fn time_cost(&self) -> u32 {
        self.params.t_cost()
    }

    fn argon2(&self) -> Argon2<'_> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a plaintext password with a fresh random salt
    pub fn hash(&self, plaintext: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2()
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| PasswordError::Hash(e.to_string()))
    }

    /// Verify a plaintext password against a stored PHC hash
    ///
    /// Malformed hashes yield `false`. The parameters embedded in the
    /// stored hash are used, not this hasher's.
    pub fn verify(&self, plaintext: &str, stored_hash: &str) -> bool {
        match PasswordHash::new(stored_hash) {
            Ok(parsed) => self
                .argon2()
                .verify_password(plaintext.as_bytes(), &parsed)
                .is_ok(),
            Err(e) => {
                tracing::warn!(error = %e, "Stored password hash is malformed");
                false
            }
        }
    }

    /// Hash on the blocking thread pool
    pub async fn hash_blocking(&self, plaintext: String) -> Result<String, PasswordError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&plaintext))
            .await
            .map_err(|e| PasswordError::Task(e.to_string()))?
    }

    /// Verify on the blocking thread pool
    ///
    /// A panicked or cancelled task counts as a mismatch.
    pub async fn verify_blocking(&self, plaintext: String, stored_hash: String) -> bool {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&plaintext, &stored_hash))
            .await
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_then_verify() {
        let hasher = CredentialHasher::for_testing();
        let hash = hasher.hash("password123").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify("password123", &hash));
    }

    #[test]
    fn test_wrong_password_rejected() {
        let hasher = CredentialHasher::for_testing();
        let hash = hasher.hash("password123").unwrap();

        assert!(!hasher.verify("password124", &hash));
        assert!(!hasher.verify("", &hash));
    }

    #[test]
    fn test_salted_hashes_differ() {
        let hasher = CredentialHasher::for_testing();
        let a = hasher.hash("same-password").unwrap();
        let b = hasher.hash("same-password").unwrap();

        assert_ne!(a, b);
        assert!(hasher.verify("same-password", &a));
        assert!(hasher.verify("same-password", &b));
    }

    #[test]
    fn test_malformed_hash_is_mismatch() {
        let hasher = CredentialHasher::for_testing();

        assert!(!hasher.verify("anything", ""));
        assert!(!hasher.verify("anything", "not-a-hash"));
        assert!(!hasher.verify("anything", "$argon2id$v=19$garbage"));
        assert!(!hasher.verify("anything", "$2a$12$bcryptlookingvalue"));
    }

    #[test]
    fn test_verify_uses_embedded_params() {
        let cheap = CredentialHasher::for_testing();
        let hash = cheap.hash("portable").unwrap();

        let costly = CredentialHasher::with_costs(DEFAULT_MEMORY_COST_KIB, 2).unwrap();
        assert!(costly.verify("portable", &hash));
    }

    #[test]
    fn test_invalid_cost_rejected() {
        assert!(matches!(
            CredentialHasher::new(0),
            Err(PasswordError::InvalidParams(_))
        ));
        assert_eq!(CredentialHasher::new(4).unwrap().time_cost(), 4);
    }

    #[tokio::test]
    async fn test_blocking_wrappers() {
        let hasher = CredentialHasher::for_testing();
        let hash = hasher.hash_blocking("offloaded".to_string()).await.unwrap();

        assert!(hasher.verify_blocking("offloaded".to_string(), hash.clone()).await);
        assert!(!hasher.verify_blocking("other".to_string(), hash).await);
    }
}
