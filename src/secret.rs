//! Session Signing Secret
//!
//! The HMAC key that signs session tokens is process-wide configuration:
//! loaded once at startup, validated, and handed to the token codec. A
//! secret that is missing or too short stops the process; there is no
//! mode in which authentication runs unsigned.
//!
//! Beyond the hard length floor, the secret is inspected for obvious
//! weaknesses (placeholder words, low Shannon entropy). Those findings are
//! logged as warnings so operators notice them without the service
//! refusing to boot.
//!
//! # Example
//!
//! ```
//! use latchkey::secret::{generate_secret, SigningSecret};
//!
//! let secret = SigningSecret::new(generate_secret(64)).unwrap();
//! assert_eq!(secret.len(), 64);
//!
//! assert!(SigningSecret::new("too-short".to_string()).is_err());
//! ```

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

/// Minimum accepted secret length in characters
pub const MIN_SECRET_LENGTH: usize = 32;

/// Entropy (bits) below which a warning is logged
const WARN_ENTROPY_BITS: f64 = 96.0;

/// Signing secret validation failures
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SecretError {
    /// No secret configured
    #[error("JWT_SECRET is not set")]
    Missing,

    /// Secret shorter than the minimum
    #[error("JWT_SECRET must be at least {minimum} characters (got {actual})")]
    TooShort { actual: usize, minimum: usize },
}

/// A validated token signing secret
///
/// `Debug` output is redacted so the key never reaches logs.
#[derive(Clone)]
pub struct SigningSecret(String);

impl SigningSecret {
    /// Validate and wrap a secret
    pub fn new(secret: String) -> Result<Self, SecretError> {
        let actual = secret.chars().count();
        if actual == 0 {
            return Err(SecretError::Missing);
        }
        if actual < MIN_SECRET_LENGTH {
            return Err(SecretError::TooShort {
                actual,
                minimum: MIN_SECRET_LENGTH,
            });
        }

        for warning in weaknesses(&secret) {
            tracing::warn!(warning = %warning, "Signing secret looks weak");
        }

        Ok(Self(secret))
    }

    /// Raw key bytes for HMAC
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Length in characters
    pub fn len(&self) -> usize {
        self.0.chars().count()
    }

    /// Always false for a validated secret
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SigningSecret([REDACTED; {} chars])", self.len())
    }
}

/// Non-fatal weaknesses found in a secret
fn weaknesses(secret: &str) -> Vec<String> {
    const WEAK_PATTERNS: &[&str] = &[
        "secret", "password", "changeme", "example", "default", "your-",
        "replace", "123456", "qwerty",
    ];

    let mut found = Vec::new();
    let lower = secret.to_lowercase();
    if let Some(pattern) = WEAK_PATTERNS.iter().find(|p| lower.contains(*p)) {
        found.push(format!("contains placeholder pattern '{}'", pattern));
    }

    let entropy = calculate_entropy(secret);
    if entropy < WARN_ENTROPY_BITS {
        found.push(format!(
            "estimated entropy {:.1} bits is below {:.0} bits",
            entropy, WARN_ENTROPY_BITS
        ));
    }

    found
}

/// Shannon entropy of a string in bits (per-char entropy times length)
pub fn calculate_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut counts: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *counts.entry(c).or_insert(0) += 1;
    }

    let total = s.chars().count() as f64;
    let per_char: f64 = counts
        .values()
        .map(|&count| {
            let p = count as f64 / total;
            -p * p.log2()
        })
        .sum();

    per_char * total
}

/// Generate a random secret from a URL- and shell-safe alphabet
pub fn generate_secret(length: usize) -> String {
    use rand::Rng;

    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_.~";

    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect()
}
