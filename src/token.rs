//! Session Token Codec
//!
//! Issues and verifies the signed, time-limited token that carries a
//! [`SessionClaim`]. Tokens are HS256 JWTs:
//!
//! ```text
//! header  {"alg":"HS256","typ":"JWT"}
//! payload {"userId":"<id>","email":"<email>","iat":<unix>,"exp":<unix>}
//! ```
//!
//! Verification pins HS256. A token whose header names any other
//! algorithm is rejected before its signature is looked at. Every failure
//! (bad structure, bad signature, wrong algorithm, expired) collapses into
//! `None`; the reason is only logged at debug level.

use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::secret::SigningSecret;

/// Nominal session lifetime: 7 days
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

const SIGNING_ALGORITHM: Algorithm = Algorithm::HS256;

/// Identity captured at issuance
///
/// Not refreshed from the store while the token lives, so it can lag
/// behind profile edits until the next login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaim {
    /// User identifier
    #[serde(rename = "userId")]
    pub user_id: String,
    /// Email at the time of issuance
    pub email: String,
}

impl SessionClaim {
    pub fn new(user_id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            email: email.into(),
        }
    }
}

/// On-the-wire token payload
#[derive(Debug, Serialize, Deserialize)]
struct TokenPayload {
    #[serde(flatten)]
    claim: SessionClaim,
    iat: i64,
    exp: i64,
}

/// Token issuance failure
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Token encoding failed: {0}")]
    Encode(#[from] jsonwebtoken::errors::Error),

    #[error("Session lifetime is out of range")]
    InvalidTtl,
}

/// Signs and verifies session tokens with a process-wide secret
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: chrono::Duration,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &SIGNING_ALGORITHM)
            .field("ttl_secs", &self.ttl.num_seconds())
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    /// Create a codec bound to `secret`, issuing tokens valid for `ttl`
    pub fn new(secret: &SigningSecret, ttl: Duration) -> Result<Self, TokenError> {
        // `exp` has whole-second resolution
        let ttl = chrono::Duration::from_std(ttl).map_err(|_| TokenError::InvalidTtl)?;
        if ttl < chrono::Duration::seconds(1) {
            return Err(TokenError::InvalidTtl);
        }

        let mut validation = Validation::new(SIGNING_ALGORITHM);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        })
    }

    /// Token lifetime in whole seconds
    pub fn ttl_secs(&self) -> i64 {
        self.ttl.num_seconds()
    }

    /// Issue a token for `claim`, valid from now
    pub fn issue(&self, claim: &SessionClaim) -> Result<String, TokenError> {
        self.issue_at(claim, Utc::now())
    }

    /// Issue a token as if it were `issued_at`
    pub fn issue_at(
        &self,
        claim: &SessionClaim,
        issued_at: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let payload = TokenPayload {
            claim: claim.clone(),
            iat: issued_at.timestamp(),
            exp: (issued_at + self.ttl).timestamp(),
        };

        Ok(encode(
            &Header::new(SIGNING_ALGORITHM),
            &payload,
            &self.encoding_key,
        )?)
    }

    /// Verify signature, algorithm and expiry; return the claim if all hold
    pub fn verify(&self, token: &str) -> Option<SessionClaim> {
        match decode::<TokenPayload>(token, &self.decoding_key, &self.validation) {
            Ok(data) => Some(data.claims.claim),
            Err(e) => {
                tracing::debug!(reason = ?e.kind(), "Session token rejected");
                None
            }
        }
    }
}
