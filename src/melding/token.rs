// Melder capability tokens and short public identifiers

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const URL_SAFE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";
const PUBLIC_ID_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("token does not match")]
    Mismatch,
    #[error("token has been invalidated")]
    Invalidated,
    #[error("token has expired")]
    Expired,
}

/// Capability bound to one melding; authorizes the melder's steps until submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionToken {
    /// `None` once redacted; a redacted token matches nothing
    value: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub invalidated_at: Option<DateTime<Utc>>,
}

impl SubmissionToken {
    pub fn new(value: String, expires_at: DateTime<Utc>) -> Self {
        Self {
            value: Some(value),
            expires_at,
            invalidated_at: None,
        }
    }

    /// The secret itself. Only handed to the melder once, at creation.
    pub fn expose(&self) -> &str {
        self.value.as_deref().unwrap_or_default()
    }

    /// Same token without the secret, for display.
    pub fn redacted(&self) -> Self {
        Self {
            value: None,
            ..self.clone()
        }
    }

    pub fn is_invalidated(&self) -> bool {
        self.invalidated_at.is_some()
    }

    pub fn invalidate(&mut self, now: DateTime<Utc>) {
        if self.invalidated_at.is_none() {
            self.invalidated_at = Some(now);
        }
    }

    pub fn verify(&self, presented: &str, now: DateTime<Utc>) -> Result<(), TokenError> {
        if self.is_invalidated() {
            return Err(TokenError::Invalidated);
        }
        let Some(value) = &self.value else {
            return Err(TokenError::Mismatch);
        };
        if !constant_time_eq(value.as_bytes(), presented.as_bytes()) {
            return Err(TokenError::Mismatch);
        }
        if now >= self.expires_at {
            return Err(TokenError::Expired);
        }
        Ok(())
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

fn random_string(alphabet: &[u8], length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| alphabet[rng.random_range(0..alphabet.len())] as char)
        .collect()
}

#[derive(Debug, Clone)]
pub struct TokenGenerator {
    length: usize,
    duration: Duration,
}

impl Default for TokenGenerator {
    fn default() -> Self {
        Self::new(43, Duration::hours(3))
    }
}

impl TokenGenerator {
    pub fn new(length: usize, duration: Duration) -> Self {
        Self { length, duration }
    }

    pub fn generate(&self, now: DateTime<Utc>) -> SubmissionToken {
        SubmissionToken::new(random_string(URL_SAFE_ALPHABET, self.length), now + self.duration)
    }
}

#[derive(Debug, Clone)]
pub struct PublicIdGenerator {
    length: usize,
}

impl Default for PublicIdGenerator {
    fn default() -> Self {
        Self::new(6)
    }
}

impl PublicIdGenerator {
    pub fn new(length: usize) -> Self {
        Self { length }
    }

    pub fn generate(&self) -> String {
        random_string(PUBLIC_ID_ALPHABET, self.length)
    }
}
