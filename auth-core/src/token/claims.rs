use std::fmt;

use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// What a token is allowed to authorize.
///
/// A session token is never accepted where a reset token is required, and
/// vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenPurpose {
    /// Authenticated session credential issued on login.
    Session,
    /// Short-lived password-reset credential issued on forgot-password.
    Reset,
}

impl fmt::Display for TokenPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenPurpose::Session => write!(f, "session"),
            TokenPurpose::Reset => write!(f, "reset"),
        }
    }
}

/// Signed token payload.
///
/// Self-contained: everything needed for signature, expiry, and purpose
/// checks lives here. Only revocation requires external state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Subject identity (account email)
    pub sub: String,

    /// Purpose tag
    pub purpose: TokenPurpose,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Create claims for a subject, expiring `ttl` from now.
    pub fn new(subject: impl Into<String>, purpose: TokenPurpose, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: subject.into(),
            purpose,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        }
    }

    /// Subject identity carried by the token.
    pub fn subject(&self) -> &str {
        &self.sub
    }

    /// Expiry as a UTC timestamp.
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or_else(Utc::now)
    }

    /// Check whether the token is past expiry at `current_timestamp`.
    pub fn is_expired(&self, current_timestamp: i64) -> bool {
        self.exp < current_timestamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_claims_ttl() {
        let claims = Claims::new("user@example.com", TokenPurpose::Session, Duration::hours(2));

        assert_eq!(claims.subject(), "user@example.com");
        assert_eq!(claims.purpose, TokenPurpose::Session);
        assert_eq!(claims.exp - claims.iat, 2 * 60 * 60);
    }

    #[test]
    fn test_is_expired() {
        let mut claims = Claims::new("user@example.com", TokenPurpose::Reset, Duration::zero());
        claims.exp = 1000;

        assert!(!claims.is_expired(999));
        assert!(!claims.is_expired(1000)); // Exactly at expiration
        assert!(claims.is_expired(1001));
    }

    #[test]
    fn test_purpose_serialization() {
        let session = serde_json::to_string(&TokenPurpose::Session).unwrap();
        let reset = serde_json::to_string(&TokenPurpose::Reset).unwrap();

        assert_eq!(session, "\"session\"");
        assert_eq!(reset, "\"reset\"");
    }
}
