use chrono::Duration;
use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;

use super::claims::Claims;
use super::claims::TokenPurpose;
use super::errors::TokenError;

/// Signs and verifies compact, expiring, tamper-evident tokens.
///
/// Tokens are JWTs under HS256 with a process-wide secret. The payload is the
/// fixed [`Claims`] shape; there is no custom-claim escape hatch.
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
}

impl TokenCodec {
    /// Create a codec from a signing secret.
    ///
    /// # Security Notes
    /// - The secret should be at least 256 bits (32 bytes) for HS256
    /// - Store secrets in environment variables or secure vaults, never in code
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            algorithm: Algorithm::HS256,
        }
    }

    /// Issue a signed token for `subject` with the given purpose and TTL.
    ///
    /// Embeds issued-at = now and expiry = now + `ttl`.
    ///
    /// # Errors
    /// * `EncodingFailed` - Token signing failed
    pub fn issue(
        &self,
        subject: &str,
        purpose: TokenPurpose,
        ttl: Duration,
    ) -> Result<String, TokenError> {
        let claims = Claims::new(subject, purpose, ttl);
        let header = Header::new(self.algorithm);

        encode(&header, &claims, &self.encoding_key)
            .map_err(|e| TokenError::EncodingFailed(e.to_string()))
    }

    /// Decode and validate a token, checking signature, expiry, and purpose.
    ///
    /// On success returns the claims; the caller must still confirm the
    /// subject resolves to an existing account, since the account may have
    /// been deleted or renamed after issue.
    ///
    /// # Errors
    /// * `Malformed` - Encoding or signature is invalid
    /// * `Expired` - Token is past its expiry
    /// * `PurposeMismatch` - Purpose tag differs from `expected_purpose`
    pub fn decode(
        &self,
        token: &str,
        expected_purpose: TokenPurpose,
    ) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(self.algorithm);
        // No grace window: a token one second past expiry is rejected.
        validation.leeway = 0;

        let token_data =
            decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
                match e.kind() {
                    ErrorKind::ExpiredSignature => TokenError::Expired,
                    _ => TokenError::Malformed(e.to_string()),
                }
            })?;

        let claims = token_data.claims;
        if claims.purpose != expected_purpose {
            return Err(TokenError::PurposeMismatch {
                expected: expected_purpose,
                actual: claims.purpose,
            });
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"my_secret_key_at_least_32_bytes_long!";

    #[test]
    fn test_issue_and_decode() {
        let codec = TokenCodec::new(SECRET);

        let token = codec
            .issue("alice@example.com", TokenPurpose::Session, Duration::hours(1))
            .expect("Failed to issue token");
        assert!(!token.is_empty());

        let claims = codec
            .decode(&token, TokenPurpose::Session)
            .expect("Failed to decode token");
        assert_eq!(claims.subject(), "alice@example.com");
        assert_eq!(claims.purpose, TokenPurpose::Session);
    }

    #[test]
    fn test_decode_invalid_token() {
        let codec = TokenCodec::new(SECRET);

        let result = codec.decode("invalid.token.here", TokenPurpose::Session);
        assert!(matches!(result, Err(TokenError::Malformed(_))));
    }

    #[test]
    fn test_decode_with_wrong_secret() {
        let codec1 = TokenCodec::new(b"secret1_at_least_32_bytes_long_key!");
        let codec2 = TokenCodec::new(b"secret2_at_least_32_bytes_long_key!");

        let token = codec1
            .issue("alice@example.com", TokenPurpose::Session, Duration::hours(1))
            .expect("Failed to issue token");

        let result = codec2.decode(&token, TokenPurpose::Session);
        assert!(matches!(result, Err(TokenError::Malformed(_))));
    }

    #[test]
    fn test_decode_expired_token() {
        let codec = TokenCodec::new(SECRET);

        // Expiry already in the past
        let token = codec
            .issue("alice@example.com", TokenPurpose::Session, Duration::seconds(-2))
            .expect("Failed to issue token");

        let result = codec.decode(&token, TokenPurpose::Session);
        assert!(matches!(result, Err(TokenError::Expired)));
    }

    #[test]
    fn test_decode_purpose_mismatch() {
        let codec = TokenCodec::new(SECRET);

        let token = codec
            .issue("alice@example.com", TokenPurpose::Reset, Duration::minutes(15))
            .expect("Failed to issue token");

        let result = codec.decode(&token, TokenPurpose::Session);
        assert!(matches!(
            result,
            Err(TokenError::PurposeMismatch {
                expected: TokenPurpose::Session,
                actual: TokenPurpose::Reset,
            })
        ));
    }

    #[test]
    fn test_tampered_token_rejected() {
        let codec = TokenCodec::new(SECRET);

        let token = codec
            .issue("alice@example.com", TokenPurpose::Session, Duration::hours(1))
            .expect("Failed to issue token");

        let mut tampered = token.into_bytes();
        let last = tampered.len() - 1;
        tampered[last] = if tampered[last] == b'A' { b'B' } else { b'A' };
        let tampered = String::from_utf8(tampered).unwrap();

        let result = codec.decode(&tampered, TokenPurpose::Session);
        assert!(matches!(result, Err(TokenError::Malformed(_))));
    }
}
