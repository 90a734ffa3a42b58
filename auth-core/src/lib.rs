//! Authentication primitives library
//!
//! Provides the stateless building blocks the account service composes:
//! - Password hashing (Argon2id)
//! - Signed, expiring, purpose-tagged tokens
//! - In-process token revocation tracking
//!
//! The service defines its own orchestration and ports and adapts these
//! implementations. Nothing in this crate touches storage or transport.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth_core::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let digest = hasher.hash("my_password").unwrap();
//! assert!(hasher.verify("my_password", &digest).unwrap());
//! assert!(!hasher.verify("not_my_password", &digest).unwrap());
//! ```
//!
//! ## Tokens
//! ```
//! use auth_core::{TokenCodec, TokenPurpose};
//! use chrono::Duration;
//!
//! let codec = TokenCodec::new(b"secret_key_at_least_32_bytes_long!");
//! let token = codec
//!     .issue("alice@example.com", TokenPurpose::Session, Duration::hours(1))
//!     .unwrap();
//! let claims = codec.decode(&token, TokenPurpose::Session).unwrap();
//! assert_eq!(claims.subject(), "alice@example.com");
//!
//! // A session token is never accepted where a reset token is required.
//! assert!(codec.decode(&token, TokenPurpose::Reset).is_err());
//! ```
//!
//! ## Revocation
//! ```
//! use auth_core::RevocationStore;
//! use chrono::Utc;
//!
//! let store = RevocationStore::new();
//! let expires_at = Utc::now().timestamp() + 3600;
//! store.revoke("some.token.value", expires_at);
//! assert!(store.is_revoked("some.token.value"));
//! assert!(!store.is_revoked("never.seen.before"));
//! ```

pub mod password;
pub mod revocation;
pub mod token;

// Re-export commonly used items
pub use password::PasswordError;
pub use password::PasswordHasher;
pub use revocation::RevocationStore;
pub use token::Claims;
pub use token::TokenCodec;
pub use token::TokenError;
pub use token::TokenPurpose;
