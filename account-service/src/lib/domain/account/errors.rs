use auth_core::PasswordError;
use auth_core::TokenError;
use thiserror::Error;

/// Error for AccountId parsing failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AccountIdError {
    #[error("Invalid UUID format: {0}")]
    InvalidFormat(String),
}

/// Error for InvitationId parsing failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InvitationIdError {
    #[error("Invalid UUID format: {0}")]
    InvalidFormat(String),
}

/// Error for Username validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UsernameError {
    #[error("Username too short: minimum {min} characters, got {actual}")]
    TooShort { min: usize, actual: usize },

    #[error("Username too long: maximum {max} characters, got {actual}")]
    TooLong { max: usize, actual: usize },

    #[error(
        "Username contains invalid characters (only alphanumeric, underscore, and hyphen allowed)"
    )]
    InvalidCharacters,
}

/// Error for EmailAddress validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EmailError {
    #[error("Invalid email format: {0}")]
    InvalidFormat(String),
}

/// Error raised when a group-link delegation fails.
///
/// Never fatal to the enclosing register/login; carried as a warning.
#[derive(Debug, Clone, Error)]
pub enum LinkError {
    #[error("Group service rejected the link: {0}")]
    Rejected(String),

    #[error("Group service unreachable: {0}")]
    Unreachable(String),
}

/// Error for reset-notice dispatch operations
#[derive(Debug, Clone, Error)]
pub enum MailerError {
    #[error("Failed to serialize reset notice: {0}")]
    SerializationFailed(String),

    #[error("Failed to enqueue reset notice: {0}")]
    EnqueueFailed(String),
}

/// Top-level error for all auth operations.
///
/// Credential and reset failures deliberately reveal nothing beyond these
/// categories. `UserNotFound` on forgot-password does leak account existence;
/// that matches the observed upstream behavior and is kept intentionally.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    // Value object validation errors (automatically converted via #[from])
    #[error("Invalid account ID: {0}")]
    InvalidAccountId(#[from] AccountIdError),

    #[error("Invalid invitation ID: {0}")]
    InvalidInvitationId(#[from] InvitationIdError),

    #[error("Invalid username: {0}")]
    InvalidUsername(#[from] UsernameError),

    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    // Domain-level errors
    #[error("An account with this email or username already exists")]
    DuplicateAccount,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token is expired")]
    ExpiredToken,

    #[error("Token has been revoked")]
    TokenBlacklisted,

    #[error("Token purpose mismatch")]
    PurposeMismatch,

    #[error("Token is malformed")]
    MalformedToken,

    // Infrastructure errors
    #[error("Password error: {0}")]
    Password(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<PasswordError> for AuthError {
    fn from(err: PasswordError) -> Self {
        AuthError::Password(err.to_string())
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Malformed(_) => AuthError::MalformedToken,
            TokenError::Expired => AuthError::ExpiredToken,
            TokenError::PurposeMismatch { .. } => AuthError::PurposeMismatch,
            TokenError::EncodingFailed(msg) => AuthError::Unknown(msg),
        }
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        AuthError::Unknown(err.to_string())
    }
}
