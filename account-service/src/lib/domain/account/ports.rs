use async_trait::async_trait;

use crate::account::errors::AuthError;
use crate::account::errors::LinkError;
use crate::account::errors::MailerError;
use crate::account::models::Account;
use crate::account::models::AccountId;
use crate::account::models::AuthenticatedSession;
use crate::account::models::EmailAddress;
use crate::account::models::InvitationId;
use crate::account::models::LoginCommand;
use crate::account::models::RegisterCommand;
use crate::account::models::RegisteredAccount;
use crate::account::models::ResetPasswordCommand;

/// Port for the auth orchestration service.
#[async_trait]
pub trait AuthServicePort: Send + Sync + 'static {
    /// Register a new account.
    ///
    /// Uniqueness of email and username is enforced by the store's atomic
    /// insert; two concurrent registrations with the same email cannot both
    /// succeed.
    ///
    /// # Errors
    /// * `DuplicateAccount` - Email or username is already taken
    /// * `DatabaseError` - Store operation failed
    async fn register(&self, command: RegisterCommand) -> Result<RegisteredAccount, AuthError>;

    /// Authenticate by email or username and issue a session token.
    ///
    /// # Errors
    /// * `InvalidCredentials` - No matching account or wrong password; the
    ///   two cases are indistinguishable
    async fn login(&self, command: LoginCommand) -> Result<AuthenticatedSession, AuthError>;

    /// Revoke a session token.
    ///
    /// Logging out an already-dead token is a client error, not a silent
    /// success.
    ///
    /// # Errors
    /// * `MalformedToken` - Encoding or signature is invalid
    /// * `ExpiredToken` - Token is past expiry
    /// * `PurposeMismatch` - Not a session token
    /// * `TokenBlacklisted` - Already revoked
    async fn logout(&self, session_token: &str) -> Result<(), AuthError>;

    /// Verify a session token and resolve its subject to a live account.
    ///
    /// Checks signature, expiry, purpose, and revocation on every call.
    ///
    /// # Errors
    /// * `MalformedToken` / `ExpiredToken` / `PurposeMismatch` /
    ///   `TokenBlacklisted` - Token failed one of the four checks
    /// * `UserNotFound` - Subject no longer resolves to an account
    async fn verify_session(&self, session_token: &str) -> Result<Account, AuthError>;

    /// Issue a password-reset token and hand it to the mailer.
    ///
    /// The send is fire-and-forget: mailer failure never rolls back issuance.
    ///
    /// # Errors
    /// * `UserNotFound` - No account matches the key
    async fn forgot_password(&self, email_or_username: &str) -> Result<(), AuthError>;

    /// Overwrite the account's password hash, authorized by a reset token.
    ///
    /// # Errors
    /// * `InvalidToken` - Signature invalid or subject does not equal the
    ///   supplied email
    /// * `ExpiredToken` - Token is past expiry
    /// * `PurposeMismatch` - Not a reset token
    /// * `UserNotFound` - Account vanished after the token was issued
    async fn reset_password(&self, command: ResetPasswordCommand) -> Result<(), AuthError>;
}

/// Persistence operations for the account aggregate.
#[async_trait]
pub trait CredentialStore: Send + Sync + 'static {
    /// Persist a new account.
    ///
    /// Must be atomic and conflict-detecting: a prior existence check is
    /// never assumed to still hold at insert time.
    ///
    /// # Errors
    /// * `DuplicateAccount` - Email or username is already taken
    /// * `DatabaseError` - Store operation failed
    async fn insert(&self, account: Account) -> Result<AccountId, AuthError>;

    /// Retrieve an account whose email or username equals `key`.
    ///
    /// # Errors
    /// * `DatabaseError` - Store operation failed
    async fn find_by_email_or_username(&self, key: &str) -> Result<Option<Account>, AuthError>;

    /// Overwrite the stored password hash for `email`.
    ///
    /// # Errors
    /// * `UserNotFound` - No account with this email
    /// * `DatabaseError` - Store operation failed
    async fn update_password_hash(
        &self,
        email: &EmailAddress,
        new_hash: &str,
    ) -> Result<(), AuthError>;
}

/// Outbound transport for password-reset notices.
///
/// The orchestrator treats this as a best-effort side channel; implementations
/// queue or dispatch without coupling to email delivery.
#[async_trait]
pub trait Mailer: Send + Sync + 'static {
    async fn send_password_reset_notice(
        &self,
        account_id: AccountId,
        email: &EmailAddress,
        reset_token: &str,
    ) -> Result<(), MailerError>;
}

/// Group-management collaborator.
///
/// Links a pending invitation placeholder to a real account. Idempotent on
/// the collaborator's side.
#[async_trait]
pub trait GroupService: Send + Sync + 'static {
    async fn add_account_to_group(
        &self,
        invitation: InvitationId,
        account: AccountId,
    ) -> Result<(), LinkError>;
}
