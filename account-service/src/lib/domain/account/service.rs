use std::sync::Arc;

use async_trait::async_trait;
use auth_core::PasswordHasher;
use auth_core::RevocationStore;
use auth_core::TokenCodec;
use auth_core::TokenError;
use auth_core::TokenPurpose;
use chrono::Duration;
use chrono::Utc;

use crate::account::errors::AuthError;
use crate::account::linker::InvitationLinker;
use crate::account::models::Account;
use crate::account::models::AccountId;
use crate::account::models::AuthenticatedSession;
use crate::account::models::LoginCommand;
use crate::account::models::RegisterCommand;
use crate::account::models::RegisteredAccount;
use crate::account::models::ResetPasswordCommand;
use crate::account::ports::AuthServicePort;
use crate::account::ports::CredentialStore;
use crate::account::ports::GroupService;
use crate::account::ports::Mailer;

/// Auth orchestration service.
///
/// Composes the hashing, token, and revocation primitives around the
/// injected store, mailer, and group-service collaborators. Holds no mutable
/// state of its own beyond the revocation entries; every method is safe to
/// call from any number of concurrent requests.
pub struct AuthService<CS, M, G>
where
    CS: CredentialStore,
    M: Mailer,
    G: GroupService,
{
    store: Arc<CS>,
    mailer: Arc<M>,
    linker: InvitationLinker<G>,
    hasher: PasswordHasher,
    tokens: TokenCodec,
    revoked: RevocationStore,
    session_ttl: Duration,
    reset_ttl: Duration,
}

impl<CS, M, G> AuthService<CS, M, G>
where
    CS: CredentialStore,
    M: Mailer,
    G: GroupService,
{
    /// Create a new auth service with injected collaborators.
    ///
    /// # Arguments
    /// * `store` - Account persistence implementation
    /// * `mailer` - Password-reset notice transport
    /// * `groups` - Group-management collaborator
    /// * `hasher` - Password hasher (work factor already applied)
    /// * `token_secret` - Process-wide token signing secret
    /// * `session_ttl` - Lifetime of session tokens
    /// * `reset_ttl` - Lifetime of password-reset tokens
    pub fn new(
        store: Arc<CS>,
        mailer: Arc<M>,
        groups: Arc<G>,
        hasher: PasswordHasher,
        token_secret: &[u8],
        session_ttl: Duration,
        reset_ttl: Duration,
    ) -> Self {
        Self {
            store,
            mailer,
            linker: InvitationLinker::new(groups),
            hasher,
            tokens: TokenCodec::new(token_secret),
            revoked: RevocationStore::new(),
            session_ttl,
            reset_ttl,
        }
    }

    /// Decode a session token and reject it if revoked.
    fn check_session_token(&self, session_token: &str) -> Result<auth_core::Claims, AuthError> {
        let claims = self.tokens.decode(session_token, TokenPurpose::Session)?;
        if self.revoked.is_revoked(session_token) {
            return Err(AuthError::TokenBlacklisted);
        }
        Ok(claims)
    }
}

#[async_trait]
impl<CS, M, G> AuthServicePort for AuthService<CS, M, G>
where
    CS: CredentialStore,
    M: Mailer,
    G: GroupService,
{
    async fn register(&self, command: RegisterCommand) -> Result<RegisteredAccount, AuthError> {
        let password_hash = self.hasher.hash(&command.password)?;

        let account = Account {
            id: AccountId::new(),
            email: command.email,
            username: command.username,
            phone: command.phone,
            avatar_ref: command.avatar_ref,
            password_hash,
            created_at: Utc::now(),
        };

        // Uniqueness rides on the store's atomic insert; a pre-check would
        // race with concurrent registrations.
        let account_id = self.store.insert(account).await?;

        let link_warning = match command.pending_invitation {
            Some(invitation) => self.linker.link_or_warn(invitation, account_id).await,
            None => None,
        };

        tracing::info!(%account_id, "Account registered");

        Ok(RegisteredAccount {
            account_id,
            link_warning,
        })
    }

    async fn login(&self, command: LoginCommand) -> Result<AuthenticatedSession, AuthError> {
        // Unknown account and wrong password collapse into the same error so
        // callers cannot probe which field was wrong.
        let account = self
            .store
            .find_by_email_or_username(&command.email_or_username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let password_matches = self
            .hasher
            .verify(&command.password, &account.password_hash)?;
        if !password_matches {
            return Err(AuthError::InvalidCredentials);
        }

        let token =
            self.tokens
                .issue(account.email.as_str(), TokenPurpose::Session, self.session_ttl)?;

        let link_warning = match command.pending_invitation {
            Some(invitation) => self.linker.link_or_warn(invitation, account.id).await,
            None => None,
        };

        tracing::info!(account_id = %account.id, "Session issued");

        Ok(AuthenticatedSession {
            token,
            account_id: account.id,
            link_warning,
        })
    }

    async fn logout(&self, session_token: &str) -> Result<(), AuthError> {
        let claims = self.check_session_token(session_token)?;

        self.revoked.revoke(session_token, claims.exp);

        tracing::info!(subject = claims.subject(), "Session revoked");

        Ok(())
    }

    async fn verify_session(&self, session_token: &str) -> Result<Account, AuthError> {
        let claims = self.check_session_token(session_token)?;

        // The subject may have been deleted or renamed after issue.
        self.store
            .find_by_email_or_username(claims.subject())
            .await?
            .ok_or_else(|| AuthError::UserNotFound(claims.subject().to_string()))
    }

    async fn forgot_password(&self, email_or_username: &str) -> Result<(), AuthError> {
        let account = self
            .store
            .find_by_email_or_username(email_or_username)
            .await?
            .ok_or_else(|| AuthError::UserNotFound(email_or_username.to_string()))?;

        let reset_token =
            self.tokens
                .issue(account.email.as_str(), TokenPurpose::Reset, self.reset_ttl)?;

        // Fire-and-forget: forgot-password latency must not couple to the
        // mail transport, and a send failure never rolls back issuance.
        let mailer = Arc::clone(&self.mailer);
        let account_id = account.id;
        let email = account.email.clone();
        tokio::spawn(async move {
            if let Err(e) = mailer
                .send_password_reset_notice(account_id, &email, &reset_token)
                .await
            {
                tracing::error!(
                    %account_id,
                    error = %e,
                    "Failed to dispatch password reset notice"
                );
            }
        });

        tracing::info!(account_id = %account.id, "Password reset token issued");

        Ok(())
    }

    async fn reset_password(&self, command: ResetPasswordCommand) -> Result<(), AuthError> {
        let claims = self
            .tokens
            .decode(&command.reset_token, TokenPurpose::Reset)
            .map_err(|e| match e {
                // A bad signature on the reset path reads as a generic
                // invalid token; expiry and purpose keep their own kinds.
                TokenError::Malformed(_) => AuthError::InvalidToken,
                other => other.into(),
            })?;

        if claims.subject() != command.email.as_str() {
            return Err(AuthError::InvalidToken);
        }

        let new_hash = self.hasher.hash(&command.new_password)?;
        self.store
            .update_password_hash(&command.email, &new_hash)
            .await?;

        tracing::info!(email = %command.email, "Password reset completed");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;

    use mockall::mock;
    use tokio::sync::mpsc;

    use super::*;
    use crate::account::errors::LinkError;
    use crate::account::errors::MailerError;
    use crate::account::models::EmailAddress;
    use crate::account::models::InvitationId;
    use crate::account::models::Username;

    const SECRET: &[u8] = b"test_secret_key_at_least_32_bytes!";

    mock! {
        pub TestCredentialStore {}

        #[async_trait]
        impl CredentialStore for TestCredentialStore {
            async fn insert(&self, account: Account) -> Result<AccountId, AuthError>;
            async fn find_by_email_or_username(&self, key: &str) -> Result<Option<Account>, AuthError>;
            async fn update_password_hash(&self, email: &EmailAddress, new_hash: &str) -> Result<(), AuthError>;
        }
    }

    mock! {
        pub TestMailer {}

        #[async_trait]
        impl Mailer for TestMailer {
            async fn send_password_reset_notice(
                &self,
                account_id: AccountId,
                email: &EmailAddress,
                reset_token: &str,
            ) -> Result<(), MailerError>;
        }
    }

    mock! {
        pub TestGroupService {}

        #[async_trait]
        impl GroupService for TestGroupService {
            async fn add_account_to_group(
                &self,
                invitation: InvitationId,
                account: AccountId,
            ) -> Result<(), LinkError>;
        }
    }

    /// Mailer that reports each notice on a channel, so fire-and-forget
    /// dispatch can be awaited deterministically.
    struct ChannelMailer {
        sender: mpsc::UnboundedSender<(AccountId, String, String)>,
    }

    #[async_trait]
    impl Mailer for ChannelMailer {
        async fn send_password_reset_notice(
            &self,
            account_id: AccountId,
            email: &EmailAddress,
            reset_token: &str,
        ) -> Result<(), MailerError> {
            self.sender
                .send((account_id, email.to_string(), reset_token.to_string()))
                .map_err(|e| MailerError::EnqueueFailed(e.to_string()))
        }
    }

    fn service(
        store: MockTestCredentialStore,
        mailer: MockTestMailer,
        groups: MockTestGroupService,
    ) -> AuthService<MockTestCredentialStore, MockTestMailer, MockTestGroupService> {
        AuthService::new(
            Arc::new(store),
            Arc::new(mailer),
            Arc::new(groups),
            PasswordHasher::new(),
            SECRET,
            Duration::hours(1),
            Duration::minutes(15),
        )
    }

    fn stored_account(email: &str, username: &str, password: &str) -> Account {
        Account {
            id: AccountId::new(),
            email: EmailAddress::new(email.to_string()).unwrap(),
            username: Username::new(username.to_string()).unwrap(),
            phone: None,
            avatar_ref: None,
            password_hash: PasswordHasher::new().hash(password).unwrap(),
            created_at: Utc::now(),
        }
    }

    fn register_command(email: &str, username: &str) -> RegisterCommand {
        RegisterCommand {
            email: EmailAddress::new(email.to_string()).unwrap(),
            username: Username::new(username.to_string()).unwrap(),
            phone: None,
            avatar_ref: None,
            password: "p@ss1".to_string(),
            pending_invitation: None,
        }
    }

    #[tokio::test]
    async fn test_register_success() {
        let mut store = MockTestCredentialStore::new();
        store
            .expect_insert()
            .withf(|account| {
                account.email.as_str() == "a@x.com"
                    && account.username.as_str() == "alice"
                    && account.password_hash.starts_with("$argon2")
            })
            .times(1)
            .returning(|account| Ok(account.id));

        let svc = service(store, MockTestMailer::new(), MockTestGroupService::new());

        let result = svc.register(register_command("a@x.com", "alice")).await;

        let registered = result.unwrap();
        assert!(registered.link_warning.is_none());
    }

    #[tokio::test]
    async fn test_register_duplicate_account() {
        let mut store = MockTestCredentialStore::new();
        store
            .expect_insert()
            .times(1)
            .returning(|_| Err(AuthError::DuplicateAccount));

        let mut groups = MockTestGroupService::new();
        groups.expect_add_account_to_group().times(0);

        let svc = service(store, MockTestMailer::new(), groups);

        let mut command = register_command("a@x.com", "alice");
        command.pending_invitation = Some(InvitationId(uuid::Uuid::new_v4()));

        let result = svc.register(command).await;
        assert!(matches!(result, Err(AuthError::DuplicateAccount)));
    }

    #[tokio::test]
    async fn test_register_links_invitation() {
        let invitation = InvitationId(uuid::Uuid::new_v4());

        let mut store = MockTestCredentialStore::new();
        store
            .expect_insert()
            .times(1)
            .returning(|account| Ok(account.id));

        let mut groups = MockTestGroupService::new();
        groups
            .expect_add_account_to_group()
            .withf(move |inv, _| *inv == invitation)
            .times(1)
            .returning(|_, _| Ok(()));

        let svc = service(store, MockTestMailer::new(), groups);

        let mut command = register_command("a@x.com", "alice");
        command.pending_invitation = Some(invitation);

        let registered = svc.register(command).await.unwrap();
        assert!(registered.link_warning.is_none());
    }

    #[tokio::test]
    async fn test_register_link_failure_is_non_fatal() {
        let mut store = MockTestCredentialStore::new();
        store
            .expect_insert()
            .times(1)
            .returning(|account| Ok(account.id));

        let mut groups = MockTestGroupService::new();
        groups
            .expect_add_account_to_group()
            .times(1)
            .returning(|_, _| Err(LinkError::Unreachable("connection refused".to_string())));

        let svc = service(store, MockTestMailer::new(), groups);

        let mut command = register_command("a@x.com", "alice");
        command.pending_invitation = Some(InvitationId(uuid::Uuid::new_v4()));

        let registered = svc.register(command).await.unwrap();
        let warning = registered.link_warning.expect("expected a link warning");
        assert!(warning.contains("linking failed"));
    }

    #[tokio::test]
    async fn test_concurrent_register_same_email_one_wins() {
        // The store admits exactly one insert for the contested email, the
        // way a unique constraint would.
        let mut store = MockTestCredentialStore::new();
        let admitted = Arc::new(AtomicUsize::new(0));
        let admitted_clone = Arc::clone(&admitted);
        store.expect_insert().times(2).returning(move |account| {
            if admitted_clone.fetch_add(1, Ordering::SeqCst) == 0 {
                Ok(account.id)
            } else {
                Err(AuthError::DuplicateAccount)
            }
        });

        let svc = Arc::new(service(
            store,
            MockTestMailer::new(),
            MockTestGroupService::new(),
        ));

        let first = {
            let svc = Arc::clone(&svc);
            tokio::spawn(async move { svc.register(register_command("a@x.com", "alice")).await })
        };
        let second = {
            let svc = Arc::clone(&svc);
            tokio::spawn(async move { svc.register(register_command("a@x.com", "alice2")).await })
        };

        let (first, second) = (first.await.unwrap(), second.await.unwrap());

        let successes = [&first, &second].iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1);
        assert!([first, second]
            .into_iter()
            .any(|r| matches!(r, Err(AuthError::DuplicateAccount))));
    }

    #[tokio::test]
    async fn test_login_success_token_decodes_to_email() {
        let account = stored_account("a@x.com", "alice", "p@ss1");
        let returned = account.clone();

        let mut store = MockTestCredentialStore::new();
        store
            .expect_find_by_email_or_username()
            .withf(|key| key == "alice")
            .times(1)
            .returning(move |_| Ok(Some(returned.clone())));

        let svc = service(store, MockTestMailer::new(), MockTestGroupService::new());

        let session = svc
            .login(LoginCommand {
                email_or_username: "alice".to_string(),
                password: "p@ss1".to_string(),
                pending_invitation: None,
            })
            .await
            .unwrap();

        assert_eq!(session.account_id, account.id);

        let claims = TokenCodec::new(SECRET)
            .decode(&session.token, TokenPurpose::Session)
            .unwrap();
        assert_eq!(claims.subject(), "a@x.com");
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let account = stored_account("a@x.com", "alice", "p@ss1");

        let mut store = MockTestCredentialStore::new();
        store
            .expect_find_by_email_or_username()
            .times(1)
            .returning(move |_| Ok(Some(account.clone())));

        let svc = service(store, MockTestMailer::new(), MockTestGroupService::new());

        let result = svc
            .login(LoginCommand {
                email_or_username: "alice".to_string(),
                password: "wrong".to_string(),
                pending_invitation: None,
            })
            .await;

        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_login_unknown_user_same_error_as_wrong_password() {
        let mut store = MockTestCredentialStore::new();
        store
            .expect_find_by_email_or_username()
            .times(1)
            .returning(|_| Ok(None));

        let svc = service(store, MockTestMailer::new(), MockTestGroupService::new());

        let result = svc
            .login(LoginCommand {
                email_or_username: "nobody".to_string(),
                password: "p@ss1".to_string(),
                pending_invitation: None,
            })
            .await;

        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_logout_then_reuse_is_blacklisted() {
        let svc = service(
            MockTestCredentialStore::new(),
            MockTestMailer::new(),
            MockTestGroupService::new(),
        );

        let token = TokenCodec::new(SECRET)
            .issue("a@x.com", TokenPurpose::Session, Duration::hours(1))
            .unwrap();

        svc.logout(&token).await.unwrap();

        let again = svc.logout(&token).await;
        assert!(matches!(again, Err(AuthError::TokenBlacklisted)));
    }

    #[tokio::test]
    async fn test_logout_rejects_malformed_and_expired_tokens() {
        let svc = service(
            MockTestCredentialStore::new(),
            MockTestMailer::new(),
            MockTestGroupService::new(),
        );

        let malformed = svc.logout("not.a.token").await;
        assert!(matches!(malformed, Err(AuthError::MalformedToken)));

        let expired_token = TokenCodec::new(SECRET)
            .issue("a@x.com", TokenPurpose::Session, Duration::seconds(-2))
            .unwrap();
        let expired = svc.logout(&expired_token).await;
        assert!(matches!(expired, Err(AuthError::ExpiredToken)));
    }

    #[tokio::test]
    async fn test_logout_rejects_reset_token() {
        let svc = service(
            MockTestCredentialStore::new(),
            MockTestMailer::new(),
            MockTestGroupService::new(),
        );

        let reset_token = TokenCodec::new(SECRET)
            .issue("a@x.com", TokenPurpose::Reset, Duration::minutes(15))
            .unwrap();

        let result = svc.logout(&reset_token).await;
        assert!(matches!(result, Err(AuthError::PurposeMismatch)));
    }

    #[tokio::test]
    async fn test_verify_session_resolves_account_and_honors_revocation() {
        let account = stored_account("a@x.com", "alice", "p@ss1");
        let returned = account.clone();

        let mut store = MockTestCredentialStore::new();
        store
            .expect_find_by_email_or_username()
            .withf(|key| key == "a@x.com")
            .times(1)
            .returning(move |_| Ok(Some(returned.clone())));

        let svc = service(store, MockTestMailer::new(), MockTestGroupService::new());

        let token = TokenCodec::new(SECRET)
            .issue("a@x.com", TokenPurpose::Session, Duration::hours(1))
            .unwrap();

        let verified = svc.verify_session(&token).await.unwrap();
        assert_eq!(verified.id, account.id);

        svc.logout(&token).await.unwrap();

        let after_logout = svc.verify_session(&token).await;
        assert!(matches!(after_logout, Err(AuthError::TokenBlacklisted)));
    }

    #[tokio::test]
    async fn test_verify_session_subject_must_still_resolve() {
        let mut store = MockTestCredentialStore::new();
        store
            .expect_find_by_email_or_username()
            .times(1)
            .returning(|_| Ok(None));

        let svc = service(store, MockTestMailer::new(), MockTestGroupService::new());

        let token = TokenCodec::new(SECRET)
            .issue("gone@x.com", TokenPurpose::Session, Duration::hours(1))
            .unwrap();

        let result = svc.verify_session(&token).await;
        assert!(matches!(result, Err(AuthError::UserNotFound(_))));
    }

    #[tokio::test]
    async fn test_forgot_password_unknown_user() {
        let mut store = MockTestCredentialStore::new();
        store
            .expect_find_by_email_or_username()
            .times(1)
            .returning(|_| Ok(None));

        let svc = service(store, MockTestMailer::new(), MockTestGroupService::new());

        let result = svc.forgot_password("nobody@x.com").await;
        assert!(matches!(result, Err(AuthError::UserNotFound(_))));
    }

    #[tokio::test]
    async fn test_forgot_password_dispatches_reset_notice() {
        let account = stored_account("a@x.com", "alice", "p@ss1");
        let account_id = account.id;

        let mut store = MockTestCredentialStore::new();
        store
            .expect_find_by_email_or_username()
            .times(1)
            .returning(move |_| Ok(Some(account.clone())));

        let (sender, mut receiver) = mpsc::unbounded_channel();
        let svc = AuthService::new(
            Arc::new(store),
            Arc::new(ChannelMailer { sender }),
            Arc::new(MockTestGroupService::new()),
            PasswordHasher::new(),
            SECRET,
            Duration::hours(1),
            Duration::minutes(15),
        );

        svc.forgot_password("alice").await.unwrap();

        let (notified_id, notified_email, reset_token) =
            receiver.recv().await.expect("notice was not dispatched");
        assert_eq!(notified_id, account_id);
        assert_eq!(notified_email, "a@x.com");

        // The dispatched token is a reset token bound to the account's email.
        let claims = TokenCodec::new(SECRET)
            .decode(&reset_token, TokenPurpose::Reset)
            .unwrap();
        assert_eq!(claims.subject(), "a@x.com");
    }

    #[tokio::test]
    async fn test_reset_password_success() {
        let mut store = MockTestCredentialStore::new();
        store
            .expect_update_password_hash()
            .withf(|email, new_hash| {
                email.as_str() == "a@x.com"
                    && PasswordHasher::new().verify("new1", new_hash).unwrap()
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let svc = service(store, MockTestMailer::new(), MockTestGroupService::new());

        let reset_token = TokenCodec::new(SECRET)
            .issue("a@x.com", TokenPurpose::Reset, Duration::minutes(15))
            .unwrap();

        svc.reset_password(ResetPasswordCommand {
            email: EmailAddress::new("a@x.com".to_string()).unwrap(),
            reset_token,
            new_password: "new1".to_string(),
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_reset_password_subject_mismatch() {
        let svc = service(
            MockTestCredentialStore::new(),
            MockTestMailer::new(),
            MockTestGroupService::new(),
        );

        // Valid signature, but issued for a different account.
        let reset_token = TokenCodec::new(SECRET)
            .issue("b@x.com", TokenPurpose::Reset, Duration::minutes(15))
            .unwrap();

        let result = svc
            .reset_password(ResetPasswordCommand {
                email: EmailAddress::new("a@x.com".to_string()).unwrap(),
                reset_token,
                new_password: "new1".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }

    #[tokio::test]
    async fn test_reset_password_rejects_expired_and_session_tokens() {
        let svc = service(
            MockTestCredentialStore::new(),
            MockTestMailer::new(),
            MockTestGroupService::new(),
        );
        let email = EmailAddress::new("a@x.com".to_string()).unwrap();

        let expired_token = TokenCodec::new(SECRET)
            .issue("a@x.com", TokenPurpose::Reset, Duration::seconds(-2))
            .unwrap();
        let expired = svc
            .reset_password(ResetPasswordCommand {
                email: email.clone(),
                reset_token: expired_token,
                new_password: "new1".to_string(),
            })
            .await;
        assert!(matches!(expired, Err(AuthError::ExpiredToken)));

        let session_token = TokenCodec::new(SECRET)
            .issue("a@x.com", TokenPurpose::Session, Duration::hours(1))
            .unwrap();
        let mismatch = svc
            .reset_password(ResetPasswordCommand {
                email,
                reset_token: session_token,
                new_password: "new1".to_string(),
            })
            .await;
        assert!(matches!(mismatch, Err(AuthError::PurposeMismatch)));
    }
}
