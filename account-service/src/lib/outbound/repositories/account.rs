use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::PgPool;
use sqlx::Row;
use uuid::Uuid;

use crate::account::errors::AuthError;
use crate::account::models::Account;
use crate::account::models::AccountId;
use crate::account::models::EmailAddress;
use crate::account::models::Username;
use crate::account::ports::CredentialStore;

pub struct PostgresCredentialStore {
    pool: PgPool,
}

impl PostgresCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn account_from_row(row: &PgRow) -> Result<Account, AuthError> {
        let id: Uuid = row
            .try_get("id")
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?;
        let email: String = row
            .try_get("email")
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?;
        let username: String = row
            .try_get("username")
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?;
        let phone: Option<String> = row
            .try_get("phone")
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?;
        let avatar_ref: Option<String> = row
            .try_get("avatar_ref")
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?;
        let password_hash: String = row
            .try_get("password_hash")
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?;
        let created_at: DateTime<Utc> = row
            .try_get("created_at")
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

        Ok(Account {
            id: AccountId(id),
            email: EmailAddress::new(email)?,
            username: Username::new(username)?,
            phone,
            avatar_ref,
            password_hash,
            created_at,
        })
    }
}

#[async_trait]
impl CredentialStore for PostgresCredentialStore {
    async fn insert(&self, account: Account) -> Result<AccountId, AuthError> {
        sqlx::query(
            r#"
            INSERT INTO accounts (id, email, username, phone, avatar_ref, password_hash, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(account.id.0)
        .bind(account.email.as_str())
        .bind(account.username.as_str())
        .bind(&account.phone)
        .bind(&account.avatar_ref)
        .bind(&account.password_hash)
        .bind(account.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            // The unique constraints carry the race: two concurrent inserts
            // with the same email or username cannot both pass.
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    return AuthError::DuplicateAccount;
                }
            }
            AuthError::DatabaseError(e.to_string())
        })?;

        Ok(account.id)
    }

    async fn find_by_email_or_username(&self, key: &str) -> Result<Option<Account>, AuthError> {
        let row = sqlx::query(
            r#"
            SELECT id, email, username, phone, avatar_ref, password_hash, created_at
            FROM accounts
            WHERE email = $1 OR username = $1
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::account_from_row(&r)?)),
            None => Ok(None),
        }
    }

    async fn update_password_hash(
        &self,
        email: &EmailAddress,
        new_hash: &str,
    ) -> Result<(), AuthError> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET password_hash = $2
            WHERE email = $1
            "#,
        )
        .bind(email.as_str())
        .bind(new_hash)
        .execute(&self.pool)
        .await
        .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AuthError::UserNotFound(email.to_string()));
        }

        Ok(())
    }
}
