use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::FromRow;
use sqlx::PgPool;

use crate::domain::identity::models::Credential;
use crate::domain::identity::models::EmailAddress;
use crate::domain::identity::models::LoginCredential;
use crate::domain::identity::models::Registration;
use crate::domain::identity::models::TokenId;
use crate::domain::identity::models::UserId;
use crate::domain::identity::ports::IdentityRepository;
use crate::identity::errors::RepositoryError;

const USERS_EMAIL_KEY: &str = "users_email_key";

pub struct PostgresIdentityRepository {
    pool: PgPool,
}

impl PostgresIdentityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct CredentialRow {
    id: i64,
    email: String,
    fullname: String,
    is_verified: bool,
    token_id: Option<String>,
    verification_token: Option<String>,
    verification_expires_at: Option<DateTime<Utc>>,
}

impl From<CredentialRow> for Credential {
    fn from(row: CredentialRow) -> Self {
        Self {
            id: UserId(row.id),
            email: row.email,
            fullname: row.fullname,
            is_verified: row.is_verified,
            token_id: row.token_id,
            verification_token: row.verification_token,
            verification_expires_at: row.verification_expires_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct LoginCredentialRow {
    id: i64,
    email: String,
    password_hash: String,
    is_verified: bool,
}

impl From<LoginCredentialRow> for LoginCredential {
    fn from(row: LoginCredentialRow) -> Self {
        Self {
            id: UserId(row.id),
            email: row.email,
            password_hash: row.password_hash,
            is_verified: row.is_verified,
        }
    }
}

fn database_error(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Database(e.to_string())
}

/// Map an UPDATE result to `NotFound` when no row matched the id.
fn expect_one_row(
    result: sqlx::postgres::PgQueryResult,
    id: &UserId,
) -> Result<(), RepositoryError> {
    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound(id.0));
    }
    Ok(())
}

#[async_trait]
impl IdentityRepository for PostgresIdentityRepository {
    async fn insert(&self, registration: Registration) -> Result<UserId, RepositoryError> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO users (email, password_hash, fullname, is_verified, verification_token, verification_expires_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(registration.email.as_str())
        .bind(&registration.password_hash)
        .bind(registration.fullname.as_str())
        .bind(registration.is_verified)
        .bind(registration.verification_token.as_str())
        .bind(registration.verification_expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() && db_err.constraint() == Some(USERS_EMAIL_KEY) {
                    return RepositoryError::EmailAlreadyExists(
                        registration.email.as_str().to_string(),
                    );
                }
            }
            database_error(e)
        })?;

        Ok(UserId(id))
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<Credential>, RepositoryError> {
        let row = sqlx::query_as::<_, CredentialRow>(
            r#"
            SELECT id, email, fullname, is_verified, token_id, verification_token, verification_expires_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(row.map(Credential::from))
    }

    async fn find_credential_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<LoginCredential>, RepositoryError> {
        let row = sqlx::query_as::<_, LoginCredentialRow>(
            r#"
            SELECT id, email, password_hash, is_verified
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(row.map(LoginCredential::from))
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<Credential>, RepositoryError> {
        let row = sqlx::query_as::<_, CredentialRow>(
            r#"
            SELECT id, email, fullname, is_verified, token_id, verification_token, verification_expires_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(row.map(Credential::from))
    }

    async fn set_token_id(&self, id: &UserId, token_id: &TokenId) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET token_id = $1
            WHERE id = $2
            "#,
        )
        .bind(token_id.as_str())
        .bind(id.0)
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        expect_one_row(result, id)
    }

    async fn clear_token_id(
        &self,
        id: &UserId,
        expected: &TokenId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET token_id = NULL
            WHERE id = $1 AND token_id = $2
            "#,
        )
        .bind(id.0)
        .bind(expected.as_str())
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(result.rows_affected() == 1)
    }

    async fn mark_verified(&self, id: &UserId) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET is_verified = TRUE, verification_token = NULL, verification_expires_at = NULL
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        expect_one_row(result, id)
    }
}
