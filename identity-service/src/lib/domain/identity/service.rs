use std::sync::Arc;

use async_trait::async_trait;
use auth::JwtError;
use auth::PasswordError;
use chrono::Duration;
use chrono::Utc;
use subtle::ConstantTimeEq;

use crate::domain::identity::models::Credential;
use crate::domain::identity::models::Registration;
use crate::domain::identity::models::SignInCommand;
use crate::domain::identity::models::SignOutCommand;
use crate::domain::identity::models::SignUpCommand;
use crate::domain::identity::models::TokenId;
use crate::domain::identity::models::UserId;
use crate::domain::identity::models::VerificationToken;
use crate::domain::identity::models::VerifyEmailCommand;
use crate::identity::errors::AuthError;
use crate::identity::errors::RepositoryError;
use crate::identity::ports::AuthServicePort;
use crate::identity::ports::IdentityRepository;
use crate::identity::ports::MailDispatcher;
use crate::identity::ports::SignInTokens;
use crate::identity::ports::TokenIssuer;

/// Domain service implementation for authentication flows.
///
/// Owns the rule that a refresh token is only valid while its `jti` equals
/// the token identifier stored for the user.
pub struct AuthService<IR, MD, TI>
where
    IR: IdentityRepository,
    MD: MailDispatcher,
    TI: TokenIssuer,
{
    repository: Arc<IR>,
    mail_dispatcher: Arc<MD>,
    token_issuer: Arc<TI>,
    password_hasher: auth::PasswordHasher,
    verification_ttl: Duration,
}

impl<IR, MD, TI> AuthService<IR, MD, TI>
where
    IR: IdentityRepository,
    MD: MailDispatcher,
    TI: TokenIssuer,
{
    /// Create a new auth service with injected dependencies.
    ///
    /// # Arguments
    /// * `repository` - Identity store
    /// * `mail_dispatcher` - Activation mail sink
    /// * `token_issuer` - Access/refresh token engine
    /// * `verification_ttl` - Lifetime of the mailed verification token
    pub fn new(
        repository: Arc<IR>,
        mail_dispatcher: Arc<MD>,
        token_issuer: Arc<TI>,
        verification_ttl: Duration,
    ) -> Self {
        Self {
            repository,
            mail_dispatcher,
            token_issuer,
            password_hasher: auth::PasswordHasher::new(),
            verification_ttl,
        }
    }

    fn verify_password(&self, password: &str, stored_hash: &str) -> Result<(), AuthError> {
        match self.password_hasher.verify(stored_hash, password) {
            Ok(()) => Ok(()),
            Err(PasswordError::MalformedHash(reason)) => {
                tracing::warn!(reason = %reason, "Stored password hash could not be parsed");
                Err(AuthError::InvalidCredentials)
            }
            Err(_) => Err(AuthError::InvalidCredentials),
        }
    }
}

/// Compare a stored secret with a presented one in constant time.
fn secrets_match(stored: &str, presented: &str) -> bool {
    stored.as_bytes().ct_eq(presented.as_bytes()).into()
}

fn token_error(err: JwtError) -> AuthError {
    tracing::debug!(error = %err, "Token rejected");
    if err.is_expired() {
        AuthError::TokenExpired
    } else {
        AuthError::InvalidToken
    }
}

#[async_trait]
impl<IR, MD, TI> AuthServicePort for AuthService<IR, MD, TI>
where
    IR: IdentityRepository,
    MD: MailDispatcher,
    TI: TokenIssuer,
{
    async fn sign_up(&self, command: SignUpCommand) -> Result<UserId, AuthError> {
        let existing = self
            .repository
            .find_by_email(&command.email)
            .await
            .map_err(|e| AuthError::internal("repository.find_by_email", e))?;
        if existing.is_some() {
            tracing::debug!("Sign-up rejected: email already registered");
            return Err(AuthError::EmailAlreadyExists);
        }

        let password_hash = self
            .password_hasher
            .hash(command.password.as_str())
            .map_err(|e| AuthError::internal("password_hasher.hash", e))?;

        let verification_token = VerificationToken::generate()
            .map_err(|e| AuthError::internal("VerificationToken::generate", e))?;

        let registration = Registration {
            email: command.email.clone(),
            password_hash,
            fullname: command.fullname,
            is_verified: false,
            verification_token: verification_token.clone(),
            verification_expires_at: Utc::now() + self.verification_ttl,
        };

        let user_id = self
            .repository
            .insert(registration)
            .await
            .map_err(|e| match e {
                RepositoryError::EmailAlreadyExists(_) => AuthError::EmailAlreadyExists,
                other => AuthError::internal("repository.insert", other),
            })?;

        self.mail_dispatcher
            .send_activation_link(&user_id, &command.email, &verification_token);

        tracing::info!(user_id = %user_id, "User registered");
        Ok(user_id)
    }

    async fn sign_in(&self, command: SignInCommand) -> Result<SignInTokens, AuthError> {
        let credential = self
            .repository
            .find_credential_by_email(&command.email)
            .await
            .map_err(|e| AuthError::internal("repository.find_credential_by_email", e))?
            .ok_or_else(|| {
                tracing::debug!("Sign-in rejected: unknown email");
                AuthError::Unauthorized
            })?;

        if !credential.is_verified {
            tracing::debug!(user_id = %credential.id, "Sign-in rejected: inactive user");
            return Err(AuthError::InactiveUser);
        }

        self.verify_password(&command.password, &credential.password_hash)
            .inspect_err(|_| {
                tracing::debug!(user_id = %credential.id, "Sign-in rejected: bad password");
            })?;

        // Persisting a new identifier revokes every earlier refresh token
        let token_id =
            TokenId::generate().map_err(|e| AuthError::internal("TokenId::generate", e))?;
        self.repository
            .set_token_id(&credential.id, &token_id)
            .await
            .map_err(|e| AuthError::internal("repository.set_token_id", e))?;

        let access = self
            .token_issuer
            .issue_access(&credential.id)
            .map_err(|e| AuthError::internal("token_issuer.issue_access", e))?;
        let refresh = self
            .token_issuer
            .issue_refresh(&credential.id, &token_id)
            .map_err(|e| AuthError::internal("token_issuer.issue_refresh", e))?;

        tracing::info!(user_id = %credential.id, "User signed in");
        Ok(SignInTokens { access, refresh })
    }

    async fn sign_out(&self, command: SignOutCommand) -> Result<(), AuthError> {
        let claims = self
            .token_issuer
            .parse_and_validate_refresh(&command.refresh_token)
            .map_err(token_error)?;
        let user_id = UserId(claims.user_id);
        let token_id = claims
            .token_id()
            .map(|jti| TokenId::from(jti.to_string()))
            .ok_or(AuthError::InvalidToken)?;

        // A newer sign-in or another sign-out may have replaced the identifier
        let cleared = self
            .repository
            .clear_token_id(&user_id, &token_id)
            .await
            .map_err(|e| AuthError::internal("repository.clear_token_id", e))?;
        if !cleared {
            tracing::debug!(user_id = %user_id, "Sign-out rejected: stale token identifier");
            return Err(AuthError::Unauthorized);
        }

        tracing::info!(user_id = %user_id, "User signed out");
        Ok(())
    }

    async fn verify_email(&self, command: VerifyEmailCommand) -> Result<(), AuthError> {
        let credential = self
            .repository
            .find_by_id(&command.user_id)
            .await
            .map_err(|e| AuthError::internal("repository.find_by_id", e))?
            .ok_or(AuthError::InvalidToken)?;

        if credential.is_verified {
            return Ok(());
        }

        let (Some(stored), Some(expires_at)) = (
            credential.verification_token.as_deref(),
            credential.verification_expires_at,
        ) else {
            return Err(AuthError::InvalidToken);
        };
        if !secrets_match(stored, &command.token) {
            tracing::debug!(user_id = %credential.id, "Verification rejected: token mismatch");
            return Err(AuthError::InvalidToken);
        }
        if expires_at <= Utc::now() {
            return Err(AuthError::TokenExpired);
        }

        self.repository
            .mark_verified(&credential.id)
            .await
            .map_err(|e| AuthError::internal("repository.mark_verified", e))?;

        tracing::info!(user_id = %credential.id, "User verified");
        Ok(())
    }

    async fn authenticate_access(&self, raw_token: &str) -> Result<UserId, AuthError> {
        self.token_issuer
            .parse_and_validate_access(raw_token)
            .map(|claims| UserId(claims.user_id))
            .map_err(token_error)
    }

    async fn get_profile(&self, id: &UserId) -> Result<Credential, AuthError> {
        self.repository
            .find_by_id(id)
            .await
            .map_err(|e| AuthError::internal("repository.find_by_id", e))?
            .ok_or(AuthError::Unauthorized)
    }
}
