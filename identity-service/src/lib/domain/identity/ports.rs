use async_trait::async_trait;
use auth::Claims;
use auth::IssuedToken;
use auth::JwtError;

use crate::domain::identity::models::Credential;
use crate::domain::identity::models::EmailAddress;
use crate::domain::identity::models::LoginCredential;
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

/// Access and refresh tokens handed out by a successful sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInTokens {
    pub access: IssuedToken,
    pub refresh: IssuedToken,
}

/// Port for authentication flows.
#[async_trait]
pub trait AuthServicePort: Send + Sync + 'static {
    /// Register a new unverified account and queue its activation mail.
    ///
    /// # Returns
    /// Identifier of the created account
    ///
    /// # Errors
    /// * `EmailAlreadyExists` - Email is already registered
    /// * `Internal` - Hashing, random generation or store failure
    async fn sign_up(&self, command: SignUpCommand) -> Result<UserId, AuthError>;

    /// Exchange credentials for an access/refresh pair.
    ///
    /// Rotates the stored token identifier, which revokes every refresh token
    /// issued before.
    ///
    /// # Errors
    /// * `Unauthorized` - No account for this email
    /// * `InactiveUser` - Account not verified yet
    /// * `InvalidCredentials` - Password does not match
    /// * `Internal` - Store, signing or random generation failure
    async fn sign_in(&self, command: SignInCommand) -> Result<SignInTokens, AuthError>;

    /// Revoke the session bound to a refresh token.
    ///
    /// # Errors
    /// * `TokenExpired` - Refresh token lifetime is over
    /// * `InvalidToken` - Refresh token does not validate
    /// * `Unauthorized` - Token identifier is stale or already cleared
    /// * `Internal` - Store failure
    async fn sign_out(&self, command: SignOutCommand) -> Result<(), AuthError>;

    /// Activate an account from its mailed verification token.
    ///
    /// # Errors
    /// * `InvalidToken` - Unknown account or token mismatch
    /// * `TokenExpired` - Verification token lifetime is over
    /// * `Internal` - Store failure
    async fn verify_email(&self, command: VerifyEmailCommand) -> Result<(), AuthError>;

    /// Resolve the owner of an access token.
    ///
    /// # Errors
    /// * `TokenExpired` - Access token lifetime is over
    /// * `InvalidToken` - Access token does not validate
    async fn authenticate_access(&self, raw_token: &str) -> Result<UserId, AuthError>;

    /// Load the account behind an authenticated request.
    ///
    /// # Errors
    /// * `Unauthorized` - Account no longer exists
    /// * `Internal` - Store failure
    async fn get_profile(&self, id: &UserId) -> Result<Credential, AuthError>;
}

/// Persistence operations for credentials.
///
/// Implementations must be safe for concurrent use. Token identifier writes
/// are single-row updates keyed by user id; clearing compares and clears in
/// one atomic step.
#[async_trait]
pub trait IdentityRepository: Send + Sync + 'static {
    /// Persist a new account.
    ///
    /// # Errors
    /// * `EmailAlreadyExists` - Email is already registered
    /// * `Database` - Database operation failed
    async fn insert(&self, registration: Registration) -> Result<UserId, RepositoryError>;

    async fn find_by_email(&self, email: &EmailAddress)
        -> Result<Option<Credential>, RepositoryError>;

    /// Retrieve the password hash and verification flag for an email.
    async fn find_credential_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<LoginCredential>, RepositoryError>;

    async fn find_by_id(&self, id: &UserId) -> Result<Option<Credential>, RepositoryError>;

    /// Overwrite the stored token identifier.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    /// * `Database` - Database operation failed
    async fn set_token_id(&self, id: &UserId, token_id: &TokenId) -> Result<(), RepositoryError>;

    /// Clear the stored token identifier if it still equals `expected`.
    ///
    /// # Returns
    /// `false` when the user does not exist or holds another identifier
    ///
    /// # Errors
    /// * `Database` - Database operation failed
    async fn clear_token_id(&self, id: &UserId, expected: &TokenId)
        -> Result<bool, RepositoryError>;

    /// Flag the account as verified and drop its verification token.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    /// * `Database` - Database operation failed
    async fn mark_verified(&self, id: &UserId) -> Result<(), RepositoryError>;
}

/// Outbound activation mail.
///
/// Fire-and-forget: implementations must not block the caller and report
/// failures through logs only.
pub trait MailDispatcher: Send + Sync + 'static {
    fn send_activation_link(
        &self,
        user_id: &UserId,
        recipient: &EmailAddress,
        token: &VerificationToken,
    );
}

/// Signing and validation of access/refresh tokens.
pub trait TokenIssuer: Send + Sync + 'static {
    fn issue_access(&self, user_id: &UserId) -> Result<IssuedToken, JwtError>;

    fn issue_refresh(&self, user_id: &UserId, token_id: &TokenId)
        -> Result<IssuedToken, JwtError>;

    fn parse_and_validate_access(&self, raw_token: &str) -> Result<Claims, JwtError>;

    fn parse_and_validate_refresh(&self, raw_token: &str) -> Result<Claims, JwtError>;
}
