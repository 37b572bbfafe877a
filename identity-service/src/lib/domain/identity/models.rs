use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::DateTime;
use chrono::Utc;
use rand::rngs::OsRng;
use rand::RngCore;

use crate::identity::errors::EmailError;
use crate::identity::errors::NameError;
use crate::identity::errors::PasswordPolicyError;
use crate::identity::errors::TokenFieldError;
use crate::identity::validation;

/// Stored user record.
///
/// `token_id` is present only while a refresh token is outstanding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub id: UserId,
    pub email: String,
    pub fullname: String,
    pub is_verified: bool,
    pub token_id: Option<String>,
    pub verification_token: Option<String>,
    pub verification_expires_at: Option<DateTime<Utc>>,
}

/// The subset of a credential needed to check a password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredential {
    pub id: UserId,
    pub email: String,
    pub password_hash: String,
    pub is_verified: bool,
}

/// New, unverified account ready to be persisted.
#[derive(Debug, Clone)]
pub struct Registration {
    pub email: EmailAddress,
    pub password_hash: String,
    pub fullname: FullName,
    pub is_verified: bool,
    pub verification_token: VerificationToken,
    pub verification_expires_at: DateTime<Utc>,
}

/// User unique identifier type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Email address type
///
/// Stored as given; comparisons are case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// # Errors
    /// * `EmailError` - `@` missing, `.` missing, or `@` after the last `.`
    pub fn new(email: String) -> Result<Self, EmailError> {
        validation::validate_email(&email)?;
        Ok(Self(email))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Plaintext password that satisfies the sign-up policy.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    /// # Errors
    /// * `PasswordPolicyError` - Length out of [8, 40] or a character class missing
    pub fn new(password: String) -> Result<Self, PasswordPolicyError> {
        validation::validate_password(&password)?;
        Ok(Self(password))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(***)")
    }
}

/// Display name given at sign-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FullName(String);

impl FullName {
    pub fn new(name: String) -> Result<Self, NameError> {
        validation::validate_name(&name)?;
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Random identifier binding a refresh token to the stored session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenId(String);

impl TokenId {
    const RANDOM_BYTES: usize = 16;

    /// Draw a fresh identifier from the OS CSPRNG, base64url without padding.
    pub fn generate() -> Result<Self, rand::Error> {
        let mut bytes = [0u8; Self::RANDOM_BYTES];
        OsRng.try_fill_bytes(&mut bytes)?;
        Ok(Self(URL_SAFE_NO_PAD.encode(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for TokenId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// One-time secret mailed to the user to activate the account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationToken(String);

impl VerificationToken {
    pub const LENGTH: usize = 128;
    const ALPHABET: &'static [u8] =
        b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz-";

    /// Draw `LENGTH` characters uniformly from the alphabet.
    pub fn generate() -> Result<Self, rand::Error> {
        let alphabet_len = Self::ALPHABET.len();
        // Largest multiple of the alphabet size that fits in a byte
        let zone = (u8::MAX as usize + 1) / alphabet_len * alphabet_len;

        let mut token = String::with_capacity(Self::LENGTH);
        let mut buffer = [0u8; Self::LENGTH];
        while token.len() < Self::LENGTH {
            OsRng.try_fill_bytes(&mut buffer)?;
            for byte in buffer.iter().map(|b| *b as usize).filter(|b| *b < zone) {
                if token.len() == Self::LENGTH {
                    break;
                }
                token.push(Self::ALPHABET[byte % alphabet_len] as char);
            }
        }
        Ok(Self(token))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for VerificationToken {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Command to register a new account with validated fields
#[derive(Debug)]
pub struct SignUpCommand {
    pub fullname: FullName,
    pub email: EmailAddress,
    pub password: Password,
}

/// Command to exchange credentials for a token pair.
///
/// The password is only checked for presence; the stored hash decides the rest.
#[derive(Debug)]
pub struct SignInCommand {
    pub email: EmailAddress,
    pub password: String,
}

impl SignInCommand {
    pub fn new(email: EmailAddress, password: String) -> Result<Self, PasswordPolicyError> {
        if password.is_empty() {
            return Err(PasswordPolicyError::Empty);
        }
        Ok(Self { email, password })
    }
}

/// Command to revoke the session bound to a refresh token
#[derive(Debug)]
pub struct SignOutCommand {
    pub refresh_token: String,
}

impl SignOutCommand {
    pub fn new(refresh_token: String) -> Result<Self, TokenFieldError> {
        validation::validate_token(&refresh_token)?;
        Ok(Self { refresh_token })
    }
}

/// Command to activate an account from the mailed link
#[derive(Debug)]
pub struct VerifyEmailCommand {
    pub user_id: UserId,
    pub token: String,
}

impl VerifyEmailCommand {
    pub fn new(user_id: UserId, token: String) -> Result<Self, TokenFieldError> {
        validation::validate_token(&token)?;
        Ok(Self { user_id, token })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_id_is_random_and_url_safe() {
        let first = TokenId::generate().unwrap();
        let second = TokenId::generate().unwrap();

        assert_ne!(first, second);
        // 16 bytes -> 22 base64 characters without padding
        assert_eq!(first.as_str().len(), 22);
        assert!(first
            .as_str()
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_verification_token_shape() {
        let token = VerificationToken::generate().unwrap();

        assert_eq!(token.as_str().len(), VerificationToken::LENGTH);
        assert!(token
            .as_str()
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-'));
        assert_ne!(token, VerificationToken::generate().unwrap());
    }

    #[test]
    fn test_password_debug_is_redacted() {
        let password = Password::new("Abcdef1!".to_string()).unwrap();
        assert_eq!(format!("{:?}", password), "Password(***)");
    }

    #[test]
    fn test_sign_in_requires_password() {
        let email = EmailAddress::new("a@b.com".to_string()).unwrap();
        assert!(matches!(
            SignInCommand::new(email, String::new()),
            Err(PasswordPolicyError::Empty)
        ));
    }

    #[test]
    fn test_sign_out_requires_token() {
        assert!(SignOutCommand::new("  ".to_string()).is_err());
        assert!(SignOutCommand::new("a.b.c".to_string()).is_ok());
    }
}
