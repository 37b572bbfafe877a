use thiserror::Error;

/// Error for EmailAddress validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EmailError {
    #[error("email cannot be empty")]
    Empty,

    #[error("email is missing @")]
    MissingAt,

    #[error("email is missing .")]
    MissingDot,

    #[error("'@' must come before the last '.'")]
    AtAfterLastDot,
}

/// Error for Password policy failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PasswordPolicyError {
    #[error("password cannot be empty")]
    Empty,

    #[error("password cannot exceed {max} characters")]
    TooLong { max: usize },

    #[error("password must be at least {min} characters")]
    TooShort { min: usize },

    #[error("must have a lowercase character")]
    MissingLowercase,

    #[error("must have an uppercase character")]
    MissingUppercase,

    #[error("must have a numerical character")]
    MissingDigit,

    #[error("must have a punctuation character")]
    MissingPunctuation,
}

/// Error for FullName validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NameError {
    #[error("name cannot be empty")]
    Empty,

    #[error("name cannot exceed {max} characters")]
    TooLong { max: usize },
}

/// Error for token fields supplied by clients
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TokenFieldError {
    #[error("token cannot be empty")]
    Empty,
}

/// Error for identity store operations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Email already exists: {0}")]
    EmailAlreadyExists(String),

    #[error("User not found: {0}")]
    NotFound(i64),

    #[error("Database error: {0}")]
    Database(String),
}

/// Error for activation mail delivery
#[derive(Debug, Clone, Error)]
pub enum MailError {
    #[error("Invalid mail address: {0}")]
    InvalidAddress(String),

    #[error("Mail transport misconfigured: {0}")]
    Configuration(String),

    #[error("Failed to deliver message: {0}")]
    DeliveryFailed(String),
}

/// Top-level error for all authentication flows.
///
/// Client input, authentication, conflict and internal failures are kept
/// apart so the HTTP layer can pick status codes and log levels.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    // Client input errors
    #[error("Invalid field {field}: {message}")]
    InvalidField { field: &'static str, message: String },

    // Authentication errors
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Inactive user")]
    InactiveUser,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    // Conflict errors
    #[error("Email already exists")]
    EmailAlreadyExists,

    // Infrastructure errors
    #[error("{operation}: {cause}")]
    Internal { operation: &'static str, cause: String },
}

impl AuthError {
    /// Wrap a collaborator failure with the name of the operation that failed.
    pub fn internal(operation: &'static str, cause: impl std::fmt::Display) -> Self {
        AuthError::Internal {
            operation,
            cause: cause.to_string(),
        }
    }
}

impl From<EmailError> for AuthError {
    fn from(err: EmailError) -> Self {
        AuthError::InvalidField {
            field: "email",
            message: err.to_string(),
        }
    }
}

impl From<PasswordPolicyError> for AuthError {
    fn from(err: PasswordPolicyError) -> Self {
        AuthError::InvalidField {
            field: "password",
            message: err.to_string(),
        }
    }
}

impl From<NameError> for AuthError {
    fn from(err: NameError) -> Self {
        AuthError::InvalidField {
            field: "fullname",
            message: err.to_string(),
        }
    }
}

impl From<TokenFieldError> for AuthError {
    fn from(err: TokenFieldError) -> Self {
        AuthError::InvalidField {
            field: "token",
            message: err.to_string(),
        }
    }
}
