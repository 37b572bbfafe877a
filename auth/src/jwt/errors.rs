use thiserror::Error;

use super::claims::TokenKind;

/// Error type for JWT operations.
///
/// Variants are ordered the way validation runs: structure, signature,
/// expiry, required fields, token kind.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum JwtError {
    #[error("Failed to encode token: {0}")]
    EncodingFailed(String),

    #[error("Token is malformed: {0}")]
    Malformed(String),

    #[error("Token signature is invalid: {0}")]
    SignatureInvalid(String),

    #[error("Token is expired")]
    Expired,

    #[error("Token is missing a valid user_id claim")]
    MissingUserId,

    #[error("Token is missing the jti claim")]
    MissingIdentifier,

    #[error("Expected {expected} token, got {actual}")]
    WrongKind { expected: TokenKind, actual: TokenKind },
}

impl JwtError {
    /// True for the one failure a client can recover from by re-authenticating.
    pub fn is_expired(&self) -> bool {
        matches!(self, JwtError::Expired)
    }
}
