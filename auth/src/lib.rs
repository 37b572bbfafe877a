//! Authentication utilities library
//!
//! Provides the credential and token core used by the identity service:
//! - Password hashing (Argon2id)
//! - Access/refresh JWT issuance and validation (HS256)
//!
//! Storage is not this crate's concern. A refresh token carries a token
//! identifier (`jti`) that the service compares against its own record.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let hash = hasher.hash("Abcdef1!").unwrap();
//! assert!(hasher.verify(&hash, "Abcdef1!").is_ok());
//! ```
//!
//! ## Access and Refresh Tokens
//! ```
//! use auth::{TokenEngine, TokenKind};
//! use chrono::Duration;
//!
//! let engine = TokenEngine::new(
//!     b"secret_key_at_least_32_bytes_long!",
//!     Duration::minutes(15),
//!     Duration::days(7),
//! );
//!
//! let access = engine.issue_access(42).unwrap();
//! let claims = engine.parse_and_validate_access(&access.token).unwrap();
//! assert_eq!(claims.user_id, 42);
//! assert_eq!(claims.token_type, TokenKind::Access);
//!
//! let refresh = engine.issue_refresh(42, "random-token-id").unwrap();
//! let claims = engine.parse_and_validate_refresh(&refresh.token).unwrap();
//! assert_eq!(claims.token_id(), Some("random-token-id"));
//! ```

pub mod jwt;
pub mod password;

// Re-export commonly used items
pub use jwt::Claims;
pub use jwt::IssuedToken;
pub use jwt::JwtError;
pub use jwt::JwtHandler;
pub use jwt::TokenEngine;
pub use jwt::TokenKind;
pub use jwt::BEARER_SCHEME;
pub use password::PasswordError;
pub use password::PasswordHasher;
