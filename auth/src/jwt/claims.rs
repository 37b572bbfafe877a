use std::fmt;

use chrono::Duration;
use serde::Deserialize;
use serde::Serialize;

/// Kind of token a claim was minted for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload embedded in every signed token.
///
/// Access claims never carry a `jti`; refresh claims always do. The
/// constructors are the only way this crate builds claims, so the invariant
/// holds for everything it signs. Claims decoded from the wire are checked
/// again by the engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Owner of the token
    #[serde(default)]
    pub user_id: i64,

    /// `access` or `refresh`
    pub token_type: TokenKind,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Token identifier binding a refresh token to the stored session
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
}

impl Claims {
    /// Build access claims issued at `now` and living for `ttl`.
    pub fn access(user_id: i64, now: i64, ttl: Duration) -> Self {
        Self {
            user_id,
            token_type: TokenKind::Access,
            iat: now,
            exp: now + ttl.num_seconds(),
            jti: None,
        }
    }

    /// Build refresh claims bound to `token_id`.
    pub fn refresh(user_id: i64, token_id: impl Into<String>, now: i64, ttl: Duration) -> Self {
        Self {
            user_id,
            token_type: TokenKind::Refresh,
            iat: now,
            exp: now + ttl.num_seconds(),
            jti: Some(token_id.into()),
        }
    }

    /// Check if token is expired.
    ///
    /// The boundary is inclusive: a claim expiring exactly at `current_timestamp`
    /// is already expired.
    pub fn is_expired(&self, current_timestamp: i64) -> bool {
        self.exp <= current_timestamp
    }

    /// Token identifier, treating an empty string as absent.
    pub fn token_id(&self) -> Option<&str> {
        self.jti.as_deref().filter(|jti| !jti.is_empty())
    }
}
