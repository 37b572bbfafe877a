use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;

use super::claims::Claims;
use super::claims::TokenKind;
use super::errors::JwtError;
use super::handler::JwtHandler;

/// Presentation scheme returned with every issued token.
pub const BEARER_SCHEME: &str = "bearer";

/// A signed token together with what the caller needs to hand it out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
    pub expire_at: DateTime<Utc>,
    pub scheme: &'static str,
}

/// Issues and validates access/refresh token pairs.
///
/// Stateless: access tokens are only invalidated by expiry. Refresh tokens
/// additionally carry a token identifier that the caller compares against
/// its own record; this type never looks at storage.
pub struct TokenEngine {
    handler: JwtHandler,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenEngine {
    /// Create an engine signing with `secret`.
    ///
    /// # Arguments
    /// * `secret` - HS256 secret
    /// * `access_ttl` - Lifetime of access tokens
    /// * `refresh_ttl` - Lifetime of refresh tokens
    pub fn new(secret: &[u8], access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self::with_handler(JwtHandler::new(secret), access_ttl, refresh_ttl)
    }

    /// Create an engine around a preconfigured handler (e.g. one holding a
    /// previous secret during rotation).
    pub fn with_handler(handler: JwtHandler, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            handler,
            access_ttl,
            refresh_ttl,
        }
    }

    /// Mint an access token for `user_id`.
    ///
    /// # Errors
    /// * `EncodingFailed` - Signing failed
    pub fn issue_access(&self, user_id: i64) -> Result<IssuedToken, JwtError> {
        self.issue_access_at(user_id, Utc::now())
    }

    pub fn issue_access_at(&self, user_id: i64, now: DateTime<Utc>) -> Result<IssuedToken, JwtError> {
        self.sign(Claims::access(user_id, now.timestamp(), self.access_ttl))
    }

    /// Mint a refresh token for `user_id` bound to `token_id`.
    ///
    /// # Errors
    /// * `MissingIdentifier` - `token_id` is empty
    /// * `EncodingFailed` - Signing failed
    pub fn issue_refresh(&self, user_id: i64, token_id: &str) -> Result<IssuedToken, JwtError> {
        self.issue_refresh_at(user_id, token_id, Utc::now())
    }

    pub fn issue_refresh_at(
        &self,
        user_id: i64,
        token_id: &str,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, JwtError> {
        if token_id.is_empty() {
            return Err(JwtError::MissingIdentifier);
        }
        self.sign(Claims::refresh(
            user_id,
            token_id,
            now.timestamp(),
            self.refresh_ttl,
        ))
    }

    /// Parse and validate an access token.
    ///
    /// # Errors
    /// `Malformed`, `SignatureInvalid`, `Expired`, `MissingUserId`, `WrongKind`
    pub fn parse_and_validate_access(&self, raw: &str) -> Result<Claims, JwtError> {
        self.parse_and_validate_access_at(raw, Utc::now().timestamp())
    }

    pub fn parse_and_validate_access_at(&self, raw: &str, now: i64) -> Result<Claims, JwtError> {
        self.parse_and_validate(raw, TokenKind::Access, now)
    }

    /// Parse and validate a refresh token.
    ///
    /// # Errors
    /// `Malformed`, `SignatureInvalid`, `Expired`, `MissingUserId`,
    /// `MissingIdentifier`, `WrongKind`
    pub fn parse_and_validate_refresh(&self, raw: &str) -> Result<Claims, JwtError> {
        self.parse_and_validate_refresh_at(raw, Utc::now().timestamp())
    }

    pub fn parse_and_validate_refresh_at(&self, raw: &str, now: i64) -> Result<Claims, JwtError> {
        self.parse_and_validate(raw, TokenKind::Refresh, now)
    }

    fn sign(&self, claims: Claims) -> Result<IssuedToken, JwtError> {
        let token = self.handler.encode(&claims)?;
        let expire_at = DateTime::<Utc>::from_timestamp(claims.exp, 0).ok_or_else(|| {
            JwtError::EncodingFailed(format!("expiry out of range: {}", claims.exp))
        })?;

        Ok(IssuedToken {
            token,
            claims,
            expire_at,
            scheme: BEARER_SCHEME,
        })
    }

    // Each step assumes the previous ones passed.
    fn parse_and_validate(&self, raw: &str, expected: TokenKind, now: i64) -> Result<Claims, JwtError> {
        // 1 + 2: structure and signature
        let claims: Claims = self.handler.decode(raw)?;

        // 3: expiry
        if claims.is_expired(now) {
            return Err(JwtError::Expired);
        }

        // 4: required fields for the kind the claims declare
        if claims.user_id == 0 {
            return Err(JwtError::MissingUserId);
        }
        if claims.token_type == TokenKind::Refresh && claims.token_id().is_none() {
            return Err(JwtError::MissingIdentifier);
        }

        // 5: kind binding
        if claims.token_type != expected {
            return Err(JwtError::WrongKind {
                expected,
                actual: claims.token_type,
            });
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test_secret_key_at_least_32_bytes!";

    fn engine() -> TokenEngine {
        TokenEngine::new(SECRET, Duration::minutes(15), Duration::minutes(60 * 24))
    }

    #[test]
    fn test_access_round_trip() {
        let engine = engine();

        let issued = engine.issue_access(42).expect("Failed to issue access token");
        assert_eq!(issued.scheme, "bearer");
        assert_eq!(issued.expire_at.timestamp(), issued.claims.exp);

        let claims = engine
            .parse_and_validate_access(&issued.token)
            .expect("Failed to validate access token");
        assert_eq!(claims.user_id, 42);
        assert_eq!(claims.token_type, TokenKind::Access);
        assert!(claims.jti.is_none());
    }

    #[test]
    fn test_refresh_round_trip() {
        let engine = engine();

        let issued = engine
            .issue_refresh(42, "token-id")
            .expect("Failed to issue refresh token");
        let claims = engine
            .parse_and_validate_refresh(&issued.token)
            .expect("Failed to validate refresh token");

        assert_eq!(claims.user_id, 42);
        assert_eq!(claims.token_id(), Some("token-id"));
        assert_eq!(claims.exp - claims.iat, 60 * 60 * 24);
    }

    #[test]
    fn test_refresh_requires_token_id_at_issue() {
        let result = engine().issue_refresh(42, "");
        assert_eq!(result, Err(JwtError::MissingIdentifier));
    }

    #[test]
    fn test_two_refresh_tokens_are_independently_valid() {
        let engine = engine();

        let first = engine.issue_refresh(7, "first").unwrap();
        let second = engine.issue_refresh(7, "second").unwrap();

        let first = engine.parse_and_validate_refresh(&first.token).unwrap();
        let second = engine.parse_and_validate_refresh(&second.token).unwrap();
        assert_eq!(first.token_id(), Some("first"));
        assert_eq!(second.token_id(), Some("second"));
    }

    #[test]
    fn test_expiry_boundary() {
        let engine = engine();
        let issued = engine.issue_access(1).unwrap();
        let exp = issued.claims.exp;

        assert!(engine.parse_and_validate_access_at(&issued.token, exp - 1).is_ok());
        assert_eq!(
            engine.parse_and_validate_access_at(&issued.token, exp),
            Err(JwtError::Expired)
        );
        assert_eq!(
            engine.parse_and_validate_access_at(&issued.token, exp + 1),
            Err(JwtError::Expired)
        );
    }

    #[test]
    fn test_access_given_refresh_is_wrong_kind() {
        let engine = engine();
        let refresh = engine.issue_refresh(1, "jti").unwrap();

        assert_eq!(
            engine.parse_and_validate_access(&refresh.token),
            Err(JwtError::WrongKind {
                expected: TokenKind::Access,
                actual: TokenKind::Refresh,
            })
        );
    }

    #[test]
    fn test_refresh_given_access_is_wrong_kind() {
        let engine = engine();
        let access = engine.issue_access(1).unwrap();

        assert_eq!(
            engine.parse_and_validate_refresh(&access.token),
            Err(JwtError::WrongKind {
                expected: TokenKind::Refresh,
                actual: TokenKind::Access,
            })
        );
    }

    #[test]
    fn test_refresh_claims_without_jti_are_missing_identifier() {
        let engine = engine();
        let mut claims = Claims::refresh(1, "jti", Utc::now().timestamp(), Duration::minutes(5));
        claims.jti = None;
        let token = JwtHandler::new(SECRET).encode(&claims).unwrap();

        assert_eq!(
            engine.parse_and_validate_refresh(&token),
            Err(JwtError::MissingIdentifier)
        );
        // The claims' own kind decides the required fields
        assert_eq!(
            engine.parse_and_validate_access(&token),
            Err(JwtError::MissingIdentifier)
        );
    }

    #[test]
    fn test_refresh_given_access_with_jti_is_wrong_kind() {
        let engine = engine();
        let mut claims = Claims::access(1, Utc::now().timestamp(), Duration::minutes(5));
        claims.jti = Some("smuggled".to_string());
        let token = JwtHandler::new(SECRET).encode(&claims).unwrap();

        assert_eq!(
            engine.parse_and_validate_refresh(&token),
            Err(JwtError::WrongKind {
                expected: TokenKind::Refresh,
                actual: TokenKind::Access,
            })
        );
    }

    #[test]
    fn test_zero_user_id_is_rejected() {
        let engine = engine();
        let issued = engine.issue_access(0).unwrap();

        assert_eq!(
            engine.parse_and_validate_access(&issued.token),
            Err(JwtError::MissingUserId)
        );
    }

    #[test]
    fn test_expiry_checked_before_kind() {
        let engine = engine();
        let past = Utc::now() - Duration::days(30);
        let refresh = engine.issue_refresh_at(1, "jti", past).unwrap();

        assert_eq!(
            engine.parse_and_validate_access(&refresh.token),
            Err(JwtError::Expired)
        );
    }

    #[test]
    fn test_signature_checked_before_expiry() {
        let other = TokenEngine::new(
            b"another_secret_at_least_32_bytes_long",
            Duration::minutes(15),
            Duration::minutes(60),
        );
        let past = Utc::now() - Duration::days(30);
        let forged = other.issue_access_at(1, past).unwrap();

        assert!(matches!(
            engine().parse_and_validate_access(&forged.token),
            Err(JwtError::SignatureInvalid(_))
        ));
    }

    #[test]
    fn test_malformed_token() {
        assert!(matches!(
            engine().parse_and_validate_refresh("garbage"),
            Err(JwtError::Malformed(_))
        ));
    }

    #[test]
    fn test_payload_without_token_type_is_malformed() {
        #[derive(serde::Serialize)]
        struct Partial {
            user_id: i64,
            exp: i64,
        }

        let token = JwtHandler::new(SECRET)
            .encode(&Partial {
                user_id: 1,
                exp: Utc::now().timestamp() + 60,
            })
            .unwrap();

        assert!(matches!(
            engine().parse_and_validate_access(&token),
            Err(JwtError::Malformed(_))
        ));
    }
}
