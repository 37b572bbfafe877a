use auth::Claims;
use auth::IssuedToken;
use auth::JwtError;
use auth::TokenEngine;

use crate::domain::identity::models::TokenId;
use crate::domain::identity::models::UserId;
use crate::domain::identity::ports::TokenIssuer;

impl TokenIssuer for TokenEngine {
    fn issue_access(&self, user_id: &UserId) -> Result<IssuedToken, JwtError> {
        TokenEngine::issue_access(self, user_id.0)
    }

    fn issue_refresh(&self, user_id: &UserId, token_id: &TokenId) -> Result<IssuedToken, JwtError> {
        TokenEngine::issue_refresh(self, user_id.0, token_id.as_str())
    }

    fn parse_and_validate_access(&self, raw_token: &str) -> Result<Claims, JwtError> {
        TokenEngine::parse_and_validate_access(self, raw_token)
    }

    fn parse_and_validate_refresh(&self, raw_token: &str) -> Result<Claims, JwtError> {
        TokenEngine::parse_and_validate_refresh(self, raw_token)
    }
}
