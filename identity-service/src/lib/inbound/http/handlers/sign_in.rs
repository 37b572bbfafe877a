use auth::IssuedToken;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::domain::identity::models::EmailAddress;
use crate::domain::identity::models::SignInCommand;
use crate::domain::identity::ports::SignInTokens;
use crate::identity::errors::AuthError;
use crate::inbound::http::router::AppState;

const ACCESS_TOKEN_NAME: &str = "access_token";
const REFRESH_TOKEN_NAME: &str = "refresh_token";

pub async fn sign_in(
    State(state): State<AppState>,
    body: Result<Json<SignInRequest>, JsonRejection>,
) -> Result<ApiSuccess<SignInResponseData>, ApiError> {
    let Json(body) = body?;

    state
        .auth_service
        .sign_in(body.try_into_command()?)
        .await
        .map_err(ApiError::from)
        .map(|ref tokens| ApiSuccess::new(StatusCode::OK, tokens.into()))
}

/// HTTP request body for signing in (raw JSON)
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SignInRequest {
    email: String,
    password: String,
}

impl SignInRequest {
    fn try_into_command(self) -> Result<SignInCommand, AuthError> {
        let email = EmailAddress::new(self.email)?;
        Ok(SignInCommand::new(email, self.password)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignInResponseData {
    pub token: Vec<TokenData>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenData {
    pub token_name: &'static str,
    pub token_type: &'static str,
    pub token: String,
    pub expire_at: DateTime<Utc>,
    pub scheme: &'static str,
}

impl TokenData {
    fn new(token_name: &'static str, issued: &IssuedToken) -> Self {
        Self {
            token_name,
            token_type: issued.claims.token_type.as_str(),
            token: issued.token.clone(),
            expire_at: issued.expire_at,
            scheme: issued.scheme,
        }
    }
}

impl From<&SignInTokens> for SignInResponseData {
    fn from(tokens: &SignInTokens) -> Self {
        Self {
            token: vec![
                TokenData::new(ACCESS_TOKEN_NAME, &tokens.access),
                TokenData::new(REFRESH_TOKEN_NAME, &tokens.refresh),
            ],
        }
    }
}
