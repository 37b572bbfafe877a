use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use super::MessageResponseData;
use crate::domain::identity::models::EmailAddress;
use crate::domain::identity::models::FullName;
use crate::domain::identity::models::Password;
use crate::domain::identity::models::SignUpCommand;
use crate::identity::errors::AuthError;
use crate::inbound::http::router::AppState;

pub async fn sign_up(
    State(state): State<AppState>,
    body: Result<Json<SignUpRequest>, JsonRejection>,
) -> Result<ApiSuccess<MessageResponseData>, ApiError> {
    let Json(body) = body?;

    state
        .auth_service
        .sign_up(body.try_into_command()?)
        .await
        .map_err(ApiError::from)
        .map(|_| {
            ApiSuccess::new(
                StatusCode::CREATED,
                MessageResponseData::new("email activation has been sent, please check your email"),
            )
        })
}

/// HTTP request body for registering an account (raw JSON)
///
/// Absent fields deserialize as empty strings and fail validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SignUpRequest {
    fullname: String,
    email: String,
    password: String,
}

impl SignUpRequest {
    fn try_into_command(self) -> Result<SignUpCommand, AuthError> {
        let email = EmailAddress::new(self.email)?;
        let password = Password::new(self.password)?;
        let fullname = FullName::new(self.fullname)?;
        Ok(SignUpCommand {
            fullname,
            email,
            password,
        })
    }
}
