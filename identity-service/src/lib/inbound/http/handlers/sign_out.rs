use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use super::MessageResponseData;
use crate::domain::identity::models::SignOutCommand;
use crate::identity::errors::AuthError;
use crate::inbound::http::router::AppState;

pub async fn sign_out(
    State(state): State<AppState>,
    body: Result<Json<SignOutRequest>, JsonRejection>,
) -> Result<ApiSuccess<MessageResponseData>, ApiError> {
    let Json(body) = body?;
    let command = SignOutCommand::new(body.token).map_err(AuthError::from)?;

    state
        .auth_service
        .sign_out(command)
        .await
        .map_err(ApiError::from)
        .map(|_| {
            ApiSuccess::new(
                StatusCode::OK,
                MessageResponseData::new("user has been signed out"),
            )
        })
}

/// HTTP request body carrying the refresh token to revoke
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SignOutRequest {
    token: String,
}
