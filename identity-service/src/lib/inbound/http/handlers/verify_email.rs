use axum::extract::rejection::QueryRejection;
use axum::extract::Query;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use super::MessageResponseData;
use crate::domain::identity::models::UserId;
use crate::domain::identity::models::VerifyEmailCommand;
use crate::identity::errors::AuthError;
use crate::inbound::http::router::AppState;

/// Target of the activation link sent at sign-up.
pub async fn verify_email(
    State(state): State<AppState>,
    query: Result<Query<VerifyEmailQuery>, QueryRejection>,
) -> Result<ApiSuccess<MessageResponseData>, ApiError> {
    let Query(query) = query?;
    let command =
        VerifyEmailCommand::new(UserId(query.id), query.token).map_err(AuthError::from)?;

    state
        .auth_service
        .verify_email(command)
        .await
        .map_err(ApiError::from)
        .map(|_| {
            ApiSuccess::new(
                StatusCode::OK,
                MessageResponseData::new("email has been verified"),
            )
        })
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VerifyEmailQuery {
    id: i64,
    token: String,
}
