use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::domain::identity::models::Credential;
use crate::inbound::http::middleware::AuthenticatedUser;
use crate::inbound::http::router::AppState;

pub async fn me(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<ApiSuccess<ProfileResponseData>, ApiError> {
    state
        .auth_service
        .get_profile(&user.user_id)
        .await
        .map_err(ApiError::from)
        .map(|ref credential| ApiSuccess::new(StatusCode::OK, credential.into()))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileResponseData {
    pub id: i64,
    pub email: String,
    pub fullname: String,
    pub is_verified: bool,
}

impl From<&Credential> for ProfileResponseData {
    fn from(credential: &Credential) -> Self {
        Self {
            id: credential.id.0,
            email: credential.email.clone(),
            fullname: credential.fullname.clone(),
            is_verified: credential.is_verified,
        }
    }
}
