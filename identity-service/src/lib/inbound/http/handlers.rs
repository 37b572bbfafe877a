use axum::extract::rejection::JsonRejection;
use axum::extract::rejection::QueryRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use serde::Serialize;

use crate::identity::errors::AuthError;

pub mod me;
pub mod sign_in;
pub mod sign_out;
pub mod sign_up;
pub mod verify_email;

const MSG_BAD_REQUEST: &str = "failed to parse request";
const MSG_UNAUTHORIZED: &str = "given security scheme is invalid";
const MSG_INVALID_CREDENTIALS: &str = "email or password is incorrect";
const MSG_TOKEN_EXPIRED: &str =
    "given security scheme is valid, but the lifetime has been expired or revoked";
const MSG_INVALID_TOKEN: &str = "token is invalid";
const MSG_INACTIVE_USER: &str = "request account is inactive";
const MSG_CONFLICT: &str = "email already exists";
const MSG_INVALID_FIELD: &str = "request field is in wrong format, check `invalid_field` to see";
const MSG_INTERNAL: &str = "server has internal error";

#[derive(Debug, Clone)]
pub struct ApiSuccess<T: Serialize + PartialEq>(StatusCode, Json<T>);

impl<T> PartialEq for ApiSuccess<T>
where
    T: Serialize + PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0 && self.1 .0 == other.1 .0
    }
}

impl<T: Serialize + PartialEq> ApiSuccess<T> {
    pub fn new(status: StatusCode, data: T) -> Self {
        ApiSuccess(status, Json(data))
    }
}

impl<T: Serialize + PartialEq> IntoResponse for ApiSuccess<T> {
    fn into_response(self) -> Response {
        (self.0, self.1).into_response()
    }
}

/// Body of every plain acknowledgement and error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageResponseData {
    pub message: String,
}

impl MessageResponseData {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    InternalServerError(String),
    UnprocessableEntity { field: &'static str, message: String },
    BadRequest(String),
    Conflict(String),
    Unauthorized(String),
}

impl ApiError {
    pub fn unauthorized() -> Self {
        ApiError::Unauthorized(MSG_UNAUTHORIZED.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::UnprocessableEntity { field, message } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(InvalidFieldResponseData {
                    message: MSG_INVALID_FIELD.to_string(),
                    invalid_field: InvalidField {
                        name: field,
                        message,
                    },
                }),
            )
                .into_response(),
            ApiError::InternalServerError(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, Json(MessageResponseData::new(msg)))
                    .into_response()
            }
            ApiError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, Json(MessageResponseData::new(msg))).into_response()
            }
            ApiError::Conflict(msg) => {
                (StatusCode::CONFLICT, Json(MessageResponseData::new(msg))).into_response()
            }
            ApiError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, Json(MessageResponseData::new(msg))).into_response()
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidField { field, message } => {
                ApiError::UnprocessableEntity { field, message }
            }
            AuthError::Unauthorized => ApiError::unauthorized(),
            AuthError::InvalidCredentials => {
                ApiError::Unauthorized(MSG_INVALID_CREDENTIALS.to_string())
            }
            AuthError::TokenExpired => ApiError::Unauthorized(MSG_TOKEN_EXPIRED.to_string()),
            AuthError::InvalidToken => ApiError::Unauthorized(MSG_INVALID_TOKEN.to_string()),
            AuthError::InactiveUser => ApiError::BadRequest(MSG_INACTIVE_USER.to_string()),
            AuthError::EmailAlreadyExists => ApiError::Conflict(MSG_CONFLICT.to_string()),
            AuthError::Internal { operation, cause } => {
                tracing::error!(operation, cause = %cause, "Internal error");
                ApiError::InternalServerError(MSG_INTERNAL.to_string())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(reason = %rejection.body_text(), "Rejected request body");
        ApiError::BadRequest(MSG_BAD_REQUEST.to_string())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        tracing::debug!(reason = %rejection.body_text(), "Rejected query string");
        ApiError::BadRequest(MSG_BAD_REQUEST.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvalidFieldResponseData {
    pub message: String,
    pub invalid_field: InvalidField,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvalidField {
    pub name: &'static str,
    pub message: String,
}
