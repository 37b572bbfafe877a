use axum::extract::Request;
use axum::extract::State;
use axum::http::{self};
use axum::middleware::Next;
use axum::response::Response;

use crate::domain::identity::models::UserId;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::router::AppState;

/// Extension type to store authenticated user ID in request extensions
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
}

/// Middleware that validates bearer access tokens and adds the user to request extensions
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(&req)?;

    let user_id = state
        .auth_service
        .authenticate_access(token)
        .await
        .map_err(ApiError::from)?;

    req.extensions_mut().insert(AuthenticatedUser { user_id });

    Ok(next.run(req).await)
}

/// Pull the token out of `Authorization: Bearer <token>`. The scheme is
/// matched case-insensitively.
fn extract_bearer_token(req: &Request) -> Result<&str, ApiError> {
    let header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .ok_or_else(|| {
            tracing::debug!("Missing Authorization header");
            ApiError::unauthorized()
        })?;

    let value = header.to_str().map_err(|_| ApiError::unauthorized())?;

    let (scheme, token) = value.split_once(' ').ok_or_else(ApiError::unauthorized)?;
    if !scheme.eq_ignore_ascii_case(auth::BEARER_SCHEME) {
        tracing::debug!(scheme, "Unsupported authorization scheme");
        return Err(ApiError::unauthorized());
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(ApiError::unauthorized());
    }
    Ok(token)
}

#[cfg(test)]
mod tests {
    use axum::body::Body;

    use super::*;

    fn request(authorization: Option<&str>) -> Request {
        let mut builder = http::Request::builder().uri("/auth/me");
        if let Some(value) = authorization {
            builder = builder.header(http::header::AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_extracts_bearer_token() {
        assert_eq!(extract_bearer_token(&request(Some("Bearer abc"))), Ok("abc"));
        assert_eq!(extract_bearer_token(&request(Some("bearer abc"))), Ok("abc"));
    }

    #[test]
    fn test_rejects_bad_headers() {
        for header in [None, Some("Basic abc"), Some("Bearer"), Some("Bearer   ")] {
            assert_eq!(
                extract_bearer_token(&request(header)),
                Err(ApiError::unauthorized()),
                "{header:?}"
            );
        }
    }
}
