use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

use crate::{
    auth::{error::AuthError, google::OAuthError, jwt::TokenError},
    users::repo::StoreError,
};

/// JSON error body: `{"error": "<message>"}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Errors as seen by HTTP clients.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("{0}")]
    Unauthorized(String),
    #[error("email already registered")]
    DuplicateEmail,
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    UpstreamOAuth(String),
    #[error("google oauth is not configured")]
    OAuthNotConfigured,
    /// Detail is logged, never returned.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::DuplicateEmail | AppError::UpstreamOAuth(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::InvalidCredentials | AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::OAuthNotConfigured => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::Internal(detail) => {
                error!(%detail, "internal error");
                "internal server error".to_string()
            }
            other => {
                warn!(%status, error = %other, "request failed");
                other.to_string()
            }
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => AppError::NotFound("user not found".into()),
            StoreError::DuplicateEmail => AppError::DuplicateEmail,
            StoreError::Database(e) => AppError::Internal(e.to_string()),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidCredentials => AppError::InvalidCredentials,
            AuthError::DuplicateEmail => AppError::DuplicateEmail,
            AuthError::Store(e) => e.into(),
            AuthError::Password(e) => AppError::Internal(e.to_string()),
            AuthError::Token(TokenError::Invalid(_)) => {
                AppError::Unauthorized("invalid token".into())
            }
            AuthError::Token(e) => AppError::Internal(e.to_string()),
        }
    }
}

impl From<OAuthError> for AppError {
    fn from(e: OAuthError) -> Self {
        AppError::UpstreamOAuth(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(AppError::Validation("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::DuplicateEmail.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::InvalidCredentials.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::UpstreamOAuth("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::OAuthNotConfigured.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            AppError::Internal("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn auth_errors_map_to_client_kinds() {
        let e: AppError = AuthError::InvalidCredentials.into();
        assert!(matches!(e, AppError::InvalidCredentials));

        let e: AppError = AuthError::from(StoreError::DuplicateEmail).into();
        assert!(matches!(e, AppError::DuplicateEmail));

        let e: AppError = AuthError::Token(TokenError::Invalid("expired".into())).into();
        assert_eq!(e.status(), StatusCode::UNAUTHORIZED);

        let e: AppError = OAuthError::Exchange("bad code".into()).into();
        assert_eq!(e.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn internal_detail_is_hidden() {
        let res = AppError::Internal("connection refused on 10.0.0.3".into()).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "internal server error");
    }
}
