use crate::auth::AuthError;
use crate::logging::sanitize_message;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::error;
use serde_json::json;
use std::error::Error;
use std::fmt::{Display, Formatter};

const MAX_LOGGED_ERROR_CHARS: usize = 200;

/// Failure answered by an entry point handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    MissingAuthorization,
    /// Present but not `Bearer <token>`.
    MalformedAuthorization,
    InvalidSession,
    NotFound,
    /// Backend failure; details are logged, never returned.
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingAuthorization | Self::InvalidSession => StatusCode::UNAUTHORIZED,
            Self::MalformedAuthorization => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingAuthorization => write!(f, "Missing authorization header"),
            Self::MalformedAuthorization => write!(f, "Malformed authorization header"),
            Self::InvalidSession => write!(f, "Invalid or expired session"),
            Self::NotFound => write!(f, "Endpoint not found"),
            Self::Internal(_) => write!(f, "Internal error"),
        }
    }
}

impl Error for ApiError {}

impl From<AuthError> for ApiError {
    fn from(value: AuthError) -> Self {
        Self::Internal(value.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Internal(detail) = &self {
            error!(
                "event=api_error module=api status=error error_code=internal error={}",
                sanitize_message(detail, MAX_LOGGED_ERROR_CHARS)
            );
        }
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::ApiError;
    use axum::http::StatusCode;

    #[test]
    fn statuses_follow_error_kind() {
        assert_eq!(ApiError::MissingAuthorization.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::MalformedAuthorization.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::NotFound.to_string(), "Endpoint not found");
        assert_eq!(
            ApiError::Internal("disk I/O error".to_string()).to_string(),
            "Internal error"
        );
    }
}
