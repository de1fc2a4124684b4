use crate::api::error::ApiError;
use crate::api::ApiState;
use axum::extract::State;
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

/// Health check payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Epoch milliseconds.
    pub timestamp: i64,
}

/// Owner of a presented session token.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub user_id: String,
    pub email: Option<String>,
}

/// Routes mounted both at the root and under `/api`.
pub(crate) fn router() -> Router<ApiState> {
    Router::new()
        .route("/health", get(health).fallback(not_found))
        .route("/auth/session", get(session).fallback(not_found))
}

/// GET /health
async fn health(State(state): State<ApiState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: state.clock.now_ms(),
    })
}

/// GET /auth/session -- resolves `Authorization: Bearer <token>`.
async fn session(
    State(state): State<ApiState>,
    headers: HeaderMap,
) -> Result<Json<SessionResponse>, ApiError> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or(ApiError::MissingAuthorization)?;
    let token = header
        .to_str()
        .ok()
        .and_then(bearer_token)
        .ok_or(ApiError::MalformedAuthorization)?;

    let identity = state
        .verifier
        .verify_token(token)?
        .ok_or(ApiError::InvalidSession)?;
    Ok(Json(SessionResponse {
        user_id: identity.user_id,
        email: identity.email,
    }))
}

pub(crate) async fn not_found() -> ApiError {
    ApiError::NotFound
}

/// Extracts the token from `Bearer <token>`; the scheme is case-insensitive.
fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() && !token.contains(' '))
        .then_some(token)
}
