//! HTTP entry point: health, session lookup and CORS.
//!
//! # Responsibility
//! - Build the axum [`Router`] shared by the CLI and tests.
//! - Apply the CORS allow-list and security headers to every response.
//!
//! # Invariants
//! - Handlers perform no I/O beyond token verification.
//! - The allow-origin header is only ever an exact echo of an allowed origin.
//! - Routes answer with and without the `/api` prefix; unknown paths and
//!   methods get a JSON 404.

mod error;
mod routes;

pub use error::ApiError;
pub use routes::{HealthResponse, SessionResponse};

use crate::auth::TokenVerifier;
use crate::logging::sanitize_message;
use crate::repo::clock::Clock;
use axum::extract::Request;
use axum::http::header::{
    HeaderValue, AUTHORIZATION, CONTENT_TYPE, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS,
    X_FRAME_OPTIONS,
};
use axum::http::{Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::Router;
use log::{info, warn};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;

/// Methods advertised on preflight responses.
pub const ALLOWED_METHODS: [Method; 4] = [Method::GET, Method::POST, Method::PUT, Method::DELETE];
pub const PREFLIGHT_MAX_AGE_SECS: u64 = 3600;

const MAX_LOGGED_PATH_CHARS: usize = 120;

/// CORS policy for the entry point.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiConfig {
    /// Lowercased origins without trailing slash; `*` allows any origin.
    pub allowed_origins: Vec<String>,
}

impl ApiConfig {
    pub fn allowing(origins: &[&str]) -> Self {
        Self {
            allowed_origins: origins
                .iter()
                .map(|origin| origin.trim_end_matches('/').to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.iter().any(|origin| origin == "*")
    }

    /// Allow-list as header values; unusable entries are logged and skipped.
    fn origin_values(&self) -> Vec<HeaderValue> {
        self.allowed_origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(
                        "event=api_cors module=api status=error error_code=invalid_origin origin={}",
                        sanitize_message(origin, MAX_LOGGED_PATH_CHARS)
                    );
                    None
                }
            })
            .collect()
    }
}

/// Shared handler state.
#[derive(Clone)]
pub struct ApiState {
    pub verifier: Arc<dyn TokenVerifier + Send + Sync>,
    /// Stamps the health payload.
    pub clock: Arc<dyn Clock + Send + Sync>,
}

impl ApiState {
    pub fn new(
        verifier: Arc<dyn TokenVerifier + Send + Sync>,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Self {
        Self { verifier, clock }
    }
}

/// Builds the full router with CORS, security headers and request logging.
///
/// Layers are applied bottom-up:
///
/// 1. CORS (answers every `OPTIONS` request itself)
/// 2. Preflight status rewrite and access log
/// 3. Security headers
pub fn build_router(config: &ApiConfig, state: ApiState) -> Router {
    Router::new()
        .merge(routes::router())
        .nest("/api", routes::router())
        .fallback(routes::not_found)
        .layer(build_cors_layer(config))
        .layer(middleware::from_fn(finish_response))
        .layer(SetResponseHeaderLayer::overriding(
            X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            REFERRER_POLICY,
            HeaderValue::from_static("origin-when-cross-origin"),
        ))
        .with_state(state)
}

/// CORS layer echoing allow-listed origins; `*` mirrors any request origin.
pub fn build_cors_layer(config: &ApiConfig) -> CorsLayer {
    let allow_origin = if config.allows_any_origin() {
        AllowOrigin::mirror_request()
    } else {
        AllowOrigin::list(config.origin_values())
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(ALLOWED_METHODS)
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .max_age(Duration::from_secs(PREFLIGHT_MAX_AGE_SECS))
}

/// Preflight answers carry no body, so they report 204.
async fn finish_response(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = sanitize_message(request.uri().path(), MAX_LOGGED_PATH_CHARS);
    let mut response = next.run(request).await;

    if method == Method::OPTIONS && response.status() == StatusCode::OK {
        *response.status_mut() = StatusCode::NO_CONTENT;
    }
    info!(
        "event=api_request module=api status={} method={} path={}",
        response.status().as_u16(),
        method,
        path
    );
    response
}

#[cfg(test)]
mod tests {
    use super::ApiConfig;

    #[test]
    fn allow_list_is_normalized() {
        let config = ApiConfig::allowing(&["https://App.example.com/", "http://localhost:3000"]);
        assert_eq!(
            config.allowed_origins,
            vec!["https://app.example.com", "http://localhost:3000"]
        );
        assert!(!config.allows_any_origin());
        assert_eq!(config.origin_values().len(), 2);
        assert!(ApiConfig::allowing(&["*"]).allows_any_origin());
    }

    #[test]
    fn unusable_origins_are_skipped() {
        let config = ApiConfig {
            allowed_origins: vec!["http://ok.test".to_string(), "bad\norigin".to_string()],
        };
        assert_eq!(config.origin_values().len(), 1);
    }
}
