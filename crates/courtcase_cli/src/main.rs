//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `courtcase_core` linkage, configuration and storage bootstrap.
//! - Drive one health request through the HTTP router.
//! - Keep output deterministic apart from the health timestamp.

use axum::body::{to_bytes, Body};
use axum::http::Request;
use courtcase_core::db::migrations::latest_version;
use courtcase_core::{
    build_router, init_logging, open_db, ApiState, AppConfig, CaseController, CaseService,
    SqliteCaseStore, SqliteSessionVerifier, SystemClock,
};
use log::info;
use std::process::ExitCode;
use std::sync::Arc;
use tower::ServiceExt;

const MAX_HEALTH_BODY_BYTES: usize = 4096;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("courtcase: {message}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), String> {
    let config = AppConfig::from_env().map_err(|err| err.to_string())?;
    if let Some(log_dir) = &config.log_dir {
        let log_dir = log_dir
            .to_str()
            .ok_or_else(|| format!("log directory `{}` is not UTF-8", log_dir.display()))?;
        init_logging(config.log_level, log_dir)?;
    }

    let conn = open_db(&config.db_path).map_err(|err| err.to_string())?;
    let store = SqliteCaseStore::try_new(&conn).map_err(|err| err.to_string())?;
    let controller = CaseController::from_config(CaseService::new(store), &config);

    let verifier_conn = open_db(&config.db_path).map_err(|err| err.to_string())?;
    let verifier = SqliteSessionVerifier::try_new(verifier_conn).map_err(|err| err.to_string())?;
    let app = build_router(
        &config.api_config(),
        ApiState::new(Arc::new(verifier), Arc::new(SystemClock)),
    );

    let request = Request::get("/api/health")
        .body(Body::empty())
        .map_err(|err| err.to_string())?;
    let response = app
        .oneshot(request)
        .await
        .map_err(|err| err.to_string())?;
    let status = response.status();
    let body = to_bytes(response.into_body(), MAX_HEALTH_BODY_BYTES)
        .await
        .map_err(|err| err.to_string())?;
    info!(
        "event=cli_health_check module=cli status=ok db_path={} health_status={}",
        config.db_path.display(),
        status.as_u16()
    );

    println!("courtcase_core version={}", courtcase_core::core_version());
    println!("courtcase_core schema_version={}", latest_version());
    println!("courtcase_core db_path={}", config.db_path.display());
    println!("courtcase_core page_size={}", controller.state().page_size());
    println!(
        "courtcase_core health={} {}",
        status.as_u16(),
        String::from_utf8_lossy(&body)
    );
    Ok(())
}
