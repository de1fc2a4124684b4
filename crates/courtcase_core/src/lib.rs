//! Core domain logic for Courtcase.
//! This crate is the single source of truth for case ownership and lifecycle rules.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod view;

pub use api::{build_router, ApiConfig, ApiError, ApiState};
pub use auth::{
    AuthError, AuthEvent, AuthResult, IdentityProvider, Session, SqliteIdentityProvider,
    SqliteSessionVerifier, SubscriptionId, TokenVerifier,
};
pub use config::{AppConfig, ConfigError};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::case::{CaseId, CasePatch, CaseRecord, CaseStatus, ClientInfo, NewCase};
pub use model::case_form::{CaseDraft, CaseValidationError, FieldError};
pub use model::identity::Identity;
pub use model::workflow::{CasePhase, CaseWorkflow, WorkflowField};
pub use repo::case_store::{CaseStore, SqliteCaseStore, StoreError, StoreResult};
pub use repo::clock::{Clock, ManualClock, SystemClock};
pub use service::case_service::{
    CaseError, CaseResult, CaseService, ForbiddenReason, WriteAction,
};
pub use view::case_view::{CaseViewState, DateRange, StatusFilter};
pub use view::controller::CaseController;
pub use view::sort::{SortDirection, SortField, SortSpec};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
