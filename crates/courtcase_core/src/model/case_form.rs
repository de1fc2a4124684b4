//! Client-side case form validation.
//!
//! # Responsibility
//! - Check required fields and contact formats before a create is submitted.
//! - Report every failing field at once, keyed by form field name.

use crate::model::case::{CaseStatus, ClientInfo, NewCase};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\S+@\S+\.\S+").expect("valid email regex"));
static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[\d\s()-]{10,15}$").expect("valid phone regex"));

/// Loose email shape check shared by case forms and sign-up.
pub fn is_valid_email(value: &str) -> bool {
    EMAIL_RE.is_match(value)
}

/// Phone check: optional leading `+`, 10-15 digits/spaces/parens/dashes.
pub fn is_valid_phone(value: &str) -> bool {
    PHONE_RE.is_match(value)
}

/// One failing form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Form field name, `client.` prefixed for client sub-record fields.
    pub field: &'static str,
    pub message: &'static str,
}

/// Collected validation failures.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaseValidationError {
    errors: Vec<FieldError>,
}

impl CaseValidationError {
    pub fn single(field: &'static str, message: &'static str) -> Self {
        Self {
            errors: vec![FieldError { field, message }],
        }
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Message for one field, if it failed.
    pub fn message_for(&self, field: &str) -> Option<&'static str> {
        self.errors
            .iter()
            .find(|error| error.field == field)
            .map(|error| error.message)
    }

    fn push(&mut self, field: &'static str, message: &'static str) {
        self.errors.push(FieldError { field, message });
    }
}

impl Display for CaseValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let joined = self
            .errors
            .iter()
            .map(|error| format!("{}: {}", error.field, error.message))
            .collect::<Vec<_>>()
            .join("; ");
        write!(f, "validation failed: {joined}")
    }
}

impl Error for CaseValidationError {}

/// New-case form contents as typed by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaseDraft {
    pub case_number: String,
    pub client_name: String,
    pub current_summary: String,
    pub status: CaseStatus,
    pub client: ClientInfo,
}

impl CaseDraft {
    /// Client name as submitted; falls back to the client's full name.
    pub fn resolved_client_name(&self) -> String {
        let typed = self.client_name.trim();
        if !typed.is_empty() {
            return typed.to_string();
        }
        self.client.full_name().unwrap_or_default()
    }

    /// Validates required fields and contact formats.
    pub fn validate(&self) -> Result<(), CaseValidationError> {
        let mut error = CaseValidationError::default();

        if self.resolved_client_name().is_empty() {
            error.push("clientName", "Client name is required");
        }
        if self.current_summary.trim().is_empty() {
            error.push("currentSummary", "Case summary is required");
        }
        if !self.client.email.is_empty() && !is_valid_email(&self.client.email) {
            error.push("client.email", "Invalid email address");
        }
        if !self.client.phone.is_empty() && !is_valid_phone(&self.client.phone) {
            error.push("client.phone", "Invalid phone number");
        }

        if error.errors.is_empty() {
            Ok(())
        } else {
            Err(error)
        }
    }

    /// Validates and converts into service input.
    pub fn into_new_case(self) -> Result<NewCase, CaseValidationError> {
        self.validate()?;
        let client_name = self.resolved_client_name();
        Ok(NewCase {
            case_number: Some(self.case_number),
            client_name,
            current_summary: self.current_summary.trim().to_string(),
            case_date: None,
            status: Some(self.status),
            client: self.client,
            workflow: Default::default(),
        })
    }
}
