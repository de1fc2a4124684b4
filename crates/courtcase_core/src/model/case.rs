//! Case domain model.
//!
//! # Responsibility
//! - Define the canonical case record shared by list, detail and export views.
//! - Define create and partial-update inputs accepted by the case service.
//!
//! # Invariants
//! - `is_deleted`, `deleted_at.is_some()` and `status == Deleted` always agree.
//! - `id`, `user_id` and `created_at` never change after creation.
//! - Timestamps are Unix epoch milliseconds.

use crate::model::workflow::{CaseWorkflow, WorkflowField};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Opaque case identifier assigned by the document store.
pub type CaseId = String;

/// Case classification shown in list chips and used by the status filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CaseStatus {
    #[default]
    Open,
    Closed,
    Pending,
    /// Soft-deleted; only reachable through the soft-delete operation.
    Deleted,
}

impl CaseStatus {
    pub fn all() -> &'static [CaseStatus] {
        &[Self::Open, Self::Closed, Self::Pending, Self::Deleted]
    }

    /// Stored string value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::Closed => "Closed",
            Self::Pending => "Pending",
            Self::Deleted => "Deleted",
        }
    }

    /// Parses an exact stored value.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Open" => Some(Self::Open),
            "Closed" => Some(Self::Closed),
            "Pending" => Some(Self::Pending),
            "Deleted" => Some(Self::Deleted),
            _ => None,
        }
    }
}

/// Client contact details embedded in a case.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientInfo {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub statement: String,
    pub objectives: String,
}

impl ClientInfo {
    /// `"First Last"` when both names are present.
    pub fn full_name(&self) -> Option<String> {
        let first = self.first_name.trim();
        let last = self.last_name.trim();
        if first.is_empty() || last.is_empty() {
            None
        } else {
            Some(format!("{first} {last}"))
        }
    }

    /// Document representation stored under the `client` key.
    pub fn to_json(&self) -> Value {
        json!({
            "firstName": self.first_name,
            "lastName": self.last_name,
            "email": self.email,
            "phone": self.phone,
            "address": self.address,
            "statement": self.statement,
            "objectives": self.objectives,
        })
    }
}

/// Canonical case record as seen by callers of the case service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseRecord {
    pub id: CaseId,
    /// Human-readable number; generated when the creator leaves it blank.
    pub case_number: String,
    pub client_name: String,
    pub current_summary: String,
    pub case_date: Option<i64>,
    pub status: CaseStatus,
    pub is_deleted: bool,
    pub deleted_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
    /// Exclusive owner; every read and write compares against this.
    pub user_id: String,
    pub is_primary: bool,
    pub can_write: bool,
    pub can_export: bool,
    pub client: ClientInfo,
    pub workflow: CaseWorkflow,
}

impl CaseRecord {
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }

    /// Returns whether this case shows up in the default case list.
    pub fn is_active(&self) -> bool {
        !self.is_deleted
    }

    /// Checks the three-way tombstone invariant.
    pub fn lifecycle_is_consistent(&self) -> bool {
        let by_status = self.status == CaseStatus::Deleted;
        self.is_deleted == by_status && self.deleted_at.is_some() == by_status
    }

    /// Mirrors a soft delete locally, e.g. in view state before a refetch.
    pub fn mark_deleted(&mut self, at: i64) {
        self.is_deleted = true;
        self.deleted_at = Some(at);
        self.status = CaseStatus::Deleted;
        self.updated_at = at;
    }
}

/// Input for creating a case.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewCase {
    /// Blank or `None` asks the service to generate one.
    pub case_number: Option<String>,
    pub client_name: String,
    pub current_summary: String,
    pub case_date: Option<i64>,
    /// Defaults to `Open`.
    pub status: Option<CaseStatus>,
    pub client: ClientInfo,
    pub workflow: CaseWorkflow,
}

impl NewCase {
    pub fn new(client_name: impl Into<String>, current_summary: impl Into<String>) -> Self {
        Self {
            client_name: client_name.into(),
            current_summary: current_summary.into(),
            ..Self::default()
        }
    }

    pub fn with_case_number(mut self, case_number: impl Into<String>) -> Self {
        self.case_number = Some(case_number.into());
        self
    }

    pub fn with_status(mut self, status: CaseStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Caller-supplied case number, `None` when blank.
    pub fn requested_case_number(&self) -> Option<&str> {
        self.case_number
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}

/// Partial update payload keyed by document field name.
///
/// Keys the service owns (`id`, `userId`, `createdAt`, ...) may be present
/// and are dropped before the write.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CasePatch {
    fields: Map<String, Value>,
}

impl CasePatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps a raw JSON payload. Returns `None` unless it is an object.
    pub fn from_json(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self { fields }),
            _ => None,
        }
    }

    /// Sets a raw field.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn case_number(self, value: impl Into<String>) -> Self {
        self.set("caseNumber", Value::String(value.into()))
    }

    pub fn client_name(self, value: impl Into<String>) -> Self {
        self.set("clientName", Value::String(value.into()))
    }

    pub fn current_summary(self, value: impl Into<String>) -> Self {
        self.set("currentSummary", Value::String(value.into()))
    }

    pub fn status(self, status: CaseStatus) -> Self {
        self.set("status", status.as_str())
    }

    pub fn case_date(self, value: Option<i64>) -> Self {
        self.set("caseDate", value.map_or(Value::Null, Value::from))
    }

    pub fn client(self, client: &ClientInfo) -> Self {
        self.set("client", client.to_json())
    }

    pub fn workflow(self, field: WorkflowField, text: impl Into<String>) -> Self {
        self.set(field.as_key(), Value::String(text.into()))
    }

    pub fn can_write(self, value: bool) -> Self {
        self.set("canWrite", value)
    }

    pub fn can_export(self, value: bool) -> Self {
        self.set("canExport", value)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{CasePatch, CaseStatus, ClientInfo, NewCase};
    use serde_json::json;

    #[test]
    fn status_parse_is_exact() {
        for status in CaseStatus::all() {
            assert_eq!(CaseStatus::parse(status.as_str()), Some(*status));
        }
        assert_eq!(CaseStatus::parse("open"), None);
        assert_eq!(CaseStatus::default(), CaseStatus::Open);
    }

    #[test]
    fn full_name_requires_both_parts() {
        let mut client = ClientInfo {
            first_name: " John ".to_string(),
            ..ClientInfo::default()
        };
        assert_eq!(client.full_name(), None);
        client.last_name = "Smith".to_string();
        assert_eq!(client.full_name().as_deref(), Some("John Smith"));
    }

    #[test]
    fn blank_case_number_is_not_requested() {
        let new_case = NewCase::new("Jane Doe", "DUI").with_case_number("   ");
        assert_eq!(new_case.requested_case_number(), None);
        let new_case = new_case.with_case_number(" CR-22 ");
        assert_eq!(new_case.requested_case_number(), Some("CR-22"));
    }

    #[test]
    fn patch_accepts_only_objects() {
        assert!(CasePatch::from_json(json!(["status"])).is_none());
        let patch = CasePatch::from_json(json!({"status": "Closed"})).unwrap();
        assert_eq!(patch.fields()["status"], "Closed");
        assert_eq!(
            CasePatch::new().status(CaseStatus::Pending).fields()["status"],
            "Pending"
        );
    }
}
