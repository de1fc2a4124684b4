//! Document-to-record normalization.
//!
//! Every read path (list, get, create/update/restore read-back) goes through
//! [`document_to_case`], so one stored document always yields the same record.
//!
//! # Defaults
//! - Missing strings become `""`, missing timestamps become `0` or `None`.
//! - Missing permission flags and `isPrimary` become `true`.
//! - An unknown or missing status becomes `Open`.

use crate::model::case::{CaseRecord, CaseStatus, ClientInfo};
use crate::model::workflow::{CaseWorkflow, WorkflowField};
use crate::repo::document::{CaseDocument, StoreTimestamp};
use serde_json::{Map, Value};

/// Converts a stored document into the canonical case record.
pub fn document_to_case(document: &CaseDocument) -> CaseRecord {
    let data = &document.data;

    let mut workflow = CaseWorkflow::new();
    for field in WorkflowField::all() {
        workflow.set(*field, string_field(data, field.as_key()));
    }

    CaseRecord {
        id: document.id.clone(),
        case_number: string_field(data, "caseNumber"),
        client_name: string_field(data, "clientName"),
        current_summary: string_field(data, "currentSummary"),
        case_date: timestamp_field(data, "caseDate"),
        status: data
            .get("status")
            .and_then(Value::as_str)
            .and_then(CaseStatus::parse)
            .unwrap_or_default(),
        is_deleted: bool_field(data, "isDeleted", false),
        deleted_at: timestamp_field(data, "deletedAt"),
        created_at: timestamp_field(data, "createdAt").unwrap_or(0),
        updated_at: timestamp_field(data, "updatedAt").unwrap_or(0),
        user_id: string_field(data, "userId"),
        is_primary: bool_field(data, "isPrimary", true),
        can_write: bool_field(data, "canWrite", true),
        can_export: bool_field(data, "canExport", true),
        client: data
            .get("client")
            .and_then(Value::as_object)
            .map(client_from_object)
            .unwrap_or_default(),
        workflow,
    }
}

/// Reads a timestamp in store-native form; plain integers are epoch ms.
pub fn timestamp_to_millis(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64(),
        other => StoreTimestamp::from_value(other).and_then(StoreTimestamp::to_millis),
    }
}

fn client_from_object(object: &Map<String, Value>) -> ClientInfo {
    ClientInfo {
        first_name: string_field(object, "firstName"),
        last_name: string_field(object, "lastName"),
        email: string_field(object, "email"),
        phone: string_field(object, "phone"),
        address: string_field(object, "address"),
        statement: string_field(object, "statement"),
        objectives: string_field(object, "objectives"),
    }
}

fn string_field(data: &Map<String, Value>, key: &str) -> String {
    data.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn bool_field(data: &Map<String, Value>, key: &str, default: bool) -> bool {
    data.get(key).and_then(Value::as_bool).unwrap_or(default)
}

fn timestamp_field(data: &Map<String, Value>, key: &str) -> Option<i64> {
    data.get(key).and_then(timestamp_to_millis)
}

#[cfg(test)]
mod tests {
    use super::{document_to_case, timestamp_to_millis};
    use crate::model::case::CaseStatus;
    use crate::model::workflow::WorkflowField;
    use crate::repo::document::CaseDocument;
    use serde_json::{json, Value};

    fn document(value: Value) -> CaseDocument {
        CaseDocument {
            id: "doc-1".to_string(),
            data: value.as_object().cloned().unwrap(),
        }
    }

    #[test]
    fn empty_document_gets_defaults() {
        let record = document_to_case(&document(json!({})));
        assert_eq!(record.id, "doc-1");
        assert_eq!(record.case_number, "");
        assert_eq!(record.status, CaseStatus::Open);
        assert_eq!(record.created_at, 0);
        assert_eq!(record.deleted_at, None);
        assert!(record.can_write);
        assert!(record.can_export);
        assert!(record.is_primary);
        assert!(!record.is_deleted);
    }

    #[test]
    fn explicit_false_permissions_are_kept() {
        let record = document_to_case(&document(json!({
            "canWrite": false,
            "canExport": false,
        })));
        assert!(!record.can_write);
        assert!(!record.can_export);
    }

    #[test]
    fn native_timestamps_and_workflow_keys_are_read() {
        let record = document_to_case(&document(json!({
            "status": "Deleted",
            "isDeleted": true,
            "deletedAt": {"seconds": 10, "nanos": 250_000_000},
            "updatedAt": {"seconds": 11, "nanos": 0},
            "caseDate": 1_234,
            "relevantLaws": "Penal Code 484",
            "client": {"firstName": "Jane", "phone": 5},
        })));
        assert_eq!(record.status, CaseStatus::Deleted);
        assert_eq!(record.deleted_at, Some(10_250));
        assert_eq!(record.updated_at, 11_000);
        assert_eq!(record.case_date, Some(1_234));
        assert_eq!(record.workflow.get(WorkflowField::RelevantLaws), "Penal Code 484");
        assert_eq!(record.client.first_name, "Jane");
        assert_eq!(record.client.phone, "");
        assert!(record.lifecycle_is_consistent());
    }

    #[test]
    fn unreadable_timestamps_are_none() {
        assert_eq!(timestamp_to_millis(&json!("2024-01-01")), None);
        assert_eq!(timestamp_to_millis(&Value::Null), None);
        assert_eq!(
            timestamp_to_millis(&json!({"seconds": i64::MAX, "nanos": 0})),
            None
        );
    }
}
