use courtcase_core::repo::document::{CaseDocument, StoreTimestamp};
use courtcase_core::service::convert::document_to_case;
use courtcase_core::{CasePhase, CaseStatus, WorkflowField};
use serde_json::{json, Map, Value};

fn document(data: Value) -> CaseDocument {
    let data: Map<String, Value> = match data {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    };
    CaseDocument {
        id: "case-1".to_string(),
        data,
    }
}

#[test]
fn record_serialization_uses_expected_wire_fields() {
    let record = document_to_case(&document(json!({
        "caseNumber": "CASE-12345678",
        "clientName": "John Smith",
        "currentSummary": "Trespass",
        "caseDate": StoreTimestamp::from_millis(1_700_000_000_500).to_value(),
        "status": "Pending",
        "isDeleted": false,
        "deletedAt": null,
        "createdAt": StoreTimestamp::from_millis(1_700_000_000_000).to_value(),
        "updatedAt": 1_700_000_001_000_i64,
        "userId": "alice",
        "client": { "firstName": "John", "email": "john@smith.test" },
        "relevantLaws": "Penal code 602",
    })));

    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(json["id"], "case-1");
    assert_eq!(json["caseNumber"], "CASE-12345678");
    assert_eq!(json["caseDate"], 1_700_000_000_500_i64);
    assert_eq!(json["status"], "Pending");
    assert_eq!(json["isDeleted"], false);
    assert_eq!(json["deletedAt"], Value::Null);
    assert_eq!(json["createdAt"], 1_700_000_000_000_i64);
    assert_eq!(json["updatedAt"], 1_700_000_001_000_i64);
    assert_eq!(json["userId"], "alice");
    assert_eq!(json["isPrimary"], true);
    assert_eq!(json["canWrite"], true);
    assert_eq!(json["canExport"], true);
    assert_eq!(json["client"]["firstName"], "John");
    assert_eq!(json["client"]["lastName"], "");
    assert_eq!(json["workflow"]["relevantLaws"], "Penal code 602");
    assert!(json["workflow"].get("closingArgument").is_none());
}

#[test]
fn sparse_documents_normalize_to_defaults() {
    let record = document_to_case(&document(json!({
        "status": "Archived",
        "canExport": false,
        "createdAt": "yesterday",
    })));

    assert_eq!(record.case_number, "");
    assert_eq!(record.client_name, "");
    assert_eq!(record.status, CaseStatus::Open);
    assert_eq!(record.created_at, 0);
    assert_eq!(record.updated_at, 0);
    assert_eq!(record.case_date, None);
    assert!(record.can_write);
    assert!(!record.can_export);
    assert!(record.lifecycle_is_consistent());

    let again = document_to_case(&document(json!({
        "status": "Archived",
        "canExport": false,
        "createdAt": "yesterday",
    })));
    assert_eq!(again, record);
}

#[test]
fn phases_cover_every_workflow_field_once() {
    let mut seen = Vec::new();
    for phase in CasePhase::all() {
        for field in phase.fields() {
            assert_eq!(field.phase(), *phase);
            seen.push(*field);
        }
    }
    seen.sort();
    seen.dedup();
    assert_eq!(seen.len(), WorkflowField::all().len());

    assert_eq!(CasePhase::all().len(), 9);
    assert_eq!(
        CasePhase::all()
            .iter()
            .filter(|phase| phase.is_placeholder())
            .map(|phase| phase.label())
            .collect::<Vec<_>>(),
        vec!["Documents & Evidence"]
    );
}

#[test]
fn workflow_keys_match_serde_names() {
    for field in WorkflowField::all() {
        let json = serde_json::to_value(field).unwrap();
        assert_eq!(json, field.as_key());
        assert_eq!(WorkflowField::parse(field.as_key()), Some(*field));
    }
}
