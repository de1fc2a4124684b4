//! Case repository access layer.
//!
//! # Responsibility
//! - Expose list/get/create/update/soft-delete/restore/purge/export for cases.
//! - Enforce identity, ownership and permission checks before any mutation.
//! - Translate store failures into the case error taxonomy.
//!
//! # Invariants
//! - Checks run in order: identity, existence, ownership, permission.
//! - Documents owned by someone else are never returned, even partially.
//! - `id`, `userId` and `createdAt` are never rewritten after creation.
//! - Lifecycle transitions into or out of `Deleted` only happen through
//!   soft delete and restore.
//! - Update is read-then-write with no concurrency token; last write wins.
//! - Update patches only carry known fields with their stored JSON types.

use crate::logging::sanitize_message;
use crate::model::case::{CaseId, CasePatch, CaseRecord, CaseStatus, NewCase};
use crate::model::case_form::CaseValidationError;
use crate::model::identity::Identity;
use crate::model::workflow::WorkflowField;
use crate::repo::case_store::{CaseStore, DocumentQuery, StoreError};
use crate::repo::document::{DocumentFields, FieldValue, StoreTimestamp};
use crate::service::convert::document_to_case;
use crate::service::trigger::on_case_created;
use log::{error, info, warn};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Prefix of generated case numbers.
pub const CASE_NUMBER_PREFIX: &str = "CASE-";

/// Payload keys the service owns; dropped from update patches.
const PROTECTED_KEYS: &[&str] = &[
    "id",
    "userId",
    "createdAt",
    "updatedAt",
    "isDeleted",
    "deletedAt",
];

/// Members accepted inside a `client` patch object.
const CLIENT_KEYS: &[&str] = &[
    "firstName",
    "lastName",
    "email",
    "phone",
    "address",
    "statement",
    "objectives",
];

const CASE_DATE_MESSAGE: &str = "Case date must be epoch milliseconds between years 1 and 9999";

const MAX_LOGGED_ERROR_CHARS: usize = 200;
const MAX_LOGGED_KEY_CHARS: usize = 64;

pub type CaseResult<T> = Result<T, CaseError>;

/// Mutation gated by `canWrite`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteAction {
    Update,
    SoftDelete,
    Restore,
    PermanentlyDelete,
}

impl WriteAction {
    fn verb(self) -> &'static str {
        match self {
            Self::Update => "update",
            Self::SoftDelete | Self::PermanentlyDelete => "delete",
            Self::Restore => "restore",
        }
    }
}

/// Why access to an existing case was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForbiddenReason {
    /// Requester is not the case owner.
    NotOwner,
    /// Owner matches but `canWrite` is false.
    WriteDenied(WriteAction),
    /// Owner matches but `canExport` is false.
    ExportDenied,
}

/// Case operation error surfaced to the view layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaseError {
    Unauthenticated,
    NotFound(CaseId),
    Forbidden {
        case_id: CaseId,
        reason: ForbiddenReason,
    },
    Validation(CaseValidationError),
    /// Operation not allowed in the case's current lifecycle state.
    InvalidState {
        case_id: CaseId,
        message: &'static str,
    },
    /// Unclassified store failure, message passed through verbatim.
    Backend(String),
}

impl CaseError {
    pub fn is_access_error(&self) -> bool {
        matches!(self, Self::Unauthenticated | Self::Forbidden { .. })
    }
}

impl Display for CaseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthenticated => write!(f, "User not authenticated"),
            Self::NotFound(id) => write!(f, "Case not found: {id}"),
            Self::Forbidden { reason, .. } => match reason {
                ForbiddenReason::NotOwner => write!(f, "You do not have access to this case"),
                ForbiddenReason::WriteDenied(action) => write!(
                    f,
                    "You do not have permission to {} this case",
                    action.verb()
                ),
                ForbiddenReason::ExportDenied => {
                    write!(f, "You do not have permission to export this case")
                }
            },
            Self::Validation(err) => write!(f, "{err}"),
            Self::InvalidState { message, .. } => write!(f, "{message}"),
            Self::Backend(message) => write!(f, "{message}"),
        }
    }
}

impl Error for CaseError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<CaseValidationError> for CaseError {
    fn from(value: CaseValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StoreError> for CaseError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound(id) => Self::NotFound(id),
            other => Self::Backend(other.to_string()),
        }
    }
}

/// Access layer over an injected case store.
pub struct CaseService<S: CaseStore> {
    store: S,
}

impl<S: CaseStore> CaseService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Lists the requester's non-deleted cases, most recently updated first.
    pub fn list(&self, identity: Option<&Identity>) -> CaseResult<Vec<CaseRecord>> {
        let user = require_identity(identity)?;
        let query = DocumentQuery {
            owner_id: user.user_id.clone(),
            include_deleted: false,
        };
        let documents = self
            .store
            .query_documents(&query)
            .map_err(|err| backend_failure("case_list", err))?;

        info!(
            "event=case_list module=service status=ok user_id={} count={}",
            user.user_id,
            documents.len()
        );
        Ok(documents.iter().map(document_to_case).collect())
    }

    /// Gets one owned case, including soft-deleted ones.
    pub fn get_by_id(&self, identity: Option<&Identity>, id: &str) -> CaseResult<CaseRecord> {
        let user = require_identity(identity)?;
        self.load_owned(user, id)
    }

    /// Creates a case owned by the requester and returns the stored shape.
    pub fn create(&self, identity: Option<&Identity>, new_case: NewCase) -> CaseResult<CaseRecord> {
        let user = require_identity(identity)?;
        if new_case
            .case_date
            .is_some_and(|millis| !StoreTimestamp::millis_in_range(millis))
        {
            return Err(CaseValidationError::single("caseDate", CASE_DATE_MESSAGE).into());
        }
        let status = new_case.status.unwrap_or_default();
        if status == CaseStatus::Deleted {
            return Err(CaseValidationError::single(
                "status",
                "New cases cannot start as Deleted",
            )
            .into());
        }

        let case_number = match new_case.requested_case_number() {
            Some(value) => value.to_string(),
            None => generate_case_number(self.store.now_ms()),
        };

        let mut fields = DocumentFields::new();
        put(&mut fields, "caseNumber", case_number);
        put(&mut fields, "clientName", new_case.client_name);
        put(&mut fields, "currentSummary", new_case.current_summary);
        fields.insert(
            "caseDate".to_string(),
            new_case
                .case_date
                .map_or(FieldValue::Value(Value::Null), FieldValue::Timestamp),
        );
        put(&mut fields, "status", status.as_str());
        put(&mut fields, "userId", user.user_id.as_str());
        put(&mut fields, "isDeleted", false);
        put(&mut fields, "deletedAt", Value::Null);
        put(&mut fields, "isPrimary", true);
        put(&mut fields, "canWrite", true);
        put(&mut fields, "canExport", true);
        put(&mut fields, "client", new_case.client.to_json());
        for field in WorkflowField::all() {
            put(&mut fields, field.as_key(), new_case.workflow.get(*field));
        }
        fields.insert("createdAt".to_string(), FieldValue::ServerTimestamp);
        fields.insert("updatedAt".to_string(), FieldValue::ServerTimestamp);

        let id = self
            .store
            .add_document(fields)
            .map_err(|err| backend_failure("case_create", err))?;
        on_case_created(&self.store, &id, &user.user_id);

        info!(
            "event=case_create module=service status=ok case_id={} user_id={}",
            id, user.user_id
        );
        self.read_back(&id)
    }

    /// Applies a partial update after ownership and write checks.
    pub fn update(
        &self,
        identity: Option<&Identity>,
        id: &str,
        patch: CasePatch,
    ) -> CaseResult<CaseRecord> {
        let user = require_identity(identity)?;
        let current = self.load_writable(user, id, WriteAction::Update)?;
        let fields = patch_to_fields(&current, patch)?;

        self.store
            .update_document(id, fields)
            .map_err(|err| backend_failure("case_update", err))?;
        info!(
            "event=case_update module=service status=ok case_id={} user_id={}",
            id, user.user_id
        );
        self.read_back(id)
    }

    /// Tombstones a case. It stays readable by id but leaves the list.
    pub fn soft_delete(&self, identity: Option<&Identity>, id: &str) -> CaseResult<CaseRecord> {
        let user = require_identity(identity)?;
        self.load_writable(user, id, WriteAction::SoftDelete)?;

        let mut fields = DocumentFields::new();
        put(&mut fields, "isDeleted", true);
        fields.insert("deletedAt".to_string(), FieldValue::ServerTimestamp);
        put(&mut fields, "status", CaseStatus::Deleted.as_str());
        fields.insert("updatedAt".to_string(), FieldValue::ServerTimestamp);

        self.store
            .update_document(id, fields)
            .map_err(|err| backend_failure("case_soft_delete", err))?;
        info!(
            "event=case_soft_delete module=service status=ok case_id={} user_id={}",
            id, user.user_id
        );
        self.read_back(id)
    }

    /// Reverses a soft delete. A case that is not deleted is returned as is.
    pub fn restore(&self, identity: Option<&Identity>, id: &str) -> CaseResult<CaseRecord> {
        let user = require_identity(identity)?;
        let current = self.load_writable(user, id, WriteAction::Restore)?;
        if !current.is_deleted {
            info!(
                "event=case_restore module=service status=noop case_id={} user_id={}",
                id, user.user_id
            );
            return Ok(current);
        }

        let mut fields = DocumentFields::new();
        put(&mut fields, "isDeleted", false);
        put(&mut fields, "deletedAt", Value::Null);
        put(&mut fields, "status", CaseStatus::Open.as_str());
        fields.insert("updatedAt".to_string(), FieldValue::ServerTimestamp);

        self.store
            .update_document(id, fields)
            .map_err(|err| backend_failure("case_restore", err))?;
        info!(
            "event=case_restore module=service status=ok case_id={} user_id={}",
            id, user.user_id
        );
        self.read_back(id)
    }

    /// Erases a soft-deleted case irrevocably and returns its id.
    pub fn permanently_delete(&self, identity: Option<&Identity>, id: &str) -> CaseResult<CaseId> {
        let user = require_identity(identity)?;
        let current = self.load_writable(user, id, WriteAction::PermanentlyDelete)?;
        if !current.is_deleted {
            return Err(CaseError::InvalidState {
                case_id: current.id,
                message: "Case must be deleted before it can be permanently deleted",
            });
        }

        self.store
            .delete_document(id)
            .map_err(|err| backend_failure("case_purge", err))?;
        info!(
            "event=case_purge module=service status=ok case_id={} user_id={}",
            id, user.user_id
        );
        Ok(current.id)
    }

    /// Serializes an owned case as pretty JSON when `canExport` allows it.
    pub fn export_case(&self, identity: Option<&Identity>, id: &str) -> CaseResult<String> {
        let user = require_identity(identity)?;
        let record = self.load_owned(user, id)?;
        if !record.can_export {
            return Err(forbidden(user, record.id, ForbiddenReason::ExportDenied));
        }
        serde_json::to_string_pretty(&record).map_err(|err| CaseError::Backend(err.to_string()))
    }

    fn load_owned(&self, user: &Identity, id: &str) -> CaseResult<CaseRecord> {
        let document = self
            .store
            .get_document(id)
            .map_err(|err| backend_failure("case_get", err))?
            .ok_or_else(|| CaseError::NotFound(id.to_string()))?;

        let record = document_to_case(&document);
        if !record.is_owned_by(&user.user_id) {
            return Err(forbidden(user, record.id, ForbiddenReason::NotOwner));
        }
        Ok(record)
    }

    fn load_writable(
        &self,
        user: &Identity,
        id: &str,
        action: WriteAction,
    ) -> CaseResult<CaseRecord> {
        let record = self.load_owned(user, id)?;
        if !record.can_write {
            return Err(forbidden(
                user,
                record.id,
                ForbiddenReason::WriteDenied(action),
            ));
        }
        Ok(record)
    }

    fn read_back(&self, id: &str) -> CaseResult<CaseRecord> {
        let document = self
            .store
            .get_document(id)
            .map_err(|err| backend_failure("case_read_back", err))?
            .ok_or_else(|| CaseError::NotFound(id.to_string()))?;
        Ok(document_to_case(&document))
    }
}

/// Builds a case number from server time plus a random tie-breaker.
///
/// Format: `CASE-` followed by 8 digits. Uniqueness is not checked.
pub fn generate_case_number(now_ms: i64) -> String {
    let time_part = now_ms.rem_euclid(1_000_000);
    let tie_breaker = Uuid::new_v4().as_u128() % 100;
    format!("{CASE_NUMBER_PREFIX}{time_part:06}{tie_breaker:02}")
}

fn require_identity(identity: Option<&Identity>) -> CaseResult<&Identity> {
    match identity {
        Some(identity) if !identity.user_id.trim().is_empty() => Ok(identity),
        _ => {
            warn!("event=case_access module=service status=error error_code=unauthenticated");
            Err(CaseError::Unauthenticated)
        }
    }
}

fn forbidden(user: &Identity, case_id: CaseId, reason: ForbiddenReason) -> CaseError {
    warn!(
        "event=case_access module=service status=error error_code=forbidden case_id={} user_id={} reason={:?}",
        case_id, user.user_id, reason
    );
    CaseError::Forbidden { case_id, reason }
}

fn backend_failure(event: &str, err: StoreError) -> CaseError {
    let converted = CaseError::from(err);
    if let CaseError::Backend(message) = &converted {
        error!(
            "event={} module=service status=error error_code=backend error={}",
            event,
            sanitize_message(message, MAX_LOGGED_ERROR_CHARS)
        );
    }
    converted
}

fn put(fields: &mut DocumentFields, key: &str, value: impl Into<Value>) {
    fields.insert(key.to_string(), FieldValue::Value(value.into()));
}

/// Expected JSON shape of an updatable document field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PatchKind {
    Text,
    Flag,
    Status,
    CaseDate,
    Client,
}

/// Stored name and shape of an updatable key; `None` for unknown keys.
fn classify_patch_key(key: &str) -> Option<(&'static str, PatchKind)> {
    if let Some(field) = WorkflowField::parse(key) {
        return Some((field.as_key(), PatchKind::Text));
    }
    let classified = match key {
        "caseNumber" => ("caseNumber", PatchKind::Text),
        "clientName" => ("clientName", PatchKind::Text),
        "currentSummary" => ("currentSummary", PatchKind::Text),
        "status" => ("status", PatchKind::Status),
        "caseDate" => ("caseDate", PatchKind::CaseDate),
        "isPrimary" => ("isPrimary", PatchKind::Flag),
        "canWrite" => ("canWrite", PatchKind::Flag),
        "canExport" => ("canExport", PatchKind::Flag),
        "client" => ("client", PatchKind::Client),
        _ => return None,
    };
    Some(classified)
}

fn patch_to_fields(current: &CaseRecord, patch: CasePatch) -> CaseResult<DocumentFields> {
    let mut fields = DocumentFields::new();

    for (key, value) in patch.into_fields() {
        if PROTECTED_KEYS.contains(&key.as_str()) {
            continue;
        }
        let Some((name, kind)) = classify_patch_key(&key) else {
            warn!(
                "event=case_update module=service status=error error_code=unknown_field field={}",
                sanitize_message(&key, MAX_LOGGED_KEY_CHARS)
            );
            return Err(CaseValidationError::single("patch", "Unknown case field").into());
        };

        let write = match kind {
            PatchKind::Text if value.is_string() => FieldValue::Value(value),
            PatchKind::Text => {
                return Err(CaseValidationError::single(name, "Expected text").into());
            }
            PatchKind::Flag if value.is_boolean() => FieldValue::Value(value),
            PatchKind::Flag => {
                return Err(CaseValidationError::single(name, "Expected true or false").into());
            }
            PatchKind::Status => {
                let status = value
                    .as_str()
                    .and_then(CaseStatus::parse)
                    .ok_or_else(|| CaseValidationError::single(name, "Unknown case status"))?;
                if (status == CaseStatus::Deleted) != current.is_deleted {
                    return Err(CaseValidationError::single(
                        name,
                        "Use delete or restore to change the Deleted status",
                    )
                    .into());
                }
                FieldValue::Value(Value::from(status.as_str()))
            }
            PatchKind::CaseDate => match &value {
                Value::Null => FieldValue::Value(Value::Null),
                _ => match value.as_i64() {
                    Some(millis) if StoreTimestamp::millis_in_range(millis) => {
                        FieldValue::Timestamp(millis)
                    }
                    _ => return Err(CaseValidationError::single(name, CASE_DATE_MESSAGE).into()),
                },
            },
            PatchKind::Client if is_client_object(&value) => FieldValue::Value(value),
            PatchKind::Client => {
                return Err(CaseValidationError::single(
                    name,
                    "Client details must be an object of known text fields",
                )
                .into());
            }
        };
        fields.insert(name.to_string(), write);
    }

    fields.insert("updatedAt".to_string(), FieldValue::ServerTimestamp);
    Ok(fields)
}

fn is_client_object(value: &Value) -> bool {
    value.as_object().is_some_and(|object| {
        object
            .iter()
            .all(|(key, member)| CLIENT_KEYS.contains(&key.as_str()) && member.is_string())
    })
}

#[cfg(test)]
mod tests {
    use super::{generate_case_number, patch_to_fields, CaseError, ForbiddenReason, WriteAction};
    use crate::model::case::{CasePatch, CaseRecord, CaseStatus};
    use crate::repo::document::FieldValue;
    use crate::service::convert::document_to_case;
    use crate::repo::document::CaseDocument;
    use regex::Regex;
    use serde_json::{json, Map};

    fn open_record() -> CaseRecord {
        document_to_case(&CaseDocument {
            id: "c1".to_string(),
            data: Map::new(),
        })
    }

    #[test]
    fn generated_number_matches_format() {
        let pattern = Regex::new(r"^CASE-\d{8}$").unwrap();
        for now in [0_i64, 7, 1_700_000_123_456] {
            let number = generate_case_number(now);
            assert!(pattern.is_match(&number), "unexpected case number {number}");
        }
        assert!(generate_case_number(1_700_000_123_456).starts_with("CASE-123456"));
    }

    #[test]
    fn protected_keys_are_dropped() {
        let patch = CasePatch::from_json(json!({
            "id": "other",
            "userId": "intruder",
            "createdAt": 1,
            "deletedAt": 2,
            "clientName": "New Name",
        }))
        .unwrap();
        let fields = patch_to_fields(&open_record(), patch).unwrap();
        assert!(!fields.contains_key("id"));
        assert!(!fields.contains_key("userId"));
        assert!(!fields.contains_key("createdAt"));
        assert!(!fields.contains_key("deletedAt"));
        assert_eq!(fields["updatedAt"], FieldValue::ServerTimestamp);
        assert_eq!(fields["clientName"], FieldValue::Value(json!("New Name")));
    }

    #[test]
    fn status_cannot_enter_deleted_through_update() {
        let err = patch_to_fields(&open_record(), CasePatch::new().status(CaseStatus::Deleted))
            .unwrap_err();
        assert!(matches!(err, CaseError::Validation(_)));

        let err = patch_to_fields(&open_record(), CasePatch::new().set("status", "closed"))
            .unwrap_err();
        assert!(matches!(err, CaseError::Validation(_)));
    }

    #[test]
    fn case_date_integers_become_timestamps() {
        let fields =
            patch_to_fields(&open_record(), CasePatch::new().case_date(Some(9_000))).unwrap();
        assert_eq!(fields["caseDate"], FieldValue::Timestamp(9_000));

        let fields = patch_to_fields(&open_record(), CasePatch::new().case_date(None)).unwrap();
        assert_eq!(fields["caseDate"], FieldValue::Value(json!(null)));
    }

    #[test]
    fn case_date_must_be_in_range_integer() {
        for bad in [
            json!({"seconds": i64::MAX, "nanos": 0}),
            json!(i64::MIN),
            json!(u64::MAX),
            json!(1.5),
            json!("2024-01-01"),
        ] {
            let err = patch_to_fields(&open_record(), CasePatch::new().set("caseDate", bad.clone()))
                .unwrap_err();
            match err {
                CaseError::Validation(err) => assert!(err.message_for("caseDate").is_some()),
                other => panic!("unexpected error for {bad}: {other:?}"),
            }
        }
    }

    #[test]
    fn mistyped_and_unknown_fields_are_rejected() {
        for (patch, field) in [
            (CasePatch::new().set("clientName", 42), "clientName"),
            (CasePatch::new().set("canWrite", "no"), "canWrite"),
            (CasePatch::new().set("relevantLaws", json!(["a"])), "relevantLaws"),
            (CasePatch::new().set("client", "John"), "client"),
            (CasePatch::new().set("client", json!({"firstName": 1})), "client"),
            (CasePatch::new().set("client", json!({"ssn": "x"})), "client"),
            (CasePatch::new().set("favouriteColour", "blue"), "patch"),
        ] {
            match patch_to_fields(&open_record(), patch) {
                Err(CaseError::Validation(err)) => {
                    assert!(err.message_for(field).is_some(), "field={field} err={err}");
                }
                other => panic!("expected validation error for {field}, got {other:?}"),
            }
        }
    }

    #[test]
    fn typed_fields_pass_through() {
        let patch = CasePatch::new()
            .can_export(false)
            .set("isPrimary", false)
            .set("client", json!({"firstName": "Ann", "phone": "555-0100"}))
            .set("relevantLaws", "Penal Code 187");
        let fields = patch_to_fields(&open_record(), patch).unwrap();
        assert_eq!(fields["canExport"], FieldValue::Value(json!(false)));
        assert_eq!(fields["isPrimary"], FieldValue::Value(json!(false)));
        assert_eq!(fields["relevantLaws"], FieldValue::Value(json!("Penal Code 187")));
        assert_eq!(
            fields["client"],
            FieldValue::Value(json!({"firstName": "Ann", "phone": "555-0100"}))
        );
    }

    #[test]
    fn forbidden_messages_distinguish_reasons() {
        let not_owner = CaseError::Forbidden {
            case_id: "c1".to_string(),
            reason: ForbiddenReason::NotOwner,
        };
        let read_only = CaseError::Forbidden {
            case_id: "c1".to_string(),
            reason: ForbiddenReason::WriteDenied(WriteAction::Restore),
        };
        assert_eq!(not_owner.to_string(), "You do not have access to this case");
        assert_eq!(
            read_only.to_string(),
            "You do not have permission to restore this case"
        );
        assert!(read_only.is_access_error());
    }
}
