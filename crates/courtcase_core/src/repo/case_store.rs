//! Case document store contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide add/get/query/partial-update/delete over case documents.
//! - Assign document ids and server write timestamps.
//! - Keep the separate activity-log collection.
//!
//! # Invariants
//! - `owner_id`, `is_deleted` and `updated_at` columns always mirror the
//!   JSON body after every write.
//! - Queries order by `updated_at DESC, id ASC`.
//! - The store performs no ownership or permission checks.

use crate::db::DbError;
use crate::repo::clock::{Clock, SystemClock};
use crate::repo::document::{resolve_fields, CaseDocument, DocumentFields, StoreTimestamp};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::rc::Rc;
use uuid::Uuid;

pub type StoreResult<T> = Result<T, StoreError>;

/// Store transport and data errors.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    Serialization(serde_json::Error),
    NotFound(String),
    InvalidData(String),
    MissingRequiredTable(&'static str),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Serialization(err) => write!(f, "document serialization failed: {err}"),
            Self::NotFound(id) => write!(f, "document not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid stored document: {message}"),
            Self::MissingRequiredTable(table) => {
                write!(f, "required table `{table}` is missing; run migrations first")
            }
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Serialization(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}

/// Equality query over the owner and tombstone fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentQuery {
    pub owner_id: String,
    pub include_deleted: bool,
}

/// Activity-log write request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewActivity {
    pub action: String,
    pub case_id: String,
    pub user_id: String,
}

/// Stored activity-log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    pub id: i64,
    pub action: String,
    pub case_id: String,
    pub user_id: String,
    /// Server time in epoch milliseconds.
    pub timestamp: i64,
}

/// Document store interface used by the case service.
pub trait CaseStore {
    /// Current server time in epoch milliseconds.
    fn now_ms(&self) -> i64;
    /// Inserts a document under a generated id and returns the id.
    fn add_document(&self, fields: DocumentFields) -> StoreResult<String>;
    fn get_document(&self, id: &str) -> StoreResult<Option<CaseDocument>>;
    fn query_documents(&self, query: &DocumentQuery) -> StoreResult<Vec<CaseDocument>>;
    /// Shallow-merges `fields` into an existing document.
    fn update_document(&self, id: &str, fields: DocumentFields) -> StoreResult<()>;
    /// Removes a document irrevocably.
    fn delete_document(&self, id: &str) -> StoreResult<()>;
    /// Appends one activity entry stamped with server time.
    fn append_activity(&self, entry: &NewActivity) -> StoreResult<i64>;
    /// Activity entries for one case, oldest first.
    fn list_activity(&self, case_id: &str) -> StoreResult<Vec<ActivityEntry>>;
}

/// SQLite-backed case document store.
pub struct SqliteCaseStore<'conn> {
    conn: &'conn Connection,
    clock: Rc<dyn Clock>,
}

impl<'conn> SqliteCaseStore<'conn> {
    /// Constructs a store on a migrated connection using the wall clock.
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        Self::try_with_clock(conn, Rc::new(SystemClock))
    }

    /// Constructs a store with an explicit server clock.
    pub fn try_with_clock(conn: &'conn Connection, clock: Rc<dyn Clock>) -> StoreResult<Self> {
        for table in ["case_documents", "activity_logs"] {
            if !table_exists(conn, table)? {
                return Err(StoreError::MissingRequiredTable(table));
            }
        }
        Ok(Self { conn, clock })
    }

    fn write_body(&self, id: &str, data: &Map<String, Value>, insert: bool) -> StoreResult<usize> {
        let mirror = IndexMirror::from_data(data);
        let body = serde_json::to_string(data)?;
        let sql = if insert {
            "INSERT INTO case_documents (id, owner_id, is_deleted, updated_at, body)
             VALUES (?1, ?2, ?3, ?4, ?5);"
        } else {
            "UPDATE case_documents
             SET owner_id = ?2, is_deleted = ?3, updated_at = ?4, body = ?5
             WHERE id = ?1;"
        };
        let changed = self.conn.execute(
            sql,
            params![
                id,
                mirror.owner_id,
                bool_to_int(mirror.is_deleted),
                mirror.updated_at,
                body
            ],
        )?;
        Ok(changed)
    }
}

impl CaseStore for SqliteCaseStore<'_> {
    fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }

    fn add_document(&self, fields: DocumentFields) -> StoreResult<String> {
        let id = Uuid::new_v4().simple().to_string();
        let data = resolve_fields(fields, self.clock.now_ms());
        self.write_body(&id, &data, true)?;
        Ok(id)
    }

    fn get_document(&self, id: &str) -> StoreResult<Option<CaseDocument>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, body FROM case_documents WHERE id = ?1;",
                [id],
                read_id_and_body,
            )
            .optional()?;

        row.map(|(id, body)| parse_document(id, &body)).transpose()
    }

    fn query_documents(&self, query: &DocumentQuery) -> StoreResult<Vec<CaseDocument>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, body
             FROM case_documents
             WHERE owner_id = ?1
               AND (?2 = 1 OR is_deleted = 0)
             ORDER BY updated_at DESC, id ASC;",
        )?;
        let rows = stmt.query_map(
            params![query.owner_id, bool_to_int(query.include_deleted)],
            read_id_and_body,
        )?;

        let mut documents = Vec::new();
        for row in rows {
            let (id, body) = row?;
            documents.push(parse_document(id, &body)?);
        }
        Ok(documents)
    }

    fn update_document(&self, id: &str, fields: DocumentFields) -> StoreResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        let body: Option<String> = tx
            .query_row(
                "SELECT body FROM case_documents WHERE id = ?1;",
                [id],
                |row| row.get(0),
            )
            .optional()?;
        let Some(body) = body else {
            return Err(StoreError::NotFound(id.to_string()));
        };

        let mut document = parse_document(id.to_string(), &body)?;
        document
            .data
            .extend(resolve_fields(fields, self.clock.now_ms()));
        self.write_body(id, &document.data, false)?;
        tx.commit()?;
        Ok(())
    }

    fn delete_document(&self, id: &str) -> StoreResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM case_documents WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    fn append_activity(&self, entry: &NewActivity) -> StoreResult<i64> {
        self.conn.execute(
            "INSERT INTO activity_logs (action, case_id, user_id, timestamp)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                entry.action,
                entry.case_id,
                entry.user_id,
                self.clock.now_ms()
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn list_activity(&self, case_id: &str) -> StoreResult<Vec<ActivityEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, action, case_id, user_id, timestamp
             FROM activity_logs
             WHERE case_id = ?1
             ORDER BY id ASC;",
        )?;
        let rows = stmt.query_map([case_id], |row| {
            Ok(ActivityEntry {
                id: row.get("id")?,
                action: row.get("action")?,
                case_id: row.get("case_id")?,
                user_id: row.get("user_id")?,
                timestamp: row.get("timestamp")?,
            })
        })?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }
}

/// Queryable columns derived from a document body.
struct IndexMirror<'a> {
    owner_id: &'a str,
    is_deleted: bool,
    updated_at: i64,
}

impl<'a> IndexMirror<'a> {
    fn from_data(data: &'a Map<String, Value>) -> Self {
        Self {
            owner_id: data.get("userId").and_then(Value::as_str).unwrap_or(""),
            is_deleted: data
                .get("isDeleted")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            updated_at: data
                .get("updatedAt")
                .and_then(StoreTimestamp::from_value)
                .and_then(StoreTimestamp::to_millis)
                .unwrap_or(0),
        }
    }
}

fn read_id_and_body(row: &Row<'_>) -> rusqlite::Result<(String, String)> {
    Ok((row.get(0)?, row.get(1)?))
}

fn parse_document(id: String, body: &str) -> StoreResult<CaseDocument> {
    match serde_json::from_str::<Value>(body)? {
        Value::Object(data) => Ok(CaseDocument { id, data }),
        other => Err(StoreError::InvalidData(format!(
            "document `{id}` body must be an object, got `{other}`"
        ))),
    }
}

fn table_exists(conn: &Connection, table: &str) -> StoreResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
