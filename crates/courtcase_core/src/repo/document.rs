//! Native document shapes of the case store.
//!
//! # Responsibility
//! - Define the store-native timestamp encoding.
//! - Define write values, including the server-timestamp sentinel.
//!
//! # Invariants
//! - Stored timestamps are `{"seconds": i64, "nanos": u32}` objects.
//! - `nanos` is always below one second.
//! - Written timestamps fall between `0001-01-01` and `9999-12-31` UTC.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

const NANOS_PER_MILLI: u32 = 1_000_000;
const NANOS_PER_SECOND: u64 = 1_000_000_000;

/// Store-native timestamp value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StoreTimestamp {
    pub seconds: i64,
    pub nanos: u32,
}

impl StoreTimestamp {
    /// `0001-01-01T00:00:00Z` in epoch milliseconds.
    pub const MIN_MILLIS: i64 = -62_135_596_800_000;
    /// `9999-12-31T23:59:59.999Z` in epoch milliseconds.
    pub const MAX_MILLIS: i64 = 253_402_300_799_999;

    /// Returns whether `millis` can be written as a store timestamp.
    pub fn millis_in_range(millis: i64) -> bool {
        (Self::MIN_MILLIS..=Self::MAX_MILLIS).contains(&millis)
    }

    pub fn from_millis(millis: i64) -> Self {
        Self {
            seconds: millis.div_euclid(1000),
            nanos: millis.rem_euclid(1000) as u32 * NANOS_PER_MILLI,
        }
    }

    /// Truncates to whole milliseconds. `None` when the value does not fit.
    pub fn to_millis(self) -> Option<i64> {
        self.seconds
            .checked_mul(1000)?
            .checked_add(i64::from(self.nanos / NANOS_PER_MILLI))
    }

    pub fn to_value(self) -> Value {
        json!({ "seconds": self.seconds, "nanos": self.nanos })
    }

    /// Reads a stored timestamp object. Anything else is `None`.
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let seconds = object.get("seconds")?.as_i64()?;
        let nanos = object.get("nanos").map_or(Some(0), Value::as_u64)?;
        if nanos >= NANOS_PER_SECOND {
            return None;
        }
        Some(Self {
            seconds,
            nanos: nanos as u32,
        })
    }
}

/// One field write.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Stored verbatim.
    Value(Value),
    /// Epoch milliseconds, stored as a [`StoreTimestamp`].
    Timestamp(i64),
    /// Resolved to the store clock at write time.
    ServerTimestamp,
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

/// Field writes keyed by document field name.
pub type DocumentFields = BTreeMap<String, FieldValue>;

/// A stored case document.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseDocument {
    pub id: String,
    pub data: Map<String, Value>,
}

/// Resolves write values into stored JSON, stamping sentinels with `now_ms`.
pub fn resolve_fields(fields: DocumentFields, now_ms: i64) -> Map<String, Value> {
    fields
        .into_iter()
        .map(|(key, value)| {
            let resolved = match value {
                FieldValue::Value(value) => value,
                FieldValue::Timestamp(millis) => StoreTimestamp::from_millis(millis).to_value(),
                FieldValue::ServerTimestamp => StoreTimestamp::from_millis(now_ms).to_value(),
            };
            (key, resolved)
        })
        .collect()
}
