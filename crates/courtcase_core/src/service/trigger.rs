//! Change trigger fired after a case document is created.
//!
//! # Invariants
//! - Failures never propagate; they are logged and reported as `false`.
//! - No retries.

use crate::repo::case_store::{CaseStore, NewActivity};
use log::{error, info};

/// Activity action recorded for new cases.
pub const CASE_CREATED_ACTION: &str = "case_created";

/// Appends a `case_created` activity entry. Returns whether it was written.
pub fn on_case_created<S: CaseStore + ?Sized>(store: &S, case_id: &str, user_id: &str) -> bool {
    let entry = NewActivity {
        action: CASE_CREATED_ACTION.to_string(),
        case_id: case_id.to_string(),
        user_id: user_id.to_string(),
    };

    match store.append_activity(&entry) {
        Ok(entry_id) => {
            info!(
                "event=case_created_trigger module=trigger status=ok case_id={} user_id={} entry_id={}",
                case_id, user_id, entry_id
            );
            true
        }
        Err(err) => {
            error!(
                "event=case_created_trigger module=trigger status=error case_id={} user_id={} error={}",
                case_id, user_id, err
            );
            false
        }
    }
}
