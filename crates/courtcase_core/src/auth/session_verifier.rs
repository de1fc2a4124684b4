//! Session lookup over an owned connection.
//!
//! The HTTP router shares one verifier across requests, so it cannot borrow
//! a connection the way [`SqliteIdentityProvider`](super::SqliteIdentityProvider)
//! does.

use crate::auth::provider::{AuthError, AuthResult, TokenVerifier};
use crate::auth::sqlite_provider::{ensure_auth_tables, find_session_identity};
use crate::model::identity::Identity;
use rusqlite::Connection;
use std::sync::Mutex;

pub struct SqliteSessionVerifier {
    conn: Mutex<Connection>,
}

impl SqliteSessionVerifier {
    /// Fails when the users or sessions table is missing.
    pub fn try_new(conn: Connection) -> AuthResult<Self> {
        ensure_auth_tables(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl TokenVerifier for SqliteSessionVerifier {
    fn verify_token(&self, token: &str) -> AuthResult<Option<Identity>> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| AuthError::Backend("session connection lock poisoned".to_string()))?;
        find_session_identity(&conn, token)
    }
}

#[cfg(test)]
mod tests {
    use super::SqliteSessionVerifier;
    use crate::auth::provider::{AuthError, TokenVerifier};
    use crate::db::open_db_in_memory;
    use rusqlite::Connection;

    #[test]
    fn unknown_tokens_resolve_to_none() {
        let verifier = SqliteSessionVerifier::try_new(open_db_in_memory().unwrap()).unwrap();
        assert_eq!(verifier.verify_token("nope"), Ok(None));
    }

    #[test]
    fn requires_migrated_schema() {
        let err = SqliteSessionVerifier::try_new(Connection::open_in_memory().unwrap())
            .err()
            .unwrap();
        assert!(matches!(err, AuthError::Backend(_)));
    }
}
