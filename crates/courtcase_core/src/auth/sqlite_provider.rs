//! SQLite-backed identity provider.
//!
//! # Responsibility
//! - Register accounts with argon2id password hashes in `users`.
//! - Issue opaque session tokens in `sessions` and resolve them later.
//! - Track the signed-in identity for this process and notify listeners.
//!
//! # Invariants
//! - Plaintext passwords never reach storage or logs.
//! - Emails are stored trimmed and compared case-insensitively.
//! - Signing out revokes the active session token.

use crate::auth::password::{hash_password, meets_min_length, verify_password};
use crate::auth::provider::{
    AuthError, AuthEvent, AuthListener, AuthResult, AuthSubscribers, IdentityProvider, Session,
    SubscriptionId, TokenVerifier,
};
use crate::model::case_form::is_valid_email;
use crate::model::identity::Identity;
use crate::repo::clock::{Clock, SystemClock};
use log::{info, warn};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use std::rc::Rc;
use uuid::Uuid;

pub const MIN_PASSWORD_LENGTH: usize = 6;

pub struct SqliteIdentityProvider<'conn> {
    conn: &'conn Connection,
    clock: Rc<dyn Clock>,
    session: Option<Session>,
    subscribers: AuthSubscribers,
}

impl<'conn> SqliteIdentityProvider<'conn> {
    pub fn try_new(conn: &'conn Connection) -> AuthResult<Self> {
        Self::try_with_clock(conn, Rc::new(SystemClock))
    }

    pub fn try_with_clock(conn: &'conn Connection, clock: Rc<dyn Clock>) -> AuthResult<Self> {
        ensure_auth_tables(conn)?;
        Ok(Self {
            conn,
            clock,
            session: None,
            subscribers: AuthSubscribers::new(),
        })
    }

    /// Active session including its bearer token.
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    fn current_event(&self) -> AuthEvent {
        match &self.session {
            Some(session) => AuthEvent::SignedIn(session.identity.clone()),
            None => AuthEvent::SignedOut,
        }
    }

    fn start_session(&mut self, identity: Identity) -> AuthResult<Session> {
        if self.session.is_some() {
            self.revoke_active_session()?;
        }

        let token = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
        self.conn.execute(
            "INSERT INTO sessions (token, uid, created_at) VALUES (?1, ?2, ?3);",
            params![token, identity.user_id, self.clock.now_ms()],
        )?;

        let session = Session { identity, token };
        self.session = Some(session.clone());
        let event = self.current_event();
        self.subscribers.notify(&event);
        Ok(session)
    }

    fn revoke_active_session(&mut self) -> AuthResult<()> {
        if let Some(session) = self.session.take() {
            self.conn
                .execute("DELETE FROM sessions WHERE token = ?1;", [&session.token])?;
        }
        Ok(())
    }
}

impl IdentityProvider for SqliteIdentityProvider<'_> {
    fn sign_in(&mut self, email: &str, password: &str) -> AuthResult<Session> {
        let email = check_credentials(email, password)?;

        let row: Option<(String, String, String)> = self
            .conn
            .query_row(
                "SELECT uid, email, password_hash FROM users WHERE email = ?1;",
                [email],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;
        let Some((uid, stored_email, password_hash)) = row else {
            warn!("event=auth_sign_in module=auth status=error reason=unknown_email");
            return Err(AuthError::InvalidCredential);
        };

        let matches = verify_password(password, &password_hash)
            .map_err(|err| AuthError::Backend(format!("stored password hash unreadable: {err}")))?;
        if !matches {
            warn!(
                "event=auth_sign_in module=auth status=error reason=wrong_password user_id={}",
                uid
            );
            return Err(AuthError::InvalidCredential);
        }

        let session = self.start_session(Identity::new(uid).with_email(stored_email))?;
        info!(
            "event=auth_sign_in module=auth status=ok user_id={}",
            session.identity.user_id
        );
        Ok(session)
    }

    fn sign_up(&mut self, email: &str, password: &str) -> AuthResult<Session> {
        let email = check_credentials(email, password)?;
        if !meets_min_length(password, MIN_PASSWORD_LENGTH) {
            return Err(AuthError::WeakPassword {
                min_length: MIN_PASSWORD_LENGTH,
            });
        }

        let password_hash = hash_password(password)
            .map_err(|err| AuthError::Backend(format!("password hashing failed: {err}")))?;
        let uid = Uuid::new_v4().simple().to_string();
        let inserted = self.conn.execute(
            "INSERT INTO users (uid, email, password_hash, created_at) VALUES (?1, ?2, ?3, ?4);",
            params![uid, email, password_hash, self.clock.now_ms()],
        );
        match inserted {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                warn!("event=auth_sign_up module=auth status=error reason=email_in_use");
                return Err(AuthError::EmailAlreadyInUse);
            }
            Err(err) => return Err(err.into()),
        }

        let session = self.start_session(Identity::new(uid).with_email(email))?;
        info!(
            "event=auth_sign_up module=auth status=ok user_id={}",
            session.identity.user_id
        );
        Ok(session)
    }

    fn sign_out(&mut self) -> AuthResult<()> {
        let Some(user_id) = self
            .session
            .as_ref()
            .map(|session| session.identity.user_id.clone())
        else {
            return Ok(());
        };

        self.revoke_active_session()?;
        self.subscribers.notify(&AuthEvent::SignedOut);
        info!("event=auth_sign_out module=auth status=ok user_id={}", user_id);
        Ok(())
    }

    fn current(&self) -> Option<&Identity> {
        self.session.as_ref().map(|session| &session.identity)
    }

    fn subscribe(&mut self, listener: AuthListener) -> SubscriptionId {
        let current = self.current_event();
        self.subscribers.add(listener, &current)
    }

    fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.remove(id)
    }
}

impl TokenVerifier for SqliteIdentityProvider<'_> {
    fn verify_token(&self, token: &str) -> AuthResult<Option<Identity>> {
        find_session_identity(self.conn, token)
    }
}

pub(crate) fn ensure_auth_tables(conn: &Connection) -> AuthResult<()> {
    for table in ["users", "sessions"] {
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1);",
            [table],
            |row| row.get(0),
        )?;
        if !exists {
            return Err(AuthError::Backend(format!(
                "required table `{table}` is missing; run migrations first"
            )));
        }
    }
    Ok(())
}

/// Owner of a live session token, if any.
pub(crate) fn find_session_identity(
    conn: &Connection,
    token: &str,
) -> AuthResult<Option<Identity>> {
    let row: Option<(String, String)> = conn
        .query_row(
            "SELECT users.uid, users.email
             FROM sessions
             JOIN users ON users.uid = sessions.uid
             WHERE sessions.token = ?1;",
            [token],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;
    Ok(row.map(|(uid, email)| Identity::new(uid).with_email(email)))
}

/// Trims the email and checks presence plus format.
fn check_credentials<'a>(email: &'a str, password: &str) -> AuthResult<&'a str> {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return Err(AuthError::MissingCredentials);
    }
    if !is_valid_email(email) {
        return Err(AuthError::InvalidEmail);
    }
    Ok(email)
}
