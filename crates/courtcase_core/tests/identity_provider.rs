use courtcase_core::db::open_db_in_memory;
use courtcase_core::{
    AuthError, AuthEvent, IdentityProvider, SqliteIdentityProvider, TokenVerifier,
};
use rusqlite::Connection;
use std::cell::RefCell;
use std::rc::Rc;

#[test]
fn sign_up_creates_account_and_signs_in() {
    let conn = open_db_in_memory().unwrap();
    let mut provider = SqliteIdentityProvider::try_new(&conn).unwrap();

    let session = provider.sign_up(" Ann@Example.com ", "secret1").unwrap();
    assert_eq!(session.identity.email.as_deref(), Some("Ann@Example.com"));
    assert!(!session.identity.user_id.is_empty());
    assert_eq!(provider.current(), Some(&session.identity));

    let stored_hash: String = conn
        .query_row("SELECT password_hash FROM users;", [], |row| row.get(0))
        .unwrap();
    assert!(stored_hash.starts_with("$argon2id$"));
    assert!(!stored_hash.contains("secret1"));
}

#[test]
fn sign_up_rejects_bad_input_and_duplicates() {
    let conn = open_db_in_memory().unwrap();
    let mut provider = SqliteIdentityProvider::try_new(&conn).unwrap();

    assert_eq!(
        provider.sign_up("", "secret1").unwrap_err(),
        AuthError::MissingCredentials
    );
    assert_eq!(
        provider.sign_up("not-an-email", "secret1").unwrap_err(),
        AuthError::InvalidEmail
    );
    assert_eq!(
        provider.sign_up("ann@example.com", "12345").unwrap_err(),
        AuthError::WeakPassword { min_length: 6 }
    );

    provider.sign_up("ann@example.com", "secret1").unwrap();
    assert_eq!(
        provider.sign_up("ANN@example.com", "secret2").unwrap_err(),
        AuthError::EmailAlreadyInUse
    );
}

#[test]
fn sign_in_checks_password_and_email_case_insensitively() {
    let conn = open_db_in_memory().unwrap();
    let mut provider = SqliteIdentityProvider::try_new(&conn).unwrap();
    let registered = provider.sign_up("ann@example.com", "secret1").unwrap();
    provider.sign_out().unwrap();
    assert!(provider.current().is_none());

    assert_eq!(
        provider.sign_in("ann@example.com", "wrong-pass").unwrap_err(),
        AuthError::InvalidCredential
    );
    assert_eq!(
        provider.sign_in("nobody@example.com", "secret1").unwrap_err(),
        AuthError::InvalidCredential
    );

    let session = provider.sign_in("ANN@EXAMPLE.COM", "secret1").unwrap();
    assert_eq!(session.identity.user_id, registered.identity.user_id);
    assert_ne!(session.token, registered.token);
}

#[test]
fn tokens_resolve_until_sign_out() {
    let conn = open_db_in_memory().unwrap();
    let mut provider = SqliteIdentityProvider::try_new(&conn).unwrap();
    let session = provider.sign_up("ann@example.com", "secret1").unwrap();

    let verified = provider.verify_token(&session.token).unwrap();
    assert_eq!(verified, Some(session.identity.clone()));
    assert_eq!(provider.verify_token("unknown").unwrap(), None);

    provider.sign_out().unwrap();
    assert_eq!(provider.verify_token(&session.token).unwrap(), None);
}

#[test]
fn subscribers_see_current_state_then_changes_until_unsubscribed() {
    let conn = open_db_in_memory().unwrap();
    let mut provider = SqliteIdentityProvider::try_new(&conn).unwrap();
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);

    let id = provider.subscribe(Box::new(move |event: &AuthEvent| {
        sink.borrow_mut().push(event.clone())
    }));
    let session = provider.sign_up("ann@example.com", "secret1").unwrap();
    provider.sign_out().unwrap();

    assert!(provider.unsubscribe(id));
    assert!(!provider.unsubscribe(id));
    provider.sign_in("ann@example.com", "secret1").unwrap();

    assert_eq!(
        *events.borrow(),
        vec![
            AuthEvent::SignedOut,
            AuthEvent::SignedIn(session.identity),
            AuthEvent::SignedOut,
        ]
    );
}

#[test]
fn sign_out_without_session_is_silent() {
    let conn = open_db_in_memory().unwrap();
    let mut provider = SqliteIdentityProvider::try_new(&conn).unwrap();
    let count = Rc::new(RefCell::new(0));
    let sink = Rc::clone(&count);
    provider.subscribe(Box::new(move |_: &AuthEvent| *sink.borrow_mut() += 1));

    provider.sign_out().unwrap();
    assert_eq!(*count.borrow(), 1);
}

#[test]
fn unmigrated_connection_is_rejected() {
    let conn = Connection::open_in_memory().unwrap();
    let err = SqliteIdentityProvider::try_new(&conn).err().unwrap();
    assert!(matches!(err, AuthError::Backend(ref message) if message.contains("users")));
}
