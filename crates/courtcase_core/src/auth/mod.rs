//! Credential-based identity: accounts, sessions and change notifications.

pub mod password;
pub mod provider;
pub mod session_verifier;
pub mod sqlite_provider;

pub use provider::{
    AuthError, AuthEvent, AuthListener, AuthResult, AuthSubscribers, IdentityProvider, Session,
    SubscriptionId, TokenVerifier,
};
pub use session_verifier::SqliteSessionVerifier;
pub use sqlite_provider::{SqliteIdentityProvider, MIN_PASSWORD_LENGTH};
