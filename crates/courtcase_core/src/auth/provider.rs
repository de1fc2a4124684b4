//! Identity provider contract and subscription plumbing.
//!
//! # Responsibility
//! - Define sign-in, sign-up, sign-out and current-identity operations.
//! - Deliver identity changes to registered listeners until they unsubscribe.
//!
//! # Invariants
//! - A listener is told the current state as soon as it subscribes.
//! - Unsubscribed listeners never receive another event.
//! - User ids are opaque strings to every consumer.

use crate::model::identity::Identity;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type AuthResult<T> = Result<T, AuthError>;

/// Identity change delivered to listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn(Identity),
    SignedOut,
}

/// Handle returned by `subscribe`, used to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

pub type AuthListener = Box<dyn FnMut(&AuthEvent)>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    MissingCredentials,
    InvalidEmail,
    WeakPassword { min_length: usize },
    EmailAlreadyInUse,
    /// Unknown email or wrong password; deliberately indistinguishable.
    InvalidCredential,
    Backend(String),
}

impl Display for AuthError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingCredentials => write!(f, "Email and password are required"),
            Self::InvalidEmail => write!(f, "Invalid email address"),
            Self::WeakPassword { min_length } => {
                write!(f, "Password must be at least {min_length} characters")
            }
            Self::EmailAlreadyInUse => write!(f, "Email is already in use"),
            Self::InvalidCredential => write!(f, "Invalid email or password"),
            Self::Backend(message) => write!(f, "{message}"),
        }
    }
}

impl Error for AuthError {}

impl From<rusqlite::Error> for AuthError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Backend(value.to_string())
    }
}

/// Signed-in identity plus its bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub identity: Identity,
    pub token: String,
}

/// Credential-based identity source.
pub trait IdentityProvider {
    fn sign_in(&mut self, email: &str, password: &str) -> AuthResult<Session>;
    /// Registers a new account and signs it in.
    fn sign_up(&mut self, email: &str, password: &str) -> AuthResult<Session>;
    fn sign_out(&mut self) -> AuthResult<()>;
    fn current(&self) -> Option<&Identity>;
    fn subscribe(&mut self, listener: AuthListener) -> SubscriptionId;
    /// Returns `false` when the id was never registered or already removed.
    fn unsubscribe(&mut self, id: SubscriptionId) -> bool;
}

/// Resolves bearer tokens presented to the HTTP entry point.
pub trait TokenVerifier {
    /// `Ok(None)` for tokens that are unknown or revoked.
    fn verify_token(&self, token: &str) -> AuthResult<Option<Identity>>;
}

/// Ordered listener registry.
#[derive(Default)]
pub struct AuthSubscribers {
    next_id: u64,
    listeners: Vec<(SubscriptionId, AuthListener)>,
}

impl AuthSubscribers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `listener` and immediately delivers `current`.
    pub fn add(&mut self, mut listener: AuthListener, current: &AuthEvent) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        listener(current);
        self.listeners.push((id, listener));
        id
    }

    pub fn remove(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    pub fn notify(&mut self, event: &AuthEvent) {
        for (_, listener) in &mut self.listeners {
            listener(event);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}
