//! Session model

use serde::{Deserialize, Serialize};

use super::User;

/// The authenticated identity and its bearer credential.
///
/// Held as `Option<AuthSession>` so a user without a token (or a token
/// without a user) cannot be represented.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    pub user: User,
    pub token: String,
}

impl AuthSession {
    pub fn new(user: User, token: impl Into<String>) -> Self {
        Self {
            user,
            token: token.into(),
        }
    }
}

/// Lifecycle of the session context.
///
/// `Uninitialized -> Loading -> {Authenticated, Anonymous}`; afterwards the
/// context moves between `Authenticated` and `Anonymous` only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    #[default]
    Uninitialized,
    Loading,
    Authenticated,
    Anonymous,
}

impl SessionPhase {
    /// Consumers must treat the session as unknown while this is true
    pub fn is_loading(&self) -> bool {
        matches!(self, SessionPhase::Uninitialized | SessionPhase::Loading)
    }
}

/// Read-only view handed to consumers
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub user: Option<User>,
    pub token: Option<String>,
    pub loading: bool,
    pub unseen_warnings: u32,
    pub unseen_inbox: u32,
}

impl SessionSnapshot {
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some() && self.token.is_some()
    }
}

/// Change notification published on every session mutation.
///
/// `generation` moves on login and logout (a new credential), `revision` on
/// every change including user updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionSignal {
    pub generation: u64,
    pub revision: u64,
    pub authenticated: bool,
}

/// Outcome of the admin gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminAccess {
    /// Session still loading, decide later
    Pending,
    Denied,
    Granted,
}
