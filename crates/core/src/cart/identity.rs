//! Cart ownership.
//!
//! A cart line item belongs to exactly one owner: an authenticated user or an
//! anonymous browsing session. The web layer builds a [`RequestIdentity`] for
//! each request and the cart code only ever sees the resolved [`OwnerKey`].

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::types::UserId;

/// Maximum accepted length of a session key.
const MAX_SESSION_KEY_LEN: usize = 64;

/// Error parsing a session key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionKeyError {
    #[error("session key is empty")]
    Empty,
    #[error("session key exceeds {MAX_SESSION_KEY_LEN} characters")]
    TooLong,
}

/// Anonymous identity of one browsing session.
///
/// Generated once per session and kept in the server-side session store, so
/// it survives session ID rotation on login.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionKey(String);

impl SessionKey {
    /// Generate a fresh random key.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Parse a stored key.
    ///
    /// # Errors
    ///
    /// Returns `SessionKeyError` if the key is empty or too long.
    pub fn parse(s: &str) -> Result<Self, SessionKeyError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(SessionKeyError::Empty);
        }
        if s.len() > MAX_SESSION_KEY_LEN {
            return Err(SessionKeyError::TooLong);
        }
        Ok(Self(s.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SessionKey {
    type Error = SessionKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SessionKey> for String {
    fn from(key: SessionKey) -> Self {
        key.0
    }
}

/// The owner of a set of cart line items.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum OwnerKey {
    /// Durable, authenticated owner.
    User(UserId),
    /// Short-lived anonymous owner.
    Session(SessionKey),
}

impl OwnerKey {
    /// Owner kind for log fields.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::User(_) => "user",
            Self::Session(_) => "session",
        }
    }

    #[must_use]
    pub const fn user_id(&self) -> Option<UserId> {
        match self {
            Self::User(id) => Some(*id),
            Self::Session(_) => None,
        }
    }

    #[must_use]
    pub const fn session_key(&self) -> Option<&SessionKey> {
        match self {
            Self::User(_) => None,
            Self::Session(key) => Some(key),
        }
    }
}

/// Identity facts known about the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestIdentity {
    /// Authenticated user, if any.
    pub user: Option<UserId>,
    /// Anonymous session key. Always present.
    pub session: SessionKey,
}

impl RequestIdentity {
    #[must_use]
    pub const fn new(user: Option<UserId>, session: SessionKey) -> Self {
        Self { user, session }
    }

    /// Resolve the single owner key for this request.
    ///
    /// A logged-in user always owns the cart; the session key is only used
    /// for anonymous visitors.
    #[must_use]
    pub fn owner_key(&self) -> OwnerKey {
        match self.user {
            Some(user) => OwnerKey::User(user),
            None => OwnerKey::Session(self.session.clone()),
        }
    }

    /// The anonymous owner key, regardless of login state.
    #[must_use]
    pub fn session_owner(&self) -> OwnerKey {
        OwnerKey::Session(self.session.clone())
    }
}
