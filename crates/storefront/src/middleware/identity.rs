//! Cart owner resolution.
//!
//! The only place request state is turned into a cart identity. Handlers
//! receive the resolved [`RequestIdentity`] and pass its owner key down to
//! the cart service explicitly.

use axum::{extract::FromRequestParts, http::request::Parts};
use toko_core::{OwnerKey, RequestIdentity, SessionKey};
use tower_sessions::Session;

use crate::error::AppError;
use crate::models::{CurrentUser, session_keys};

/// Extractor resolving who owns the cart for this request.
///
/// A visitor without an anonymous session key gets a fresh one stored in the
/// session, so the same browser keeps the same cart across requests.
#[derive(Debug, Clone)]
pub struct CartOwner(pub RequestIdentity);

impl CartOwner {
    /// The key cart rows are stored under: the user when signed in,
    /// otherwise the anonymous session.
    #[must_use]
    pub fn owner_key(&self) -> OwnerKey {
        self.0.owner_key()
    }
}

impl<S> FromRequestParts<S> for CartOwner
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or_else(|| AppError::Internal("session layer is not installed".to_string()))?;

        let user = session
            .get::<CurrentUser>(session_keys::CURRENT_USER)
            .await?
            .map(|user| user.id);

        let key = match session
            .get::<SessionKey>(session_keys::CART_SESSION_KEY)
            .await?
        {
            Some(key) => key,
            None => {
                let key = SessionKey::generate();
                session
                    .insert(session_keys::CART_SESSION_KEY, &key)
                    .await?;
                key
            }
        };

        Ok(Self(RequestIdentity::new(user, key)))
    }
}
