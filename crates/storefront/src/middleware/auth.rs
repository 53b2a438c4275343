//! Authentication extractors and sign-in helpers.
//!
//! Login itself is handled by an external auth layer. It records the user in
//! the session through [`sign_in`], which also folds the visitor's anonymous
//! cart into the user's cart.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use toko_core::{OwnerKey, SessionKey};
use tower_sessions::Session;

use crate::db::Storage;
use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::models::{CurrentUser, session_keys};
use crate::services::{CartError, CartService};
use crate::state::AppState;

/// Path of the external login page.
pub const LOGIN_PATH: &str = "/auth/login";

/// Extractor that requires an authenticated user.
///
/// If the user is not logged in, returns a redirect to the login page.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.name)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Error returned when authentication is required but the user is not logged in.
#[derive(Debug)]
pub enum AuthRejection {
    /// Redirect to login page (for HTML requests).
    RedirectToLogin,
    /// Unauthorized response (for API requests).
    Unauthorized,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to(LOGIN_PATH).into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = current_user(parts).await.ok_or_else(|| {
            if parts.uri.path().starts_with("/api/") {
                AuthRejection::Unauthorized
            } else {
                AuthRejection::RedirectToLogin
            }
        })?;

        Ok(Self(user))
    }
}

async fn current_user(parts: &Parts) -> Option<CurrentUser> {
    let session = parts.extensions.get::<Session>()?;
    session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten()
}

/// Record `user` as signed in and merge the visitor's anonymous cart.
///
/// The merge runs before the user is recorded, so a failed sign-in never
/// leaves a half-signed-in session. A merge rejected for quantity overflow
/// does not block sign-in: the anonymous cart is left intact in the session
/// and shows up again after signing out.
///
/// The session ID is cycled to prevent fixation. The anonymous session key
/// is kept, so signing out later starts from the (now empty) session cart.
/// Returns the number of cart lines merged.
///
/// # Errors
///
/// Returns `AppError::Session` if the session cannot be modified.
/// Returns `AppError::Database` if the cart merge fails.
pub async fn sign_in<S: Storage>(
    session: &Session,
    state: &AppState<S>,
    user: &CurrentUser,
) -> Result<u64, AppError> {
    let anonymous = session
        .get::<SessionKey>(session_keys::CART_SESSION_KEY)
        .await?;

    let merged = match anonymous {
        Some(key) => {
            let result = CartService::new(state.storage(), state.pricing())
                .merge_on_login(&OwnerKey::Session(key), &OwnerKey::User(user.id))
                .await;
            match result {
                Ok(merged) => merged,
                Err(CartError::Validation(reason)) => {
                    tracing::warn!(user_id = %user.id, %reason, "Anonymous cart not merged");
                    0
                }
                Err(e) => return Err(e.into()),
            }
        }
        None => 0,
    };

    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await?;
    set_sentry_user(&user.id);
    tracing::info!(user_id = %user.id, merged, "User signed in");

    Ok(merged)
}

/// Remove the current user from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn sign_out(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentUser>(session_keys::CURRENT_USER)
        .await?;
    session.cycle_id().await?;
    clear_sentry_user();
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::Request;

    use super::*;

    async fn reject(path: &str) -> Option<AuthRejection> {
        let (mut parts, ()) = Request::builder()
            .uri(path)
            .body(())
            .unwrap()
            .into_parts();
        RequireAuth::from_request_parts(&mut parts, &()).await.err()
    }

    #[tokio::test]
    async fn test_require_auth_redirects_pages() {
        assert!(matches!(
            reject("/orders").await,
            Some(AuthRejection::RedirectToLogin)
        ));
    }

    #[tokio::test]
    async fn test_require_auth_rejects_api_requests() {
        assert!(matches!(
            reject("/api/orders").await,
            Some(AuthRejection::Unauthorized)
        ));
    }

    #[test]
    fn test_redirect_points_at_login() {
        let response = AuthRejection::RedirectToLogin.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(axum::http::header::LOCATION).map(|v| v.as_bytes()),
            Some(LOGIN_PATH.as_bytes())
        );
    }
}
