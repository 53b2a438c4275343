//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Session layer (tower-sessions with `PostgreSQL` store)
//!
//! Extractors built on the session:
//! - [`RequireAuth`] - the signed-in user
//! - [`CartOwner`] - the resolved cart identity for the request

pub mod auth;
pub mod identity;
pub mod request_id;
pub mod session;

pub use auth::{RequireAuth, sign_in, sign_out};
pub use identity::CartOwner;
pub use request_id::{RequestId, request_id_middleware};
pub use session::create_session_layer;
