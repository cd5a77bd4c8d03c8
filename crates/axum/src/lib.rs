//! Axum integration for seabag sessions.
//!
//! [`session_lifecycle`] is the middleware that reads the session cookie,
//! loads the session from the configured [`SessionStore`], hands the
//! [`Session`] to handlers through the request extensions, and writes it
//! back (cookie included) when the request dirtied it.
//!
//! ```ignore
//! let manager = SessionManager::new(options, store);
//! let app = Router::new()
//!     .route("/", get(home))
//!     .route_layer(middleware::from_fn_with_state(manager, session_lifecycle));
//! ```
//!
//! [`SessionStore`]: seabag_sessions::SessionStore

pub mod cookies;
pub mod extract;
pub mod middleware;

pub use extract::{SessionFailure, SessionSkip};
pub use middleware::{session_lifecycle, SessionManager};
pub use seabag_sessions::Session;
