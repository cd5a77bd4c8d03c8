//! Handler-side session access.
//!
//! The lifecycle middleware parks the [`Session`] handle in the request
//! extensions, so handlers take it with axum's plain `Extension`
//! extractor:
//!
//! ```ignore
//! async fn profile(Extension(session): Extension<Session>) -> impl IntoResponse {
//!     let theme = session.get("theme");
//!     // ...
//! }
//! ```
//!
//! [`Session`]: seabag_sessions::Session

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use seabag_domain::Error;

/// Route marker: requests carrying this extension bypass the session
/// lifecycle entirely. Routes can also opt out structurally by being
/// registered outside the middleware's `route_layer`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionSkip;

/// Wrapper letting handlers bubble session errors out with `?`.
#[derive(Debug)]
pub struct SessionFailure(pub Error);

impl From<Error> for SessionFailure {
    fn from(error: Error) -> Self {
        Self(error)
    }
}

impl IntoResponse for SessionFailure {
    fn into_response(self) -> Response {
        let status = if self.0.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        api_error(status, self.0.to_string())
    }
}

/// Build a standardized JSON error response: `{ "error": "<message>" }`.
fn api_error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({ "error": message.into() }))).into_response()
}
