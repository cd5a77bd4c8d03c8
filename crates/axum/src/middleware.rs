//! The session lifecycle around each request.
//!
//! On the way in: read the session cookie, validate the ID, fetch the
//! payload from the store, and park a [`Session`] handle in the request
//! extensions. On the way out: if the session is dirty or lazy, stage the
//! cookie and write the payload back. A request marked with
//! [`SessionSkip`] passes through untouched.
//!
//! A forged or corrupted cookie is a client error (400); a store that is
//! down or failing is a server error (500). A write failure still carries
//! the staged cookie so the client and store converge on the next
//! request.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, HeaderValue, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use cookie::Cookie;
use serde_json::Map;

use seabag_domain::{Error, SessionOptions};
use seabag_sessions::{id, Session, SessionStore};

use crate::cookies;
use crate::extract::SessionSkip;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Manager
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Shared middleware state: the session options plus the store every
/// session reads from and writes through.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<ManagerInner>,
}

struct ManagerInner {
    options: SessionOptions,
    store: Arc<dyn SessionStore>,
}

impl SessionManager {
    pub fn new(options: SessionOptions, store: Arc<dyn SessionStore>) -> Self {
        Self {
            inner: Arc::new(ManagerInner { options, store }),
        }
    }

    pub fn options(&self) -> &SessionOptions {
        &self.inner.options
    }

    pub fn store(&self) -> Arc<dyn SessionStore> {
        self.inner.store.clone()
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Lifecycle middleware
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Axum middleware driving the whole session lifecycle. Attach via
/// `axum::middleware::from_fn_with_state`.
pub async fn session_lifecycle(
    State(manager): State<SessionManager>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if req.extensions().get::<SessionSkip>().is_some() {
        return next.run(req).await;
    }

    let session = match open_session(&manager, req.headers()).await {
        Ok(session) => session,
        Err(response) => return response,
    };

    req.extensions_mut().insert(session.clone());
    let response = next.run(req).await;

    persist_session(&manager, &session, response).await
}

/// Request preamble: turn the cookie (or its absence) into a `Session`.
///
/// Borrows only the headers: holding `&Request<Body>` across the store
/// await would make the middleware future `!Send` (axum's `Body` is not
/// `Sync`).
async fn open_session(manager: &SessionManager, headers: &HeaderMap) -> Result<Session, Response> {
    let options = manager.options();
    let store = manager.store();

    let Some(candidate) = cookies::read_session_cookie(headers, &options.name) else {
        return Ok(Session::fresh(store, options.store_blank));
    };

    if !id::is_valid(&candidate) {
        let error = Error::InvalidSessionId;
        tracing::warn!("rejected malformed session cookie");
        let mut response = api_error(StatusCode::BAD_REQUEST, error.to_string());
        if options.cookie_options.clear_invalid {
            append_cookie(
                &mut response,
                &cookies::removal_cookie(&options.name, &options.cookie_options),
            );
        }
        return Err(response);
    }

    if !store.is_ready() {
        let error = Error::CacheNotReady("not loading sessions from cache".into());
        tracing::error!(%error, "session preamble failed");
        return Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, error.to_string()));
    }

    match store.get(&candidate).await {
        // An unknown or expired ID keeps its cookie value and starts from
        // an empty payload.
        Ok(payload) => Ok(Session::hydrated(
            store,
            candidate,
            payload.unwrap_or_else(Map::new),
        )),
        Err(error) => {
            tracing::error!(%error, "session lookup failed");
            Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, error.to_string()))
        }
    }
}

/// Response phase: write the session back and stage the cookie.
async fn persist_session(
    manager: &SessionManager,
    session: &Session,
    mut response: Response,
) -> Response {
    // Clean and not lazy: nothing to write, no cookie.
    let Some((session_id, payload)) = session.prepare_write() else {
        return response;
    };

    let options = manager.options();
    let store = manager.store();

    if !store.is_ready() {
        let error = Error::CacheNotReady("not storing sessions to cache".into());
        tracing::error!(%error, "session write failed");
        return api_error(StatusCode::INTERNAL_SERVER_ERROR, error.to_string());
    }

    // Staged before the write; rides along even when the write fails.
    let cookie = cookies::session_cookie(&options.name, &session_id, &options.cookie_options);

    if let Err(error) = store.set(&session_id, &payload, None).await {
        tracing::error!(session_id = %session_id, %error, "failed to store session");
        let mut failure = api_error(StatusCode::INTERNAL_SERVER_ERROR, error.to_string());
        append_cookie(&mut failure, &cookie);
        return failure;
    }

    append_cookie(&mut response, &cookie);
    response
}

fn append_cookie(response: &mut Response, cookie: &Cookie<'_>) {
    match HeaderValue::from_str(&cookie.to_string()) {
        Ok(value) => {
            response.headers_mut().append(SET_COOKIE, value);
        }
        Err(error) => {
            tracing::error!(%error, "session cookie is not a valid header value");
        }
    }
}

/// Build a standardized JSON error response: `{ "error": "<message>" }`.
fn api_error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({ "error": message.into() }))).into_response()
}
