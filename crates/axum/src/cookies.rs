//! Session cookie plumbing.
//!
//! The cookie carries only the raw session ID; no signing or encryption
//! happens at this layer. Attributes come straight from
//! [`CookieOptions`].

use axum::http::header::COOKIE;
use axum::http::HeaderMap;
use cookie::time::Duration;
use cookie::{Cookie, SameSite};

use seabag_domain::{CookieOptions, SameSitePolicy};

/// Pull the session ID candidate out of the request's `Cookie` header.
pub fn read_session_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let header = headers.get(COOKIE)?.to_str().ok()?;
    Cookie::split_parse(header)
        .flatten()
        .find(|cookie| cookie.name() == name)
        .map(|cookie| cookie.value().to_owned())
}

/// Build the response cookie carrying `id`.
pub fn session_cookie(name: &str, id: &str, options: &CookieOptions) -> Cookie<'static> {
    let mut builder = Cookie::build((name.to_owned(), id.to_owned()))
        .path(options.path.clone())
        .secure(options.secure)
        .http_only(options.http_only)
        .same_site(same_site(options.same_site));

    if let Some(ttl) = options.ttl_secs {
        builder = builder.max_age(Duration::seconds(i64::try_from(ttl).unwrap_or(i64::MAX)));
    }
    builder.build()
}

/// Build a cookie that tells the client to drop its session cookie.
pub fn removal_cookie(name: &str, options: &CookieOptions) -> Cookie<'static> {
    Cookie::build((name.to_owned(), ""))
        .path(options.path.clone())
        .max_age(Duration::ZERO)
        .build()
}

fn same_site(policy: SameSitePolicy) -> SameSite {
    match policy {
        SameSitePolicy::Strict => SameSite::Strict,
        SameSitePolicy::Lax => SameSite::Lax,
        SameSitePolicy::None => SameSite::None,
    }
}
