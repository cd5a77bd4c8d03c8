use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Session options
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Configuration for the session lifecycle middleware.
///
/// Deserializes from TOML (or any serde format) with every field
/// optional, so an empty table yields the documented defaults: a cookie
/// named `session`, blank sessions persisted on first response, and a
/// one-day store expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionOptions {
    /// Options forwarded verbatim to the store adapter.
    #[serde(default)]
    pub cache: CacheOptions,

    /// Attributes stamped onto the emitted session cookie.
    #[serde(default)]
    pub cookie_options: CookieOptions,

    /// Cookie name.
    #[serde(default = "d_cookie_name")]
    pub name: String,

    /// Whether a brand-new session with no mutations is still persisted
    /// (and its cookie issued) on the first response.
    #[serde(default = "d_true")]
    pub store_blank: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            cache: CacheOptions::default(),
            cookie_options: CookieOptions::default(),
            name: d_cookie_name(),
            store_blank: true,
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Store adapter options
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Options handed to the store adapter at construction time.  The
/// lifecycle itself never interprets these; it always writes with the
/// adapter's default expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheOptions {
    /// Default entry expiry, in seconds.
    #[serde(default = "d_one_day")]
    pub expires_in_secs: u64,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            expires_in_secs: d_one_day(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Cookie options
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Pass-through cookie attributes.  The session layer applies no signing
/// or encryption of its own; the cookie value is the raw identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CookieOptions {
    /// When the cookie carries a malformed identifier, stamp an expired
    /// replacement cookie onto the 400 response so the client stops
    /// resending the bad value.
    #[serde(default = "d_true")]
    pub clear_invalid: bool,

    /// Same-site policy.  Defaults to the loose (`lax`) variant.
    #[serde(default)]
    pub same_site: SameSitePolicy,

    #[serde(default = "d_true")]
    pub secure: bool,

    #[serde(default = "d_true")]
    pub http_only: bool,

    #[serde(default = "d_root_path")]
    pub path: String,

    /// Cookie lifetime in seconds (`Max-Age`).  `None` issues a
    /// browser-session cookie.
    #[serde(default)]
    pub ttl_secs: Option<u64>,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            clear_invalid: true,
            same_site: SameSitePolicy::Lax,
            secure: true,
            http_only: true,
            path: d_root_path(),
            ttl_secs: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SameSitePolicy {
    Strict,
    #[default]
    Lax,
    None,
}

// ── serde default helpers ───────────────────────────────────────────

fn d_cookie_name() -> String {
    "session".into()
}
fn d_one_day() -> u64 {
    86_400
}
fn d_root_path() -> String {
    "/".into()
}
fn d_true() -> bool {
    true
}
