//! Shared types for the seabag workspace: the error taxonomy and the
//! serde configuration surface consumed by the session lifecycle.

pub mod config;
pub mod error;

pub use config::{CacheOptions, CookieOptions, SameSitePolicy, SessionOptions};
pub use error::{Error, Result};
