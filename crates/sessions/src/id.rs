//! Session ID generation and validation.
//!
//! IDs are version 4 UUIDs in canonical hyphenated form. Validation is
//! strict about shape: the version nibble must be `4` and the variant
//! nibble one of `8`, `9`, `A`, `B`, so only IDs this module could have
//! minted pass. Matching is case-insensitive.

use std::sync::OnceLock;

use regex::Regex;
use uuid::Uuid;

fn session_id_regex() -> &'static Regex {
    static CACHED: OnceLock<Regex> = OnceLock::new();
    CACHED.get_or_init(|| {
        Regex::new(r"(?i)^[0-9A-F]{8}-[0-9A-F]{4}-4[0-9A-F]{3}-[89AB][0-9A-F]{3}-[0-9A-F]{12}$")
            .expect("session id regex must compile")
    })
}

/// Mint a new session ID.
pub fn generate() -> String {
    Uuid::new_v4().to_string()
}

/// Check whether a candidate string is a well-formed session ID.
pub fn is_valid(candidate: &str) -> bool {
    session_id_regex().is_match(candidate)
}
