//! Cookie-indexed server-side session state.
//!
//! Each client is tracked by a UUID session ID carried in a cookie; the
//! session data itself lives server-side behind the [`SessionStore`]
//! contract. Handlers work through the [`Session`] handle: plain reads and
//! writes with dirty tracking, one-time flash messages, and a lazy surface
//! swept into the store at response time.

pub mod id;
pub mod session;
mod state;
pub mod store;

pub use session::Session;
pub use store::{MemoryStore, SessionStore};
