/// Shared error type used across all seabag crates.
///
/// Two failure classes matter to the lifecycle: a malformed session
/// identifier is the client's fault; everything else (store unavailable,
/// store rejected an operation, a handler violated the `set` contract) is
/// an implementation failure.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid session id")]
    InvalidSessionId,

    #[error("cache is not ready: {0}")]
    CacheNotReady(String),

    #[error("session store: {0}")]
    Store(String),

    #[error("invalid session.set() arguments: {0}")]
    InvalidSetArguments(String),
}

impl Error {
    /// Whether the request, rather than the server, is at fault.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::InvalidSessionId)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
