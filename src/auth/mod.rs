//! Access Guard Module
//!
//! Session-token check run by every student endpoint before it touches the
//! store or the cache, plus the in-memory user/session registry that issues
//! those tokens.

mod session;

use async_trait::async_trait;
use thiserror::Error;

pub use session::{Session, SessionRegistry, User};

// == Auth Error ==
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Missing session_id")]
    MissingToken,

    #[error("Malformed session_id")]
    MalformedToken,

    #[error("Session is invalid or expired")]
    InvalidSession,

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Username '{0}' is already taken")]
    UsernameTaken(String),

    #[error("Session not found")]
    UnknownSession,

    #[error("{0}")]
    InvalidInput(String),
}

// == Access Guard ==
/// Decides whether a session token may perform a request.
#[async_trait]
pub trait AccessGuard: Send + Sync {
    /// Fails unless `token` names an active session. No side effects.
    async fn check(&self, token: Option<&str>) -> Result<(), AuthError>;
}
