//! Axum integration for fade_session
//!
//! [`with_sessions`] wraps a router so every request gets a loaded
//! [`Session`](fade_session::Session) and every response carries the cookie
//! the handler's changes call for. Handlers reach the session through the
//! [`SessionHandle`] extractor.

mod error;
mod middleware;
mod session;

pub use error::SessionResponseError;
pub use middleware::{session_middleware, with_sessions};
pub use session::SessionHandle;

pub use fade_session::{Session, SessionData, SessionError, SessionManager};
