//! fade_session - cookie-bound server-side sessions with sliding expiration
//!
//! A [`Session`] ties an opaque cookie to a payload kept in a [`SessionStore`].
//! Session keys start with a hash of the user agent that created them, so a
//! cookie copied into another browser does not validate. Sessions close to
//! expiry are renewed by [`Session::touch`].

mod config;
mod session;
mod storage;
mod utils;

#[cfg(test)]
mod test_utils;

pub use config::SessionConfig;

pub use session::{
    CookieOptions, DEFAULT_COOKIE_NAME, FIELD_IP_ADDR, FIELD_LOGIN_AT, FIELD_RENEW_AT,
    FIELD_USER_AGENT, HeaderContext, MAX_LIFETIME_SEC, RequestContext, SameSite, Session,
    SessionError, SessionManager, state_prefix,
};

pub use storage::{
    EXPIRY_ABSENT, EXPIRY_PERSISTENT, InMemorySessionStore, RedisSessionStore, SessionData,
    SessionStore, StorageError, create_session_store,
};

pub use utils::UtilError;
