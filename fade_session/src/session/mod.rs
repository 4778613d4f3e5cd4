mod config;
mod errors;
mod main;
mod types;

pub use config::{DEFAULT_COOKIE_NAME, MAX_LIFETIME_SEC, SessionManager};
pub use errors::SessionError;
pub use main::{
    FIELD_IP_ADDR, FIELD_LOGIN_AT, FIELD_RENEW_AT, FIELD_USER_AGENT, HeaderContext,
    RequestContext, Session, state_prefix,
};
pub use types::{CookieOptions, SameSite};
