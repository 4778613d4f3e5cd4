mod context;
mod cookie;
mod key;
mod session;

#[cfg(test)]
mod session_security_tests;

pub use context::{HeaderContext, RequestContext};
pub use key::state_prefix;
pub use session::{FIELD_IP_ADDR, FIELD_LOGIN_AT, FIELD_RENEW_AT, FIELD_USER_AGENT, Session};
