mod errors;
mod session_store;
mod types;

pub use errors::StorageError;
pub use session_store::{
    InMemorySessionStore, RedisSessionStore, SessionStore, create_session_store,
};
pub use types::{EXPIRY_ABSENT, EXPIRY_PERSISTENT, SessionData};
