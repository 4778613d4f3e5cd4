use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::storage::SessionStore;

use super::types::CookieOptions;

/// Cookie name used when an empty name is configured.
pub const DEFAULT_COOKIE_NAME: &str = "SK";

/// Longest lifetime a manager accepts, ten years. Longer values are clamped.
pub const MAX_LIFETIME_SEC: i64 = 10 * 365 * 24 * 60 * 60;

/// Session settings plus the store they apply to.
///
/// Built once at startup and shared behind an `Arc`; every [`Session`](super::Session)
/// carries a reference to the manager it was loaded with.
pub struct SessionManager {
    cookie_name: String,
    expire_sec: i64,
    renew_sec: i64,
    cookie_options: CookieOptions,
    store: Arc<dyn SessionStore>,
}

impl SessionManager {
    /// `expire` is the full session lifetime and `renew` the remaining lifetime
    /// below which [`Session::touch`](super::Session::touch) renews it. Both are
    /// truncated to whole seconds and clamped to [`MAX_LIFETIME_SEC`].
    pub fn new(
        cookie_name: impl Into<String>,
        expire: Duration,
        renew: Duration,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        let cookie_name = cookie_name.into();
        let cookie_name = if cookie_name.is_empty() {
            DEFAULT_COOKIE_NAME.to_string()
        } else {
            cookie_name
        };
        let manager = Self {
            cookie_name,
            expire_sec: whole_seconds(expire),
            renew_sec: whole_seconds(renew),
            cookie_options: CookieOptions::default(),
            store,
        };
        tracing::info!(
            cookie_name = %manager.cookie_name,
            expire_sec = manager.expire_sec,
            renew_sec = manager.renew_sec,
            "Session manager initialized"
        );
        manager
    }

    pub fn with_cookie_options(mut self, cookie_options: CookieOptions) -> Self {
        self.cookie_options = cookie_options;
        self
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    pub fn expire_sec(&self) -> i64 {
        self.expire_sec
    }

    pub fn renew_sec(&self) -> i64 {
        self.renew_sec
    }

    pub fn cookie_options(&self) -> &CookieOptions {
        &self.cookie_options
    }

    pub fn store(&self) -> &dyn SessionStore {
        self.store.as_ref()
    }
}

impl fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("cookie_name", &self.cookie_name)
            .field("expire_sec", &self.expire_sec)
            .field("renew_sec", &self.renew_sec)
            .field("cookie_options", &self.cookie_options)
            .finish_non_exhaustive()
    }
}

fn whole_seconds(duration: Duration) -> i64 {
    let secs = i64::try_from(duration.as_secs()).unwrap_or(i64::MAX);
    if secs > MAX_LIFETIME_SEC {
        tracing::warn!(
            "Session lifetime of {secs}s exceeds {MAX_LIFETIME_SEC}s, clamping it"
        );
        return MAX_LIFETIME_SEC;
    }
    secs
}
