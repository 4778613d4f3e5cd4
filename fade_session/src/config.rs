//! Environment-driven session configuration

use std::env;
use std::sync::Arc;
use std::time::Duration;

use crate::session::{CookieOptions, DEFAULT_COOKIE_NAME, SameSite, SessionError, SessionManager};
use crate::storage::{SessionStore, create_session_store};

const DEFAULT_EXPIRE_SEC: u64 = 86400;
const DEFAULT_RENEW_SEC: u64 = 3600;
const DEFAULT_STORE_TYPE: &str = "memory";
const DEFAULT_STORE_URL: &str = "redis://127.0.0.1:6379";

/// Settings for a [`SessionManager`] and its store.
///
/// | Variable                 | Default                  |
/// |--------------------------|--------------------------|
/// | `SESSION_COOKIE_NAME`    | `SK`                     |
/// | `SESSION_EXPIRE_SEC`     | `86400`                  |
/// | `SESSION_RENEW_SEC`      | `3600`                   |
/// | `SESSION_COOKIE_SECURE`  | `false`                  |
/// | `SESSION_COOKIE_SAMESITE`| `Lax`                    |
/// | `SESSION_STORE_TYPE`     | `memory`                 |
/// | `SESSION_STORE_URL`      | `redis://127.0.0.1:6379` |
///
/// Unparsable values fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub expire: Duration,
    pub renew: Duration,
    pub cookie_options: CookieOptions,
    pub store_type: String,
    pub store_url: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            expire: Duration::from_secs(DEFAULT_EXPIRE_SEC),
            renew: Duration::from_secs(DEFAULT_RENEW_SEC),
            cookie_options: CookieOptions::default(),
            store_type: DEFAULT_STORE_TYPE.to_string(),
            store_url: DEFAULT_STORE_URL.to_string(),
        }
    }
}

impl SessionConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let seconds = |name: &str, default: u64| {
            lookup(name)
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(default)
        };

        let same_site = lookup("SESSION_COOKIE_SAMESITE")
            .and_then(|s| match s.parse::<SameSite>() {
                Ok(same_site) => Some(same_site),
                Err(e) => {
                    tracing::warn!("Ignoring SESSION_COOKIE_SAMESITE: {}", e);
                    None
                }
            })
            .unwrap_or(defaults.cookie_options.same_site);

        Self {
            cookie_name: lookup("SESSION_COOKIE_NAME").unwrap_or(defaults.cookie_name),
            expire: Duration::from_secs(seconds("SESSION_EXPIRE_SEC", DEFAULT_EXPIRE_SEC)),
            renew: Duration::from_secs(seconds("SESSION_RENEW_SEC", DEFAULT_RENEW_SEC)),
            cookie_options: CookieOptions {
                secure: lookup("SESSION_COOKIE_SECURE")
                    .map(|val| val.eq_ignore_ascii_case("true"))
                    .unwrap_or(defaults.cookie_options.secure),
                same_site,
                ..defaults.cookie_options
            },
            store_type: lookup("SESSION_STORE_TYPE").unwrap_or(defaults.store_type),
            store_url: lookup("SESSION_STORE_URL").unwrap_or(defaults.store_url),
        }
    }

    /// Create the configured store backend and check it is reachable.
    pub async fn build_store(&self) -> Result<Arc<dyn SessionStore>, SessionError> {
        if self.renew > self.expire {
            tracing::warn!(
                "SESSION_RENEW_SEC exceeds SESSION_EXPIRE_SEC; every touch will renew the session"
            );
        }
        create_session_store(&self.store_type, &self.store_url)
            .await
            .map_err(|e| SessionError::Config(e.to_string()))
    }

    /// Build the store and wrap it in a [`SessionManager`].
    pub async fn into_manager(self) -> Result<SessionManager, SessionError> {
        let store = self.build_store().await?;
        Ok(
            SessionManager::new(self.cookie_name, self.expire, self.renew, store)
                .with_cookie_options(self.cookie_options),
        )
    }
}
