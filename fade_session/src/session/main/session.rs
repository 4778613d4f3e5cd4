use chrono::{TimeDelta, Utc};
use http::HeaderMap;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::session::config::SessionManager;
use crate::session::errors::SessionError;
use crate::storage::{EXPIRY_ABSENT, EXPIRY_PERSISTENT, SessionData, SessionStore};
use crate::utils::{epoch_now, gen_random_base63};

use super::context::RequestContext;
use super::cookie::header_set_cookie;
use super::key::{KEY_SUFFIX_LEN, MAX_KEY_ATTEMPTS, state_prefix};

pub const FIELD_IP_ADDR: &str = "ip_addr";
pub const FIELD_USER_AGENT: &str = "user_agent";
pub const FIELD_LOGIN_AT: &str = "login_at";
pub const FIELD_RENEW_AT: &str = "renew_at";

/// Session state for a single request.
///
/// Created by [`Session::load`] when a request arrives, mutated by the handler
/// through [`login`](Session::login), [`touch`](Session::touch) and
/// [`logout`](Session::logout), and written back as a cookie by
/// [`save`](Session::save) before the response leaves. Store writes happen
/// eagerly inside `login` and `touch`; `save` only emits the cookie.
#[derive(Debug, Clone)]
pub struct Session {
    manager: Arc<SessionManager>,
    user_agent: String,
    ip_addr: String,
    key: String,
    payload: SessionData,
    changed: bool,
}

impl Session {
    /// An anonymous session that has not looked at any request.
    pub fn new(manager: Arc<SessionManager>) -> Self {
        Self {
            manager,
            user_agent: String::new(),
            ip_addr: String::new(),
            key: String::new(),
            payload: SessionData::new(),
            changed: false,
        }
    }

    /// Build the session for an inbound request.
    ///
    /// Never fails: a missing cookie, a cookie minted for another user agent,
    /// a payload the store no longer has, and store failures all yield an
    /// anonymous session. On a store failure the cookie is left untouched.
    #[tracing::instrument(skip_all)]
    pub async fn load<C>(manager: Arc<SessionManager>, ctx: &C) -> Self
    where
        C: RequestContext + ?Sized,
    {
        let mut session = Self::new(manager);
        session.user_agent = ctx.user_agent().to_string();
        session.ip_addr = ctx.remote_addr();

        let cookie = ctx
            .cookie(session.manager.cookie_name())
            .unwrap_or_default();

        if cookie.is_empty() {
            return session;
        }

        if !cookie.starts_with(&session.state_prefix()) {
            // Issued to a different user agent: possibly a stolen cookie.
            // Only local state is cleared; the presented key is left alone.
            tracing::warn!(
                ip_addr = %session.ip_addr,
                "Session cookie does not match the user agent, discarding it"
            );
            session.logout_or_warn().await;
            return session;
        }

        let loaded = session.store().get_msx(&cookie).await;
        session.payload = match loaded {
            Ok(payload) => payload,
            Err(e) => {
                // The entry may still be valid: keep it and the browser cookie.
                tracing::warn!("Failed to read session payload, serving anonymously: {}", e);
                return session;
            }
        };
        session.key = cookie;

        if session.payload.is_empty() {
            tracing::debug!("Session payload missing or expired, logging out");
            session.logout_or_warn().await;
        }
        session
    }

    /// Mark the session as logged in with `payload`.
    ///
    /// `ip_addr`, `user_agent` and `login_at` are added to the payload, which
    /// then replaces the in-memory one and is written to the store with the
    /// full ttl. An anonymous session first gets a fresh key, claimed
    /// atomically together with the payload.
    #[tracing::instrument(skip_all)]
    pub async fn login(&mut self, mut payload: SessionData) -> Result<(), SessionError> {
        payload.insert(FIELD_IP_ADDR.to_string(), Value::from(self.ip_addr.clone()));
        payload.insert(
            FIELD_USER_AGENT.to_string(),
            Value::from(self.user_agent.clone()),
        );
        payload.insert(FIELD_LOGIN_AT.to_string(), Value::from(epoch_now()));

        let ttl = self.manager.expire_sec();
        if self.key.is_empty() {
            self.key = self.claim_key(&payload, ttl).await?;
        } else {
            self.store().fade_msx(&self.key, &payload, ttl).await?;
        }

        self.payload = payload;
        self.changed = true;
        tracing::debug!("Session logged in");
        Ok(())
    }

    /// Forget the session: delete its store entry and clear key and payload.
    ///
    /// Local state is cleared even when the store delete fails, so the next
    /// `save` still overwrites the browser cookie with an expired one.
    #[tracing::instrument(skip_all)]
    pub async fn logout(&mut self) -> Result<(), SessionError> {
        let key = std::mem::take(&mut self.key);
        self.payload = SessionData::new();
        self.changed = true;

        if !key.is_empty() {
            self.store().del(&key).await?;
        }
        tracing::debug!("Session logged out");
        Ok(())
    }

    /// Sliding expiration: when less than the renewal threshold is left,
    /// stamp `renew_at` and reset the store ttl to the full lifetime.
    ///
    /// Sessions that are not logged in, or whose store entry is gone, are
    /// left alone. Returns whether the session was renewed.
    #[tracing::instrument(skip_all)]
    pub async fn touch(&mut self) -> Result<bool, SessionError> {
        if self.key.is_empty() || self.payload.is_empty() {
            return Ok(false);
        }

        let remaining = self.store().expiry(&self.key).await?;
        if remaining == EXPIRY_ABSENT || remaining >= self.manager.renew_sec() {
            return Ok(false);
        }

        self.payload
            .insert(FIELD_RENEW_AT.to_string(), Value::from(epoch_now()));
        self.changed = true;
        self.store()
            .fade_msx(&self.key, &self.payload, self.manager.expire_sec())
            .await?;
        tracing::debug!(remaining, "Session renewed");
        Ok(true)
    }

    /// Write the session cookie into `headers` if anything changed.
    ///
    /// The cookie lifetime follows the ttl the store reports right now, so a
    /// logged out session gets an already expired cookie. Returns whether a
    /// cookie was written.
    #[tracing::instrument(skip_all)]
    pub async fn save(&self, headers: &mut HeaderMap) -> Result<bool, SessionError> {
        if !self.changed {
            return Ok(false);
        }

        let remaining = if self.key.is_empty() {
            0
        } else {
            match self.store().expiry(&self.key).await? {
                EXPIRY_PERSISTENT => self.manager.expire_sec(),
                remaining => remaining.max(0),
            }
        };
        let expires_at = TimeDelta::try_seconds(remaining)
            .and_then(|delta| Utc::now().checked_add_signed(delta))
            .ok_or_else(|| {
                SessionError::Cookie(format!("Cookie lifetime of {remaining}s is out of range"))
            })?;

        header_set_cookie(
            headers,
            self.manager.cookie_name(),
            &self.key,
            expires_at,
            remaining,
            self.manager.cookie_options(),
        )?;
        Ok(true)
    }

    /// Pick an unused key for this session.
    ///
    /// The existence check and the later write are separate store calls, so
    /// two concurrent callers can land on the same key. [`login`](Session::login)
    /// does not rely on this and claims its key atomically.
    pub async fn random_key(&mut self) -> Result<(), SessionError> {
        for _ in 0..MAX_KEY_ATTEMPTS {
            let candidate = self.candidate_key()?;
            if self.store().get_str(&candidate).await?.is_empty() {
                self.key = candidate;
                self.changed = true;
                return Ok(());
            }
            tracing::debug!("Session key collision, retrying");
        }
        Err(SessionError::KeyGeneration(MAX_KEY_ATTEMPTS))
    }

    async fn claim_key(&self, payload: &SessionData, ttl: i64) -> Result<String, SessionError> {
        for _ in 0..MAX_KEY_ATTEMPTS {
            let candidate = self.candidate_key()?;
            if self
                .store()
                .fade_msx_if_absent(&candidate, payload, ttl)
                .await?
            {
                return Ok(candidate);
            }
            tracing::debug!("Session key collision, retrying");
        }
        Err(SessionError::KeyGeneration(MAX_KEY_ATTEMPTS))
    }

    fn candidate_key(&self) -> Result<String, SessionError> {
        Ok(format!(
            "{}{}",
            self.state_prefix(),
            gen_random_base63(KEY_SUFFIX_LEN)?
        ))
    }

    async fn logout_or_warn(&mut self) {
        if let Err(e) = self.logout().await {
            tracing::warn!("Failed to delete session from store: {}", e);
        }
    }

    fn store(&self) -> &dyn SessionStore {
        self.manager.store()
    }

    /// Prefix the key must carry for the current user agent.
    pub fn state_prefix(&self) -> String {
        state_prefix(&self.user_agent)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn payload(&self) -> &SessionData {
        &self.payload
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.payload.get(field)
    }

    pub fn is_logged_in(&self) -> bool {
        !self.payload.is_empty()
    }

    pub fn is_changed(&self) -> bool {
        self.changed
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn ip_addr(&self) -> &str {
        &self.ip_addr
    }

    pub fn manager(&self) -> &Arc<SessionManager> {
        &self.manager
    }
}

impl fmt::Display for Session {
    /// `key: value | key: value`, keys in sorted order; empty when anonymous.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.payload.iter().enumerate() {
            if i > 0 {
                f.write_str(" | ")?;
            }
            match value {
                Value::String(s) => write!(f, "{key}: {s}")?,
                other => write!(f, "{key}: {other}")?,
            }
        }
        Ok(())
    }
}
