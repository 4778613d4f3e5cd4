//! Test utilities shared by the session and storage tests
//!
//! `SpyStore` wraps the in-memory store, counts the calls the session layer
//! makes, and lets a test pin the ttl the store reports.

use async_trait::async_trait;
use http::{HeaderMap, HeaderValue};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use crate::session::{HeaderContext, SessionManager};
use crate::storage::{InMemorySessionStore, SessionData, SessionStore, StorageError};

#[derive(Default)]
pub(crate) struct SpyStore {
    inner: InMemorySessionStore,
    forced_expiry: Mutex<Option<i64>>,
    occupied: AtomicBool,
    failing_reads: AtomicBool,
    fade_msx_calls: AtomicUsize,
    claim_calls: AtomicUsize,
    expiry_calls: AtomicUsize,
    del_calls: AtomicUsize,
}

impl SpyStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Make `expiry` report `ttl` for every key until reset with `None`.
    pub(crate) fn force_expiry(&self, ttl: Option<i64>) {
        if let Ok(mut forced) = self.forced_expiry.lock() {
            *forced = ttl;
        }
    }

    /// Pretend every key already exists.
    pub(crate) fn set_occupied(&self, occupied: bool) {
        self.occupied.store(occupied, Ordering::SeqCst);
    }

    /// Make reads fail as if the backend were down.
    pub(crate) fn set_failing_reads(&self, failing: bool) {
        self.failing_reads.store(failing, Ordering::SeqCst);
    }

    pub(crate) fn fade_msx_calls(&self) -> usize {
        self.fade_msx_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn claim_calls(&self) -> usize {
        self.claim_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn expiry_calls(&self) -> usize {
        self.expiry_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn del_calls(&self) -> usize {
        self.del_calls.load(Ordering::SeqCst)
    }

    /// Payload as stored, bypassing the counters.
    pub(crate) async fn stored(&self, key: &str) -> SessionData {
        self.inner.get_msx(key).await.unwrap_or_default()
    }

    fn check_reads(&self) -> Result<(), StorageError> {
        if self.failing_reads.load(Ordering::SeqCst) {
            return Err(StorageError::Storage("Connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl SessionStore for SpyStore {
    async fn del(&self, key: &str) -> Result<(), StorageError> {
        self.del_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.del(key).await
    }

    async fn expiry(&self, key: &str) -> Result<i64, StorageError> {
        self.expiry_calls.fetch_add(1, Ordering::SeqCst);
        let forced = self.forced_expiry.lock().ok().and_then(|forced| *forced);
        match forced {
            Some(ttl) => Ok(ttl),
            None => self.inner.expiry(key).await,
        }
    }

    async fn fade_str(&self, key: &str, val: &str, ttl: i64) -> Result<(), StorageError> {
        self.inner.fade_str(key, val, ttl).await
    }

    async fn fade_int(&self, key: &str, val: i64, ttl: i64) -> Result<(), StorageError> {
        self.inner.fade_int(key, val, ttl).await
    }

    async fn fade_msx(
        &self,
        key: &str,
        val: &SessionData,
        ttl: i64,
    ) -> Result<(), StorageError> {
        self.fade_msx_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.fade_msx(key, val, ttl).await
    }

    async fn fade_msx_if_absent(
        &self,
        key: &str,
        val: &SessionData,
        ttl: i64,
    ) -> Result<bool, StorageError> {
        self.claim_calls.fetch_add(1, Ordering::SeqCst);
        if self.occupied.load(Ordering::SeqCst) {
            return Ok(false);
        }
        self.inner.fade_msx_if_absent(key, val, ttl).await
    }

    async fn get_str(&self, key: &str) -> Result<String, StorageError> {
        self.check_reads()?;
        if self.occupied.load(Ordering::SeqCst) {
            return Ok("taken".to_string());
        }
        self.inner.get_str(key).await
    }

    async fn get_int(&self, key: &str) -> Result<i64, StorageError> {
        self.check_reads()?;
        self.inner.get_int(key).await
    }

    async fn get_msx(&self, key: &str) -> Result<SessionData, StorageError> {
        self.check_reads()?;
        self.inner.get_msx(key).await
    }

    async fn inc(&self, key: &str) -> Result<i64, StorageError> {
        self.inner.inc(key).await
    }

    async fn set_str(&self, key: &str, val: &str) -> Result<(), StorageError> {
        self.inner.set_str(key, val).await
    }

    async fn set_int(&self, key: &str, val: i64) -> Result<(), StorageError> {
        self.inner.set_int(key, val).await
    }

    async fn set_msx(&self, key: &str, val: &SessionData) -> Result<(), StorageError> {
        self.inner.set_msx(key, val).await
    }
}

pub(crate) fn test_manager(
    store: Arc<dyn SessionStore>,
    expire_sec: u64,
    renew_sec: u64,
) -> Arc<SessionManager> {
    Arc::new(SessionManager::new(
        "SK",
        Duration::from_secs(expire_sec),
        Duration::from_secs(renew_sec),
        store,
    ))
}

/// Inbound request headers for session tests.
pub(crate) struct TestRequest {
    pub(crate) headers: HeaderMap,
    pub(crate) remote_addr: SocketAddr,
}

impl TestRequest {
    pub(crate) fn context(&self) -> HeaderContext<'_> {
        HeaderContext::new(&self.headers, Some(self.remote_addr))
    }
}

pub(crate) fn request_headers(user_agent: &str, cookie: Option<&str>) -> TestRequest {
    let mut headers = HeaderMap::new();
    headers.insert(
        http::header::USER_AGENT,
        HeaderValue::from_str(user_agent).unwrap(),
    );
    if let Some(cookie) = cookie {
        headers.insert(
            http::header::COOKIE,
            HeaderValue::from_str(&format!("SK={cookie}")).unwrap(),
        );
    }
    TestRequest {
        headers,
        remote_addr: SocketAddr::from(([192, 0, 2, 10], 40000)),
    }
}

/// Value of the session cookie written into response headers, if any.
pub(crate) fn set_cookie_value(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(http::header::SET_COOKIE)?.to_str().ok()?;
    let pair = raw.split(';').next()?;
    pair.strip_prefix("SK=").map(|v| v.to_string())
}
