use chrono::{DateTime, Utc};

/// Session payload: arbitrary attributes keyed by name.
pub type SessionData = serde_json::Map<String, serde_json::Value>;

/// Remaining lifetime reported for a key that is absent or already expired.
pub const EXPIRY_ABSENT: i64 = -2;

/// Remaining lifetime reported for a key stored without an expiry.
pub const EXPIRY_PERSISTENT: i64 = -1;

/// A raw entry as the in-memory store keeps it.
///
/// Integers are kept in decimal and maps as JSON text, so every typed getter
/// reads the same representation a redis backend would return.
#[derive(Debug, Clone)]
pub(crate) struct CacheData {
    pub(crate) value: String,
    pub(crate) expires_at: Option<DateTime<Utc>>,
}

impl CacheData {
    pub(crate) fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }

    /// Whole seconds left, rounded up so a live entry never reports zero.
    pub(crate) fn remaining_secs(&self, now: DateTime<Utc>) -> i64 {
        match self.expires_at {
            None => EXPIRY_PERSISTENT,
            Some(at) if at <= now => EXPIRY_ABSENT,
            Some(at) => {
                let ms = (at - now).num_milliseconds();
                (ms + 999) / 1000
            }
        }
    }
}
