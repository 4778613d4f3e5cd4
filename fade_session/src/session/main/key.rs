use crate::utils::hash_base64url;

/// Separates the user-agent hash from the random part of a session key.
pub(crate) const KEY_SEPARATOR: char = '|';

/// Length of the random suffix of a session key.
pub(crate) const KEY_SUFFIX_LEN: usize = 8;

/// Attempts before key generation gives up.
pub(crate) const MAX_KEY_ATTEMPTS: usize = 16;

/// Prefix every session key issued to `user_agent` starts with.
///
/// A cookie replayed from a browser with another user agent fails this check.
/// The header is client controlled, so this deters casual cookie theft and is
/// no substitute for a CSRF token.
pub fn state_prefix(user_agent: &str) -> String {
    format!("{}{KEY_SEPARATOR}", hash_base64url(user_agent))
}
