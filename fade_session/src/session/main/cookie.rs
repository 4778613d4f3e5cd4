use chrono::{DateTime, Utc};
use http::header::{HeaderMap, SET_COOKIE};

use crate::session::errors::SessionError;
use crate::session::types::CookieOptions;

pub(super) fn header_set_cookie(
    headers: &mut HeaderMap,
    name: &str,
    value: &str,
    expires_at: DateTime<Utc>,
    max_age: i64,
    options: &CookieOptions,
) -> Result<(), SessionError> {
    let mut cookie = format!(
        "{name}={value}; Path={}; Max-Age={max_age}; Expires={}",
        options.path,
        expires_at.format("%a, %d %b %Y %H:%M:%S GMT")
    );
    if options.http_only {
        cookie.push_str("; HttpOnly");
    }
    if options.secure {
        cookie.push_str("; Secure");
    }
    cookie.push_str(&format!("; SameSite={}", options.same_site));

    tracing::debug!("Set-Cookie: {}", cookie);
    headers.append(
        SET_COOKIE,
        cookie
            .parse()
            .map_err(|_| SessionError::Cookie("Failed to parse cookie".to_string()))?,
    );
    Ok(())
}
