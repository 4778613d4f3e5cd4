use http::HeaderMap;
use http::header::{COOKIE, USER_AGENT};
use std::net::SocketAddr;

/// The parts of an inbound request the session layer reads.
pub trait RequestContext {
    /// `User-Agent` header, empty when absent.
    fn user_agent(&self) -> &str;

    /// Peer address as text, empty when unknown.
    fn remote_addr(&self) -> String;

    /// Value of the named cookie, if the request carries it.
    fn cookie(&self, name: &str) -> Option<String>;
}

/// [`RequestContext`] over plain `http` request headers.
#[derive(Debug, Clone, Copy)]
pub struct HeaderContext<'a> {
    headers: &'a HeaderMap,
    remote_addr: Option<SocketAddr>,
}

impl<'a> HeaderContext<'a> {
    pub fn new(headers: &'a HeaderMap, remote_addr: Option<SocketAddr>) -> Self {
        Self {
            headers,
            remote_addr,
        }
    }
}

impl RequestContext for HeaderContext<'_> {
    fn user_agent(&self) -> &str {
        self.headers
            .get(USER_AGENT)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
    }

    fn remote_addr(&self) -> String {
        if let Some(addr) = self.remote_addr {
            return addr.to_string();
        }
        // Behind a proxy the socket address is not handed to us; take the first hop.
        self.headers
            .get("x-forwarded-for")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(|hop| hop.trim().to_string())
            .unwrap_or_default()
    }

    fn cookie(&self, name: &str) -> Option<String> {
        get_cookie_from_headers(self.headers, name)
    }
}

pub(crate) fn get_cookie_from_headers(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let value = headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|header| match header.to_str() {
            Ok(s) => Some(s),
            Err(e) => {
                tracing::debug!("Skipping non-ASCII cookie header: {}", e);
                None
            }
        })
        .flat_map(|s| s.split(';'))
        .map(|s| s.trim())
        .find_map(|s| {
            let mut parts = s.splitn(2, '=');
            match (parts.next(), parts.next()) {
                (Some(k), Some(v)) if k == cookie_name => Some(v.to_string()),
                _ => None,
            }
        });

    if value.is_none() {
        tracing::debug!("No session cookie '{}' found in cookies", cookie_name);
    }
    value
}
