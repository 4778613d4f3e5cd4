use axum::extract::FromRequestParts;
use http::request::Parts;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

use fade_session::Session;

use super::error::SessionResponseError;

/// The current request's session, shared between the middleware and the handler.
///
/// # Example
///
/// ```no_run
/// use fade_session_axum::{SessionHandle, SessionResponseError};
///
/// async fn whoami(session: SessionHandle) -> Result<String, SessionResponseError> {
///     let mut session = session.lock().await;
///     session.touch().await?;
///     Ok(session.to_string())
/// }
/// ```
#[derive(Clone, Debug)]
pub struct SessionHandle(Arc<Mutex<Session>>);

impl SessionHandle {
    pub(crate) fn new(session: Session) -> Self {
        Self(Arc::new(Mutex::new(session)))
    }

    pub async fn lock(&self) -> MutexGuard<'_, Session> {
        self.0.lock().await
    }
}

impl<S> FromRequestParts<S> for SessionHandle
where
    S: Send + Sync,
{
    type Rejection = SessionResponseError;

    async fn from_request_parts(parts: &mut Parts, _: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionHandle>()
            .cloned()
            .ok_or(SessionResponseError::MissingMiddleware)
    }
}
