use axum::response::{IntoResponse, Response};
use http::StatusCode;

use fade_session::SessionError;

/// Error returned to the client when session handling fails.
#[derive(Debug)]
pub enum SessionResponseError {
    /// The handler asked for a session but the router has no session middleware.
    MissingMiddleware,
    Session(SessionError),
}

impl From<SessionError> for SessionResponseError {
    fn from(err: SessionError) -> Self {
        Self::Session(err)
    }
}

impl IntoResponse for SessionResponseError {
    fn into_response(self) -> Response {
        match self {
            Self::MissingMiddleware => {
                tracing::error!("SessionHandle requested but the session middleware is not installed");
            }
            Self::Session(e) => {
                tracing::error!("Session error: {}", e);
            }
        }
        (StatusCode::INTERNAL_SERVER_ERROR, "Session error").into_response()
    }
}
