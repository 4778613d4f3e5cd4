use axum::{
    Router,
    extract::{ConnectInfo, Request, State},
    middleware::{Next, from_fn_with_state},
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;
use std::sync::Arc;

use fade_session::{HeaderContext, Session, SessionManager};

use super::error::SessionResponseError;
use super::session::SessionHandle;

/// Load the session before the handler runs and write its cookie afterwards.
///
/// The peer address comes from `ConnectInfo<SocketAddr>` when the server was
/// started with `into_make_service_with_connect_info`.
pub async fn session_middleware(
    State(manager): State<Arc<SessionManager>>,
    mut req: Request,
    next: Next,
) -> Response {
    let remote_addr = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    let session = Session::load(manager, &HeaderContext::new(req.headers(), remote_addr)).await;
    let handle = SessionHandle::new(session);
    req.extensions_mut().insert(handle.clone());

    let mut response = next.run(req).await;

    let session = handle.lock().await;
    if let Err(e) = session.save(response.headers_mut()).await {
        return SessionResponseError::from(e).into_response();
    }
    response
}

/// Install [`session_middleware`] on every route of `router`.
pub fn with_sessions<S>(router: Router<S>, manager: Arc<SessionManager>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(from_fn_with_state(manager, session_middleware))
}
