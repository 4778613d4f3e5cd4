use axum::{Json, extract::Query};
use serde::{Deserialize, Serialize};
use serde_json::json;

use fade_session::{FIELD_LOGIN_AT, FIELD_RENEW_AT, SessionData};
use fade_session_axum::{SessionHandle, SessionResponseError};

#[derive(Debug, Serialize)]
pub(crate) struct SessionView {
    logged_in: bool,
    name: Option<String>,
    login_at: Option<i64>,
    renew_at: Option<i64>,
    summary: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginParams {
    name: String,
}

async fn view(session: &mut fade_session::Session) -> Result<SessionView, SessionResponseError> {
    session.touch().await?;
    Ok(SessionView {
        logged_in: session.is_logged_in(),
        name: session
            .get("name")
            .and_then(|v| v.as_str())
            .map(str::to_string),
        login_at: session.get(FIELD_LOGIN_AT).and_then(|v| v.as_i64()),
        renew_at: session.get(FIELD_RENEW_AT).and_then(|v| v.as_i64()),
        summary: session.to_string(),
    })
}

pub(crate) async fn index(session: SessionHandle) -> Result<Json<SessionView>, SessionResponseError> {
    let mut session = session.lock().await;
    Ok(Json(view(&mut session).await?))
}

pub(crate) async fn login(
    session: SessionHandle,
    Query(params): Query<LoginParams>,
) -> Result<Json<SessionView>, SessionResponseError> {
    let mut session = session.lock().await;
    let mut payload = SessionData::new();
    payload.insert("name".to_string(), json!(params.name));
    session.login(payload).await?;
    tracing::info!("{} logged in", params.name);
    Ok(Json(view(&mut session).await?))
}

pub(crate) async fn logout(session: SessionHandle) -> Result<Json<SessionView>, SessionResponseError> {
    let mut session = session.lock().await;
    session.logout().await?;
    Ok(Json(view(&mut session).await?))
}
