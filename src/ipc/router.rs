use super::handlers;
use super::types::{AppState, Request};
use crate::ipc::error::{err, event};
use crate::session;
use serde_json::json;

pub fn handle_request(state: &mut AppState, req: Request) -> serde_json::Value {
    if let Some(resp) = handlers::core::try_handle(state, &req) {
        return resp;
    }
    if let Some(resp) = handlers::setup::try_handle(state, &req) {
        return resp;
    }
    if let Some(resp) = handlers::auth::try_handle(state, &req) {
        return resp;
    }
    if let Some(resp) = handlers::students::try_handle(state, &req) {
        return resp;
    }
    if let Some(resp) = handlers::attendance::try_handle(state, &req) {
        return resp;
    }
    if let Some(resp) = handlers::data::try_handle(state, &req) {
        return resp;
    }

    err(
        &req.id,
        "not_implemented",
        format!("unknown method: {}", req.method),
        None,
    )
}

/// Periodic expiry check. Returns an event line for the client when a
/// session was just cleared.
pub fn handle_sweep(state: &mut AppState) -> Option<serde_json::Value> {
    let conn = state.db.as_ref()?;
    match session::sweep(conn, session::now_ms()) {
        Ok(Some(expired)) => Some(event(
            "session.expired",
            json!({
                "email": expired.email,
                "expiredAt": expired.expires_at,
                "redirect": "login"
            }),
        )),
        Ok(None) => None,
        Err(e) => {
            log::warn!("session sweep failed: {e:#}");
            None
        }
    }
}
