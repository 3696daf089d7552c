use crate::accounts;
use crate::ipc::error::{err, ok, HandlerErr};
use crate::ipc::handlers::setup;
use crate::ipc::helpers::{get_optional_str, get_required_str};
use crate::ipc::types::{AppState, Request};
use crate::session::{self, Session, SessionState};
use crate::store;
use rusqlite::Connection;
use serde_json::json;

/// Gate for dashboard methods. A successful call counts as user activity and
/// slides the session's expiry.
pub fn require_session(conn: &Connection) -> Result<Session, HandlerErr> {
    let now = session::now_ms();
    match session::extend(conn, now, setup::idle_timeout_ms(conn)).map_err(HandlerErr::db_query)? {
        SessionState::Active(s) => Ok(s),
        SessionState::Expired(_) => Err(HandlerErr::new(
            "session_expired",
            "session expired due to inactivity",
        )),
        SessionState::Anonymous => Err(HandlerErr::new("no_session", "login required")),
    }
}

fn session_json(state: &SessionState) -> serde_json::Value {
    match state {
        SessionState::Anonymous => json!({ "state": state.as_str() }),
        SessionState::Active(s) | SessionState::Expired(s) => json!({
            "state": state.as_str(),
            "email": s.email,
            "createdAt": s.created_at,
            "expiresAt": s.expires_at
        }),
    }
}

fn auth_register(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let email = get_required_str(params, "email")?;
    let password = get_required_str(params, "password")?;
    let confirm = get_optional_str(params, "confirmPassword")?.unwrap_or_else(|| password.clone());

    let mut all = store::load_accounts(conn).map_err(HandlerErr::db_query)?;
    accounts::register(&mut all, &email, &password, &confirm, session::now_ms())?;
    store::save_accounts(conn, &all).map_err(HandlerErr::db_update("users"))?;
    log::info!("registered account {}", email.trim());
    Ok(json!({ "email": email.trim() }))
}

fn auth_login(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let email = get_required_str(params, "email")?;
    let password = get_required_str(params, "password")?;

    let all = store::load_accounts(conn).map_err(HandlerErr::db_query)?;
    let account = match accounts::login(&all, &email, &password) {
        Ok(a) => a,
        Err(e) => {
            log::info!("login rejected for {}: {}", email.trim(), e.code());
            return Err(e.into());
        }
    };
    let s = session::begin(
        conn,
        &account.email,
        session::now_ms(),
        setup::idle_timeout_ms(conn),
    )
    .map_err(HandlerErr::db_update("sessionUser"))?;
    log::info!("login for {}", s.email);
    Ok(json!({
        "email": s.email,
        "expiresAt": s.expires_at,
        "redirect": "dashboard"
    }))
}

fn auth_logout(conn: &Connection) -> Result<serde_json::Value, HandlerErr> {
    session::end(conn).map_err(HandlerErr::db_update("sessionUser"))?;
    Ok(json!({ "redirect": "login" }))
}

fn session_get(conn: &Connection) -> Result<serde_json::Value, HandlerErr> {
    let state = session::current(conn, session::now_ms()).map_err(HandlerErr::db_query)?;
    Ok(session_json(&state))
}

fn session_touch(conn: &Connection) -> Result<serde_json::Value, HandlerErr> {
    let now = session::now_ms();
    let state =
        session::extend(conn, now, setup::idle_timeout_ms(conn)).map_err(HandlerErr::db_query)?;
    Ok(session_json(&state))
}

fn account_get(conn: &Connection) -> Result<serde_json::Value, HandlerErr> {
    let s = require_session(conn)?;
    let all = store::load_accounts(conn).map_err(HandlerErr::db_query)?;
    let created_at = all
        .iter()
        .find(|a| a.matches_email(&s.email))
        .map(|a| a.created_at);
    Ok(json!({
        "email": s.email,
        "createdAt": created_at,
        "sessionExpiresAt": s.expires_at
    }))
}

fn account_change_password(
    conn: &Connection,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let s = require_session(conn)?;
    let new_password = get_required_str(params, "newPassword")?;
    let mut all = store::load_accounts(conn).map_err(HandlerErr::db_query)?;
    accounts::change_password(&mut all, &s.email, &new_password)?;
    store::save_accounts(conn, &all).map_err(HandlerErr::db_update("users"))?;
    log::info!("password changed for {}", s.email);
    Ok(json!({ "ok": true }))
}

fn account_delete(conn: &Connection) -> Result<serde_json::Value, HandlerErr> {
    let s = require_session(conn)?;
    let mut all = store::load_accounts(conn).map_err(HandlerErr::db_query)?;
    let removed = accounts::remove(&mut all, &s.email);
    let tx = conn.unchecked_transaction().map_err(HandlerErr::db_tx)?;
    store::save_accounts(&tx, &all).map_err(HandlerErr::db_update("users"))?;
    session::end(&tx).map_err(HandlerErr::db_update("sessionUser"))?;
    tx.commit().map_err(HandlerErr::db_tx)?;
    log::info!("account {} deleted", s.email);
    Ok(json!({ "deleted": removed, "redirect": "login" }))
}

fn with_conn(
    state: &mut AppState,
    req: &Request,
    f: impl FnOnce(&Connection, &serde_json::Value) -> Result<serde_json::Value, HandlerErr>,
) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match f(conn, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "auth.register" => Some(with_conn(state, req, auth_register)),
        "auth.login" => Some(with_conn(state, req, auth_login)),
        "auth.logout" => Some(with_conn(state, req, |c, _| auth_logout(c))),
        "session.get" => Some(with_conn(state, req, |c, _| session_get(c))),
        "session.touch" => Some(with_conn(state, req, |c, _| session_touch(c))),
        "account.get" => Some(with_conn(state, req, |c, _| account_get(c))),
        "account.changePassword" => Some(with_conn(state, req, account_change_password)),
        "account.delete" => Some(with_conn(state, req, |c, _| account_delete(c))),
        _ => None,
    }
}
