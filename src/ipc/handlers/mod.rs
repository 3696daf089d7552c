use crate::ipc::error::{err, ok, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::roster::Dashboard;
use crate::store;
use rusqlite::Connection;

pub mod attendance;
pub mod auth;
pub mod core;
pub mod data;
pub mod setup;
pub mod students;

type DashboardOp =
    fn(&Connection, &mut Dashboard, &serde_json::Value) -> Result<serde_json::Value, HandlerErr>;

/// Runs a dashboard operation against the open workspace and wraps the
/// outcome in a response envelope.
pub fn with_dashboard(state: &mut AppState, req: &Request, op: DashboardOp) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match op(conn, &mut state.dashboard, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(e) => e.response(&req.id),
    }
}

/// Persists `next` in one transaction and swaps it in only once the write
/// has committed, so a failed call leaves memory and store untouched.
pub fn commit_dashboard(
    conn: &Connection,
    dashboard: &mut Dashboard,
    next: Dashboard,
) -> Result<(), HandlerErr> {
    store::save_dashboard(conn, &next.students, &next.attendance)
        .map_err(HandlerErr::db_update("students,attendance"))?;
    *dashboard = next;
    Ok(())
}
