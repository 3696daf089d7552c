use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::handlers::setup;
use crate::ipc::types::{AppState, Request};
use crate::model::YearMonth;
use crate::roster::Dashboard;
use crate::{seed, store};
use rusqlite::Connection;
use serde_json::json;
use std::path::{Path, PathBuf};

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string())
        }),
    )
}

/// Loads roster and attendance, seeding demo data into an empty roster when
/// the workspace allows it. Returns whether seeding happened.
fn load_dashboard(conn: &Connection) -> anyhow::Result<(Dashboard, bool)> {
    let students = store::load_students(conn)?;
    if students.is_empty() && setup::seed_demo_data(conn) {
        let students = seed::demo_students();
        let attendance =
            seed::demo_attendance(&mut rand::thread_rng(), &students, YearMonth::current());
        store::save_dashboard(conn, &students, &attendance)?;
        return Ok((Dashboard::new(students, attendance), true));
    }
    let attendance = store::load_attendance(conn)?;
    Ok((Dashboard::new(students, attendance), false))
}

pub fn open_workspace(state: &mut AppState, path: &Path) -> anyhow::Result<bool> {
    let conn = db::open_db(path)?;
    let (dashboard, seeded) = load_dashboard(&conn)?;
    log::info!(
        "opened workspace {} ({} students{})",
        path.to_string_lossy(),
        dashboard.students.len(),
        if seeded { ", demo data seeded" } else { "" }
    );
    state.workspace = Some(path.to_path_buf());
    state.db = Some(conn);
    state.dashboard = dashboard;
    Ok(seeded)
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from);
    let Some(path) = p else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };

    match open_workspace(state, &path) {
        Ok(seeded) => ok(
            &req.id,
            json!({
                "workspacePath": path.to_string_lossy(),
                "studentCount": state.dashboard.students.len(),
                "seeded": seeded
            }),
        ),
        Err(e) => err(&req.id, "db_open_failed", format!("{e:?}"), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        _ => None,
    }
}
