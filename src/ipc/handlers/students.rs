use crate::calc::class_options;
use crate::ipc::error::HandlerErr;
use crate::ipc::handlers::auth::require_session;
use crate::ipc::handlers::{commit_dashboard, with_dashboard};
use crate::ipc::helpers::{get_student_id, refresh_all};
use crate::ipc::types::{AppState, Request};
use crate::roster::{Dashboard, StudentForm};
use rusqlite::Connection;
use serde_json::json;

fn students_list(
    conn: &Connection,
    dashboard: &mut Dashboard,
    _params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    require_session(conn)?;
    Ok(json!({ "students": dashboard.students }))
}

fn students_create(
    conn: &Connection,
    dashboard: &mut Dashboard,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    require_session(conn)?;
    let form: StudentForm = serde_json::from_value(params.clone())
        .map_err(|e| HandlerErr::bad_params(format!("invalid student form: {}", e)))?;

    let mut next = dashboard.clone();
    let student = next.add(form)?.clone();
    commit_dashboard(conn, dashboard, next)?;
    log::info!("added student {} ({})", student.name, student.id);
    Ok(json!({
        "student": student,
        "refresh": refresh_all()
    }))
}

fn students_delete(
    conn: &Connection,
    dashboard: &mut Dashboard,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    require_session(conn)?;
    let id = get_student_id(params, "id")?;
    let mut next = dashboard.clone();
    let removed = next.delete(&id)?;
    commit_dashboard(conn, dashboard, next)?;
    log::info!("deleted student {} ({})", removed.name, removed.id);
    Ok(json!({
        "deleted": removed.id,
        "refresh": refresh_all()
    }))
}

fn students_classes(
    conn: &Connection,
    dashboard: &mut Dashboard,
    _params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    require_session(conn)?;
    let classes = class_options(&dashboard.students);
    let mut options = vec!["all".to_string()];
    options.extend(classes.iter().cloned());
    Ok(json!({
        "classes": classes,
        "options": options
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.list" => Some(with_dashboard(state, req, students_list)),
        "students.create" => Some(with_dashboard(state, req, students_create)),
        "students.delete" => Some(with_dashboard(state, req, students_delete)),
        "students.classes" => Some(with_dashboard(state, req, students_classes)),
        _ => None,
    }
}
