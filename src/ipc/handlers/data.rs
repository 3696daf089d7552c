use crate::exchange::{self, ImportPayload, ATTENDANCE_ENTRY, STUDENTS_ENTRY};
use crate::ipc::error::HandlerErr;
use crate::ipc::handlers::auth::require_session;
use crate::ipc::handlers::{commit_dashboard, with_dashboard};
use crate::ipc::helpers::{get_optional_str, get_required_str, refresh_all};
use crate::ipc::types::{AppState, Request};
use crate::roster::Dashboard;
use rusqlite::Connection;
use serde_json::json;
use std::path::PathBuf;

/// Writes `text` to `params.path` when given; otherwise hands the document
/// back so the client can offer it as a download named `file_name`.
fn deliver(
    params: &serde_json::Value,
    file_name: &str,
    text: String,
) -> Result<serde_json::Value, HandlerErr> {
    match get_optional_str(params, "path")? {
        Some(path) => {
            let out = PathBuf::from(path);
            exchange::write_text(&out, &text).map_err(HandlerErr::io)?;
            log::info!("exported {} to {}", file_name, out.to_string_lossy());
            Ok(json!({ "path": out.to_string_lossy(), "fileName": file_name }))
        }
        None => Ok(json!({ "fileName": file_name, "content": text })),
    }
}

fn data_export_students(
    conn: &Connection,
    dashboard: &mut Dashboard,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    require_session(conn)?;
    let text = exchange::students_json(&dashboard.students).map_err(HandlerErr::io)?;
    let mut result = deliver(params, STUDENTS_ENTRY, text)?;
    result["studentCount"] = json!(dashboard.students.len());
    Ok(result)
}

fn data_export_attendance(
    conn: &Connection,
    dashboard: &mut Dashboard,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    require_session(conn)?;
    let text = exchange::attendance_json(&dashboard.attendance).map_err(HandlerErr::io)?;
    let mut result = deliver(params, ATTENDANCE_ENTRY, text)?;
    result["studentCount"] = json!(dashboard.attendance.student_count());
    Ok(result)
}

fn data_export_bundle(
    conn: &Connection,
    dashboard: &mut Dashboard,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    require_session(conn)?;
    let out = PathBuf::from(get_required_str(params, "path")?);
    let summary = exchange::export_bundle(&dashboard.students, &dashboard.attendance, &out)
        .map_err(HandlerErr::io)?;
    log::info!(
        "exported bundle {} ({} entries)",
        out.to_string_lossy(),
        summary.entry_count
    );
    Ok(json!({
        "path": out.to_string_lossy(),
        "bundleFormat": summary.bundle_format,
        "entryCount": summary.entry_count,
        "studentCount": dashboard.students.len()
    }))
}

fn read_payload(params: &serde_json::Value) -> Result<ImportPayload, HandlerErr> {
    if let Some(text) = get_optional_str(params, "text")? {
        return Ok(exchange::parse_import(&text)?);
    }
    let Some(path) = get_optional_str(params, "path")? else {
        return Err(HandlerErr::bad_params("missing path or text"));
    };
    let payload = exchange::read_import_file(&PathBuf::from(path)).map_err(HandlerErr::io)?;
    Ok(payload?)
}

/// Replaces whichever collections the document carries. A bare array only
/// touches the roster.
fn data_import(
    conn: &Connection,
    dashboard: &mut Dashboard,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    require_session(conn)?;
    let (students, attendance) = match read_payload(params)? {
        ImportPayload::Roster(students) => (Some(students), None),
        ImportPayload::Document {
            students,
            attendance,
        } => (students, attendance),
    };
    let students_replaced = students.is_some();
    let attendance_replaced = attendance.is_some();
    let mut next = dashboard.clone();
    if let Some(students) = students {
        next.replace_students(students)?;
    }
    if let Some(book) = attendance {
        next.attendance = book;
    }
    commit_dashboard(conn, dashboard, next)?;
    log::info!(
        "import applied (students: {}, attendance: {}), {} students now",
        students_replaced,
        attendance_replaced,
        dashboard.students.len()
    );

    Ok(json!({
        "studentsReplaced": students_replaced,
        "attendanceReplaced": attendance_replaced,
        "studentCount": dashboard.students.len(),
        "refresh": refresh_all()
    }))
}

fn data_clear(
    conn: &Connection,
    dashboard: &mut Dashboard,
    _params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    require_session(conn)?;
    let mut next = dashboard.clone();
    next.clear();
    commit_dashboard(conn, dashboard, next)?;
    log::info!("cleared students and attendance");
    Ok(json!({ "ok": true, "refresh": refresh_all() }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "data.exportStudents" => Some(with_dashboard(state, req, data_export_students)),
        "data.exportAttendance" => Some(with_dashboard(state, req, data_export_attendance)),
        "data.exportBundle" => Some(with_dashboard(state, req, data_export_bundle)),
        "data.import" => Some(with_dashboard(state, req, data_import)),
        "data.clear" => Some(with_dashboard(state, req, data_clear)),
        _ => None,
    }
}
