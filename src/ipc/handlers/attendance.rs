use crate::calc::{self, ClassFilter, Scope};
use crate::ipc::error::HandlerErr;
use crate::ipc::handlers::auth::require_session;
use crate::ipc::handlers::{commit_dashboard, with_dashboard};
use crate::ipc::handlers::setup;
use crate::ipc::helpers::{
    get_bool, get_day, get_month, get_optional_str, get_optional_u64, get_student_id, refresh_all,
};
use crate::ipc::types::{AppState, Request};
use crate::model::{Mark, DAYS_IN_GRID};
use crate::roster::Dashboard;
use rusqlite::Connection;
use serde_json::json;

fn scope_from_params(params: &serde_json::Value) -> Result<Scope, HandlerErr> {
    let month = get_month(params)?;
    let filter = get_optional_str(params, "classFilter")?;
    Ok(Scope {
        month,
        class_filter: ClassFilter::parse(filter.as_deref()),
    })
}

fn attendance_month_open(
    conn: &Connection,
    dashboard: &mut Dashboard,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    require_session(conn)?;
    let scope = scope_from_params(params)?;
    let rows: Vec<serde_json::Value> =
        calc::month_grid(&dashboard.students, &dashboard.attendance, &scope)
            .into_iter()
            .map(|row| {
                let marks: Vec<&str> = row.marks.iter().map(|m| m.as_str()).collect();
                json!({
                    "studentId": row.student_id,
                    "name": row.name,
                    "marks": marks
                })
            })
            .collect();

    Ok(json!({
        "month": scope.month,
        "classFilter": scope.class_filter.as_str(),
        "days": DAYS_IN_GRID,
        "rows": rows
    }))
}

fn attendance_toggle(
    conn: &Connection,
    dashboard: &mut Dashboard,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    require_session(conn)?;
    let student_id = get_student_id(params, "studentId")?;
    let month = get_month(params)?;
    let day = get_day(params)?;

    let mut next = dashboard.clone();
    let present = next.toggle_mark(&student_id, month, day)?;
    commit_dashboard(conn, dashboard, next)?;
    let mark = if present { Mark::Present } else { Mark::Absent };
    Ok(json!({
        "studentId": student_id,
        "month": month,
        "day": day,
        "mark": mark.as_str(),
        "present": present,
        "refresh": refresh_all()
    }))
}

fn attendance_set_mark(
    conn: &Connection,
    dashboard: &mut Dashboard,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    require_session(conn)?;
    let student_id = get_student_id(params, "studentId")?;
    let month = get_month(params)?;
    let day = get_day(params)?;
    let present = get_bool(params, "present")?;

    let mut next = dashboard.clone();
    next.set_mark(&student_id, month, day, present)?;
    commit_dashboard(conn, dashboard, next)?;
    Ok(json!({
        "studentId": student_id,
        "month": month,
        "day": day,
        "present": present,
        "refresh": refresh_all()
    }))
}

fn stats_summary(
    conn: &Connection,
    dashboard: &mut Dashboard,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    require_session(conn)?;
    let scope = scope_from_params(params)?;
    let days = get_optional_u64(params, "days")?.unwrap_or_else(|| setup::default_visible_days(conn));
    let days = calc::clamp_days(Some(days));

    let daily = calc::daily_totals(&dashboard.students, &dashboard.attendance, &scope);
    let summary = calc::range_summary(&daily, days);
    let chart = calc::chart_feed(&daily, days);

    Ok(json!({
        "month": scope.month,
        "classFilter": scope.class_filter.as_str(),
        "studentCount": daily.student_count,
        "days": summary.days,
        "totalPresent": summary.total_present,
        "totalAbsent": summary.total_absent,
        "percentPresent": summary.percent_present,
        "percentAbsent": summary.percent_absent,
        "chart": chart
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "attendance.monthOpen" => Some(with_dashboard(state, req, attendance_month_open)),
        "attendance.toggle" => Some(with_dashboard(state, req, attendance_toggle)),
        "attendance.setMark" => Some(with_dashboard(state, req, attendance_set_mark)),
        "stats.summary" => Some(with_dashboard(state, req, stats_summary)),
        _ => None,
    }
}
