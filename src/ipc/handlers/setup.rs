use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::model::DAYS_IN_GRID;
use crate::session;
use rusqlite::Connection;
use serde_json::{json, Map, Value};

#[derive(Clone, Copy)]
enum SetupSection {
    Session,
    Dashboard,
}

impl SetupSection {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "session" => Some(Self::Session),
            "dashboard" => Some(Self::Dashboard),
            _ => None,
        }
    }

    fn key(self) -> &'static str {
        match self {
            Self::Session => "setup.session",
            Self::Dashboard => "setup.dashboard",
        }
    }
}

fn default_section(section: SetupSection) -> Value {
    match section {
        SetupSection::Session => json!({
            "idleTimeoutMinutes": session::DEFAULT_IDLE_TIMEOUT_MINUTES
        }),
        SetupSection::Dashboard => json!({
            "defaultVisibleDays": DAYS_IN_GRID,
            "seedDemoData": true
        }),
    }
}

fn as_object_mut(value: &mut Value) -> Result<&mut Map<String, Value>, String> {
    value
        .as_object_mut()
        .ok_or_else(|| "internal setup object must be a JSON object".to_string())
}

fn parse_bool(v: &Value, key: &str) -> Result<bool, String> {
    v.as_bool()
        .ok_or_else(|| format!("{} must be boolean", key))
}

fn parse_i64_range(v: &Value, key: &str, min: i64, max: i64) -> Result<i64, String> {
    let n = v
        .as_i64()
        .ok_or_else(|| format!("{} must be integer", key))?;
    if !(min..=max).contains(&n) {
        return Err(format!("{} must be in {}..={}", key, min, max));
    }
    Ok(n)
}

fn merge_section_patch(
    section: SetupSection,
    current: &mut Value,
    patch: &Map<String, Value>,
) -> Result<(), String> {
    let obj = as_object_mut(current)?;
    for (k, v) in patch {
        match section {
            SetupSection::Session => match k.as_str() {
                "idleTimeoutMinutes" => {
                    obj.insert(k.clone(), Value::from(parse_i64_range(v, k, 1, 240)?));
                }
                _ => return Err(format!("unknown session field: {}", k)),
            },
            SetupSection::Dashboard => match k.as_str() {
                "defaultVisibleDays" => {
                    let max = i64::from(DAYS_IN_GRID);
                    obj.insert(k.clone(), Value::from(parse_i64_range(v, k, 1, max)?));
                }
                "seedDemoData" => {
                    obj.insert(k.clone(), Value::Bool(parse_bool(v, k)?));
                }
                _ => return Err(format!("unknown dashboard field: {}", k)),
            },
        }
    }
    Ok(())
}

fn load_section(conn: &Connection, section: SetupSection) -> anyhow::Result<Value> {
    let mut current = default_section(section);
    if let Some(saved) = db::settings_get_json(conn, section.key())? {
        if let Some(saved_obj) = saved.as_object() {
            // Best-effort apply: a bad stored value falls back to its default.
            let _ = merge_section_patch(section, &mut current, saved_obj);
        }
    }
    Ok(current)
}

fn section_field(conn: &Connection, section: SetupSection, field: &str) -> Value {
    match load_section(conn, section) {
        Ok(v) => v.get(field).cloned().unwrap_or(Value::Null),
        Err(e) => {
            log::warn!("could not read {}: {e:#}", section.key());
            default_section(section)
                .get(field)
                .cloned()
                .unwrap_or(Value::Null)
        }
    }
}

pub fn idle_timeout_ms(conn: &Connection) -> i64 {
    let minutes = section_field(conn, SetupSection::Session, "idleTimeoutMinutes")
        .as_i64()
        .unwrap_or(session::DEFAULT_IDLE_TIMEOUT_MINUTES);
    session::idle_ms(minutes)
}

pub fn default_visible_days(conn: &Connection) -> u64 {
    section_field(conn, SetupSection::Dashboard, "defaultVisibleDays")
        .as_u64()
        .unwrap_or(u64::from(DAYS_IN_GRID))
}

pub fn seed_demo_data(conn: &Connection) -> bool {
    section_field(conn, SetupSection::Dashboard, "seedDemoData")
        .as_bool()
        .unwrap_or(true)
}

fn handle_setup_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let session = match load_section(conn, SetupSection::Session) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let dashboard = match load_section(conn, SetupSection::Dashboard) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };

    ok(
        &req.id,
        json!({
            "session": session,
            "dashboard": dashboard
        }),
    )
}

fn handle_setup_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(section_raw) = req.params.get("section").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing section", None);
    };
    let Some(section) = SetupSection::parse(section_raw) else {
        return err(&req.id, "bad_params", "unknown section", None);
    };
    let Some(patch_obj) = req.params.get("patch").and_then(|v| v.as_object()) else {
        return err(&req.id, "bad_params", "patch must be an object", None);
    };

    let mut current = match load_section(conn, section) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    if let Err(msg) = merge_section_patch(section, &mut current, patch_obj) {
        return err(&req.id, "bad_params", msg, None);
    }
    if let Err(e) = db::settings_set_json(conn, section.key(), &current) {
        return err(&req.id, "db_update_failed", e.to_string(), None);
    }
    log::info!("updated {}", section.key());
    let mut result = json!({ "ok": true });
    result[section_raw] = current;
    ok(&req.id, result)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "setup.get" => Some(handle_setup_get(state, req)),
        "setup.update" => Some(handle_setup_update(state, req)),
        _ => None,
    }
}
