use crate::ipc::error::HandlerErr;
use crate::model::{StudentId, YearMonth};
use serde_json::Value;

pub fn get_required_str(params: &Value, key: &str) -> Result<String, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

/// Missing and JSON null are both "not provided"; any other non-string is
/// rejected.
pub fn get_optional_str(params: &Value, key: &str) -> Result<Option<String>, HandlerErr> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_str()
            .map(|s| Some(s.to_string()))
            .ok_or_else(|| HandlerErr::bad_params(format!("{} must be string", key))),
    }
}

pub fn get_student_id(params: &Value, key: &str) -> Result<StudentId, HandlerErr> {
    let v = params
        .get(key)
        .filter(|v| v.is_string() || v.is_number())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))?;
    serde_json::from_value(v.clone())
        .map_err(|_| HandlerErr::bad_params(format!("{} must be string or number", key)))
}

pub fn get_day(params: &Value) -> Result<u8, HandlerErr> {
    let raw = params
        .get("day")
        .and_then(|v| v.as_u64())
        .ok_or_else(|| HandlerErr::bad_params("missing day"))?;
    u8::try_from(raw).map_err(|_| HandlerErr::bad_params("day out of range"))
}

pub fn get_bool(params: &Value, key: &str) -> Result<bool, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_bool())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

/// `month` as `YYYY-MM`; defaults to the current month when omitted.
pub fn get_month(params: &Value) -> Result<YearMonth, HandlerErr> {
    match get_optional_str(params, "month")? {
        None => Ok(YearMonth::current()),
        Some(raw) => raw.parse::<YearMonth>().map_err(HandlerErr::from),
    }
}

pub fn get_optional_u64(params: &Value, key: &str) -> Result<Option<u64>, HandlerErr> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_u64()
            .map(Some)
            .ok_or_else(|| HandlerErr::bad_params(format!("{} must be a positive integer", key))),
    }
}

/// Views the client should redraw after a roster or attendance mutation.
pub fn refresh_all() -> Value {
    serde_json::json!(["students", "attendance", "classes", "stats"])
}
