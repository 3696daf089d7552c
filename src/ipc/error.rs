use crate::error::DomainError;
use serde_json::json;

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

pub fn event(name: &str, payload: serde_json::Value) -> serde_json::Value {
    json!({
        "event": name,
        "payload": payload,
    })
}

#[derive(Debug)]
pub struct HandlerErr {
    pub code: &'static str,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl HandlerErr {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        HandlerErr {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn bad_params(message: impl Into<String>) -> Self {
        Self::new("bad_params", message)
    }

    pub fn db_query(e: anyhow::Error) -> Self {
        Self::new("db_query_failed", format!("{e:#}"))
    }

    pub fn db_update(table: &str) -> impl FnOnce(anyhow::Error) -> Self + '_ {
        move |e| HandlerErr {
            code: "db_update_failed",
            message: format!("{e:#}"),
            details: Some(json!({ "record": table })),
        }
    }

    pub fn db_tx(e: rusqlite::Error) -> Self {
        Self::new("db_tx_failed", e.to_string())
    }

    pub fn io(e: anyhow::Error) -> Self {
        Self::new("io_failed", format!("{e:#}"))
    }

    pub fn response(self, id: &str) -> serde_json::Value {
        err(id, self.code, self.message, self.details)
    }
}

impl From<DomainError> for HandlerErr {
    fn from(e: DomainError) -> Self {
        HandlerErr::new(e.code(), e.message())
    }
}
