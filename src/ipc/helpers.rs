use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::model::LevelCourse;
use chrono::NaiveDate;
use rusqlite::Connection;
use serde_json::{json, Value};
use std::fmt::Display;
use std::path::PathBuf;
use uuid::Uuid;

pub struct HandlerErr {
    pub code: &'static str,
    pub message: String,
    pub details: Option<Value>,
}

impl HandlerErr {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn bad_params(message: impl Into<String>) -> Self {
        Self::new("bad_params", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("not_found", message)
    }

    pub fn query(e: impl Display) -> Self {
        Self::new("db_query_failed", e.to_string())
    }

    pub fn insert(table: &str, e: impl Display) -> Self {
        Self::new("db_insert_failed", e.to_string()).with_details(json!({ "table": table }))
    }

    pub fn update(table: &str, e: impl Display) -> Self {
        Self::new("db_update_failed", e.to_string()).with_details(json!({ "table": table }))
    }

    pub fn delete(table: &str, e: impl Display) -> Self {
        Self::new("db_delete_failed", e.to_string()).with_details(json!({ "table": table }))
    }

    pub fn response(self, id: &str) -> Value {
        err(id, self.code, self.message, self.details)
    }
}

/// Runs `f` against the open workspace database and wraps the outcome in the
/// response envelope.
pub fn with_db<F>(state: &mut AppState, req: &Request, f: F) -> Value
where
    F: FnOnce(&Connection, &Value) -> Result<Value, HandlerErr>,
{
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match f(conn, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(e) => e.response(&req.id),
    }
}

pub fn get_required_str(params: &Value, key: &str) -> Result<String, HandlerErr> {
    match get_optional_str(params, key) {
        Some(v) => Ok(v),
        None => Err(HandlerErr::bad_params(format!("missing {}", key))),
    }
}

pub fn get_optional_str(params: &Value, key: &str) -> Option<String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Caller-supplied id, or a fresh UUID.
pub fn get_id_or_new(params: &Value, key: &str) -> String {
    get_optional_str(params, key).unwrap_or_else(|| Uuid::new_v4().to_string())
}

pub fn get_required_date(params: &Value, key: &str) -> Result<String, HandlerErr> {
    let raw = get_required_str(params, key)?;
    match NaiveDate::parse_from_str(&raw, "%Y-%m-%d") {
        Ok(date) => Ok(date.format("%Y-%m-%d").to_string()),
        Err(_) => Err(
            HandlerErr::bad_params(format!("{} must be a YYYY-MM-DD date", key))
                .with_details(json!({ key: raw })),
        ),
    }
}

pub fn get_level(params: &Value, key: &str) -> Result<LevelCourse, HandlerErr> {
    let Some(raw) = get_optional_str(params, key) else {
        return Ok(LevelCourse::default());
    };
    LevelCourse::parse(&raw).ok_or_else(|| {
        let allowed: Vec<&str> = LevelCourse::ALL.iter().map(|l| l.as_str()).collect();
        HandlerErr::bad_params(format!("unknown {}", key))
            .with_details(json!({ key: raw, "allowed": allowed }))
    })
}

/// Absent or null yields `None`. Numeric strings are accepted.
pub fn get_optional_f64(params: &Value, key: &str) -> Result<Option<f64>, HandlerErr> {
    let parsed = match params.get(key) {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    };
    match parsed {
        Some(v) if v.is_finite() => Ok(Some(v)),
        _ => Err(HandlerErr::bad_params(format!("{} must be a number", key))
            .with_details(json!({ key: params.get(key) }))),
    }
}

pub fn csv_quote(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

pub fn write_text_file(path: &str, contents: &str) -> Result<(), HandlerErr> {
    let out = PathBuf::from(path);
    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            HandlerErr::new("export_failed", e.to_string()).with_details(json!({ "path": path }))
        })?;
    }
    std::fs::write(&out, contents).map_err(|e| {
        HandlerErr::new("export_failed", e.to_string()).with_details(json!({ "path": path }))
    })?;
    Ok(())
}
