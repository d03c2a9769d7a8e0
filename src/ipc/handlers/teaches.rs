use crate::db;
use crate::ipc::helpers::{get_optional_str, get_required_str, with_db, HandlerErr};
use crate::ipc::types::{AppState, Request};
use rusqlite::Connection;
use serde_json::{json, Value};

fn handle_teaches_list(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let teacher_id = get_optional_str(params, "teacherId");
    let course_id = get_optional_str(params, "courseId");
    let teaches = db::list_teaches(conn, teacher_id.as_deref(), course_id.as_deref())
        .map_err(HandlerErr::query)?;
    Ok(json!({ "teaches": teaches }))
}

fn handle_teaches_create(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let teacher_id = get_required_str(params, "teacherId")?;
    let course_id = get_required_str(params, "courseId")?;
    if !db::row_exists(conn, "teachers", &teacher_id).map_err(HandlerErr::query)? {
        return Err(HandlerErr::not_found("teacher not found")
            .with_details(json!({ "teacherId": teacher_id })));
    }
    if !db::row_exists(conn, "courses", &course_id).map_err(HandlerErr::query)? {
        return Err(HandlerErr::not_found("course not found")
            .with_details(json!({ "courseId": course_id })));
    }

    conn.execute(
        "INSERT OR REPLACE INTO teaches(teacher_id, course_id) VALUES(?, ?)",
        (&teacher_id, &course_id),
    )
    .map_err(|e| HandlerErr::insert("teaches", e))?;

    Ok(json!({ "teacherId": teacher_id, "courseId": course_id }))
}

fn handle_teaches_delete(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let teacher_id = get_required_str(params, "teacherId")?;
    let course_id = get_required_str(params, "courseId")?;
    let removed = conn
        .execute(
            "DELETE FROM teaches WHERE teacher_id = ? AND course_id = ?",
            (&teacher_id, &course_id),
        )
        .map_err(|e| HandlerErr::delete("teaches", e))?;
    if removed == 0 {
        return Err(HandlerErr::not_found("teach not found"));
    }
    Ok(json!({ "ok": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "teaches.list" => Some(with_db(state, req, handle_teaches_list)),
        "teaches.create" => Some(with_db(state, req, handle_teaches_create)),
        "teaches.delete" => Some(with_db(state, req, handle_teaches_delete)),
        _ => None,
    }
}
