use crate::db;
use crate::ipc::helpers::{
    get_id_or_new, get_level, get_optional_f64, get_required_str, with_db, HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use crate::model::Course;
use rusqlite::Connection;
use serde_json::{json, Value};

fn handle_courses_list(conn: &Connection, _params: &Value) -> Result<Value, HandlerErr> {
    let courses = db::courses_snapshot(conn).map_err(HandlerErr::query)?;
    Ok(json!({ "courses": courses }))
}

fn handle_courses_get(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let course_id = get_required_str(params, "courseId")?;
    match db::get_course(conn, &course_id).map_err(HandlerErr::query)? {
        Some(course) => Ok(json!({ "course": course })),
        None => Err(HandlerErr::not_found("course not found")
            .with_details(json!({ "courseId": course_id }))),
    }
}

fn handle_courses_create(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let name = get_required_str(params, "name")?;
    let Some(credits) = get_optional_f64(params, "credits")? else {
        return Err(HandlerErr::bad_params("missing credits"));
    };
    if credits < 0.0 {
        return Err(HandlerErr::bad_params("credits cannot be negative")
            .with_details(json!({ "credits": credits })));
    }

    let course = Course {
        course_id: get_id_or_new(params, "courseId"),
        name,
        credits,
        level: get_level(params, "level")?,
    };
    db::upsert_course(conn, &course).map_err(|e| HandlerErr::insert("courses", e))?;
    Ok(json!({ "courseId": course.course_id, "course": course }))
}

fn handle_courses_delete(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let course_id = get_required_str(params, "courseId")?;
    if !db::row_exists(conn, "courses", &course_id).map_err(HandlerErr::query)? {
        return Err(HandlerErr::not_found("course not found"));
    }

    let tx = conn
        .unchecked_transaction()
        .map_err(|e| HandlerErr::new("db_tx_failed", e.to_string()))?;

    // Dependents first; there is no ON DELETE CASCADE.
    let removed_subscribes = tx
        .execute("DELETE FROM subscribes WHERE course_id = ?", [&course_id])
        .map_err(|e| HandlerErr::delete("subscribes", e))?;
    let removed_teaches = tx
        .execute("DELETE FROM teaches WHERE course_id = ?", [&course_id])
        .map_err(|e| HandlerErr::delete("teaches", e))?;
    tx.execute("DELETE FROM courses WHERE id = ?", [&course_id])
        .map_err(|e| HandlerErr::delete("courses", e))?;

    tx.commit()
        .map_err(|e| HandlerErr::new("db_commit_failed", e.to_string()))?;

    Ok(json!({
        "ok": true,
        "removedSubscribes": removed_subscribes,
        "removedTeaches": removed_teaches
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "courses.list" => Some(with_db(state, req, handle_courses_list)),
        "courses.get" => Some(with_db(state, req, handle_courses_get)),
        "courses.create" => Some(with_db(state, req, handle_courses_create)),
        "courses.delete" => Some(with_db(state, req, handle_courses_delete)),
        _ => None,
    }
}
