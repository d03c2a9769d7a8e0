use crate::db;
use crate::ipc::helpers::{
    get_optional_f64, get_optional_str, get_required_str, with_db, HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use crate::model::Subscribe;
use rusqlite::Connection;
use serde_json::{json, Value};

fn handle_subscribes_list(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let student_id = get_optional_str(params, "studentId");
    let course_id = get_optional_str(params, "courseId");
    let subscribes = db::subscribes_snapshot(conn, student_id.as_deref(), course_id.as_deref())
        .map_err(HandlerErr::query)?;
    Ok(json!({ "subscribes": subscribes }))
}

/// Enrolls a student in a course. Enrolling again replaces the existing row,
/// including its score.
fn handle_subscribes_create(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let student_id = get_required_str(params, "studentId")?;
    let course_id = get_required_str(params, "courseId")?;
    let score = get_optional_f64(params, "score")?;

    if !db::row_exists(conn, "students", &student_id).map_err(HandlerErr::query)? {
        return Err(HandlerErr::not_found("student not found")
            .with_details(json!({ "studentId": student_id })));
    }
    if !db::row_exists(conn, "courses", &course_id).map_err(HandlerErr::query)? {
        return Err(HandlerErr::not_found("course not found")
            .with_details(json!({ "courseId": course_id })));
    }

    let subscribe = Subscribe {
        student_id,
        course_id,
        score,
    };
    db::upsert_subscribe(conn, &subscribe).map_err(|e| HandlerErr::insert("subscribes", e))?;
    Ok(json!({ "subscribe": subscribe }))
}

/// Teacher grading: sets (or with `null`, clears) the score of an existing
/// enrollment.
fn handle_subscribes_set_score(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let student_id = get_required_str(params, "studentId")?;
    let course_id = get_required_str(params, "courseId")?;
    if params.get("score").is_none() {
        return Err(HandlerErr::bad_params("missing score"));
    }
    let score = get_optional_f64(params, "score")?;

    let Some(mut subscribe) =
        db::get_subscribe(conn, &student_id, &course_id).map_err(HandlerErr::query)?
    else {
        return Err(HandlerErr::not_found("subscribe not found")
            .with_details(json!({ "studentId": student_id, "courseId": course_id })));
    };
    subscribe.score = score;
    db::upsert_subscribe(conn, &subscribe).map_err(|e| HandlerErr::update("subscribes", e))?;

    tracing::debug!(
        student = %subscribe.student_id,
        course = %subscribe.course_id,
        score = ?subscribe.score,
        "score updated"
    );
    Ok(json!({ "subscribe": subscribe, "evaluated": subscribe.is_evaluated() }))
}

fn handle_subscribes_delete(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let student_id = get_required_str(params, "studentId")?;
    let course_id = get_required_str(params, "courseId")?;
    let removed = conn
        .execute(
            "DELETE FROM subscribes WHERE student_id = ? AND course_id = ?",
            (&student_id, &course_id),
        )
        .map_err(|e| HandlerErr::delete("subscribes", e))?;
    if removed == 0 {
        return Err(HandlerErr::not_found("subscribe not found"));
    }
    Ok(json!({ "ok": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "subscribes.list" => Some(with_db(state, req, handle_subscribes_list)),
        "subscribes.create" => Some(with_db(state, req, handle_subscribes_create)),
        "subscribes.setScore" => Some(with_db(state, req, handle_subscribes_set_score)),
        "subscribes.delete" => Some(with_db(state, req, handle_subscribes_delete)),
        _ => None,
    }
}
