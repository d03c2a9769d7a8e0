use crate::db;
use crate::ipc::helpers::{
    get_id_or_new, get_level, get_optional_str, get_required_date, get_required_str, with_db,
    HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use crate::model::{Gender, Student};
use rusqlite::Connection;
use serde_json::{json, Value};

fn handle_students_list(conn: &Connection, _params: &Value) -> Result<Value, HandlerErr> {
    let students = db::list_students(conn).map_err(HandlerErr::query)?;
    Ok(json!({ "students": students }))
}

fn handle_students_get(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let student_id = get_required_str(params, "studentId")?;
    match db::get_student(conn, &student_id).map_err(HandlerErr::query)? {
        Some(student) => Ok(json!({ "student": student })),
        None => Err(HandlerErr::not_found("student not found")
            .with_details(json!({ "studentId": student_id }))),
    }
}

/// Inserts a new student or replaces the one with the same `studentId`.
fn handle_students_create(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let last_name = get_required_str(params, "lastName")?;
    let first_name = get_required_str(params, "firstName")?;
    let date_of_birth = get_required_date(params, "dateOfBirth")?;
    let gender = get_optional_str(params, "gender")
        .map(|g| Gender::from_str_lossy(&g))
        .unwrap_or(Gender::NotConcerned);
    let level = get_level(params, "level")?;

    let student = Student {
        student_id: get_id_or_new(params, "studentId"),
        last_name,
        first_name,
        date_of_birth,
        gender,
        email: get_optional_str(params, "email"),
        level,
    };
    db::upsert_student(conn, &student).map_err(|e| HandlerErr::insert("students", e))?;

    Ok(json!({ "studentId": student.student_id, "student": student }))
}

fn handle_students_delete(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let student_id = get_required_str(params, "studentId")?;
    if !db::row_exists(conn, "students", &student_id).map_err(HandlerErr::query)? {
        return Err(HandlerErr::not_found("student not found"));
    }

    let tx = conn
        .unchecked_transaction()
        .map_err(|e| HandlerErr::new("db_tx_failed", e.to_string()))?;

    let removed_subscribes = tx
        .execute("DELETE FROM subscribes WHERE student_id = ?", [&student_id])
        .map_err(|e| HandlerErr::delete("subscribes", e))?;
    tx.execute("DELETE FROM students WHERE id = ?", [&student_id])
        .map_err(|e| HandlerErr::delete("students", e))?;

    tx.commit()
        .map_err(|e| HandlerErr::new("db_commit_failed", e.to_string()))?;

    Ok(json!({ "ok": true, "removedSubscribes": removed_subscribes }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "students.list" => Some(with_db(state, req, handle_students_list)),
        "students.get" => Some(with_db(state, req, handle_students_get)),
        "students.create" => Some(with_db(state, req, handle_students_create)),
        "students.delete" => Some(with_db(state, req, handle_students_delete)),
        _ => None,
    }
}
