use crate::db;
use crate::ipc::helpers::{
    get_id_or_new, get_optional_str, get_required_date, get_required_str, with_db, HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use crate::model::{is_evaluated_score, Teacher};
use rusqlite::Connection;
use serde_json::{json, Value};

fn require_teacher(conn: &Connection, teacher_id: &str) -> Result<(), HandlerErr> {
    if db::row_exists(conn, "teachers", teacher_id).map_err(HandlerErr::query)? {
        Ok(())
    } else {
        Err(HandlerErr::not_found("teacher not found")
            .with_details(json!({ "teacherId": teacher_id })))
    }
}

fn handle_teachers_list(conn: &Connection, _params: &Value) -> Result<Value, HandlerErr> {
    let teachers = db::list_teachers(conn).map_err(HandlerErr::query)?;
    Ok(json!({ "teachers": teachers }))
}

fn handle_teachers_get(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let teacher_id = get_required_str(params, "teacherId")?;
    match db::get_teacher(conn, &teacher_id).map_err(HandlerErr::query)? {
        Some(teacher) => Ok(json!({ "teacher": teacher })),
        None => Err(HandlerErr::not_found("teacher not found")
            .with_details(json!({ "teacherId": teacher_id }))),
    }
}

fn handle_teachers_create(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let teacher = Teacher {
        teacher_id: get_id_or_new(params, "teacherId"),
        last_name: get_required_str(params, "lastName")?,
        first_name: get_required_str(params, "firstName")?,
        date_of_birth: get_required_date(params, "dateOfBirth")?,
        email: get_optional_str(params, "email"),
    };
    db::upsert_teacher(conn, &teacher).map_err(|e| HandlerErr::insert("teachers", e))?;
    Ok(json!({ "teacherId": teacher.teacher_id, "teacher": teacher }))
}

fn handle_teachers_delete(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let teacher_id = get_required_str(params, "teacherId")?;
    require_teacher(conn, &teacher_id)?;

    let tx = conn
        .unchecked_transaction()
        .map_err(|e| HandlerErr::new("db_tx_failed", e.to_string()))?;
    let removed_teaches = tx
        .execute("DELETE FROM teaches WHERE teacher_id = ?", [&teacher_id])
        .map_err(|e| HandlerErr::delete("teaches", e))?;
    tx.execute("DELETE FROM teachers WHERE id = ?", [&teacher_id])
        .map_err(|e| HandlerErr::delete("teachers", e))?;
    tx.commit()
        .map_err(|e| HandlerErr::new("db_commit_failed", e.to_string()))?;

    Ok(json!({ "ok": true, "removedTeaches": removed_teaches }))
}

fn handle_teacher_courses(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let teacher_id = get_required_str(params, "teacherId")?;
    require_teacher(conn, &teacher_id)?;
    let courses = db::courses_for_teacher(conn, &teacher_id).map_err(HandlerErr::query)?;
    Ok(json!({ "teacherId": teacher_id, "courses": courses }))
}

/// Every subscription to a course the teacher teaches, with the names the
/// marks screen shows next to the score.
fn handle_teacher_roster(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let teacher_id = get_required_str(params, "teacherId")?;
    require_teacher(conn, &teacher_id)?;

    let mut stmt = conn
        .prepare(
            "SELECT
               sub.student_id,
               s.last_name,
               s.first_name,
               sub.course_id,
               c.name,
               c.credits,
               sub.score
             FROM subscribes sub
             JOIN teaches t ON t.course_id = sub.course_id
             JOIN students s ON s.id = sub.student_id
             JOIN courses c ON c.id = sub.course_id
             WHERE t.teacher_id = ?
             ORDER BY c.name, s.last_name, s.first_name, sub.student_id",
        )
        .map_err(HandlerErr::query)?;

    let rows = stmt
        .query_map([&teacher_id], |row| {
            let student_id: String = row.get(0)?;
            let last_name: String = row.get(1)?;
            let first_name: String = row.get(2)?;
            let course_id: String = row.get(3)?;
            let course_name: String = row.get(4)?;
            let credits: f64 = row.get(5)?;
            let score: Option<f64> = row.get(6)?;
            Ok(json!({
                "studentId": student_id,
                "displayName": format!("{}, {}", last_name, first_name),
                "courseId": course_id,
                "courseName": course_name,
                "credits": credits,
                "score": score,
                "evaluated": is_evaluated_score(score),
            }))
        })
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())
        .map_err(HandlerErr::query)?;

    Ok(json!({ "teacherId": teacher_id, "rows": rows }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "teachers.list" => Some(with_db(state, req, handle_teachers_list)),
        "teachers.get" => Some(with_db(state, req, handle_teachers_get)),
        "teachers.create" => Some(with_db(state, req, handle_teachers_create)),
        "teachers.delete" => Some(with_db(state, req, handle_teachers_delete)),
        "teacher.courses" => Some(with_db(state, req, handle_teacher_courses)),
        "teacher.roster" => Some(with_db(state, req, handle_teacher_roster)),
        _ => None,
    }
}
