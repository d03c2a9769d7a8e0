use crate::calc::{self, Transcript};
use crate::db;
use crate::ipc::helpers::{csv_quote, get_required_str, with_db, write_text_file, HandlerErr};
use crate::ipc::types::{AppState, Request};
use rusqlite::Connection;
use serde_json::{json, Value};

fn load_transcript(conn: &Connection, student_id: &str) -> Result<Transcript, HandlerErr> {
    if !db::row_exists(conn, "students", student_id).map_err(HandlerErr::query)? {
        return Err(HandlerErr::not_found("student not found")
            .with_details(json!({ "studentId": student_id })));
    }
    let subscribes =
        db::subscribes_snapshot(conn, Some(student_id), None).map_err(HandlerErr::query)?;
    let courses = db::courses_snapshot(conn).map_err(HandlerErr::query)?;
    Ok(calc::transcript(student_id, &subscribes, &courses))
}

fn handle_grades_final(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let student_id = get_required_str(params, "studentId")?;
    let transcript = load_transcript(conn, &student_id)?;
    serde_json::to_value(&transcript).map_err(|e| HandlerErr::new("internal", e.to_string()))
}

fn transcript_csv(t: &Transcript) -> String {
    let mut csv = String::from("course_id,course_name,credits,score\n");
    for row in &t.rows {
        let score = match row.score {
            Some(v) if row.evaluated => v.to_string(),
            _ => "not_evaluated".to_string(),
        };
        csv.push_str(&format!(
            "{},{},{},{}\n",
            csv_quote(&row.course_id),
            csv_quote(&row.course_name),
            row.credits,
            score
        ));
    }
    let final_grade = t
        .final_grade
        .map(|g| format!("{:.2}", g))
        .unwrap_or_else(|| "no_grade".to_string());
    csv.push_str(&format!("final_grade,,{},{}\n", t.evaluated_credits, final_grade));
    csv
}

fn handle_grades_export_csv(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let student_id = get_required_str(params, "studentId")?;
    let out_path = get_required_str(params, "outPath")?;
    let transcript = load_transcript(conn, &student_id)?;

    write_text_file(&out_path, &transcript_csv(&transcript))?;
    tracing::info!(student = %student_id, path = %out_path, "grade sheet exported");

    Ok(json!({
        "ok": true,
        "rowsExported": transcript.rows.len(),
        "finalGrade": transcript.final_grade,
        "path": out_path
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "grades.final" => Some(with_db(state, req, handle_grades_final)),
        "grades.exportCsv" => Some(with_db(state, req, handle_grades_export_csv)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calc::TranscriptRow;

    #[test]
    fn csv_marks_unevaluated_rows_and_appends_final_grade() {
        let t = Transcript {
            student_id: "s1".into(),
            final_grade: Some(86.666_666),
            evaluated_count: 1,
            evaluated_credits: 15.0,
            rows: vec![
                TranscriptRow {
                    course_id: "c1".into(),
                    course_name: "Art, History".into(),
                    credits: 15.0,
                    score: Some(86.5),
                    evaluated: true,
                },
                TranscriptRow {
                    course_id: "c2".into(),
                    course_name: "Biology".into(),
                    credits: 3.0,
                    score: Some(0.0),
                    evaluated: false,
                },
            ],
        };
        let csv = transcript_csv(&t);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "course_id,course_name,credits,score");
        assert_eq!(lines[1], "c1,\"Art, History\",15,86.5");
        assert_eq!(lines[2], "c2,Biology,3,not_evaluated");
        assert_eq!(lines[3], "final_grade,,15,86.67");
    }
}
