use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_scrudd");
    let mut child = Command::new(exe)
        .env_remove("SCRUDD_WORKSPACE")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn scrudd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|v| v.as_str())
            .unwrap_or("unknown error")
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn error_code(value: &serde_json::Value) -> Option<&str> {
    value
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(|v| v.as_str())
}

#[test]
fn roster_lists_only_the_teachers_courses() {
    let workspace = temp_dir("scrudd-roster");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    for (t, last) in [("t1", "Noether"), ("t2", "Hilbert")] {
        let _ = request_ok(
            &mut stdin,
            &mut reader,
            &format!("teacher-{t}"),
            "teachers.create",
            json!({ "teacherId": t, "lastName": last, "firstName": "X", "dateOfBirth": "1882-03-23" }),
        );
    }
    for (s, last) in [("s1", "Gauss"), ("s2", "Euler")] {
        let _ = request_ok(
            &mut stdin,
            &mut reader,
            &format!("student-{s}"),
            "students.create",
            json!({ "studentId": s, "lastName": last, "firstName": "Y", "dateOfBirth": "2002-02-02" }),
        );
    }
    for (c, name, t) in [("c1", "Rings", "t1"), ("c2", "Geometry", "t2"), ("c3", "Fields", "t1")] {
        let _ = request_ok(
            &mut stdin,
            &mut reader,
            &format!("course-{c}"),
            "courses.create",
            json!({ "courseId": c, "name": name, "credits": 6 }),
        );
        let _ = request_ok(
            &mut stdin,
            &mut reader,
            &format!("teach-{c}"),
            "teaches.create",
            json!({ "teacherId": t, "courseId": c }),
        );
    }
    for (s, c, score) in [
        ("s1", "c1", json!(15.0)),
        ("s2", "c1", json!(null)),
        ("s1", "c2", json!(12.0)),
        ("s2", "c3", json!(0.0)),
    ] {
        let _ = request_ok(
            &mut stdin,
            &mut reader,
            &format!("sub-{s}-{c}"),
            "subscribes.create",
            json!({ "studentId": s, "courseId": c, "score": score }),
        );
    }

    let courses = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "teacher.courses",
        json!({ "teacherId": "t1" }),
    );
    let names: Vec<&str> = courses
        .get("courses")
        .and_then(|v| v.as_array())
        .map(|a| a.iter().filter_map(|c| c.get("name").and_then(|v| v.as_str())).collect())
        .unwrap_or_default();
    assert_eq!(names, vec!["Fields", "Rings"]);

    let roster = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "teacher.roster",
        json!({ "teacherId": "t1" }),
    );
    let rows = roster
        .get("rows")
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default();
    let keys: Vec<(String, String, bool)> = rows
        .iter()
        .map(|r| {
            (
                r.get("courseId").and_then(|v| v.as_str()).unwrap_or("").to_string(),
                r.get("displayName").and_then(|v| v.as_str()).unwrap_or("").to_string(),
                r.get("evaluated").and_then(|v| v.as_bool()).unwrap_or(true),
            )
        })
        .collect();
    assert_eq!(
        keys,
        vec![
            ("c3".to_string(), "Euler, Y".to_string(), false),
            ("c1".to_string(), "Euler, Y".to_string(), false),
            ("c1".to_string(), "Gauss, Y".to_string(), true),
        ]
    );
    assert!(rows.iter().all(|r| r.get("courseId").and_then(|v| v.as_str()) != Some("c2")));

    let teaches = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "teaches.list",
        json!({ "courseId": "c2" }),
    );
    let teach_rows = teaches
        .get("teaches")
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default();
    assert_eq!(teach_rows.len(), 1);
    assert_eq!(
        teach_rows[0].get("teacherId").and_then(|v| v.as_str()),
        Some("t2")
    );

    let unknown = request(
        &mut stdin,
        &mut reader,
        "5",
        "teacher.roster",
        json!({ "teacherId": "t9" }),
    );
    assert_eq!(error_code(&unknown), Some("not_found"));

    drop(stdin);
    let _ = child.wait();
}
