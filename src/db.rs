use crate::model::{Course, Gender, LevelCourse, Student, Subscribe, Teach, Teacher};
use rusqlite::{Connection, OptionalExtension, Row};
use std::path::Path;

pub const DB_FILE: &str = "scrud.sqlite3";

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join(DB_FILE);
    let conn = Connection::open(db_path)?;
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS students(
            id TEXT PRIMARY KEY,
            last_name TEXT NOT NULL,
            first_name TEXT NOT NULL,
            date_of_birth TEXT NOT NULL,
            gender TEXT NOT NULL,
            email TEXT,
            level TEXT NOT NULL
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_students_name ON students(last_name, first_name)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS teachers(
            id TEXT PRIMARY KEY,
            last_name TEXT NOT NULL,
            first_name TEXT NOT NULL,
            date_of_birth TEXT NOT NULL,
            email TEXT
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS courses(
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            credits REAL NOT NULL,
            level TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS teaches(
            teacher_id TEXT NOT NULL,
            course_id TEXT NOT NULL,
            PRIMARY KEY(teacher_id, course_id),
            FOREIGN KEY(teacher_id) REFERENCES teachers(id),
            FOREIGN KEY(course_id) REFERENCES courses(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_teaches_teacher ON teaches(teacher_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_teaches_course ON teaches(course_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS subscribes(
            student_id TEXT NOT NULL,
            course_id TEXT NOT NULL,
            score REAL,
            PRIMARY KEY(student_id, course_id),
            FOREIGN KEY(student_id) REFERENCES students(id),
            FOREIGN KEY(course_id) REFERENCES courses(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_subscribes_student ON subscribes(student_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_subscribes_course ON subscribes(course_id)",
        [],
    )?;

    Ok(conn)
}

pub fn row_exists(conn: &Connection, table: &str, id: &str) -> anyhow::Result<bool> {
    let sql = format!("SELECT 1 FROM {} WHERE id = ?", table);
    let found: Option<i64> = conn.query_row(&sql, [id], |r| r.get(0)).optional()?;
    Ok(found.is_some())
}

const STUDENT_COLS: &str = "id, last_name, first_name, date_of_birth, gender, email, level";
const TEACHER_COLS: &str = "id, last_name, first_name, date_of_birth, email";
const COURSE_COLS: &str = "id, name, credits, level";

fn student_from_row(row: &Row<'_>) -> rusqlite::Result<Student> {
    let gender: String = row.get(4)?;
    let level: String = row.get(6)?;
    Ok(Student {
        student_id: row.get(0)?,
        last_name: row.get(1)?,
        first_name: row.get(2)?,
        date_of_birth: row.get(3)?,
        gender: Gender::from_str_lossy(&gender),
        email: row.get(5)?,
        level: LevelCourse::parse(&level).unwrap_or_default(),
    })
}

fn teacher_from_row(row: &Row<'_>) -> rusqlite::Result<Teacher> {
    Ok(Teacher {
        teacher_id: row.get(0)?,
        last_name: row.get(1)?,
        first_name: row.get(2)?,
        date_of_birth: row.get(3)?,
        email: row.get(4)?,
    })
}

fn course_from_row(row: &Row<'_>) -> rusqlite::Result<Course> {
    let level: String = row.get(3)?;
    Ok(Course {
        course_id: row.get(0)?,
        name: row.get(1)?,
        credits: row.get(2)?,
        level: LevelCourse::parse(&level).unwrap_or_default(),
    })
}

pub fn list_students(conn: &Connection) -> anyhow::Result<Vec<Student>> {
    let sql = format!(
        "SELECT {} FROM students ORDER BY last_name, first_name, id",
        STUDENT_COLS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], student_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn get_student(conn: &Connection, id: &str) -> anyhow::Result<Option<Student>> {
    let sql = format!("SELECT {} FROM students WHERE id = ?", STUDENT_COLS);
    Ok(conn.query_row(&sql, [id], student_from_row).optional()?)
}

pub fn upsert_student(conn: &Connection, s: &Student) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO students(id, last_name, first_name, date_of_birth, gender, email, level)
         VALUES(?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT(id) DO UPDATE SET
           last_name = excluded.last_name,
           first_name = excluded.first_name,
           date_of_birth = excluded.date_of_birth,
           gender = excluded.gender,
           email = excluded.email,
           level = excluded.level",
        (
            &s.student_id,
            &s.last_name,
            &s.first_name,
            &s.date_of_birth,
            s.gender.as_str(),
            s.email.as_deref(),
            s.level.as_str(),
        ),
    )?;
    Ok(())
}

pub fn list_teachers(conn: &Connection) -> anyhow::Result<Vec<Teacher>> {
    let sql = format!(
        "SELECT {} FROM teachers ORDER BY last_name, first_name, id",
        TEACHER_COLS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], teacher_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn get_teacher(conn: &Connection, id: &str) -> anyhow::Result<Option<Teacher>> {
    let sql = format!("SELECT {} FROM teachers WHERE id = ?", TEACHER_COLS);
    Ok(conn.query_row(&sql, [id], teacher_from_row).optional()?)
}

pub fn upsert_teacher(conn: &Connection, t: &Teacher) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO teachers(id, last_name, first_name, date_of_birth, email)
         VALUES(?, ?, ?, ?, ?)
         ON CONFLICT(id) DO UPDATE SET
           last_name = excluded.last_name,
           first_name = excluded.first_name,
           date_of_birth = excluded.date_of_birth,
           email = excluded.email",
        (
            &t.teacher_id,
            &t.last_name,
            &t.first_name,
            &t.date_of_birth,
            t.email.as_deref(),
        ),
    )?;
    Ok(())
}

/// Point-in-time copy of every course, ordered by name.
pub fn courses_snapshot(conn: &Connection) -> anyhow::Result<Vec<Course>> {
    let sql = format!("SELECT {} FROM courses ORDER BY name, id", COURSE_COLS);
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], course_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn get_course(conn: &Connection, id: &str) -> anyhow::Result<Option<Course>> {
    let sql = format!("SELECT {} FROM courses WHERE id = ?", COURSE_COLS);
    Ok(conn.query_row(&sql, [id], course_from_row).optional()?)
}

pub fn upsert_course(conn: &Connection, c: &Course) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO courses(id, name, credits, level)
         VALUES(?, ?, ?, ?)
         ON CONFLICT(id) DO UPDATE SET
           name = excluded.name,
           credits = excluded.credits,
           level = excluded.level",
        (&c.course_id, &c.name, c.credits, c.level.as_str()),
    )?;
    Ok(())
}

/// Courses assigned to a teacher through `teaches`.
pub fn courses_for_teacher(conn: &Connection, teacher_id: &str) -> anyhow::Result<Vec<Course>> {
    let mut stmt = conn.prepare(
        "SELECT c.id, c.name, c.credits, c.level
         FROM courses c
         JOIN teaches t ON t.course_id = c.id
         WHERE t.teacher_id = ?
         ORDER BY c.name, c.id",
    )?;
    let rows = stmt
        .query_map([teacher_id], course_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn list_teaches(
    conn: &Connection,
    teacher_id: Option<&str>,
    course_id: Option<&str>,
) -> anyhow::Result<Vec<Teach>> {
    let mut stmt = conn.prepare(
        "SELECT teacher_id, course_id
         FROM teaches
         WHERE (?1 IS NULL OR teacher_id = ?1)
           AND (?2 IS NULL OR course_id = ?2)
         ORDER BY teacher_id, course_id",
    )?;
    let rows = stmt
        .query_map((teacher_id, course_id), |row| {
            Ok(Teach {
                teacher_id: row.get(0)?,
                course_id: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Point-in-time copy of subscriptions, optionally narrowed to one student
/// and/or one course.
pub fn subscribes_snapshot(
    conn: &Connection,
    student_id: Option<&str>,
    course_id: Option<&str>,
) -> anyhow::Result<Vec<Subscribe>> {
    let mut stmt = conn.prepare(
        "SELECT student_id, course_id, score
         FROM subscribes
         WHERE (?1 IS NULL OR student_id = ?1)
           AND (?2 IS NULL OR course_id = ?2)
         ORDER BY student_id, course_id",
    )?;
    let rows = stmt
        .query_map((student_id, course_id), |row| {
            Ok(Subscribe {
                student_id: row.get(0)?,
                course_id: row.get(1)?,
                score: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn get_subscribe(
    conn: &Connection,
    student_id: &str,
    course_id: &str,
) -> anyhow::Result<Option<Subscribe>> {
    Ok(conn
        .query_row(
            "SELECT student_id, course_id, score
             FROM subscribes
             WHERE student_id = ? AND course_id = ?",
            (student_id, course_id),
            |row| {
                Ok(Subscribe {
                    student_id: row.get(0)?,
                    course_id: row.get(1)?,
                    score: row.get(2)?,
                })
            },
        )
        .optional()?)
}

/// Re-inserting an existing (student, course) pair replaces its score.
pub fn upsert_subscribe(conn: &Connection, s: &Subscribe) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO subscribes(student_id, course_id, score)
         VALUES(?, ?, ?)
         ON CONFLICT(student_id, course_id) DO UPDATE SET score = excluded.score",
        (&s.student_id, &s.course_id, s.score),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
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

    #[test]
    fn open_db_is_idempotent_and_snapshots_filter() {
        let ws = temp_dir("scrudd-db");
        let conn = open_db(&ws).expect("open");
        drop(conn);
        let conn = open_db(&ws).expect("reopen");

        upsert_course(
            &conn,
            &Course {
                course_id: "c1".into(),
                name: "Physics".into(),
                credits: 5.0,
                level: LevelCourse::B1,
            },
        )
        .expect("course");
        upsert_student(
            &conn,
            &Student {
                student_id: "s1".into(),
                last_name: "Curie".into(),
                first_name: "Marie".into(),
                date_of_birth: "1867-11-07".into(),
                gender: Gender::Female,
                email: None,
                level: LevelCourse::PhD,
            },
        )
        .expect("student");
        upsert_subscribe(
            &conn,
            &Subscribe {
                student_id: "s1".into(),
                course_id: "c1".into(),
                score: None,
            },
        )
        .expect("subscribe");
        upsert_subscribe(
            &conn,
            &Subscribe {
                student_id: "s1".into(),
                course_id: "c1".into(),
                score: Some(88.0),
            },
        )
        .expect("rescore");

        let all = subscribes_snapshot(&conn, None, None).expect("all");
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].score, Some(88.0));
        assert!(subscribes_snapshot(&conn, Some("nobody"), None)
            .expect("filtered")
            .is_empty());
        assert_eq!(
            get_student(&conn, "s1").expect("get").map(|s| s.level),
            Some(LevelCourse::PhD)
        );
        assert!(row_exists(&conn, "courses", "c1").expect("exists"));
        assert!(!row_exists(&conn, "courses", "c2").expect("exists"));
    }
}
