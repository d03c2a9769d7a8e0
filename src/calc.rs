use crate::model::{Course, Subscribe};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Credit-weighted mean of a student's evaluated scores:
/// `sum(score * credits) / sum(credits)`.
///
/// Subscriptions of other students, subscriptions whose course is missing from
/// `courses`, and unevaluated subscriptions (`score` absent or `<= 0`) are
/// skipped. Returns `None` when nothing was counted.
pub fn final_grade(student_id: &str, subscribes: &[Subscribe], courses: &[Course]) -> Option<f64> {
    let by_id = index_courses(courses);
    accumulate(student_id, subscribes, &by_id).mean()
}

fn index_courses(courses: &[Course]) -> HashMap<&str, &Course> {
    courses.iter().map(|c| (c.course_id.as_str(), c)).collect()
}

#[derive(Debug, Clone, Copy, Default)]
struct Accumulated {
    weighted: f64,
    credits: f64,
    /// Subscriptions that carried weight into the mean.
    counted: usize,
}

impl Accumulated {
    fn mean(self) -> Option<f64> {
        if self.credits > 0.0 {
            Some(self.weighted / self.credits)
        } else {
            None
        }
    }
}

fn accumulate(
    student_id: &str,
    subscribes: &[Subscribe],
    by_id: &HashMap<&str, &Course>,
) -> Accumulated {
    let mut acc = Accumulated::default();
    for sub in subscribes.iter().filter(|s| s.student_id == student_id) {
        let Some(course) = by_id.get(sub.course_id.as_str()) else {
            continue;
        };
        let Some(score) = sub.score.filter(|_| sub.is_evaluated()) else {
            continue;
        };
        acc.weighted += score * course.credits;
        acc.credits += course.credits;
        if course.credits > 0.0 {
            acc.counted += 1;
        }
    }
    acc
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptRow {
    pub course_id: String,
    pub course_name: String,
    pub credits: f64,
    pub score: Option<f64>,
    pub evaluated: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transcript {
    pub student_id: String,
    pub final_grade: Option<f64>,
    pub evaluated_count: usize,
    pub evaluated_credits: f64,
    pub rows: Vec<TranscriptRow>,
}

/// The grade sheet of one student: one row per subscription whose course still
/// exists, ordered by course name, plus the aggregate. `evaluated_count` only
/// counts rows that carry weight into `final_grade`, so an evaluated row on a
/// zero-credit course is flagged `evaluated` but not counted.
pub fn transcript(student_id: &str, subscribes: &[Subscribe], courses: &[Course]) -> Transcript {
    let by_id = index_courses(courses);

    let mut rows: Vec<TranscriptRow> = subscribes
        .iter()
        .filter(|s| s.student_id == student_id)
        .filter_map(|s| {
            let course = by_id.get(s.course_id.as_str())?;
            Some(TranscriptRow {
                course_id: course.course_id.clone(),
                course_name: course.name.clone(),
                credits: course.credits,
                score: s.score,
                evaluated: s.is_evaluated(),
            })
        })
        .collect();
    rows.sort_by(|a, b| match a.course_name.cmp(&b.course_name) {
        Ordering::Equal => a.course_id.cmp(&b.course_id),
        o => o,
    });

    let acc = accumulate(student_id, subscribes, &by_id);

    Transcript {
        student_id: student_id.to_string(),
        final_grade: final_grade(student_id, subscribes, courses),
        evaluated_count: acc.counted,
        evaluated_credits: acc.credits,
        rows,
    }
}
