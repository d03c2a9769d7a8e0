use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    #[serde(rename = "Not concerned")]
    NotConcerned,
}

impl Gender {
    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::NotConcerned => "Not concerned",
        }
    }

    /// Unknown values map to `NotConcerned` so stored rows always decode.
    pub fn from_str_lossy(s: &str) -> Self {
        match s.trim() {
            "Male" => Gender::Male,
            "Female" => Gender::Female,
            _ => Gender::NotConcerned,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LevelCourse {
    P1,
    P2,
    P3,
    B1,
    B2,
    B3,
    A1,
    A2,
    A3,
    #[default]
    MS,
    PhD,
}

impl LevelCourse {
    pub const ALL: [LevelCourse; 11] = [
        LevelCourse::P1,
        LevelCourse::P2,
        LevelCourse::P3,
        LevelCourse::B1,
        LevelCourse::B2,
        LevelCourse::B3,
        LevelCourse::A1,
        LevelCourse::A2,
        LevelCourse::A3,
        LevelCourse::MS,
        LevelCourse::PhD,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LevelCourse::P1 => "P1",
            LevelCourse::P2 => "P2",
            LevelCourse::P3 => "P3",
            LevelCourse::B1 => "B1",
            LevelCourse::B2 => "B2",
            LevelCourse::B3 => "B3",
            LevelCourse::A1 => "A1",
            LevelCourse::A2 => "A2",
            LevelCourse::A3 => "A3",
            LevelCourse::MS => "MS",
            LevelCourse::PhD => "PhD",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let t = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|l| l.as_str().eq_ignore_ascii_case(t))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub student_id: String,
    pub last_name: String,
    pub first_name: String,
    pub date_of_birth: String,
    pub gender: Gender,
    pub email: Option<String>,
    pub level: LevelCourse,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    pub teacher_id: String,
    pub last_name: String,
    pub first_name: String,
    pub date_of_birth: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub course_id: String,
    pub name: String,
    /// ECTS weight.
    pub credits: f64,
    pub level: LevelCourse,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Teach {
    pub teacher_id: String,
    pub course_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscribe {
    pub student_id: String,
    pub course_id: String,
    pub score: Option<f64>,
}

/// A score of exactly 0 is indistinguishable from "not graded yet".
pub fn is_evaluated_score(score: Option<f64>) -> bool {
    matches!(score, Some(s) if s > 0.0)
}

impl Subscribe {
    pub fn is_evaluated(&self) -> bool {
        is_evaluated_score(self.score)
    }
}
