use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user's role within one course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Ta,
    Professor,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Ta => "ta",
            Role::Professor => "professor",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "student" => Ok(Role::Student),
            "ta" => Ok(Role::Ta),
            "professor" => Ok(Role::Professor),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

/// Question categories a student picks on the question form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestionType {
    Concept,
    Clarification,
    Testing,
    Bug,
    Setup,
    Other,
}

impl QuestionType {
    pub const ALL: [QuestionType; 6] = [
        QuestionType::Concept,
        QuestionType::Clarification,
        QuestionType::Testing,
        QuestionType::Bug,
        QuestionType::Setup,
        QuestionType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Concept => "Concept",
            QuestionType::Clarification => "Clarification",
            QuestionType::Testing => "Testing",
            QuestionType::Bug => "Bug",
            QuestionType::Setup => "Setup",
            QuestionType::Other => "Other",
        }
    }
}

#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl UserRecord {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone)]
pub struct EnrollmentRecord {
    pub user_id: i32,
    pub course_id: i32,
    pub role: Role,
}

#[derive(Debug, Clone)]
pub struct QuestionRecord {
    pub id: i32,
    pub queue_id: i32,
    pub creator_id: i32,
    pub helper_id: Option<i32>,
    pub question_type: Option<String>,
    pub created_at: DateTime<Utc>,
    pub first_helped_at: Option<DateTime<Utc>>,
    pub helped_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
}

/// One row of the most-active-students aggregate.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveStudentRow {
    pub student_id: i32,
    pub name: String,
    pub email: String,
    pub questions_asked: i64,
}
