//! Typed query builders for the entities insights read, and the filter
//! predicates each of them supports.
//!
//! Builders only accumulate conjunctive conditions. Executing them is the
//! store's job (see [`crate::store`]).

use chrono::{DateTime, Utc};

use crate::filter::{Filter, FilterScope};
use crate::models::{QuestionRecord, Role};

#[derive(Debug, Clone, PartialEq)]
pub enum QuestionCondition {
    HasQuestionType,
    FirstHelped,
    HelpedAndClosed,
    /// The question's queue belongs to this course.
    QueueCourse(i32),
    /// `created_at` falls in `[start, end)`.
    CreatedWithin {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

impl QuestionCondition {
    /// Evaluates the condition against one record. `course_of_queue` resolves
    /// the owning course of a queue.
    pub fn matches(&self, question: &QuestionRecord, course_of_queue: impl Fn(i32) -> Option<i32>) -> bool {
        match self {
            Self::HasQuestionType => question.question_type.is_some(),
            Self::FirstHelped => question.first_helped_at.is_some(),
            Self::HelpedAndClosed => question.helped_at.is_some() && question.closed_at.is_some(),
            Self::QueueCourse(course_id) => course_of_queue(question.queue_id) == Some(*course_id),
            Self::CreatedWithin { start, end } => question.created_at >= *start && question.created_at < *end,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuestionQuery {
    conditions: Vec<QuestionCondition>,
}

impl QuestionQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn and(mut self, condition: QuestionCondition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn conditions(&self) -> &[QuestionCondition] {
        &self.conditions
    }

    pub fn joins_queue(&self) -> bool {
        self.conditions
            .iter()
            .any(|c| matches!(c, QuestionCondition::QueueCourse(_)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionFilterKind {
    CourseId,
    Timeframe,
}

#[derive(Debug, Clone, PartialEq)]
pub enum QuestionPredicate {
    CourseId(i32),
    Timeframe {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

impl FilterScope for QuestionQuery {
    type Kind = QuestionFilterKind;
    type Predicate = QuestionPredicate;

    const ENTITY: &'static str = "question";

    fn predicate_for(filter: &Filter) -> Option<QuestionPredicate> {
        match filter {
            Filter::CourseId { course_id } => Some(QuestionPredicate::CourseId(*course_id)),
            Filter::Timeframe { start, end } => Some(QuestionPredicate::Timeframe {
                start: *start,
                end: *end,
            }),
            Filter::Role { .. } | Filter::Unrecognized => None,
        }
    }

    fn kind_of(predicate: &QuestionPredicate) -> QuestionFilterKind {
        match predicate {
            QuestionPredicate::CourseId(_) => QuestionFilterKind::CourseId,
            QuestionPredicate::Timeframe { .. } => QuestionFilterKind::Timeframe,
        }
    }

    fn narrow(self, predicate: QuestionPredicate) -> Self {
        match predicate {
            QuestionPredicate::CourseId(course_id) => self.and(QuestionCondition::QueueCourse(course_id)),
            QuestionPredicate::Timeframe { start, end } => {
                self.and(QuestionCondition::CreatedWithin { start, end })
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EnrollmentCondition {
    Role(Role),
    Course(i32),
}

/// Query over `user_course` rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnrollmentQuery {
    conditions: Vec<EnrollmentCondition>,
}

impl EnrollmentQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn and(mut self, condition: EnrollmentCondition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn conditions(&self) -> &[EnrollmentCondition] {
        &self.conditions
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrollmentFilterKind {
    CourseId,
    Role,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EnrollmentPredicate {
    CourseId(i32),
    Role(Role),
}

impl FilterScope for EnrollmentQuery {
    type Kind = EnrollmentFilterKind;
    type Predicate = EnrollmentPredicate;

    const ENTITY: &'static str = "user_course";

    fn predicate_for(filter: &Filter) -> Option<EnrollmentPredicate> {
        match filter {
            Filter::CourseId { course_id } => Some(EnrollmentPredicate::CourseId(*course_id)),
            Filter::Role { role } => Some(EnrollmentPredicate::Role(*role)),
            Filter::Timeframe { .. } | Filter::Unrecognized => None,
        }
    }

    fn kind_of(predicate: &EnrollmentPredicate) -> EnrollmentFilterKind {
        match predicate {
            EnrollmentPredicate::CourseId(_) => EnrollmentFilterKind::CourseId,
            EnrollmentPredicate::Role(_) => EnrollmentFilterKind::Role,
        }
    }

    fn narrow(self, predicate: EnrollmentPredicate) -> Self {
        match predicate {
            EnrollmentPredicate::CourseId(course_id) => self.and(EnrollmentCondition::Course(course_id)),
            EnrollmentPredicate::Role(role) => self.and(EnrollmentCondition::Role(role)),
        }
    }
}
