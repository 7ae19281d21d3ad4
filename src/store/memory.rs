//! In-process store for tests. Evaluates the same typed conditions the
//! Postgres store renders and counts every query it answers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{ActiveStudentRow, EnrollmentRecord, QuestionRecord, UserRecord};
use crate::query::{EnrollmentCondition, EnrollmentQuery, QuestionQuery};

use super::InsightStore;

#[derive(Default)]
pub struct MemoryStore {
    pub users: Vec<UserRecord>,
    pub enrollments: Vec<EnrollmentRecord>,
    /// queue id -> course id
    pub queues: HashMap<i32, i32>,
    pub questions: Vec<QuestionRecord>,
    queries: AtomicUsize,
    failing: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    /// Makes every later query fail as if the pool were exhausted.
    pub fn fail_queries(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    fn begin_query(&self) -> Result<()> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(sqlx::Error::PoolTimedOut.into());
        }
        Ok(())
    }

    fn matching_questions<'a>(&'a self, query: &'a QuestionQuery) -> impl Iterator<Item = &'a QuestionRecord> + 'a {
        self.questions.iter().filter(move |question| {
            query
                .conditions()
                .iter()
                .all(|condition| condition.matches(question, |queue_id| self.queues.get(&queue_id).copied()))
        })
    }
}

#[async_trait]
impl InsightStore for MemoryStore {
    async fn count_enrollments(&self, query: &EnrollmentQuery) -> Result<i64> {
        self.begin_query()?;
        let count = self
            .enrollments
            .iter()
            .filter(|enrollment| {
                query.conditions().iter().all(|condition| match condition {
                    EnrollmentCondition::Role(role) => enrollment.role == *role,
                    EnrollmentCondition::Course(course_id) => enrollment.course_id == *course_id,
                })
            })
            .count();
        Ok(count as i64)
    }

    async fn count_questions(&self, query: &QuestionQuery) -> Result<i64> {
        self.begin_query()?;
        Ok(self.matching_questions(query).count() as i64)
    }

    async fn fetch_questions(&self, query: &QuestionQuery) -> Result<Vec<QuestionRecord>> {
        self.begin_query()?;
        Ok(self.matching_questions(query).cloned().collect())
    }

    async fn question_type_counts(&self, query: &QuestionQuery) -> Result<Vec<(String, i64)>> {
        self.begin_query()?;
        let mut counts: HashMap<String, i64> = HashMap::new();
        for question in self.matching_questions(query) {
            if let Some(question_type) = &question.question_type {
                *counts.entry(question_type.clone()).or_insert(0) += 1;
            }
        }
        Ok(counts.into_iter().collect())
    }

    async fn most_active_students(
        &self,
        query: &QuestionQuery,
        limit: i64,
    ) -> Result<Vec<ActiveStudentRow>> {
        self.begin_query()?;
        let mut counts: HashMap<i32, i64> = HashMap::new();
        for question in self.matching_questions(query) {
            *counts.entry(question.creator_id).or_insert(0) += 1;
        }

        let mut rows: Vec<ActiveStudentRow> = counts
            .into_iter()
            .filter_map(|(creator_id, questions_asked)| {
                let user = self.users.iter().find(|user| user.id == creator_id)?;
                Some(ActiveStudentRow {
                    student_id: creator_id,
                    name: user.full_name(),
                    email: user.email.clone(),
                    questions_asked,
                })
            })
            .collect();

        rows.sort_by(|a, b| {
            b.questions_asked
                .cmp(&a.questions_asked)
                .then(a.student_id.cmp(&b.student_id))
        });
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }
}
