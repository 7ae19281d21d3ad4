//! Read interface the insight engine runs its queries through.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{ActiveStudentRow, QuestionRecord};
use crate::query::{EnrollmentQuery, QuestionQuery};

#[cfg(test)]
pub mod memory;
mod postgres;

pub use postgres::PgStore;

#[async_trait]
pub trait InsightStore: Send + Sync {
    async fn count_enrollments(&self, query: &EnrollmentQuery) -> Result<i64>;

    async fn count_questions(&self, query: &QuestionQuery) -> Result<i64>;

    async fn fetch_questions(&self, query: &QuestionQuery) -> Result<Vec<QuestionRecord>>;

    /// Question counts grouped by non-null question type.
    async fn question_type_counts(&self, query: &QuestionQuery) -> Result<Vec<(String, i64)>>;

    /// Question counts per creator, highest first, at most `limit` rows.
    async fn most_active_students(
        &self,
        query: &QuestionQuery,
        limit: i64,
    ) -> Result<Vec<ActiveStudentRow>>;
}
