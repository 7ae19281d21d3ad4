use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};

use crate::error::Result;
use crate::models::{ActiveStudentRow, QuestionRecord};
use crate::query::{EnrollmentCondition, EnrollmentQuery, QuestionCondition, QuestionQuery};

use super::InsightStore;

const QUESTION_COLUMNS: &str = "q.id, q.queue_id, q.creator_id, q.helper_id, q.question_type, \
     q.created_at, q.first_helped_at, q.helped_at, q.closed_at";

/// Postgres-backed store. Renders typed queries with bind parameters.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn question_sql(select: &str, extra_join: &str, query: &QuestionQuery) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(format!("SELECT {select} FROM office_hours.questions q"));
    builder.push(extra_join);
    if query.joins_queue() {
        builder.push(" JOIN office_hours.queues qu ON qu.id = q.queue_id");
    }
    builder.push(" WHERE TRUE");

    for condition in query.conditions() {
        match condition {
            QuestionCondition::HasQuestionType => {
                builder.push(" AND q.question_type IS NOT NULL");
            }
            QuestionCondition::FirstHelped => {
                builder.push(" AND q.first_helped_at IS NOT NULL");
            }
            QuestionCondition::HelpedAndClosed => {
                builder.push(" AND q.helped_at IS NOT NULL AND q.closed_at IS NOT NULL");
            }
            QuestionCondition::QueueCourse(course_id) => {
                builder.push(" AND qu.course_id = ").push_bind(*course_id);
            }
            QuestionCondition::CreatedWithin { start, end } => {
                builder
                    .push(" AND q.created_at >= ")
                    .push_bind(*start)
                    .push(" AND q.created_at < ")
                    .push_bind(*end);
            }
        }
    }

    builder
}

fn enrollment_sql(query: &EnrollmentQuery) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM office_hours.user_course uc WHERE TRUE");

    for condition in query.conditions() {
        match condition {
            EnrollmentCondition::Role(role) => {
                builder.push(" AND uc.role = ").push_bind(role.as_str());
            }
            EnrollmentCondition::Course(course_id) => {
                builder.push(" AND uc.course_id = ").push_bind(*course_id);
            }
        }
    }

    builder
}

fn most_active_sql(query: &QuestionQuery, limit: i64) -> QueryBuilder<'static, Postgres> {
    let mut builder = question_sql(
        "q.creator_id AS student_id, concat(u.first_name, ' ', u.last_name) AS name, \
         u.email, COUNT(*) AS questions_asked",
        " JOIN office_hours.users u ON u.id = q.creator_id",
        query,
    );
    builder
        .push(" GROUP BY q.creator_id, u.first_name, u.last_name, u.email")
        .push(" ORDER BY questions_asked DESC, q.creator_id")
        .push(" LIMIT ")
        .push_bind(limit);
    builder
}

#[async_trait]
impl InsightStore for PgStore {
    async fn count_enrollments(&self, query: &EnrollmentQuery) -> Result<i64> {
        let count = enrollment_sql(query)
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn count_questions(&self, query: &QuestionQuery) -> Result<i64> {
        let count = question_sql("COUNT(*)", "", query)
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn fetch_questions(&self, query: &QuestionQuery) -> Result<Vec<QuestionRecord>> {
        let rows = question_sql(QUESTION_COLUMNS, "", query)
            .build()
            .fetch_all(&self.pool)
            .await?;

        let mut questions = Vec::with_capacity(rows.len());
        for row in rows {
            questions.push(QuestionRecord {
                id: row.try_get("id")?,
                queue_id: row.try_get("queue_id")?,
                creator_id: row.try_get("creator_id")?,
                helper_id: row.try_get("helper_id")?,
                question_type: row.try_get("question_type")?,
                created_at: row.try_get("created_at")?,
                first_helped_at: row.try_get("first_helped_at")?,
                helped_at: row.try_get("helped_at")?,
                closed_at: row.try_get("closed_at")?,
            });
        }

        Ok(questions)
    }

    async fn question_type_counts(&self, query: &QuestionQuery) -> Result<Vec<(String, i64)>> {
        let mut builder = question_sql("q.question_type, COUNT(*)", "", query);
        builder.push(" GROUP BY q.question_type HAVING q.question_type IS NOT NULL");

        let rows = builder
            .build_query_as::<(Option<String>, i64)>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(question_type, count)| question_type.map(|t| (t, count)))
            .collect())
    }

    async fn most_active_students(
        &self,
        query: &QuestionQuery,
        limit: i64,
    ) -> Result<Vec<ActiveStudentRow>> {
        let rows = most_active_sql(query, limit).build().fetch_all(&self.pool).await?;

        let mut students = Vec::with_capacity(rows.len());
        for row in rows {
            students.push(ActiveStudentRow {
                student_id: row.try_get("student_id")?,
                name: row.try_get("name")?,
                email: row.try_get("email")?,
                questions_asked: row.try_get("questions_asked")?,
            });
        }

        Ok(students)
    }
}
