//! The computations behind each insight.
//!
//! Every function builds its base query, narrows it with the filters the
//! insight accepts, runs it through the store and shapes the result. None of
//! them writes.

use serde_json::{json, Map, Value};

use crate::error::Result;
use crate::filter::{apply_filters, Filter};
use crate::models::{QuestionType, Role};
use crate::output::{BarChartOutput, BarDatum, InsightOutput, ScalarValue, TableColumn, TableOutput};
use crate::query::{
    EnrollmentCondition, EnrollmentFilterKind, EnrollmentQuery, QuestionCondition, QuestionFilterKind,
    QuestionQuery,
};
use crate::stats::{elapsed_minutes, format_minutes, median, ratio_two_places};
use crate::store::InsightStore;

pub const MOST_ACTIVE_LIMIT: i64 = 75;

const QUESTION_FILTERS: &[QuestionFilterKind] = &[QuestionFilterKind::CourseId, QuestionFilterKind::Timeframe];
const ENROLLMENT_FILTERS: &[EnrollmentFilterKind] = &[EnrollmentFilterKind::CourseId, EnrollmentFilterKind::Role];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsightKind {
    TotalStudents,
    TotalQuestionsAsked,
    MedianWaitTime,
    QuestionTypeBreakdown,
    MostActiveStudents,
    QuestionToStudentRatio,
    MedianHelpingTime,
}

impl InsightKind {
    pub async fn compute(self, store: &dyn InsightStore, filters: &[Filter]) -> Result<InsightOutput> {
        let output = match self {
            InsightKind::TotalStudents => {
                InsightOutput::SimpleDisplay(ScalarValue::Number(total_students(store, filters).await?))
            }
            InsightKind::TotalQuestionsAsked => {
                InsightOutput::SimpleDisplay(ScalarValue::Number(total_questions_asked(store, filters).await?))
            }
            InsightKind::MedianWaitTime => {
                InsightOutput::SimpleDisplay(ScalarValue::Text(median_wait_time(store, filters).await?))
            }
            InsightKind::QuestionTypeBreakdown => {
                InsightOutput::BarChart(question_type_breakdown(store, filters).await?)
            }
            InsightKind::MostActiveStudents => {
                InsightOutput::SimpleTable(most_active_students(store, filters).await?)
            }
            InsightKind::QuestionToStudentRatio => {
                InsightOutput::SimpleDisplay(ScalarValue::Text(question_to_student_ratio(store, filters).await?))
            }
            InsightKind::MedianHelpingTime => {
                InsightOutput::SimpleDisplay(ScalarValue::Text(median_helping_time(store, filters).await?))
            }
        };
        Ok(output)
    }
}

pub async fn total_students(store: &dyn InsightStore, filters: &[Filter]) -> Result<i64> {
    let query = apply_filters(
        EnrollmentQuery::new().and(EnrollmentCondition::Role(Role::Student)),
        ENROLLMENT_FILTERS,
        filters,
    );
    store.count_enrollments(&query).await
}

pub async fn total_questions_asked(store: &dyn InsightStore, filters: &[Filter]) -> Result<i64> {
    let query = apply_filters(QuestionQuery::new(), QUESTION_FILTERS, filters);
    store.count_questions(&query).await
}

pub async fn most_active_students(store: &dyn InsightStore, filters: &[Filter]) -> Result<TableOutput> {
    let query = apply_filters(
        QuestionQuery::new().and(QuestionCondition::HasQuestionType),
        QUESTION_FILTERS,
        filters,
    );
    let rows = store.most_active_students(&query, MOST_ACTIVE_LIMIT).await?;

    let data_source = rows
        .into_iter()
        .take(MOST_ACTIVE_LIMIT as usize)
        .map(|row| {
            let mut cells = Map::new();
            cells.insert("studentId".to_string(), json!(row.student_id));
            cells.insert("name".to_string(), Value::String(row.name));
            cells.insert("email".to_string(), Value::String(row.email));
            cells.insert("questionsAsked".to_string(), json!(row.questions_asked));
            cells
        })
        .collect();

    Ok(TableOutput {
        columns: vec![
            TableColumn::new("Name", "name"),
            TableColumn::new("Questions Asked", "questionsAsked"),
        ],
        data_source,
    })
}

pub async fn question_type_breakdown(store: &dyn InsightStore, filters: &[Filter]) -> Result<BarChartOutput> {
    let query = apply_filters(
        QuestionQuery::new().and(QuestionCondition::HasQuestionType),
        QUESTION_FILTERS,
        filters,
    );
    let counts = store.question_type_counts(&query).await?;

    let mut data: Vec<BarDatum> = counts
        .into_iter()
        .map(|(category, value)| BarDatum { category, value })
        .collect();

    for question_type in QuestionType::ALL {
        if !data.iter().any(|datum| datum.category == question_type.as_str()) {
            data.push(BarDatum {
                category: question_type.as_str().to_string(),
                value: 0,
            });
        }
    }
    data.sort_by(|a, b| a.category.cmp(&b.category));

    Ok(BarChartOutput {
        data,
        x_field: "totalQuestions".to_string(),
        y_field: "questionType".to_string(),
        series_field: "questionType".to_string(),
        x_axis_name: "totalQuestions".to_string(),
        y_axis_name: "questionType".to_string(),
    })
}

pub async fn median_wait_time(store: &dyn InsightStore, filters: &[Filter]) -> Result<String> {
    let query = apply_filters(
        QuestionQuery::new().and(QuestionCondition::FirstHelped),
        QUESTION_FILTERS,
        filters,
    );
    let questions = store.fetch_questions(&query).await?;

    let waits: Vec<f64> = questions
        .iter()
        .filter_map(|q| q.first_helped_at.map(|helped| elapsed_minutes(q.created_at, helped)))
        .collect();

    Ok(format_minutes(median(&waits).unwrap_or(0.0)))
}

pub async fn median_helping_time(store: &dyn InsightStore, filters: &[Filter]) -> Result<String> {
    let query = apply_filters(
        QuestionQuery::new().and(QuestionCondition::HelpedAndClosed),
        QUESTION_FILTERS,
        filters,
    );
    let questions = store.fetch_questions(&query).await?;

    let helping: Vec<f64> = questions
        .iter()
        .filter_map(|q| match (q.helped_at, q.closed_at) {
            (Some(helped), Some(closed)) => Some(elapsed_minutes(helped, closed)),
            _ => None,
        })
        .collect();

    Ok(format_minutes(median(&helping).unwrap_or(0.0)))
}

/// Questions per enrolled student to two decimals, or `0 students` when the
/// course has no students.
pub async fn question_to_student_ratio(store: &dyn InsightStore, filters: &[Filter]) -> Result<String> {
    let questions = total_questions_asked(store, filters).await?;
    let students = total_students(store, filters).await?;

    if students == 0 {
        return Ok("0 students".to_string());
    }
    Ok(ratio_two_places(questions, students))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::InsightError;
    use crate::models::{EnrollmentRecord, QuestionRecord, UserRecord};
    use crate::store::memory::MemoryStore;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    pub(crate) fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap()
    }

    pub(crate) fn question(id: i32, queue_id: i32, creator_id: i32, question_type: Option<&str>) -> QuestionRecord {
        QuestionRecord {
            id,
            queue_id,
            creator_id,
            helper_id: None,
            question_type: question_type.map(str::to_string),
            created_at: t0(),
            first_helped_at: None,
            helped_at: None,
            closed_at: None,
        }
    }

    fn user(id: i32, first: &str, last: &str) -> UserRecord {
        UserRecord {
            id,
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: format!("{}@example.edu", first.to_lowercase()),
        }
    }

    fn enroll(user_id: i32, course_id: i32, role: Role) -> EnrollmentRecord {
        EnrollmentRecord { user_id, course_id, role }
    }

    /// Course 1 owns queue 10, course 2 owns queue 20.
    pub(crate) fn course_store() -> MemoryStore {
        let mut store = MemoryStore::new();
        store.queues.insert(10, 1);
        store.queues.insert(20, 2);
        store.users = vec![
            user(1, "Ada", "Byron"),
            user(2, "Grace", "Hopper"),
            user(3, "Alan", "Turing"),
            user(9, "Prof", "Oak"),
        ];
        store.enrollments = vec![
            enroll(1, 1, Role::Student),
            enroll(2, 1, Role::Student),
            enroll(3, 2, Role::Student),
            enroll(9, 1, Role::Professor),
        ];

        let mut helped_10 = question(1, 10, 1, Some("Bug"));
        helped_10.first_helped_at = Some(t0() + Duration::minutes(10));
        helped_10.helped_at = Some(t0() + Duration::minutes(10));
        helped_10.closed_at = Some(t0() + Duration::minutes(14));

        let mut helped_20 = question(2, 10, 1, Some("Bug"));
        helped_20.first_helped_at = Some(t0() + Duration::minutes(20));
        helped_20.helped_at = Some(t0() + Duration::minutes(20));
        helped_20.closed_at = Some(t0() + Duration::minutes(26));

        let never_helped = question(3, 10, 2, Some("Concept"));
        let other_course = question(4, 20, 3, Some("Setup"));

        store.questions = vec![helped_10, helped_20, never_helped, other_course];
        store
    }

    #[tokio::test]
    async fn counts_students_only() {
        let store = course_store();
        assert_eq!(total_students(&store, &[Filter::course(1)]).await.unwrap(), 2);
        assert_eq!(total_students(&store, &[]).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn role_filter_narrows_enrollments() {
        let store = course_store();
        let filters = [Filter::course(1), Filter::Role { role: Role::Professor }];
        assert_eq!(total_students(&store, &filters).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn counts_questions_per_course() {
        let store = course_store();
        assert_eq!(total_questions_asked(&store, &[Filter::course(1)]).await.unwrap(), 3);
        assert_eq!(total_questions_asked(&store, &[Filter::course(2)]).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn timeframe_excludes_end_instant() {
        let mut store = course_store();
        store.questions[0].created_at = t0() + Duration::hours(1);
        let filters = [Filter::course(1), Filter::timeframe(t0(), t0() + Duration::hours(1))];
        assert_eq!(total_questions_asked(&store, &filters).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn median_wait_time_over_helped_questions() {
        let store = course_store();
        let wait = median_wait_time(&store, &[Filter::course(1)]).await.unwrap();
        assert_eq!(wait, "15 min");
    }

    #[tokio::test]
    async fn median_wait_time_without_helped_questions() {
        let store = course_store();
        let wait = median_wait_time(&store, &[Filter::course(2)]).await.unwrap();
        assert_eq!(wait, "0 min");
    }

    #[tokio::test]
    async fn median_helping_time_requires_both_timestamps() {
        let mut store = course_store();
        let mut half_done = question(5, 10, 2, Some("Testing"));
        half_done.helped_at = Some(t0());
        store.questions.push(half_done);

        let helping = median_helping_time(&store, &[Filter::course(1)]).await.unwrap();
        assert_eq!(helping, "5 min");
    }

    #[tokio::test]
    async fn breakdown_lists_every_type_sorted() {
        let store = course_store();
        let chart = question_type_breakdown(&store, &[Filter::course(1)]).await.unwrap();

        let categories: Vec<&str> = chart.data.iter().map(|d| d.category.as_str()).collect();
        assert_eq!(
            categories,
            vec!["Bug", "Clarification", "Concept", "Other", "Setup", "Testing"]
        );
        let counts: Vec<i64> = chart.data.iter().map(|d| d.value).collect();
        assert_eq!(counts, vec![2, 0, 1, 0, 0, 0]);
        assert_eq!(chart.x_field, "totalQuestions");
        assert_eq!(chart.y_field, "questionType");
    }

    #[tokio::test]
    async fn breakdown_ignores_untyped_questions() {
        let mut store = course_store();
        store.questions.push(question(6, 10, 1, None));
        let chart = question_type_breakdown(&store, &[Filter::course(1)]).await.unwrap();
        assert_eq!(chart.data.iter().map(|d| d.value).sum::<i64>(), 3);
    }

    #[tokio::test]
    async fn most_active_students_is_capped_and_descending() {
        let mut store = MemoryStore::new();
        store.queues.insert(10, 1);
        let mut next_id = 0;
        for student in 0..100 {
            store.users.push(user(student, &format!("S{student}"), "Doe"));
            for _ in 0..(student % 7 + 1) {
                next_id += 1;
                store.questions.push(question(next_id, 10, student, Some("Other")));
            }
        }

        let table = most_active_students(&store, &[Filter::course(1)]).await.unwrap();
        assert_eq!(table.data_source.len(), 75);

        let asked: Vec<i64> = table
            .data_source
            .iter()
            .map(|row| row["questionsAsked"].as_i64().unwrap())
            .collect();
        assert!(asked.windows(2).all(|pair| pair[0] >= pair[1]));
        assert_eq!(table.columns[0].title, "Name");
        assert_eq!(table.columns[1].data_index, "questionsAsked");
    }

    #[tokio::test]
    async fn most_active_students_joins_names() {
        let store = course_store();
        let table = most_active_students(&store, &[Filter::course(1)]).await.unwrap();
        assert_eq!(table.data_source[0]["name"], "Ada Byron");
        assert_eq!(table.data_source[0]["questionsAsked"], 2);
        assert_eq!(table.data_source[1]["name"], "Grace Hopper");
    }

    #[tokio::test]
    async fn ratio_formats_two_decimals() {
        let store = course_store();
        let ratio = question_to_student_ratio(&store, &[Filter::course(1)]).await.unwrap();
        assert_eq!(ratio, "1.50");
    }

    #[tokio::test]
    async fn ratio_rounds_half_up() {
        let mut store = MemoryStore::new();
        store.queues.insert(10, 1);
        store.enrollments = (1..=8).map(|id| enroll(id, 1, Role::Student)).collect();
        store.questions = vec![question(1, 10, 1, Some("Bug"))];
        let filters = [Filter::course(1)];
        assert_eq!(question_to_student_ratio(&store, &filters).await.unwrap(), "0.13");

        store.questions = (1..=5).map(|id| question(id, 10, 1, Some("Bug"))).collect();
        assert_eq!(question_to_student_ratio(&store, &filters).await.unwrap(), "0.63");
    }

    #[tokio::test]
    async fn ratio_without_students_falls_back() {
        let mut store = course_store();
        store.enrollments.retain(|e| e.course_id != 2);
        let ratio = question_to_student_ratio(&store, &[Filter::course(2)]).await.unwrap();
        assert_eq!(ratio, "0 students");
    }

    #[tokio::test]
    async fn unaccepted_filters_change_nothing() {
        let store = course_store();
        let ignored = [Filter::Role { role: Role::Ta }, Filter::Unrecognized];
        for kind in [
            InsightKind::TotalQuestionsAsked,
            InsightKind::MedianWaitTime,
            InsightKind::MedianHelpingTime,
            InsightKind::QuestionTypeBreakdown,
            InsightKind::MostActiveStudents,
        ] {
            let filtered = kind.compute(&store, &ignored).await.unwrap();
            let unfiltered = kind.compute(&store, &[]).await.unwrap();
            assert_eq!(filtered, unfiltered, "{kind:?}");
        }
    }

    #[tokio::test]
    async fn store_failures_propagate() {
        let store = course_store();
        store.fail_queries();
        let err = InsightKind::MedianWaitTime.compute(&store, &[]).await.unwrap_err();
        assert!(matches!(err, InsightError::Store(sqlx::Error::PoolTimedOut)));
    }
}
