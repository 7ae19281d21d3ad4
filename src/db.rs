use anyhow::Context;
use chrono::{Duration, Utc};
use sqlx::{PgPool, Row};

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub const SEED_COURSE_ID: i32 = 1;
pub const SEED_PROFESSOR_ID: i32 = 1;

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO office_hours.courses (id, name)
        VALUES ($1, $2)
        ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name
        "#,
    )
    .bind(SEED_COURSE_ID)
    .bind("CS 2500: Fundamentals of Computer Science")
    .execute(pool)
    .await?;

    let users = vec![
        (SEED_PROFESSOR_ID, "Olin", "Shivers", "o.shivers@northeastern.edu", "professor"),
        (2, "Riya", "Nair", "nair.r@northeastern.edu", "ta"),
        (3, "Avery", "Lee", "lee.av@northeastern.edu", "student"),
        (4, "Jules", "Moreno", "moreno.j@northeastern.edu", "student"),
        (5, "Kiara", "Patel", "patel.k@northeastern.edu", "student"),
        (6, "Sam", "Okafor", "okafor.s@northeastern.edu", "student"),
    ];

    for (id, first_name, last_name, email, role) in users {
        sqlx::query(
            r#"
            INSERT INTO office_hours.users (id, first_name, last_name, email)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE
            SET first_name = EXCLUDED.first_name, last_name = EXCLUDED.last_name, email = EXCLUDED.email
            "#,
        )
        .bind(id)
        .bind(first_name)
        .bind(last_name)
        .bind(email)
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO office_hours.user_course (user_id, course_id, role)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, course_id) DO UPDATE SET role = EXCLUDED.role
            "#,
        )
        .bind(id)
        .bind(SEED_COURSE_ID)
        .bind(role)
        .execute(pool)
        .await?;
    }

    sqlx::query(
        r#"
        INSERT INTO office_hours.queues (id, course_id, room)
        VALUES ($1, $2, $3)
        ON CONFLICT (id) DO NOTHING
        "#,
    )
    .bind(1)
    .bind(SEED_COURSE_ID)
    .bind("Online")
    .execute(pool)
    .await?;

    // (id, creator, type, days ago, minutes waited, minutes helped)
    let questions = vec![
        (1, 3, Some("Bug"), 1, Some(12), Some(8)),
        (2, 3, Some("Concept"), 2, Some(5), Some(15)),
        (3, 4, Some("Bug"), 2, Some(25), Some(6)),
        (4, 5, Some("Setup"), 3, Some(3), Some(4)),
        (5, 3, Some("Testing"), 5, None, None),
        (6, 6, None, 6, Some(40), None),
        (7, 4, Some("Clarification"), 9, Some(18), Some(10)),
    ];

    let now = Utc::now();
    for (id, creator_id, question_type, days_ago, waited, helped) in questions {
        let created_at = now - Duration::days(days_ago);
        let first_helped_at = waited.map(|minutes| created_at + Duration::minutes(minutes));
        let closed_at = match (first_helped_at, helped) {
            (Some(start), Some(minutes)) => Some(start + Duration::minutes(minutes)),
            _ => None,
        };

        sqlx::query(
            r#"
            INSERT INTO office_hours.questions
            (id, queue_id, creator_id, helper_id, question_type, text,
             created_at, first_helped_at, helped_at, closed_at)
            VALUES ($1, 1, $2, $3, $4, $5, $6, $7, $7, $8)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(id)
        .bind(creator_id)
        .bind(first_helped_at.map(|_| 2))
        .bind(question_type)
        .bind(format!("Seed question {id}"))
        .bind(created_at)
        .bind(first_helped_at)
        .bind(closed_at)
        .execute(pool)
        .await?;
    }

    Ok(())
}

/// The insights `user_id` keeps on their dashboard.
pub async fn user_insights(pool: &PgPool, user_id: i32) -> anyhow::Result<Vec<String>> {
    let row = sqlx::query("SELECT insights FROM office_hours.users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .with_context(|| format!("no user with id {user_id}"))?;

    Ok(row.get("insights"))
}

pub async fn set_user_insights(pool: &PgPool, user_id: i32, insights: &[String]) -> anyhow::Result<()> {
    let result = sqlx::query("UPDATE office_hours.users SET insights = $2 WHERE id = $1")
        .bind(user_id)
        .bind(insights)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        anyhow::bail!("no user with id {user_id}");
    }
    Ok(())
}
