use anyhow::Context;
use chrono::{Duration, NaiveDate, Utc};
use log::{debug, info};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::{CompletedTopicRecord, Difficulty, Learner, StudyRecord, Topic};

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

async fn upsert_learner(pool: &PgPool, full_name: &str, email: &str) -> anyhow::Result<Uuid> {
    let id: Uuid = sqlx::query(
        r#"
        INSERT INTO study_advisor.learners (id, full_name, email)
        VALUES ($1, $2, $3)
        ON CONFLICT (email) DO UPDATE
        SET full_name = EXCLUDED.full_name
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(full_name)
    .bind(email)
    .fetch_one(pool)
    .await?
    .get("id");

    Ok(id)
}

async fn upsert_study_day(
    pool: &PgPool,
    learner_id: Uuid,
    study_date: NaiveDate,
    minutes: i32,
    topics_completed: Option<i32>,
) -> anyhow::Result<u64> {
    let result = sqlx::query(
        r#"
        INSERT INTO study_advisor.study_days
        (id, learner_id, study_date, minutes, topics_completed)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (learner_id, study_date) DO UPDATE
        SET minutes = EXCLUDED.minutes, topics_completed = EXCLUDED.topics_completed
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(learner_id)
    .bind(study_date)
    .bind(minutes)
    .bind(topics_completed)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let roadmap_title = "Rust Foundations";
    let roadmap_id: Uuid = sqlx::query(
        r#"
        INSERT INTO study_advisor.roadmaps (id, title)
        VALUES ($1, $2)
        ON CONFLICT (title) DO UPDATE SET title = EXCLUDED.title
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(roadmap_title)
    .fetch_one(pool)
    .await?
    .get("id");

    let topics = vec![
        ("Variables and Types", Some(Difficulty::Easy)),
        ("Ownership", Some(Difficulty::Medium)),
        ("Borrowing", Some(Difficulty::Medium)),
        ("Lifetimes", Some(Difficulty::Hard)),
        ("Traits", None),
        ("Async Rust", Some(Difficulty::Hard)),
    ];

    for (position, (title, difficulty)) in topics.into_iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO study_advisor.topics (id, roadmap_id, title, difficulty, position)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (roadmap_id, title) DO UPDATE
            SET difficulty = EXCLUDED.difficulty, position = EXCLUDED.position
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(roadmap_id)
        .bind(title)
        .bind(difficulty.map(|d| d.as_str()))
        .bind(i32::try_from(position).context("topic position overflow")?)
        .execute(pool)
        .await?;
    }

    let learners = vec![
        (
            "Avery Lee",
            "avery.lee@example.com",
            vec![(0, 130, 2), (1, 140, 2), (2, 125, 1), (3, 150, 2), (4, 120, 1), (5, 135, 2), (6, 130, 1)],
            vec![
                ("Variables and Types", Some(95.0)),
                ("Ownership", Some(90.0)),
                ("Borrowing", Some(88.0)),
                ("Lifetimes", None),
            ],
        ),
        (
            "Jules Moreno",
            "jules.moreno@example.com",
            vec![(0, 50, 1), (2, 45, 0), (3, 60, 1), (5, 40, 1)],
            vec![("Variables and Types", Some(78.0)), ("Ownership", None)],
        ),
        (
            "Kiara Patel",
            "kiara.patel@example.com",
            vec![(1, 20, 0)],
            vec![("Variables and Types", Some(45.0))],
        ),
    ];

    let today = Utc::now().date_naive();
    for (full_name, email, days, completions) in learners {
        let learner_id = upsert_learner(pool, full_name, email).await?;

        for (days_ago, minutes, topics_completed) in days {
            upsert_study_day(
                pool,
                learner_id,
                today - Duration::days(days_ago),
                minutes,
                Some(topics_completed),
            )
            .await?;
        }

        for (topic_title, test_score) in completions {
            let topic_id: Uuid = sqlx::query(
                r#"
                SELECT t.id
                FROM study_advisor.topics t
                JOIN study_advisor.roadmaps r ON r.id = t.roadmap_id
                WHERE r.title = $1 AND t.title = $2
                "#,
            )
            .bind(roadmap_title)
            .bind(topic_title)
            .fetch_one(pool)
            .await?
            .get("id");

            sqlx::query(
                r#"
                INSERT INTO study_advisor.completed_topics
                (id, learner_id, topic_id, test_score, completed_on)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (learner_id, topic_id) DO UPDATE
                SET test_score = EXCLUDED.test_score
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(learner_id)
            .bind(topic_id)
            .bind(test_score)
            .bind(today)
            .execute(pool)
            .await?;
        }

        info!("seeded learner {email}");
    }

    Ok(())
}

pub async fn fetch_learner(pool: &PgPool, email: &str) -> anyhow::Result<Option<Learner>> {
    let row = sqlx::query(
        "SELECT id, full_name, email FROM study_advisor.learners WHERE email = $1",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|row| Learner {
        id: row.get("id"),
        full_name: row.get("full_name"),
        email: row.get("email"),
    }))
}

pub async fn fetch_study_records(
    pool: &PgPool,
    learner_id: Uuid,
    since_date: NaiveDate,
    until_date: NaiveDate,
) -> anyhow::Result<Vec<StudyRecord>> {
    let rows = sqlx::query(
        r#"
        SELECT study_date, minutes, topics_completed
        FROM study_advisor.study_days
        WHERE learner_id = $1 AND study_date >= $2 AND study_date <= $3
        ORDER BY study_date
        "#,
    )
    .bind(learner_id)
    .bind(since_date)
    .bind(until_date)
    .fetch_all(pool)
    .await?;

    let records: Vec<StudyRecord> = rows
        .into_iter()
        .map(|row| StudyRecord {
            date: row.get("study_date"),
            minutes: row.get("minutes"),
            topics_completed: row.get("topics_completed"),
        })
        .collect();

    debug!(
        "loaded {} study days from {since_date} to {until_date}",
        records.len()
    );
    Ok(records)
}

pub async fn fetch_completed_topics(
    pool: &PgPool,
    learner_id: Uuid,
) -> anyhow::Result<Vec<CompletedTopicRecord>> {
    let rows = sqlx::query(
        "SELECT test_score FROM study_advisor.completed_topics WHERE learner_id = $1",
    )
    .bind(learner_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| CompletedTopicRecord {
            test_score: row.get("test_score"),
        })
        .collect())
}

pub async fn fetch_roadmap_topics(pool: &PgPool, roadmap: &str) -> anyhow::Result<Vec<Topic>> {
    let rows = sqlx::query(
        r#"
        SELECT t.id, t.title, t.difficulty
        FROM study_advisor.topics t
        JOIN study_advisor.roadmaps r ON r.id = t.roadmap_id
        WHERE r.title = $1
        ORDER BY t.position
        "#,
    )
    .bind(roadmap)
    .fetch_all(pool)
    .await?;

    let mut topics = Vec::with_capacity(rows.len());
    for row in rows {
        let difficulty: Option<String> = row.get("difficulty");
        topics.push(Topic {
            id: row.get("id"),
            title: row.get("title"),
            difficulty: difficulty
                .map(|value| value.parse::<Difficulty>())
                .transpose()?,
        });
    }

    Ok(topics)
}

pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        full_name: String,
        email: String,
        study_date: NaiveDate,
        minutes: i32,
        #[serde(default)]
        topics_completed: Option<i32>,
    }

    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let mut written = 0usize;

    for (line, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = result.with_context(|| format!("invalid row {} in CSV", line + 1))?;
        let learner_id = upsert_learner(pool, &row.full_name, &row.email).await?;
        let affected = upsert_study_day(
            pool,
            learner_id,
            row.study_date,
            row.minutes,
            row.topics_completed,
        )
        .await?;

        debug!("imported {} on {} for {}", row.minutes, row.study_date, row.email);
        if affected > 0 {
            written += 1;
        }
    }

    Ok(written)
}
