use std::path::PathBuf;

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{ArgAction, Parser, Subcommand};
use log::{info, LevelFilter};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

mod db;
mod difficulty;
mod metrics;
mod models;
mod plan;
mod report;

use models::{AdvisorSnapshot, Difficulty, Learner, PerformanceMetrics, StudyRecord};

#[derive(Parser)]
#[command(name = "study-advisor")]
#[command(about = "Adaptive difficulty and study plan advisor for learners", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Import study days from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Show performance metrics for a learner
    Metrics {
        #[arg(long)]
        email: String,
        /// Evaluate as of this instant (RFC 3339) instead of now
        #[arg(long)]
        as_of: Option<DateTime<Utc>>,
        #[arg(long)]
        json: bool,
    },
    /// Recommend a difficulty and daily study plan
    Plan {
        #[arg(long)]
        email: String,
        /// Difficulty the learner is currently studying at
        #[arg(long, default_value_t = Difficulty::Medium)]
        current_difficulty: Difficulty,
        #[arg(long)]
        as_of: Option<DateTime<Utc>>,
        #[arg(long)]
        json: bool,
    },
    /// List roadmap topics in adaptive order
    Topics {
        #[arg(long)]
        email: String,
        #[arg(long)]
        roadmap: String,
        #[arg(long, default_value_t = 10)]
        limit: usize,
        #[arg(long)]
        as_of: Option<DateTime<Utc>>,
    },
    /// Generate a markdown report
    Report {
        #[arg(long)]
        email: String,
        #[arg(long)]
        roadmap: Option<String>,
        #[arg(long)]
        as_of: Option<DateTime<Utc>>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

struct LearnerHistory {
    learner: Learner,
    records: Vec<StudyRecord>,
    metrics: PerformanceMetrics,
}

async fn load_history(
    pool: &PgPool,
    email: &str,
    now: DateTime<Utc>,
) -> anyhow::Result<LearnerHistory> {
    let learner = db::fetch_learner(pool, email)
        .await?
        .with_context(|| format!("no learner registered with email {email}"))?;
    let since_date = metrics::window_start(now).date_naive();
    let records =
        db::fetch_study_records(pool, learner.id, since_date, now.date_naive()).await?;
    let completed = db::fetch_completed_topics(pool, learner.id).await?;
    let metrics = metrics::compute_metrics(&records, &completed, now);
    info!(
        "{} has {} study days in window and {} completed topics",
        learner.email,
        records.len(),
        completed.len()
    );

    Ok(LearnerHistory {
        learner,
        records,
        metrics,
    })
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };
    env_logger::Builder::new()
        .filter_level(level)
        .format_target(false)
        .format_timestamp(None)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv } => {
            let written = db::import_csv(&pool, &csv).await?;
            info!("import of {} finished", csv.display());
            println!("Recorded {written} study days from {}.", csv.display());
        }
        Commands::Metrics { email, as_of, json } => {
            let now = as_of.unwrap_or_else(Utc::now);
            let history = load_history(&pool, &email, now).await?;
            let performance = &history.metrics;

            if json {
                let snapshot = AdvisorSnapshot {
                    learner: history.learner.email.clone(),
                    as_of: now,
                    metrics: performance.clone(),
                    current_difficulty: None,
                    difficulty: None,
                    plan: None,
                };
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
                return Ok(());
            }

            println!(
                "{} ({}): score {} ({})",
                history.learner.full_name,
                history.learner.email,
                performance.performance_score,
                performance.level
            );
            println!("- average test score {:.1}", performance.avg_test_score);
            println!("- {:.1} minutes/day", performance.avg_minutes_per_day);
            println!("- consistency {:.2}", performance.consistency);
            println!(
                "- {} topics completed in the last {} days",
                performance.total_topics_completed,
                metrics::WINDOW_DAYS
            );
        }
        Commands::Plan {
            email,
            current_difficulty,
            as_of,
            json,
        } => {
            let now = as_of.unwrap_or_else(Utc::now);
            let history = load_history(&pool, &email, now).await?;
            let next = difficulty::recommend_difficulty(&history.metrics, current_difficulty);
            let settings = plan::adaptive_study_settings(&history.metrics);

            if json {
                let snapshot = AdvisorSnapshot {
                    learner: history.learner.email.clone(),
                    as_of: now,
                    metrics: history.metrics.clone(),
                    current_difficulty: Some(current_difficulty),
                    difficulty: Some(next),
                    plan: Some(settings),
                };
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
                return Ok(());
            }

            println!(
                "{} is {} (score {}).",
                history.learner.full_name, history.metrics.level, history.metrics.performance_score
            );
            println!("Next difficulty from {current_difficulty}: {next}");
            println!(
                "Plan: {} topics/day at {} difficulty, ~{} minutes each{}",
                settings.topics_per_day,
                settings.recommended_difficulty,
                settings.estimated_minutes_per_topic,
                if settings.should_review_previous {
                    ", review previous topics first"
                } else {
                    ""
                }
            );
        }
        Commands::Topics {
            email,
            roadmap,
            limit,
            as_of,
        } => {
            let now = as_of.unwrap_or_else(Utc::now);
            let history = load_history(&pool, &email, now).await?;
            let topics = db::fetch_roadmap_topics(&pool, &roadmap).await?;

            if topics.is_empty() {
                println!("No topics found for roadmap {roadmap}.");
                return Ok(());
            }

            let sorted = difficulty::sort_by_adaptive_difficulty(&topics, &history.metrics);
            println!("Topics for {} on {roadmap}:", history.learner.full_name);
            for (index, topic) in sorted.iter().take(limit).enumerate() {
                println!("{}. {} [{}]", index + 1, topic.title, topic.difficulty());
            }
        }
        Commands::Report {
            email,
            roadmap,
            as_of,
            out,
        } => {
            let now = as_of.unwrap_or_else(Utc::now);
            let history = load_history(&pool, &email, now).await?;
            let settings = plan::adaptive_study_settings(&history.metrics);

            let sorted = match roadmap.as_deref() {
                Some(title) => {
                    let topics = db::fetch_roadmap_topics(&pool, title).await?;
                    Some((
                        title,
                        difficulty::sort_by_adaptive_difficulty(&topics, &history.metrics),
                    ))
                }
                None => None,
            };

            let report = report::build_report(
                &history.learner.full_name,
                now,
                &history.metrics,
                &settings,
                sorted
                    .as_ref()
                    .map(|(title, topics)| (*title, topics.as_slice())),
                &history.records,
            );
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
