use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::metrics;
use crate::models::{PerformanceMetrics, StudyPlanSettings, StudyRecord, Topic};

const RECENT_DAYS_SHOWN: usize = 7;

pub fn build_report(
    learner_name: &str,
    now: DateTime<Utc>,
    performance: &PerformanceMetrics,
    settings: &StudyPlanSettings,
    roadmap: Option<(&str, &[Topic])>,
    records: &[StudyRecord],
) -> String {
    let mut output = String::new();
    let window_start = metrics::window_start(now);

    let _ = writeln!(output, "# Study Plan Report");
    let _ = writeln!(
        output,
        "Generated for {} (study window {} to {})",
        learner_name,
        window_start.date_naive(),
        now.date_naive()
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Performance Snapshot");
    let _ = writeln!(
        output,
        "- Performance score: {} ({})",
        performance.performance_score, performance.level
    );
    let _ = writeln!(output, "- Average test score: {:.1}", performance.avg_test_score);
    let _ = writeln!(
        output,
        "- Average study time: {:.1} minutes/day",
        performance.avg_minutes_per_day
    );
    let _ = writeln!(
        output,
        "- Consistency: {:.0}% of the last {} days",
        performance.consistency * 100.0,
        metrics::WINDOW_DAYS
    );
    let _ = writeln!(
        output,
        "- Topics completed this week: {}",
        performance.total_topics_completed
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Study Plan");
    let _ = writeln!(output, "- Topics per day: {}", settings.topics_per_day);
    let _ = writeln!(
        output,
        "- Recommended difficulty: {}",
        settings.recommended_difficulty
    );
    let _ = writeln!(
        output,
        "- Estimated minutes per topic: {}",
        settings.estimated_minutes_per_topic
    );
    let _ = writeln!(
        output,
        "- Review previous topics: {}",
        if settings.should_review_previous { "yes" } else { "no" }
    );

    if let Some((title, topics)) = roadmap {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Recommended Topic Order ({})", title);

        if topics.is_empty() {
            let _ = writeln!(output, "No topics found for this roadmap.");
        } else {
            for (index, topic) in topics.iter().enumerate() {
                let _ = writeln!(
                    output,
                    "{}. {} [{}]",
                    index + 1,
                    topic.title,
                    topic.difficulty()
                );
            }
        }
    }

    let mut recent: Vec<&StudyRecord> = records
        .iter()
        .filter(|record| metrics::in_window(record.date, now))
        .collect();
    recent.sort_by(|a, b| b.date.cmp(&a.date));
    let _ = writeln!(output);
    let _ = writeln!(output, "## Recent Study Days");

    if recent.is_empty() {
        let _ = writeln!(output, "No study activity recorded for this window.");
    } else {
        for record in recent.iter().take(RECENT_DAYS_SHOWN) {
            let _ = writeln!(
                output,
                "- {}: {} minutes, {} topics",
                record.date,
                record.minutes,
                record.topics_completed.unwrap_or(0)
            );
        }
    }

    output
}
