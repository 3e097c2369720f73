use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use log::{debug, trace};

use crate::models::{CompletedTopicRecord, Level, PerformanceMetrics, StudyRecord};

pub const WINDOW_DAYS: i64 = 7;
/// Average assumed when a learner has no graded topics yet.
pub const NEUTRAL_TEST_SCORE: f64 = 50.0;
/// Daily minutes at which the time term stops growing.
pub const MINUTES_CAP: f64 = 60.0;

const TEST_WEIGHT: f64 = 0.5;
const TIME_WEIGHT: f64 = 0.3;
const CONSISTENCY_WEIGHT: f64 = 0.2;

const LEVEL_THRESHOLDS: [(u32, Level); 3] = [
    (80, Level::Advanced),
    (60, Level::Intermediate),
    (40, Level::Beginner),
];

pub fn compute_metrics(
    study_records: &[StudyRecord],
    completed_topics: &[CompletedTopicRecord],
    now: DateTime<Utc>,
) -> PerformanceMetrics {
    let recent: Vec<&StudyRecord> = study_records
        .iter()
        .filter(|record| in_window(record.date, now))
        .collect();

    let total_minutes: i64 = recent.iter().map(|record| i64::from(record.minutes)).sum();
    let total_topics_completed: i64 = recent
        .iter()
        .map(|record| i64::from(record.topics_completed.unwrap_or(0)))
        .sum();

    let days = WINDOW_DAYS as f64;
    let avg_minutes_per_day = total_minutes as f64 / days;
    let consistency = (recent.len() as f64 / days).min(1.0);

    let (total_tests, total_score) = completed_topics
        .iter()
        .filter_map(|topic| topic.test_score)
        .fold((0usize, 0.0f64), |(count, sum), score| (count + 1, sum + score));
    let avg_test_score = if total_tests > 0 {
        total_score / total_tests as f64
    } else {
        NEUTRAL_TEST_SCORE
    };

    let performance_score = performance_score(avg_test_score, avg_minutes_per_day, consistency);
    let level = level_for_score(performance_score);

    debug!(
        "metrics over {} of {} records: score {} ({}), avg test {:.1} from {} tests, {:.1} min/day, consistency {:.2}",
        recent.len(),
        study_records.len(),
        performance_score,
        level,
        avg_test_score,
        total_tests,
        avg_minutes_per_day,
        consistency
    );

    PerformanceMetrics {
        performance_score,
        avg_test_score,
        avg_minutes_per_day,
        consistency,
        total_topics_completed,
        level,
    }
}

/// Blends the three components and rounds once at the end.
pub fn performance_score(avg_test_score: f64, avg_minutes_per_day: f64, consistency: f64) -> u32 {
    let test_term = avg_test_score * TEST_WEIGHT;
    let time_term = (avg_minutes_per_day / MINUTES_CAP).min(1.0) * 100.0 * TIME_WEIGHT;
    let consistency_term = consistency * 100.0 * CONSISTENCY_WEIGHT;
    trace!(
        "score terms: test {:.3}, time {:.3}, consistency {:.3}",
        test_term,
        time_term,
        consistency_term
    );

    (test_term + time_term + consistency_term)
        .round()
        .clamp(0.0, 100.0) as u32
}

pub fn level_for_score(score: u32) -> Level {
    LEVEL_THRESHOLDS
        .iter()
        .find(|(floor, _)| score >= *floor)
        .map(|(_, level)| *level)
        .unwrap_or(Level::Novice)
}

pub fn window_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::days(WINDOW_DAYS)
}

/// A study day counts when its UTC midnight is on or after the window start
/// and the day itself is not later than `now`.
pub fn in_window(date: NaiveDate, now: DateTime<Utc>) -> bool {
    date <= now.date_naive() && date.and_time(NaiveTime::MIN).and_utc() >= window_start(now)
}
