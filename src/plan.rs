use log::debug;

use crate::difficulty::recommend_difficulty;
use crate::models::{Difficulty, PerformanceMetrics, StudyPlanSettings};

pub const DEFAULT_TOPICS_PER_DAY: u8 = 3;

/// Daily load table, first match wins.
const TOPICS_PER_DAY_RULES: &[(fn(&PerformanceMetrics) -> bool, u8)] = &[
    (is_intensive, 5),
    (is_steady, 4),
    (is_struggling, 2),
];

fn is_intensive(metrics: &PerformanceMetrics) -> bool {
    metrics.avg_minutes_per_day >= 120.0 && metrics.performance_score >= 70
}

fn is_steady(metrics: &PerformanceMetrics) -> bool {
    metrics.avg_minutes_per_day >= 60.0 && metrics.performance_score >= 60
}

fn is_struggling(metrics: &PerformanceMetrics) -> bool {
    metrics.performance_score < 40
}

pub fn topics_per_day(metrics: &PerformanceMetrics) -> u8 {
    TOPICS_PER_DAY_RULES
        .iter()
        .find(|(applies, _)| applies(metrics))
        .map(|(_, topics)| *topics)
        .unwrap_or(DEFAULT_TOPICS_PER_DAY)
}

pub fn adaptive_study_settings(metrics: &PerformanceMetrics) -> StudyPlanSettings {
    let settings = StudyPlanSettings {
        topics_per_day: topics_per_day(metrics),
        recommended_difficulty: recommend_difficulty(metrics, Difficulty::default()),
        estimated_minutes_per_topic: if metrics.performance_score >= 70 { 30 } else { 45 },
        should_review_previous: metrics.performance_score < 60,
    };
    debug!("study plan for score {}: {:?}", metrics.performance_score, settings);
    settings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::level_for_score;

    fn metrics(performance_score: u32, avg_minutes_per_day: f64) -> PerformanceMetrics {
        PerformanceMetrics {
            performance_score,
            avg_test_score: 70.0,
            avg_minutes_per_day,
            consistency: 1.0,
            total_topics_completed: 10,
            level: level_for_score(performance_score),
        }
    }

    #[test]
    fn intensive_high_scorers_get_five_short_topics() {
        let settings = adaptive_study_settings(&metrics(90, 150.0));
        assert_eq!(settings.topics_per_day, 5);
        assert_eq!(settings.estimated_minutes_per_topic, 30);
        assert!(!settings.should_review_previous);
    }

    #[test]
    fn struggling_learners_get_two_topics_and_review() {
        let settings = adaptive_study_settings(&metrics(30, 10.0));
        assert_eq!(settings.topics_per_day, 2);
        assert_eq!(settings.estimated_minutes_per_topic, 45);
        assert!(settings.should_review_previous);
        assert_eq!(settings.recommended_difficulty, Difficulty::Easy);
    }

    #[test]
    fn load_table_is_checked_in_order() {
        assert_eq!(topics_per_day(&metrics(70, 120.0)), 5);
        assert_eq!(topics_per_day(&metrics(69, 120.0)), 4);
        assert_eq!(topics_per_day(&metrics(60, 60.0)), 4);
        assert_eq!(topics_per_day(&metrics(59, 200.0)), 3);
        assert_eq!(topics_per_day(&metrics(90, 59.0)), 3);
        assert_eq!(topics_per_day(&metrics(39, 200.0)), 2);
    }

    #[test]
    fn review_and_pace_thresholds() {
        let at_sixty = adaptive_study_settings(&metrics(60, 0.0));
        assert!(!at_sixty.should_review_previous);
        assert_eq!(at_sixty.estimated_minutes_per_topic, 45);

        let below = adaptive_study_settings(&metrics(59, 0.0));
        assert!(below.should_review_previous);

        let at_seventy = adaptive_study_settings(&metrics(70, 0.0));
        assert_eq!(at_seventy.estimated_minutes_per_topic, 30);
    }

    #[test]
    fn difficulty_escalates_from_medium() {
        let mut ready = metrics(75, 90.0);
        ready.avg_test_score = 80.0;
        assert_eq!(
            adaptive_study_settings(&ready).recommended_difficulty,
            Difficulty::Hard
        );
    }
}
