use log::debug;

use crate::models::{Difficulty, PerformanceMetrics, Topic};

/// One row of the recommendation table. Rows are checked in order and the
/// first one whose `applies` matches decides the outcome.
struct DifficultyRule {
    name: &'static str,
    applies: fn(&PerformanceMetrics) -> bool,
    outcome: fn(Difficulty) -> Difficulty,
}

const DIFFICULTY_RULES: &[DifficultyRule] = &[
    DifficultyRule {
        name: "mastery",
        applies: is_mastering,
        outcome: always_hard,
    },
    DifficultyRule {
        name: "escalate",
        applies: is_ready_to_escalate,
        outcome: escalate,
    },
    DifficultyRule {
        name: "struggling",
        applies: is_struggling,
        outcome: always_easy,
    },
];

fn is_mastering(metrics: &PerformanceMetrics) -> bool {
    metrics.performance_score >= 85 && metrics.avg_test_score >= 85.0
}

fn is_ready_to_escalate(metrics: &PerformanceMetrics) -> bool {
    metrics.performance_score >= 70 && metrics.avg_test_score >= 75.0
}

fn is_struggling(metrics: &PerformanceMetrics) -> bool {
    metrics.performance_score < 40 || metrics.avg_test_score < 50.0
}

fn always_hard(_: Difficulty) -> Difficulty {
    Difficulty::Hard
}

fn always_easy(_: Difficulty) -> Difficulty {
    Difficulty::Easy
}

// Easy steps up to medium; anything else goes straight to hard.
fn escalate(current: Difficulty) -> Difficulty {
    match current {
        Difficulty::Easy => Difficulty::Medium,
        Difficulty::Medium | Difficulty::Hard => Difficulty::Hard,
    }
}

pub fn recommend_difficulty(metrics: &PerformanceMetrics, current: Difficulty) -> Difficulty {
    let matched = DIFFICULTY_RULES
        .iter()
        .find(|rule| (rule.applies)(metrics));

    match matched {
        Some(rule) => {
            let recommended = (rule.outcome)(current);
            debug!(
                "difficulty rule '{}' matched (score {}, avg test {:.1}, current {}): {}",
                rule.name, metrics.performance_score, metrics.avg_test_score, current, recommended
            );
            recommended
        }
        None => Difficulty::Medium,
    }
}

/// Orders topics so the ones tagged with the recommended difficulty come
/// first. The sort is stable: each group keeps its input order.
pub fn sort_by_adaptive_difficulty(topics: &[Topic], metrics: &PerformanceMetrics) -> Vec<Topic> {
    let target = recommend_difficulty(metrics, Difficulty::default());
    let mut sorted = topics.to_vec();
    sorted.sort_by_key(|topic| topic.difficulty() != target);
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::level_for_score;
    use uuid::Uuid;

    fn metrics(performance_score: u32, avg_test_score: f64) -> PerformanceMetrics {
        PerformanceMetrics {
            performance_score,
            avg_test_score,
            avg_minutes_per_day: 30.0,
            consistency: 0.5,
            total_topics_completed: 3,
            level: level_for_score(performance_score),
        }
    }

    fn topic(title: &str, difficulty: Option<Difficulty>) -> Topic {
        Topic {
            id: Uuid::new_v4(),
            title: title.to_string(),
            difficulty,
        }
    }

    fn titles(topics: &[Topic]) -> Vec<&str> {
        topics.iter().map(|topic| topic.title.as_str()).collect()
    }

    #[test]
    fn strong_learners_get_hard_regardless_of_current() {
        let strong = metrics(90, 92.0);
        assert_eq!(recommend_difficulty(&strong, Difficulty::Easy), Difficulty::Hard);
        assert_eq!(recommend_difficulty(&strong, Difficulty::Medium), Difficulty::Hard);
    }

    #[test]
    fn escalation_from_easy_is_one_step() {
        let ready = metrics(75, 80.0);
        assert_eq!(recommend_difficulty(&ready, Difficulty::Easy), Difficulty::Medium);
        assert_eq!(recommend_difficulty(&ready, Difficulty::Medium), Difficulty::Hard);
        assert_eq!(recommend_difficulty(&ready, Difficulty::Hard), Difficulty::Hard);
    }

    #[test]
    fn high_score_without_mastery_tests_escalates_instead() {
        assert_eq!(
            recommend_difficulty(&metrics(88, 80.0), Difficulty::Easy),
            Difficulty::Medium
        );
        assert_eq!(
            recommend_difficulty(&metrics(88, 80.0), Difficulty::Medium),
            Difficulty::Hard
        );
    }

    #[test]
    fn weak_tests_do_not_escalate() {
        assert_eq!(
            recommend_difficulty(&metrics(72, 60.0), Difficulty::Medium),
            Difficulty::Medium
        );
    }

    #[test]
    fn rule_thresholds_are_inclusive() {
        assert_eq!(recommend_difficulty(&metrics(85, 85.0), Difficulty::Easy), Difficulty::Hard);
        assert_eq!(recommend_difficulty(&metrics(84, 85.0), Difficulty::Easy), Difficulty::Medium);
        assert_eq!(recommend_difficulty(&metrics(85, 84.9), Difficulty::Easy), Difficulty::Medium);
        assert_eq!(recommend_difficulty(&metrics(70, 75.0), Difficulty::Medium), Difficulty::Hard);
        assert_eq!(recommend_difficulty(&metrics(70, 75.0), Difficulty::Easy), Difficulty::Medium);
        assert_eq!(recommend_difficulty(&metrics(69, 75.0), Difficulty::Easy), Difficulty::Medium);
        assert_eq!(recommend_difficulty(&metrics(70, 74.9), Difficulty::Easy), Difficulty::Medium);
        assert_eq!(recommend_difficulty(&metrics(40, 50.0), Difficulty::Hard), Difficulty::Medium);
    }

    #[test]
    fn struggling_learners_drop_to_easy() {
        assert_eq!(recommend_difficulty(&metrics(39, 70.0), Difficulty::Hard), Difficulty::Easy);
        assert_eq!(recommend_difficulty(&metrics(65, 49.0), Difficulty::Medium), Difficulty::Easy);
    }

    #[test]
    fn everything_else_is_medium() {
        assert_eq!(recommend_difficulty(&metrics(40, 50.0), Difficulty::Easy), Difficulty::Medium);
        assert_eq!(recommend_difficulty(&metrics(69, 90.0), Difficulty::Hard), Difficulty::Medium);
    }

    #[test]
    fn recommendation_is_deterministic() {
        let sample = metrics(75, 80.0);
        let first = recommend_difficulty(&sample, Difficulty::Medium);
        let second = recommend_difficulty(&sample, Difficulty::Medium);
        assert_eq!(first, second);
    }

    #[test]
    fn matching_topics_move_first_in_input_order() {
        let topics = vec![
            topic("A", Some(Difficulty::Medium)),
            topic("B", Some(Difficulty::Hard)),
            topic("C", Some(Difficulty::Medium)),
            topic("D", Some(Difficulty::Hard)),
        ];
        let sorted = sort_by_adaptive_difficulty(&topics, &metrics(75, 80.0));
        assert_eq!(titles(&sorted), vec!["B", "D", "A", "C"]);
        assert_eq!(titles(&topics), vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn untagged_topics_sort_as_medium() {
        let topics = vec![
            topic("hard", Some(Difficulty::Hard)),
            topic("untagged", None),
            topic("easy", Some(Difficulty::Easy)),
            topic("medium", Some(Difficulty::Medium)),
        ];
        let sorted = sort_by_adaptive_difficulty(&topics, &metrics(55, 65.0));
        assert_eq!(titles(&sorted), vec!["untagged", "medium", "hard", "easy"]);
    }

    #[test]
    fn empty_topic_list_stays_empty() {
        assert!(sort_by_adaptive_difficulty(&[], &metrics(25, 50.0)).is_empty());
    }
}
