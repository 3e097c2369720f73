use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => anyhow::bail!("unknown difficulty '{other}' (expected easy, medium or hard)"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Novice,
    Beginner,
    Intermediate,
    Advanced,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Level::Novice => "novice",
            Level::Beginner => "beginner",
            Level::Intermediate => "intermediate",
            Level::Advanced => "advanced",
        };
        f.write_str(label)
    }
}

/// One day of logged study for a learner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudyRecord {
    pub date: NaiveDate,
    pub minutes: i32,
    #[serde(default)]
    pub topics_completed: Option<i32>,
}

/// A finished roadmap topic; `test_score` is absent when the topic had no test.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompletedTopicRecord {
    #[serde(default)]
    pub test_score: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topic {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
}

impl Topic {
    /// Effective difficulty; untagged topics count as medium.
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty.unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub performance_score: u32,
    pub avg_test_score: f64,
    pub avg_minutes_per_day: f64,
    pub consistency: f64,
    pub total_topics_completed: i64,
    pub level: Level,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyPlanSettings {
    pub topics_per_day: u8,
    pub recommended_difficulty: Difficulty,
    pub estimated_minutes_per_topic: u8,
    pub should_review_previous: bool,
}

#[derive(Debug, Clone)]
pub struct Learner {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
}

/// What `--json` prints for a learner.
#[derive(Debug, Serialize)]
pub struct AdvisorSnapshot {
    pub learner: String,
    pub as_of: DateTime<Utc>,
    pub metrics: PerformanceMetrics,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_difficulty: Option<Difficulty>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<StudyPlanSettings>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difficulty_parses_case_insensitively() {
        assert_eq!("Hard".parse::<Difficulty>().unwrap(), Difficulty::Hard);
        assert_eq!(" easy ".parse::<Difficulty>().unwrap(), Difficulty::Easy);
        assert!("extreme".parse::<Difficulty>().is_err());
    }

    #[test]
    fn untagged_topic_reads_as_medium() {
        let topic = Topic {
            id: Uuid::new_v4(),
            title: "Ownership".to_string(),
            difficulty: None,
        };
        assert_eq!(topic.difficulty(), Difficulty::Medium);
    }

    #[test]
    fn optional_fields_default_when_missing() {
        let record: StudyRecord =
            serde_json::from_str(r#"{"date":"2026-03-04","minutes":40}"#).unwrap();
        assert_eq!(record.topics_completed, None);

        let completed: CompletedTopicRecord = serde_json::from_str("{}").unwrap();
        assert_eq!(completed.test_score, None);
    }

    #[test]
    fn settings_serialize_with_lowercase_difficulty() {
        let settings = StudyPlanSettings {
            topics_per_day: 3,
            recommended_difficulty: Difficulty::Medium,
            estimated_minutes_per_topic: 45,
            should_review_previous: true,
        };
        let json = serde_json::to_string(&settings).unwrap();
        assert!(json.contains(r#""recommended_difficulty":"medium""#));
    }
}
