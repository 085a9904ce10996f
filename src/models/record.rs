use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{CoherenceResult, Component, ProcessState};
use crate::utils::stats::{clamp_or, clamp_unit};

/// Secondary quality metrics derived per sample.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProcessMetrics {
    pub novelty: f64,
    pub fluency_rate: f64,
    pub flexibility_index: f64,
    pub elaboration_depth: f64,
    pub convergence_ratio: f64,
    pub flow_intensity: f64,
    pub breakthrough_probability: f64,
}

impl ProcessMetrics {
    /// Upper bound for the ratio-style metrics (elaboration depth, flow intensity).
    pub const RATIO_BOUND: f64 = 2.0;

    /// Clamp every field into its documented bound.
    pub fn clamped(self) -> Self {
        Self {
            novelty: clamp_unit(self.novelty),
            fluency_rate: clamp_unit(self.fluency_rate),
            flexibility_index: clamp_unit(self.flexibility_index),
            elaboration_depth: clamp_or(self.elaboration_depth, 0.0, Self::RATIO_BOUND, 0.0),
            convergence_ratio: clamp_unit(self.convergence_ratio),
            flow_intensity: clamp_or(self.flow_intensity, 0.0, Self::RATIO_BOUND, 0.0),
            breakthrough_probability: clamp_unit(self.breakthrough_probability),
        }
    }
}

/// A sustained high-quality episode. Open while `ended_at` is unset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FlowEpisode {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    /// Elapsed time while open, fixed to `ended_at - started_at` once closed.
    pub duration_ms: i64,
}

impl FlowEpisode {
    pub fn open(started_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at,
            ended_at: None,
            duration_ms: 0,
        }
    }

    pub fn is_open(&self) -> bool {
        self.ended_at.is_none()
    }

    pub fn duration(&self) -> Duration {
        Duration::milliseconds(self.duration_ms)
    }
}

/// Flow-indicator outcome attached to each record.
///
/// `in_flow` is the single attribute that says whether the sample is inside a
/// flow episode. It is computed independently of the `Flow` process state.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FlowStatus {
    pub in_flow: bool,
    pub checks_passed: usize,
    pub checks_total: usize,
    pub episode_id: Option<Uuid>,
    /// Elapsed time of the current (or just-closed) episode.
    pub elapsed_ms: i64,
}

impl FlowStatus {
    pub fn elapsed(&self) -> Duration {
        Duration::milliseconds(self.elapsed_ms)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub enum Urgency {
    Low,
    Medium,
    High,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Low => "low",
            Urgency::Medium => "medium",
            Urgency::High => "high",
        }
    }
}

/// Recommendation category; serialises as its snake_case name.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(into = "String", try_from = "String")]
pub enum Category {
    ClarityBoost,
    EmotionalRegulation,
    DivergencePrompt,
    FlowMaintenance,
    BreakthroughPreparation,
    Enhancement(Component),
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::ClarityBoost => "clarity_boost",
            Category::EmotionalRegulation => "emotional_regulation",
            Category::DivergencePrompt => "divergence_prompt",
            Category::FlowMaintenance => "flow_maintenance",
            Category::BreakthroughPreparation => "breakthrough_preparation",
            Category::Enhancement(Component::Consistency) => "consistency_enhancement",
            Category::Enhancement(Component::Depth) => "depth_enhancement",
            Category::Enhancement(Component::Activation) => "activation_enhancement",
            Category::Enhancement(Component::Connection) => "connection_enhancement",
        }
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        category.as_str().to_string()
    }
}

impl TryFrom<String> for Category {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let fixed = [
            Category::ClarityBoost,
            Category::EmotionalRegulation,
            Category::DivergencePrompt,
            Category::FlowMaintenance,
            Category::BreakthroughPreparation,
        ];
        fixed
            .into_iter()
            .chain(Component::ALL.into_iter().map(Category::Enhancement))
            .find(|c| c.as_str() == value)
            .ok_or_else(|| format!("unknown recommendation category: {value}"))
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub category: Category,
    pub action: String,
    pub rationale: String,
    pub urgency: Urgency,
}

/// Everything the engine derived for one sample.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRecord {
    /// Position in the session's sample stream, starting at 0.
    pub sample_index: u64,
    pub timestamp: DateTime<Utc>,
    pub result: CoherenceResult,
    pub state: ProcessState,
    pub metrics: ProcessMetrics,
    pub breakthrough_probability: f64,
    pub flow: FlowStatus,
    pub recommendations: Vec<Recommendation>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_clamp_to_documented_bounds() {
        let wild = ProcessMetrics {
            novelty: 1.7,
            fluency_rate: -0.3,
            flexibility_index: f64::NAN,
            elaboration_depth: 9.0,
            convergence_ratio: 40.0,
            flow_intensity: 1.5,
            breakthrough_probability: -1.0,
        }
        .clamped();

        assert_eq!(wild.novelty, 1.0);
        assert_eq!(wild.fluency_rate, 0.0);
        assert_eq!(wild.flexibility_index, 0.0);
        assert_eq!(wild.elaboration_depth, ProcessMetrics::RATIO_BOUND);
        assert_eq!(wild.convergence_ratio, 1.0);
        assert_eq!(wild.flow_intensity, 1.5);
        assert_eq!(wild.breakthrough_probability, 0.0);
    }

    #[test]
    fn category_serialises_as_snake_case_name() {
        let json = serde_json::to_string(&Category::EmotionalRegulation).unwrap();
        assert_eq!(json, "\"emotional_regulation\"");

        let back: Category = serde_json::from_str("\"depth_enhancement\"").unwrap();
        assert_eq!(back, Category::Enhancement(Component::Depth));

        assert!(serde_json::from_str::<Category>("\"nap\"").is_err());
    }
}
