use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::CoherenceSession;
use crate::models::{Estimate, ProcessState};
use crate::utils::stats::{mean, std_dev};

/// Direction of coherence between the first and last retained sample.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Trend {
    Improving,
    Declining,
    Stable,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session_id: String,
    pub started_at: DateTime<Utc>,
    pub sample_count: u64,
    /// Samples still in the bounded history window.
    pub retained_samples: usize,
    pub mean_score: f64,
    pub score_std_dev: f64,
    pub start_score: f64,
    pub end_score: f64,
    pub trend: Trend,
    pub state_distribution: BTreeMap<ProcessState, usize>,
    pub dominant_state: ProcessState,
    pub total_flow_ms: i64,
    pub closed_flow_episodes: usize,
    pub breakthrough_count: usize,
}

pub(super) fn summarize(session: &CoherenceSession) -> Estimate<SessionSummary> {
    Estimate::require(2, session.history().len(), || {
        let scores: Vec<f64> = session.history().map(|r| r.result.score).collect();
        let start_score = scores[0];
        let end_score = scores[scores.len() - 1];

        let mut state_distribution = BTreeMap::new();
        for record in session.history() {
            *state_distribution.entry(record.state).or_insert(0) += 1;
        }
        // ties go to the state declared first
        let dominant_state = state_distribution
            .iter()
            .fold(None::<(ProcessState, usize)>, |best, (state, count)| match best {
                Some((_, best_count)) if best_count >= *count => best,
                _ => Some((*state, *count)),
            })
            .map_or(ProcessState::Transition, |(state, _)| state);

        let trend = if end_score > start_score {
            Trend::Improving
        } else if end_score < start_score {
            Trend::Declining
        } else {
            Trend::Stable
        };

        SessionSummary {
            session_id: session.id().to_string(),
            started_at: session.created_at(),
            sample_count: session.sample_count(),
            retained_samples: scores.len(),
            mean_score: mean(&scores),
            score_std_dev: std_dev(&scores),
            start_score,
            end_score,
            trend,
            state_distribution,
            dominant_state,
            total_flow_ms: session.total_flow_ms(),
            closed_flow_episodes: session.flow_episodes().len(),
            breakthrough_count: session.breakthroughs().len(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::models::CoherenceResult;
    use chrono::TimeZone;

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn needs_two_samples() {
        let mut session = CoherenceSession::new(EngineConfig::default()).unwrap();
        session.analyze(
            t(0),
            CoherenceResult::new(0.5, 0.0, 0.0).with_components(0.5, 0.5, 0.5, 0.5),
            None,
            None,
        );
        assert_eq!(
            session.summary(),
            Estimate::InsufficientHistory {
                required: 2,
                available: 1
            }
        );
    }

    #[test]
    fn summarises_scores_and_states() {
        let mut session = CoherenceSession::new(EngineConfig::default()).unwrap();
        for (i, score) in [0.1, 0.15, 0.5, 0.9].into_iter().enumerate() {
            // low activation + high connection keeps the classifier on known ground
            let result = CoherenceResult::new(score, -0.01, 0.0).with_components(0.5, 0.5, 0.2, 0.5);
            session.analyze(t(i as i64 * 60), result, None, None);
        }

        let summary = session.summary().ready().expect("enough samples");
        assert_eq!(summary.started_at, session.created_at());
        assert_eq!(summary.sample_count, 4);
        assert_eq!(summary.start_score, 0.1);
        assert_eq!(summary.end_score, 0.9);
        assert_eq!(summary.trend, Trend::Improving);
        assert!((summary.mean_score - 0.4125).abs() < 1e-12);
        assert_eq!(summary.state_distribution.values().sum::<usize>(), 4);
        assert_eq!(summary.state_distribution.get(&ProcessState::Blocked), Some(&2));
        assert_eq!(summary.dominant_state, ProcessState::Blocked);
    }

    #[test]
    fn serialises_state_keys_by_name() {
        let mut session = CoherenceSession::new(EngineConfig::default()).unwrap();
        for i in 0..3 {
            let result = CoherenceResult::new(0.5, 0.0, 0.0).with_components(0.5, 0.5, 0.5, 0.5);
            session.analyze(t(i), result, None, None);
        }
        let summary = session.summary().ready().unwrap();
        let json = serde_json::to_value(&summary).unwrap();
        assert!(json["stateDistribution"].is_object());
        assert_eq!(json["trend"], "stable");
    }
}
