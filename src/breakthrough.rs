//! Likelihood that a qualitative jump in process quality is imminent.
//!
//! Four signals are combined, each clamped to `[0, 1]` before weighting:
//! time spent incubating, current acceleration, component instability and a
//! recent coherence jump.

use serde::{Deserialize, Serialize};

use crate::config::BreakthroughConfig;
use crate::models::{AnalysisRecord, CoherenceResult, Estimate, ProcessState};
use crate::utils::stats::{clamp_unit, mean, tail, variance};

/// Per-factor contributions, each already clamped to `[0, 1]`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BreakthroughFactors {
    pub incubation: f64,
    pub acceleration: f64,
    pub instability: f64,
    pub jump: f64,
}

#[derive(Debug, Clone, Default)]
pub struct BreakthroughDetector {
    config: BreakthroughConfig,
}

impl BreakthroughDetector {
    pub fn new(config: BreakthroughConfig) -> Self {
        Self { config }
    }

    /// Probability in `[0, 1]`, or the insufficient-history sentinel when
    /// fewer than `min_history` prior samples exist.
    pub fn detect(&self, result: &CoherenceResult, history: &[AnalysisRecord]) -> Estimate<f64> {
        self.factors(result, history).map(|factors| self.combine(&factors))
    }

    pub fn factors(
        &self,
        result: &CoherenceResult,
        history: &[AnalysisRecord],
    ) -> Estimate<BreakthroughFactors> {
        Estimate::require(self.config.min_history, history.len(), || BreakthroughFactors {
            incubation: self.incubation(history),
            acceleration: clamp_unit(result.second_derivative.abs() * self.config.acceleration_scale),
            instability: self.instability(result, history),
            jump: self.jump(result, history),
        })
    }

    fn combine(&self, factors: &BreakthroughFactors) -> f64 {
        let w = &self.config.weights;
        clamp_unit(
            w.incubation * clamp_unit(factors.incubation)
                + w.acceleration * clamp_unit(factors.acceleration)
                + w.instability * clamp_unit(factors.instability)
                + w.jump * clamp_unit(factors.jump),
        )
    }

    fn incubation(&self, history: &[AnalysisRecord]) -> f64 {
        let recent = tail(history, self.config.incubation_window);
        let incubating = recent
            .iter()
            .filter(|record| record.state == ProcessState::Incubation)
            .count();
        clamp_unit(incubating as f64 * self.config.incubation_scale)
    }

    /// Mean per-component variance over the current sample and the preceding ones.
    fn instability(&self, result: &CoherenceResult, history: &[AnalysisRecord]) -> f64 {
        let prior = tail(history, self.config.instability_window.saturating_sub(1));
        let samples: Vec<[f64; 4]> = prior
            .iter()
            .map(|record| record.result.named_components())
            .chain(std::iter::once(result.named_components()))
            .collect();

        let per_component: Vec<f64> = (0..4)
            .map(|i| {
                let column: Vec<f64> = samples.iter().map(|s| s[i]).collect();
                variance(&column)
            })
            .collect();

        clamp_unit(mean(&per_component) * self.config.instability_scale)
    }

    /// Mean of the latest 3 scores minus the mean of the scores 6-8 samples back.
    fn jump(&self, result: &CoherenceResult, history: &[AnalysisRecord]) -> f64 {
        let scores: Vec<f64> = history
            .iter()
            .map(|record| record.result.score)
            .chain(std::iter::once(result.score))
            .collect();
        let n = scores.len();
        if n < 8 {
            return 0.0;
        }

        let recent = mean(&scores[n - 3..]);
        let earlier = mean(&scores[n - 8..n - 5]);
        clamp_unit(clamp_unit(recent - earlier) * self.config.jump_scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FlowStatus, ProcessMetrics};
    use chrono::Utc;

    fn record(state: ProcessState, score: f64, comps: [f64; 4]) -> AnalysisRecord {
        AnalysisRecord {
            sample_index: 0,
            timestamp: Utc::now(),
            result: CoherenceResult::new(score, 0.0, 0.0)
                .with_components(comps[0], comps[1], comps[2], comps[3]),
            state,
            metrics: ProcessMetrics::default(),
            breakthrough_probability: 0.0,
            flow: FlowStatus::default(),
            recommendations: Vec::new(),
        }
    }

    fn steady_history(n: usize) -> Vec<AnalysisRecord> {
        (0..n)
            .map(|_| record(ProcessState::Transition, 0.5, [0.5; 4]))
            .collect()
    }

    fn current(score: f64, d2: f64) -> CoherenceResult {
        CoherenceResult::new(score, 0.0, d2).with_components(0.5, 0.5, 0.5, 0.5)
    }

    #[test]
    fn short_history_is_insufficient() {
        let detector = BreakthroughDetector::default();
        let estimate = detector.detect(&current(0.5, 0.0), &steady_history(9));
        assert_eq!(
            estimate,
            Estimate::InsufficientHistory {
                required: 10,
                available: 9
            }
        );
        assert_eq!(estimate.unwrap_or(0.0), 0.0);
    }

    #[test]
    fn calm_history_scores_zero() {
        let detector = BreakthroughDetector::default();
        let p = detector.detect(&current(0.5, 0.0), &steady_history(12)).unwrap_or(-1.0);
        assert_eq!(p, 0.0);
    }

    #[test]
    fn incubation_then_jump_scores_high() {
        let detector = BreakthroughDetector::default();
        let mut history: Vec<AnalysisRecord> = (0..8)
            .map(|_| record(ProcessState::Incubation, 0.3, [0.5; 4]))
            .collect();
        history.push(record(ProcessState::Illumination, 0.8, [0.5; 4]));
        history.push(record(ProcessState::Illumination, 0.85, [0.5; 4]));

        let factors = detector.factors(&current(0.9, 0.6), &history).ready().unwrap();
        assert_eq!(factors.incubation, 1.0);
        assert_eq!(factors.acceleration, 1.0);
        assert_eq!(factors.jump, 1.0);

        let p = detector.detect(&current(0.9, 0.6), &history).unwrap_or(0.0);
        assert!(p > 0.79, "got {p}");
        assert!(p <= 1.0);
    }

    #[test]
    fn non_decreasing_in_component_variance() {
        let detector = BreakthroughDetector::default();
        let mut previous = 0.0;
        for step in 0..=10 {
            let spread = step as f64 * 0.05;
            let mut history = steady_history(10);
            let n = history.len();
            for (offset, record) in history[n - 4..].iter_mut().enumerate() {
                let sign = if offset % 2 == 0 { 1.0 } else { -1.0 };
                let v = 0.5 + sign * spread;
                record.result = record.result.clone().with_components(v, v, v, v);
            }

            let p = detector.detect(&current(0.5, 0.0), &history).unwrap_or(0.0);
            assert!(p >= previous, "spread {spread}: {p} < {previous}");
            previous = p;
        }
        assert!(previous > 0.0);
    }
}
