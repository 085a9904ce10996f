//! Seven bounded quality metrics derived from the current sample and the
//! session's recent history.

use crate::breakthrough::BreakthroughDetector;
use crate::config::{BreakthroughConfig, MetricsConfig};
use crate::models::{AnalysisRecord, CoherenceResult, Component, CreativeOutputSignal, ProcessMetrics};
use crate::utils::stats::{clamp_unit, histogram_entropy, linear_fit, std_dev, tail};

#[derive(Debug, Clone, Default)]
pub struct MetricsEngine {
    config: MetricsConfig,
    breakthrough: BreakthroughDetector,
}

impl MetricsEngine {
    pub fn new(config: MetricsConfig, breakthrough: BreakthroughConfig) -> Self {
        Self {
            config,
            breakthrough: BreakthroughDetector::new(breakthrough),
        }
    }

    /// `history` holds the prior records, oldest first; the current sample is
    /// not in it yet.
    pub fn compute(
        &self,
        result: &CoherenceResult,
        history: &[AnalysisRecord],
        output: Option<&CreativeOutputSignal>,
    ) -> ProcessMetrics {
        let breakthrough_probability = self.breakthrough.detect(result, history).unwrap_or(0.0);
        let elaboration_depth =
            self.config.elaboration_base + self.config.elaboration_gain * result.second_derivative;

        // one prior score is the minimum for any window-derived metric
        if history.is_empty() {
            return ProcessMetrics {
                novelty: 0.0,
                fluency_rate: 1.0 - result.score,
                flexibility_index: 0.0,
                elaboration_depth: clamp_unit(elaboration_depth),
                convergence_ratio: 0.0,
                flow_intensity: self.flow_intensity(result, &[result.score], output),
                breakthrough_probability,
            }
            .clamped();
        }

        let window_len = self
            .config
            .flexibility_window
            .max(self.config.fluency_window)
            .max(self.config.trend_window);
        let scores: Vec<f64> = tail(history, window_len.saturating_sub(1))
            .iter()
            .map(|record| record.result.score)
            .chain(std::iter::once(result.score))
            .collect();

        ProcessMetrics {
            novelty: self.novelty(result),
            fluency_rate: 1.0 - std_dev(tail(&scores, self.config.fluency_window)),
            flexibility_index: self.flexibility(tail(&scores, self.config.flexibility_window)),
            elaboration_depth: clamp_unit(elaboration_depth),
            convergence_ratio: convergence(result),
            flow_intensity: self.flow_intensity(result, &scores, output),
            breakthrough_probability,
        }
        .clamped()
    }

    fn novelty(&self, result: &CoherenceResult) -> f64 {
        let connection = result.component_or_zero(Component::Connection);
        let activation = result.component_or_zero(Component::Activation);
        (1.0 - connection) * activation
    }

    /// Score entropy normalised by the log of the bin count.
    fn flexibility(&self, scores: &[f64]) -> f64 {
        let entropy = histogram_entropy(scores, self.config.flexibility_bins);
        (entropy + self.config.entropy_epsilon).ln() / (self.config.flexibility_bins as f64).ln()
    }

    /// 0 without an output-quality signal; otherwise output quality scaled by a
    /// blend of the recent score trend and the connection component.
    fn flow_intensity(
        &self,
        result: &CoherenceResult,
        scores: &[f64],
        output: Option<&CreativeOutputSignal>,
    ) -> f64 {
        let Some(output) = output else {
            return 0.0;
        };

        let (slope, _) = linear_fit(tail(scores, self.config.trend_window));
        let trend = clamp_unit(0.5 + slope * self.config.trend_gain);
        let connection = clamp_unit(result.component_or_zero(Component::Connection));

        clamp_unit(output.quality)
            * (self.config.intensity_trend_weight * trend
                + self.config.intensity_connection_weight * connection)
    }
}

/// Acceleration over velocity while coherence is rising, else 0.
fn convergence(result: &CoherenceResult) -> f64 {
    if result.first_derivative <= 0.0 {
        0.0
    } else {
        result.second_derivative / result.first_derivative
    }
}
