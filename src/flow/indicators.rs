use serde::{Deserialize, Serialize};

use crate::config::FlowConfig;
use crate::models::{BiometricSnapshot, CoherenceResult, Component};
use crate::utils::stats::variance;

/// Outcome of the flow-indicator bundle for one sample.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FlowCheck {
    pub passed: usize,
    pub total: usize,
}

impl FlowCheck {
    /// At least half of the checks hold.
    pub fn is_majority(&self) -> bool {
        self.total > 0 && self.passed * 2 >= self.total
    }
}

#[derive(Debug, Clone, Default)]
pub struct FlowIndicators {
    config: FlowConfig,
}

impl FlowIndicators {
    pub fn new(config: FlowConfig) -> Self {
        Self { config }
    }

    /// Four coherence checks, plus two physiological ones when a snapshot is present.
    pub fn evaluate(
        &self,
        result: &CoherenceResult,
        biometrics: Option<&BiometricSnapshot>,
    ) -> FlowCheck {
        let c = &self.config;
        let activation = result.component_or_zero(Component::Activation);

        let mut checks = vec![
            result.score >= c.coherence_min,
            result.first_derivative.abs() <= c.derivative_max,
            (c.activation_min..=c.activation_max).contains(&activation),
            variance(&result.named_components()) <= c.component_variance_max,
        ];

        if let Some(bio) = biometrics {
            checks.push(bio.heart_rate_variability >= c.heart_rate_variability_min);
            checks.push(bio.eye_movement_entropy <= c.eye_movement_entropy_max);
        }

        FlowCheck {
            passed: checks.iter().filter(|&&ok| ok).count(),
            total: checks.len(),
        }
    }
}
