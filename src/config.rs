use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::classifier::{default_rules, StateRule};

/// Tunable thresholds for every analysis stage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Records kept per session before the oldest is evicted.
    pub history_capacity: usize,
    /// Breakthrough probability at or above which a record is logged as a breakthrough event.
    pub breakthrough_event_threshold: f64,
    pub classifier: ClassifierConfig,
    pub metrics: MetricsConfig,
    pub breakthrough: BreakthroughConfig,
    pub flow: FlowConfig,
    pub recommendation: RecommendationConfig,
    pub trajectory: TrajectoryConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            history_capacity: 1000,
            breakthrough_event_threshold: 0.7,
            classifier: ClassifierConfig::default(),
            metrics: MetricsConfig::default(),
            breakthrough: BreakthroughConfig::default(),
            flow: FlowConfig::default(),
            recommendation: RecommendationConfig::default(),
            trajectory: TrajectoryConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.history_capacity == 0 {
            bail!("historyCapacity must be greater than zero");
        }
        unit("breakthroughEventThreshold", self.breakthrough_event_threshold)?;
        self.classifier.validate()?;
        self.metrics.validate()?;
        self.breakthrough.validate()?;
        self.flow.validate()?;
        self.recommendation.validate()?;
        self.trajectory.validate()?;
        Ok(())
    }
}

fn unit(name: &str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        bail!("{name} must be in [0, 1], got {value}");
    }
    Ok(())
}

fn positive(name: &str, value: f64) -> Result<()> {
    if !(value.is_finite() && value > 0.0) {
        bail!("{name} must be a positive number, got {value}");
    }
    Ok(())
}

/// Ordered rule table plus the thresholds used when no rule matches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ClassifierConfig {
    pub rules: Vec<StateRule>,
    /// Fallback: Flow when activation is above this...
    pub fallback_flow_activation: f64,
    /// ...and consistency is at least this.
    pub fallback_flow_consistency: f64,
    /// Fallback: Blocked when activation is below this...
    pub fallback_blocked_activation: f64,
    /// ...and connection is above this.
    pub fallback_blocked_connection: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            rules: default_rules(),
            fallback_flow_activation: 0.7,
            fallback_flow_consistency: 0.5,
            fallback_blocked_activation: 0.3,
            fallback_blocked_connection: 0.7,
        }
    }
}

impl ClassifierConfig {
    pub fn validate(&self) -> Result<()> {
        for rule in &self.rules {
            rule.validate()?;
        }
        unit("fallbackFlowActivation", self.fallback_flow_activation)?;
        unit("fallbackFlowConsistency", self.fallback_flow_consistency)?;
        unit("fallbackBlockedActivation", self.fallback_blocked_activation)?;
        unit("fallbackBlockedConnection", self.fallback_blocked_connection)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct MetricsConfig {
    /// Recent samples used for fluency (score stability).
    pub fluency_window: usize,
    /// Recent samples used for flexibility (score entropy).
    pub flexibility_window: usize,
    pub flexibility_bins: usize,
    pub entropy_epsilon: f64,
    pub elaboration_base: f64,
    pub elaboration_gain: f64,
    /// Recent samples whose slope feeds the flow-intensity trend proxy.
    pub trend_window: usize,
    pub trend_gain: f64,
    pub intensity_trend_weight: f64,
    pub intensity_connection_weight: f64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            fluency_window: 5,
            flexibility_window: 20,
            flexibility_bins: 10,
            entropy_epsilon: 1e-10,
            elaboration_base: 0.5,
            elaboration_gain: 0.3,
            trend_window: 5,
            trend_gain: 5.0,
            intensity_trend_weight: 0.6,
            intensity_connection_weight: 0.4,
        }
    }
}

impl MetricsConfig {
    pub fn validate(&self) -> Result<()> {
        if self.fluency_window < 2 || self.flexibility_window < 2 || self.trend_window < 2 {
            bail!("metric windows must hold at least two samples");
        }
        if self.flexibility_bins < 2 {
            bail!("flexibilityBins must be at least 2, got {}", self.flexibility_bins);
        }
        positive("entropyEpsilon", self.entropy_epsilon)?;
        unit("intensityTrendWeight", self.intensity_trend_weight)?;
        unit("intensityConnectionWeight", self.intensity_connection_weight)?;
        if self.intensity_trend_weight + self.intensity_connection_weight > 1.0 + 1e-9 {
            bail!("flow intensity weights must sum to at most 1");
        }
        Ok(())
    }
}

/// Weights of the four breakthrough factors.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BreakthroughWeights {
    pub incubation: f64,
    pub acceleration: f64,
    pub instability: f64,
    pub jump: f64,
}

impl Default for BreakthroughWeights {
    fn default() -> Self {
        Self {
            incubation: 0.3,
            acceleration: 0.2,
            instability: 0.2,
            jump: 0.3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct BreakthroughConfig {
    /// Prior samples required before any estimate is produced.
    pub min_history: usize,
    pub incubation_window: usize,
    pub incubation_scale: f64,
    pub acceleration_scale: f64,
    pub instability_window: usize,
    pub instability_scale: f64,
    pub jump_scale: f64,
    pub weights: BreakthroughWeights,
}

impl Default for BreakthroughConfig {
    fn default() -> Self {
        Self {
            min_history: 10,
            incubation_window: 10,
            incubation_scale: 0.2,
            acceleration_scale: 2.0,
            instability_window: 5,
            instability_scale: 10.0,
            jump_scale: 2.0,
            weights: BreakthroughWeights::default(),
        }
    }
}

impl BreakthroughConfig {
    pub fn validate(&self) -> Result<()> {
        // the coherence-jump factor reaches eight samples back
        if self.min_history < 8 {
            bail!("breakthrough minHistory must be at least 8, got {}", self.min_history);
        }
        if self.incubation_window == 0 || self.instability_window < 2 {
            bail!("breakthrough windows are too small");
        }
        positive("incubationScale", self.incubation_scale)?;
        positive("accelerationScale", self.acceleration_scale)?;
        positive("instabilityScale", self.instability_scale)?;
        positive("jumpScale", self.jump_scale)?;
        let w = &self.weights;
        for (name, value) in [
            ("weights.incubation", w.incubation),
            ("weights.acceleration", w.acceleration),
            ("weights.instability", w.instability),
            ("weights.jump", w.jump),
        ] {
            unit(name, value)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct FlowConfig {
    pub coherence_min: f64,
    /// Maximum |first derivative| still considered stable.
    pub derivative_max: f64,
    pub activation_min: f64,
    pub activation_max: f64,
    /// Maximum variance across the four named components.
    pub component_variance_max: f64,
    /// Biometric checks, only evaluated when a snapshot is present.
    pub heart_rate_variability_min: f64,
    pub eye_movement_entropy_max: f64,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            coherence_min: 0.7,
            derivative_max: 0.05,
            activation_min: 0.4,
            activation_max: 0.85,
            component_variance_max: 0.05,
            heart_rate_variability_min: 0.6,
            eye_movement_entropy_max: 0.4,
        }
    }
}

impl FlowConfig {
    pub fn validate(&self) -> Result<()> {
        unit("flow.coherenceMin", self.coherence_min)?;
        positive("flow.derivativeMax", self.derivative_max)?;
        if self.activation_min > self.activation_max {
            bail!(
                "flow activation band is empty: [{}, {}]",
                self.activation_min,
                self.activation_max
            );
        }
        positive("flow.componentVarianceMax", self.component_variance_max)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct RecommendationConfig {
    pub low_consistency: f64,
    pub high_activation: f64,
    /// Exploration with flexibility below this gets a divergence prompt.
    pub low_variation: f64,
    pub high_breakthrough: f64,
    pub low_coherence: f64,
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            low_consistency: 0.3,
            high_activation: 0.7,
            low_variation: 0.3,
            high_breakthrough: 0.7,
            low_coherence: 0.3,
        }
    }
}

impl RecommendationConfig {
    pub fn validate(&self) -> Result<()> {
        unit("recommendation.lowConsistency", self.low_consistency)?;
        unit("recommendation.highActivation", self.high_activation)?;
        unit("recommendation.lowVariation", self.low_variation)?;
        unit("recommendation.highBreakthrough", self.high_breakthrough)?;
        unit("recommendation.lowCoherence", self.low_coherence)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct TrajectoryConfig {
    pub min_history: usize,
    /// Most recent scores the line is fitted to.
    pub fit_window: usize,
    pub minutes_per_point: u32,
    /// Longer requested horizons are cut down to this.
    pub max_horizon_minutes: u32,
    pub flow_threshold: f64,
    pub blocked_threshold: f64,
    /// |slope| below this reads as a plateau (Transition).
    pub slope_epsilon: f64,
    /// Sessions with more samples than this get high confidence.
    pub confidence_sample_threshold: usize,
    pub high_confidence: f64,
    pub low_confidence: f64,
}

impl Default for TrajectoryConfig {
    fn default() -> Self {
        Self {
            min_history: 10,
            fit_window: 10,
            minutes_per_point: 5,
            max_horizon_minutes: 24 * 60,
            flow_threshold: 0.75,
            blocked_threshold: 0.2,
            slope_epsilon: 0.01,
            confidence_sample_threshold: 50,
            high_confidence: 0.8,
            low_confidence: 0.5,
        }
    }
}

impl TrajectoryConfig {
    pub fn validate(&self) -> Result<()> {
        if self.fit_window < 2 || self.min_history < self.fit_window {
            bail!(
                "trajectory needs fitWindow >= 2 and minHistory >= fitWindow (got {} / {})",
                self.fit_window,
                self.min_history
            );
        }
        if self.minutes_per_point == 0 {
            bail!("trajectory minutesPerPoint must be greater than zero");
        }
        if self.max_horizon_minutes < self.minutes_per_point {
            bail!(
                "trajectory maxHorizonMinutes must be at least minutesPerPoint (got {} / {})",
                self.max_horizon_minutes,
                self.minutes_per_point
            );
        }
        if self.blocked_threshold >= self.flow_threshold {
            bail!("trajectory blockedThreshold must be below flowThreshold");
        }
        positive("trajectory.slopeEpsilon", self.slope_epsilon)?;
        unit("trajectory.highConfidence", self.high_confidence)?;
        unit("trajectory.lowConfidence", self.low_confidence)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        EngineConfig::default().validate().unwrap();
    }

    #[test]
    fn rejects_zero_capacity() {
        let config = EngineConfig {
            history_capacity: 0,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_inverted_trajectory_thresholds() {
        let mut config = EngineConfig::default();
        config.trajectory.blocked_threshold = 0.8;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("blockedThreshold"));
    }

    #[test]
    fn rejects_horizon_cap_below_one_step() {
        let mut config = EngineConfig::default();
        config.trajectory.max_horizon_minutes = 2;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("maxHorizonMinutes"));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"historyCapacity": 50, "flow": {"coherenceMin": 0.8}}"#)
                .unwrap();
        assert_eq!(config.history_capacity, 50);
        assert_eq!(config.flow.coherence_min, 0.8);
        assert_eq!(config.flow.derivative_max, 0.05);
        assert_eq!(config.classifier.rules, default_rules());
    }
}
