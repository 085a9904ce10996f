use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use super::CoherenceSource;
use crate::models::{CoherenceResult, CoherenceVariables, Component};
use crate::utils::stats::{clamp_unit, gradient};
use crate::utils::RingBuffer;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct GctParams {
    /// Saturation constant of the activation optimisation curve.
    pub km: f64,
    /// Inhibition constant of the activation optimisation curve. Must be non-zero.
    pub ki: f64,
    pub coupling_strength: f64,
    /// Samples kept for derivative estimation.
    pub history_limit: usize,
    /// Raw coherence is divided by this to land in `[0, 1]`.
    pub score_scale: f64,
}

impl Default for GctParams {
    fn default() -> Self {
        Self {
            km: 0.3,
            ki: 0.1,
            coupling_strength: 0.15,
            history_limit: 100,
            score_scale: 4.0,
        }
    }
}

/// Reference coherence source.
///
/// `raw = psi + rho*psi + q_opt + f*psi + coupling*rho*q_opt` with
/// `q_opt = q / (km + q + q^2/ki)`, where psi, rho, q and f are the
/// consistency, depth, activation and connection inputs. Derivatives are
/// time gradients (per minute) of the normalised score over recent samples.
#[derive(Debug, Clone)]
pub struct GctCoherenceSource {
    params: GctParams,
    /// (minutes since first sample, normalised score)
    history: RingBuffer<(f64, f64)>,
    origin: Option<chrono::DateTime<chrono::Utc>>,
}

impl GctCoherenceSource {
    pub fn new(params: GctParams) -> Self {
        Self {
            history: RingBuffer::new(params.history_limit),
            params,
            origin: None,
        }
    }

    /// Wisdom-modulated activation.
    pub fn optimized_activation(&self, activation: f64) -> Result<f64> {
        if self.params.ki == 0.0 {
            bail!("ki parameter cannot be zero");
        }
        if activation < 0.0 {
            bail!("activation must be non-negative, got {activation}");
        }
        let denominator = self.params.km + activation + activation.powi(2) / self.params.ki;
        if denominator == 0.0 {
            bail!("activation optimisation denominator is zero");
        }
        Ok(activation / denominator)
    }

    pub fn reset(&mut self) {
        self.history.clear();
        self.origin = None;
    }

    fn derivatives(&mut self) -> (f64, f64) {
        let samples = self.history.as_slice();
        if samples.len() < 2 {
            return (0.0, 0.0);
        }
        let times: Vec<f64> = samples.iter().map(|(t, _)| *t).collect();
        let scores: Vec<f64> = samples.iter().map(|(_, s)| *s).collect();

        let first = gradient(&scores, &times);
        let d1 = first.last().copied().unwrap_or(0.0);
        let d2 = if samples.len() < 3 {
            0.0
        } else {
            gradient(&first, &times).last().copied().unwrap_or(0.0)
        };
        (d1, d2)
    }
}

impl Default for GctCoherenceSource {
    fn default() -> Self {
        Self::new(GctParams::default())
    }
}

impl CoherenceSource for GctCoherenceSource {
    fn evaluate(&mut self, variables: &CoherenceVariables) -> Result<CoherenceResult> {
        let CoherenceVariables {
            consistency: psi,
            depth: rho,
            activation: q,
            connection: f,
            timestamp,
        } = *variables;

        if ![psi, rho, q, f].iter().all(|v| v.is_finite()) {
            bail!("coherence variables must be finite: {variables:?}");
        }

        let q_opt = self.optimized_activation(q)?;
        let wisdom = rho * psi;
        let social = f * psi;
        let coupling = self.params.coupling_strength * rho * q_opt;
        let raw = psi + wisdom + q_opt + social + coupling;
        let score = clamp_unit(raw / self.params.score_scale);

        let origin = *self.origin.get_or_insert(timestamp);
        let minutes = (timestamp - origin).num_milliseconds() as f64 / 60_000.0;
        self.history.push((minutes, score));
        let (d1, d2) = self.derivatives();

        let mut result = CoherenceResult::new(score, d1, d2)
            .with_component(Component::Consistency, psi)
            .with_component(Component::Depth, wisdom)
            .with_component(Component::Activation, q)
            .with_component(Component::Connection, f);
        result.components.insert("activationOptimized".into(), q_opt);
        result.components.insert("coupling".into(), coupling);
        result.components.insert("rawCoherence".into(), raw);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn vars(psi: f64, rho: f64, q: f64, f: f64, minute: i64) -> CoherenceVariables {
        let t0 = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        CoherenceVariables::at(psi, rho, q, f, t0 + Duration::minutes(minute))
    }

    #[test]
    fn raw_coherence_matches_formula() {
        let mut source = GctCoherenceSource::default();
        let result = source.evaluate(&vars(0.8, 0.5, 0.2, 0.6, 0)).unwrap();

        let q_opt = 0.2 / (0.3 + 0.2 + 0.04 / 0.1);
        let raw = 0.8 + 0.4 + q_opt + 0.48 + 0.15 * 0.5 * q_opt;
        assert!((result.components["rawCoherence"] - raw).abs() < 1e-12);
        assert!((result.score - raw / 4.0).abs() < 1e-12);
        assert_eq!(result.component(Component::Activation), Some(0.2));
        assert!((result.component(Component::Depth).unwrap() - 0.4).abs() < 1e-12);
        assert_eq!(result.first_derivative, 0.0);
        assert_eq!(result.second_derivative, 0.0);
    }

    #[test]
    fn derivatives_track_score_changes() {
        let mut source = GctCoherenceSource::default();
        source.evaluate(&vars(0.2, 0.2, 0.1, 0.2, 0)).unwrap();
        let second = source.evaluate(&vars(0.5, 0.2, 0.1, 0.2, 1)).unwrap();
        assert!(second.first_derivative > 0.0);

        let third = source.evaluate(&vars(0.3, 0.2, 0.1, 0.2, 2)).unwrap();
        assert!(third.first_derivative < 0.0);
        assert!(third.second_derivative < 0.0);
    }

    #[test]
    fn rejects_invalid_inputs_without_recording_them() {
        let mut source = GctCoherenceSource::default();
        assert!(source.evaluate(&vars(0.5, 0.5, -0.1, 0.5, 0)).is_err());
        assert!(source.evaluate(&vars(f64::NAN, 0.5, 0.1, 0.5, 0)).is_err());

        // first accepted sample still has no derivative history
        let result = source.evaluate(&vars(0.5, 0.5, 0.1, 0.5, 1)).unwrap();
        assert_eq!(result.first_derivative, 0.0);

        let mut broken = GctCoherenceSource::new(GctParams {
            ki: 0.0,
            ..GctParams::default()
        });
        assert!(broken.evaluate(&vars(0.5, 0.5, 0.1, 0.5, 0)).is_err());
    }
}
