//! Short-horizon extrapolation of the coherence curve.
//!
//! A line is fitted to the most recent scores and extended forward; each
//! extrapolated point is mapped to a predicted state, and transitions into
//! risky or promising states schedule interventions ahead of time.

use serde::{Deserialize, Serialize};

use crate::config::TrajectoryConfig;
use crate::models::{Estimate, ProcessState};
use crate::utils::stats::{linear_fit, tail};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InterventionKind {
    PreventBlock,
    PrepareFlow,
}

impl InterventionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterventionKind::PreventBlock => "prevent_block",
            InterventionKind::PrepareFlow => "prepare_flow",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ConfidenceLevel {
    Low,
    High,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Confidence {
    pub level: ConfidenceLevel,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PredictedPoint {
    pub offset_minutes: u32,
    pub coherence: f64,
    pub state: ProcessState,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledIntervention {
    pub offset_minutes: u32,
    pub kind: InterventionKind,
    /// State predicted at the point that triggered this intervention.
    pub predicted_state: ProcessState,
    pub rationale: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrajectoryForecast {
    pub horizon_minutes: u32,
    pub slope: f64,
    pub points: Vec<PredictedPoint>,
    pub interventions: Vec<ScheduledIntervention>,
    pub confidence: Confidence,
}

impl TrajectoryForecast {
    pub fn states(&self) -> Vec<ProcessState> {
        self.points.iter().map(|p| p.state).collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct TrajectoryPredictor {
    config: TrajectoryConfig,
}

impl TrajectoryPredictor {
    pub fn new(config: TrajectoryConfig) -> Self {
        Self { config }
    }

    /// `scores` is the session's coherence history, oldest first. Horizons
    /// beyond `max_horizon_minutes` are clamped to it.
    pub fn predict(
        &self,
        current_state: ProcessState,
        horizon_minutes: u32,
        scores: &[f64],
    ) -> Estimate<TrajectoryForecast> {
        Estimate::require(self.config.min_history, scores.len(), || {
            self.forecast(current_state, horizon_minutes, scores)
        })
    }

    fn forecast(
        &self,
        current_state: ProcessState,
        horizon_minutes: u32,
        scores: &[f64],
    ) -> TrajectoryForecast {
        let c = &self.config;
        let window = tail(scores, c.fit_window);
        let (slope, intercept) = linear_fit(window);
        let horizon_minutes = horizon_minutes.min(c.max_horizon_minutes);
        let count = (horizon_minutes / c.minutes_per_point).max(1);

        let mut points = Vec::with_capacity(count as usize);
        let mut carried = current_state;
        for step in 0..count {
            let x = (window.len() + step as usize) as f64;
            let coherence = slope * x + intercept;
            // a line's local slope is its fitted slope everywhere
            let state = if coherence >= c.flow_threshold {
                ProcessState::Flow
            } else if coherence < c.blocked_threshold {
                ProcessState::Blocked
            } else if slope.abs() < c.slope_epsilon {
                ProcessState::Transition
            } else {
                carried
            };
            carried = state;
            points.push(PredictedPoint {
                offset_minutes: (step + 1) * c.minutes_per_point,
                coherence,
                state,
            });
        }

        TrajectoryForecast {
            horizon_minutes,
            slope,
            interventions: schedule(current_state, &points),
            points,
            confidence: self.confidence(scores.len()),
        }
    }

    fn confidence(&self, samples: usize) -> Confidence {
        if samples > self.config.confidence_sample_threshold {
            Confidence {
                level: ConfidenceLevel::High,
                value: self.config.high_confidence,
            }
        } else {
            Confidence {
                level: ConfidenceLevel::Low,
                value: self.config.low_confidence,
            }
        }
    }
}

/// Walk the predicted states and schedule an intervention on each entry into
/// Blocked or Transition. Entering Flow without a preceding Transition point
/// gets a `prepare_flow` one step earlier (or now, for the first point).
fn schedule(current_state: ProcessState, points: &[PredictedPoint]) -> Vec<ScheduledIntervention> {
    let mut out = Vec::new();
    let mut previous = current_state;

    for (i, point) in points.iter().enumerate() {
        if point.state != previous {
            match point.state {
                ProcessState::Blocked => out.push(ScheduledIntervention {
                    offset_minutes: point.offset_minutes,
                    kind: InterventionKind::PreventBlock,
                    predicted_state: point.state,
                    rationale: format!(
                        "coherence projected to fall to {:.2} in {} min",
                        point.coherence, point.offset_minutes
                    ),
                }),
                ProcessState::Transition => out.push(ScheduledIntervention {
                    offset_minutes: point.offset_minutes,
                    kind: InterventionKind::PrepareFlow,
                    predicted_state: point.state,
                    rationale: format!(
                        "coherence plateaus near {:.2}; set up for a flow push",
                        point.coherence
                    ),
                }),
                ProcessState::Flow => {
                    let led_in = i > 0 && points[i - 1].state == ProcessState::Transition;
                    if !led_in {
                        let lead = if i == 0 { 0 } else { points[i - 1].offset_minutes };
                        out.push(ScheduledIntervention {
                            offset_minutes: lead,
                            kind: InterventionKind::PrepareFlow,
                            predicted_state: point.state,
                            rationale: format!(
                                "flow projected in {} min (coherence {:.2})",
                                point.offset_minutes, point.coherence
                            ),
                        });
                    }
                }
                _ => {}
            }
        }
        previous = point.state;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rising(n: usize, from: f64, to: f64) -> Vec<f64> {
        (0..n)
            .map(|i| from + (to - from) * i as f64 / (n - 1) as f64)
            .collect()
    }

    #[test]
    fn needs_ten_samples() {
        let predictor = TrajectoryPredictor::default();
        let estimate = predictor.predict(ProcessState::Transition, 30, &[0.5; 9]);
        assert_eq!(
            estimate,
            Estimate::InsufficientHistory {
                required: 10,
                available: 9
            }
        );
    }

    #[test]
    fn flat_low_history_stays_blocked() {
        let predictor = TrajectoryPredictor::default();
        let forecast = predictor
            .predict(ProcessState::Transition, 30, &[0.1; 15])
            .ready()
            .unwrap();

        assert_eq!(forecast.points.len(), 6);
        assert!(forecast.states().iter().all(|s| *s == ProcessState::Blocked));
        assert!(forecast
            .interventions
            .iter()
            .all(|i| i.kind != InterventionKind::PrepareFlow));
    }

    #[test]
    fn rising_history_prepares_flow_ahead_of_it() {
        let predictor = TrajectoryPredictor::default();
        let forecast = predictor
            .predict(ProcessState::Exploration, 30, &rising(15, 0.1, 0.9))
            .ready()
            .unwrap();

        let first_flow = forecast
            .points
            .iter()
            .find(|p| p.state == ProcessState::Flow)
            .expect("flow predicted");
        let prepare = forecast
            .interventions
            .iter()
            .find(|i| i.kind == InterventionKind::PrepareFlow)
            .expect("prepare_flow scheduled");
        assert!(prepare.offset_minutes < first_flow.offset_minutes);
    }

    #[test]
    fn plateau_schedules_prepare_flow_on_transition() {
        let predictor = TrajectoryPredictor::default();
        let forecast = predictor
            .predict(ProcessState::Exploration, 15, &[0.5; 12])
            .ready()
            .unwrap();

        assert_eq!(
            forecast.states(),
            vec![ProcessState::Transition; 3]
        );
        assert_eq!(forecast.interventions.len(), 1);
        assert_eq!(forecast.interventions[0].kind, InterventionKind::PrepareFlow);
        assert_eq!(forecast.interventions[0].offset_minutes, 5);
    }

    #[test]
    fn falling_history_schedules_prevent_block() {
        let predictor = TrajectoryPredictor::default();
        let forecast = predictor
            .predict(ProcessState::Verification, 60, &rising(12, 0.7, 0.3))
            .ready()
            .unwrap();

        let block = forecast
            .interventions
            .iter()
            .find(|i| i.kind == InterventionKind::PreventBlock)
            .expect("prevent_block scheduled");
        let first_blocked = forecast
            .points
            .iter()
            .find(|p| p.state == ProcessState::Blocked)
            .unwrap();
        assert_eq!(block.offset_minutes, first_blocked.offset_minutes);
    }

    #[test]
    fn horizon_shorter_than_a_step_still_yields_one_point() {
        let predictor = TrajectoryPredictor::default();
        let forecast = predictor
            .predict(ProcessState::Transition, 2, &[0.5; 10])
            .ready()
            .unwrap();
        assert_eq!(forecast.points.len(), 1);
        assert_eq!(forecast.points[0].offset_minutes, 5);
    }

    #[test]
    fn huge_horizon_is_clamped() {
        let predictor = TrajectoryPredictor::default();
        let forecast = predictor
            .predict(ProcessState::Transition, u32::MAX, &[0.5; 12])
            .ready()
            .unwrap();

        assert_eq!(forecast.horizon_minutes, 24 * 60);
        assert_eq!(forecast.points.len(), 24 * 60 / 5);
        assert_eq!(forecast.points.last().map(|p| p.offset_minutes), Some(24 * 60));
    }

    #[test]
    fn one_minute_steps_stay_bounded() {
        let predictor = TrajectoryPredictor::new(TrajectoryConfig {
            minutes_per_point: 1,
            ..TrajectoryConfig::default()
        });
        let forecast = predictor
            .predict(ProcessState::Transition, u32::MAX, &[0.5; 12])
            .ready()
            .unwrap();
        assert_eq!(forecast.points.len(), 24 * 60);
    }

    #[test]
    fn confidence_is_coarse() {
        let predictor = TrajectoryPredictor::default();
        let short = predictor.predict(ProcessState::Flow, 10, &[0.8; 50]).ready().unwrap();
        assert_eq!(short.confidence.level, ConfidenceLevel::Low);

        let long = predictor.predict(ProcessState::Flow, 10, &[0.8; 51]).ready().unwrap();
        assert_eq!(long.confidence.level, ConfidenceLevel::High);
        assert_eq!(long.confidence.value, 0.8);
    }
}
