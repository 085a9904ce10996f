//! Per-session analysis state and the pipeline that feeds it.

mod registry;
mod sampler;
mod summary;

pub use registry::{SessionHandle, SessionRegistry};
pub use sampler::{sampling_loop, SampleInput, SamplerController, SamplerReport};
pub use summary::{SessionSummary, Trend};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::classifier::StateClassifier;
use crate::config::EngineConfig;
use crate::environment::{self, EnvironmentPlan};
use crate::flow::{FlowIndicators, FlowTracker};
use crate::metrics::MetricsEngine;
use crate::models::{
    AnalysisRecord, BiometricSnapshot, CoherenceResult, CreativeOutputSignal, Estimate,
    FlowEpisode, ProcessState,
};
use crate::recommend::RecommendationEngine;
use crate::source::CoherenceSource;
use crate::trajectory::{TrajectoryForecast, TrajectoryPredictor};
use crate::utils::RingBuffer;

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info};

/// One analysis session: bounded history, breakthrough log and flow episodes.
///
/// A session is single-writer. Share it across tasks through
/// [`SessionRegistry`], which wraps each session in its own lock.
pub struct CoherenceSession {
    id: String,
    config: EngineConfig,
    classifier: StateClassifier,
    metrics: MetricsEngine,
    indicators: FlowIndicators,
    flow: FlowTracker,
    recommender: RecommendationEngine,
    predictor: TrajectoryPredictor,
    history: RingBuffer<AnalysisRecord>,
    breakthroughs: Vec<AnalysisRecord>,
    sample_count: u64,
    created_at: DateTime<Utc>,
}

impl CoherenceSession {
    pub fn new(config: EngineConfig) -> Result<Self> {
        Self::with_id(Uuid::new_v4().to_string(), config)
    }

    pub fn with_id(id: impl Into<String>, config: EngineConfig) -> Result<Self> {
        config.validate().context("invalid engine configuration")?;

        Ok(Self {
            id: id.into(),
            classifier: StateClassifier::new(config.classifier.clone()),
            metrics: MetricsEngine::new(config.metrics.clone(), config.breakthrough.clone()),
            indicators: FlowIndicators::new(config.flow.clone()),
            flow: FlowTracker::new(),
            recommender: RecommendationEngine::new(config.recommendation.clone()),
            predictor: TrajectoryPredictor::new(config.trajectory.clone()),
            history: RingBuffer::new(config.history_capacity),
            breakthroughs: Vec::new(),
            sample_count: 0,
            created_at: Utc::now(),
            config,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Samples analysed since creation or the last reset, including evicted ones.
    pub fn sample_count(&self) -> u64 {
        self.sample_count
    }

    pub fn history(&self) -> impl DoubleEndedIterator<Item = &AnalysisRecord> + ExactSizeIterator {
        self.history.iter()
    }

    pub fn latest(&self) -> Option<&AnalysisRecord> {
        self.history.latest()
    }

    pub fn breakthroughs(&self) -> &[AnalysisRecord] {
        &self.breakthroughs
    }

    pub fn flow_episodes(&self) -> &[FlowEpisode] {
        self.flow.closed_episodes()
    }

    pub fn current_flow_episode(&self) -> Option<&FlowEpisode> {
        self.flow.current()
    }

    /// Evaluate raw variables through `source` and analyse the result.
    ///
    /// If the source fails nothing in the session changes.
    pub fn ingest<S>(&mut self, source: &mut S, sample: SampleInput) -> Result<AnalysisRecord>
    where
        S: CoherenceSource + ?Sized,
    {
        let result = source
            .evaluate(&sample.variables)
            .context("coherence source failed")?;
        Ok(self.analyze(
            sample.variables.timestamp,
            result,
            sample.biometrics.as_ref(),
            sample.output.as_ref(),
        ))
    }

    /// Run the full per-sample pipeline and append the record to history.
    pub fn analyze(
        &mut self,
        timestamp: DateTime<Utc>,
        result: CoherenceResult,
        biometrics: Option<&BiometricSnapshot>,
        output: Option<&CreativeOutputSignal>,
    ) -> AnalysisRecord {
        let previous_state = self.history.latest().map(|r| r.state);
        let history = self.history.as_slice();

        let (state, verdict) = self.classifier.classify_with_verdict(&result, biometrics);
        let metrics = self.metrics.compute(&result, history, output);
        let check = self.indicators.evaluate(&result, biometrics);
        let flow = self.flow.update(timestamp, check);
        let recommendations = self.recommender.recommend(state, &result, &metrics, &flow);

        if previous_state != Some(state) {
            log_debug!(
                "session {}: {} -> {} ({:?})",
                self.id,
                previous_state.map_or("none", |s| s.as_str()),
                state,
                verdict
            );
        }

        let record = AnalysisRecord {
            sample_index: self.sample_count,
            timestamp,
            breakthrough_probability: metrics.breakthrough_probability,
            result,
            state,
            metrics,
            flow,
            recommendations,
        };

        if record.breakthrough_probability >= self.config.breakthrough_event_threshold {
            log_info!(
                "session {}: breakthrough probability {:.2} at sample {}",
                self.id,
                record.breakthrough_probability,
                record.sample_index
            );
            self.breakthroughs.push(record.clone());
        }

        self.history.push(record.clone());
        self.sample_count += 1;
        record
    }

    /// Extrapolate the coherence curve `horizon_minutes` ahead.
    pub fn predict(&self, horizon_minutes: u32) -> Estimate<TrajectoryForecast> {
        let scores: Vec<f64> = self.history.iter().map(|r| r.result.score).collect();
        let current = self.latest().map_or(ProcessState::Transition, |r| r.state);
        self.predictor.predict(current, horizon_minutes, &scores)
    }

    /// Environment plan for `target`, planned from the latest observed state.
    pub fn environment_for(&self, target: ProcessState) -> EnvironmentPlan {
        environment::plan(target, self.latest().map(|r| r.state))
    }

    pub fn summary(&self) -> Estimate<SessionSummary> {
        summary::summarize(self)
    }

    pub fn reset(&mut self) {
        self.history.clear();
        self.breakthroughs.clear();
        self.flow.reset();
        self.sample_count = 0;
        log_info!("session {} reset", self.id);
    }

    pub(crate) fn total_flow_ms(&self) -> i64 {
        self.flow.total_flow_ms()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, CoherenceVariables, Urgency};
    use anyhow::anyhow;
    use chrono::{Duration, TimeZone};

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn steady(score: f64) -> CoherenceResult {
        CoherenceResult::new(score, 0.0, 0.0).with_components(0.6, 0.5, 0.6, 0.6)
    }

    #[test]
    fn blocked_sample_recommends_emotional_regulation() {
        let mut session = CoherenceSession::new(EngineConfig::default()).unwrap();
        let result = CoherenceResult::new(0.4, 0.0, 0.0)
            .with_component(crate::models::Component::Consistency, 0.1)
            .with_component(crate::models::Component::Activation, 0.9)
            .with_component(crate::models::Component::Connection, 0.5);

        let record = session.analyze(t(0), result, None, None);
        assert_eq!(record.state, ProcessState::Blocked);
        let regulation = record
            .recommendations
            .iter()
            .find(|r| r.category == Category::EmotionalRegulation)
            .expect("emotional_regulation recommended");
        assert_eq!(regulation.urgency, Urgency::High);
    }

    #[test]
    fn history_is_capacity_bounded() {
        let config = EngineConfig {
            history_capacity: 12,
            ..EngineConfig::default()
        };
        let mut session = CoherenceSession::new(config).unwrap();
        for i in 0..30 {
            session.analyze(t(i * 10), steady(0.5), None, None);
        }

        assert_eq!(session.history().len(), 12);
        assert_eq!(session.sample_count(), 30);
        let indices: Vec<u64> = session.history().map(|r| r.sample_index).collect();
        assert_eq!(indices, (18..30).collect::<Vec<_>>());
    }

    #[test]
    fn breakthrough_estimate_waits_for_history() {
        let mut session = CoherenceSession::new(EngineConfig::default()).unwrap();
        for i in 0..10 {
            let record = session.analyze(t(i), steady(0.5), None, None);
            assert_eq!(record.breakthrough_probability, 0.0);
        }
        assert!(session.breakthroughs().is_empty());
    }

    #[test]
    fn breakthrough_events_are_logged_separately() {
        let config = EngineConfig {
            breakthrough_event_threshold: 0.5,
            ..EngineConfig::default()
        };
        let mut session = CoherenceSession::new(config).unwrap();
        // quiet, low-activation incubation period
        for i in 0..10 {
            let result = CoherenceResult::new(0.3, 0.0, 0.0).with_components(0.5, 0.4, 0.2, 0.5);
            let record = session.analyze(t(i * 60), result, None, None);
            assert_eq!(record.state, ProcessState::Incubation);
        }
        // sharp accelerating jump
        let mut last = None;
        for (i, score) in [0.8, 0.85, 0.9].into_iter().enumerate() {
            let result = CoherenceResult::new(score, 0.3, 0.6).with_components(0.9, 0.7, 0.6, 0.3);
            last = Some(session.analyze(t(600 + i as i64 * 60), result, None, None));
        }

        let last = last.unwrap();
        assert!(last.breakthrough_probability >= 0.5, "{}", last.breakthrough_probability);
        assert!(!session.breakthroughs().is_empty());
        assert_eq!(
            session.breakthroughs().last().map(|r| r.sample_index),
            Some(last.sample_index)
        );
    }

    #[test]
    fn flow_episode_lifecycle_through_session() {
        let mut session = CoherenceSession::new(EngineConfig::default()).unwrap();
        let flowing = || CoherenceResult::new(0.85, 0.0, 0.0).with_components(0.7, 0.65, 0.65, 0.7);
        let scattered = || CoherenceResult::new(0.2, 0.4, 0.0).with_components(0.1, 0.9, 0.95, 0.0);

        let a = session.analyze(t(0), flowing(), None, None);
        let b = session.analyze(t(60), flowing(), None, None);
        assert!(a.flow.in_flow && b.flow.in_flow);
        assert_eq!(a.flow.episode_id, b.flow.episode_id);
        assert!(session.current_flow_episode().is_some());

        let c = session.analyze(t(150), scattered(), None, None);
        assert!(!c.flow.in_flow);
        assert!(session.current_flow_episode().is_none());
        let episode = &session.flow_episodes()[0];
        assert_eq!(episode.duration(), Duration::seconds(150));
        assert_eq!(Some(episode.id), a.flow.episode_id);
    }

    #[test]
    fn failed_source_leaves_session_untouched() {
        let mut session = CoherenceSession::new(EngineConfig::default()).unwrap();
        let mut failing = |_: &CoherenceVariables| -> Result<CoherenceResult> {
            Err(anyhow!("sensor offline"))
        };
        let sample = SampleInput::new(CoherenceVariables::at(0.5, 0.5, 0.5, 0.5, t(0)));

        assert!(session.ingest(&mut failing, sample).is_err());
        assert_eq!(session.sample_count(), 0);
        assert!(session.latest().is_none());
    }

    #[test]
    fn predict_reports_insufficient_history() {
        let mut session = CoherenceSession::new(EngineConfig::default()).unwrap();
        for i in 0..4 {
            session.analyze(t(i), steady(0.5), None, None);
        }
        assert_eq!(
            session.predict(30),
            Estimate::InsufficientHistory {
                required: 10,
                available: 4
            }
        );
    }

    #[test]
    fn reset_clears_everything() {
        let mut session = CoherenceSession::new(EngineConfig::default()).unwrap();
        for i in 0..5 {
            session.analyze(t(i), steady(0.8), None, None);
        }
        session.reset();
        assert_eq!(session.sample_count(), 0);
        assert_eq!(session.history().len(), 0);
        assert!(session.flow_episodes().is_empty());
        assert!(session.current_flow_episode().is_none());
    }

    #[test]
    fn environment_plan_uses_latest_state() {
        let mut session = CoherenceSession::new(EngineConfig::default()).unwrap();
        let blocked = CoherenceResult::new(0.1, -0.1, 0.0).with_components(0.3, 0.2, 0.5, 0.4);
        session.analyze(t(0), blocked, None, None);

        let plan = session.environment_for(ProcessState::Flow);
        let transition = plan.transition.expect("transition plan");
        assert_eq!(transition.from, ProcessState::Blocked);
        assert_eq!(transition.steps.len(), 4);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = EngineConfig {
            history_capacity: 0,
            ..EngineConfig::default()
        };
        assert!(CoherenceSession::new(config).is_err());
    }
}
