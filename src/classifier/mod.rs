//! Maps a coherence result to one discrete process state.
//!
//! Rules are evaluated in declaration order and the first full match wins.
//! When nothing matches, a small component heuristic decides between Flow,
//! Blocked and Transition.

mod rules;

pub use rules::{default_rules, Field, RangeConstraint, StateRule};

use crate::config::ClassifierConfig;
use crate::models::{BiometricSnapshot, CoherenceResult, Component, ProcessState};

/// Which path produced a classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict<'a> {
    Rule(&'a str),
    Fallback,
}

#[derive(Debug, Clone)]
pub struct StateClassifier {
    config: ClassifierConfig,
}

impl StateClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    pub fn classify(
        &self,
        result: &CoherenceResult,
        biometrics: Option<&BiometricSnapshot>,
    ) -> ProcessState {
        self.classify_with_verdict(result, biometrics).0
    }

    pub fn classify_with_verdict(
        &self,
        result: &CoherenceResult,
        biometrics: Option<&BiometricSnapshot>,
    ) -> (ProcessState, Verdict<'_>) {
        if let Some(rule) = self
            .config
            .rules
            .iter()
            .find(|rule| rule.matches(result, biometrics))
        {
            return (rule.state, Verdict::Rule(&rule.name));
        }

        (self.fallback(result), Verdict::Fallback)
    }

    fn fallback(&self, result: &CoherenceResult) -> ProcessState {
        let activation = result.component_or_zero(Component::Activation);
        let consistency = result.component_or_zero(Component::Consistency);
        let connection = result.component_or_zero(Component::Connection);

        if activation > self.config.fallback_flow_activation
            && consistency >= self.config.fallback_flow_consistency
        {
            ProcessState::Flow
        } else if activation < self.config.fallback_blocked_activation
            && connection > self.config.fallback_blocked_connection
        {
            ProcessState::Blocked
        } else {
            ProcessState::Transition
        }
    }
}

impl Default for StateClassifier {
    fn default() -> Self {
        Self::new(ClassifierConfig::default())
    }
}
