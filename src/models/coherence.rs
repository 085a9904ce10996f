use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The four inputs handed to a coherence source, each nominally in `[0, 1]`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CoherenceVariables {
    pub consistency: f64,
    pub depth: f64,
    pub activation: f64,
    pub connection: f64,
    pub timestamp: DateTime<Utc>,
}

impl CoherenceVariables {
    pub fn new(consistency: f64, depth: f64, activation: f64, connection: f64) -> Self {
        Self::at(consistency, depth, activation, connection, Utc::now())
    }

    pub fn at(
        consistency: f64,
        depth: f64,
        activation: f64,
        connection: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            consistency,
            depth,
            activation,
            connection,
            timestamp,
        }
    }
}

/// Named sub-score of a coherence result.
///
/// Declaration order doubles as the tie-break priority when picking the
/// weakest component.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub enum Component {
    Consistency,
    Depth,
    Activation,
    Connection,
}

impl Component {
    pub const ALL: [Component; 4] = [
        Component::Consistency,
        Component::Depth,
        Component::Activation,
        Component::Connection,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Component::Consistency => "consistency",
            Component::Depth => "depth",
            Component::Activation => "activation",
            Component::Connection => "connection",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == name)
    }
}

/// Coarse direction of the coherence signal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Sentiment {
    Rising,
    Falling,
    Steady,
}

impl Default for Sentiment {
    fn default() -> Self {
        Sentiment::Steady
    }
}

impl Sentiment {
    const THRESHOLD: f64 = 0.05;

    pub fn from_derivative(first_derivative: f64) -> Self {
        if first_derivative > Self::THRESHOLD {
            Sentiment::Rising
        } else if first_derivative < -Self::THRESHOLD {
            Sentiment::Falling
        } else {
            Sentiment::Steady
        }
    }
}

/// Output of a coherence source for one sample. Read-only to the engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CoherenceResult {
    pub score: f64,
    /// Component name -> value. Always carries the four [`Component`] keys when
    /// produced by a well-behaved source; sources may add auxiliary keys.
    pub components: BTreeMap<String, f64>,
    pub first_derivative: f64,
    pub second_derivative: f64,
    #[serde(default)]
    pub sentiment: Sentiment,
}

impl CoherenceResult {
    pub fn new(score: f64, first_derivative: f64, second_derivative: f64) -> Self {
        Self {
            score,
            components: BTreeMap::new(),
            first_derivative,
            second_derivative,
            sentiment: Sentiment::from_derivative(first_derivative),
        }
    }

    pub fn with_component(mut self, component: Component, value: f64) -> Self {
        self.components.insert(component.as_str().to_string(), value);
        self
    }

    pub fn with_components(
        mut self,
        consistency: f64,
        depth: f64,
        activation: f64,
        connection: f64,
    ) -> Self {
        for (component, value) in Component::ALL
            .into_iter()
            .zip([consistency, depth, activation, connection])
        {
            self.components.insert(component.as_str().to_string(), value);
        }
        self
    }

    pub fn component(&self, component: Component) -> Option<f64> {
        self.components.get(component.as_str()).copied()
    }

    /// Component value, treating a missing key as 0.
    pub fn component_or_zero(&self, component: Component) -> f64 {
        self.component(component).unwrap_or(0.0)
    }

    /// The four named component values in [`Component::ALL`] order.
    pub fn named_components(&self) -> [f64; 4] {
        Component::ALL.map(|c| self.component_or_zero(c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_component_reads_as_zero() {
        let result = CoherenceResult::new(0.5, 0.0, 0.0).with_component(Component::Activation, 0.9);
        assert_eq!(result.component(Component::Activation), Some(0.9));
        assert_eq!(result.component(Component::Connection), None);
        assert_eq!(result.named_components(), [0.0, 0.0, 0.9, 0.0]);
    }

    #[test]
    fn sentiment_follows_first_derivative() {
        assert_eq!(CoherenceResult::new(0.5, 0.2, 0.0).sentiment, Sentiment::Rising);
        assert_eq!(CoherenceResult::new(0.5, -0.2, 0.0).sentiment, Sentiment::Falling);
        assert_eq!(CoherenceResult::new(0.5, 0.01, 0.0).sentiment, Sentiment::Steady);
    }

    #[test]
    fn component_names_round_trip() {
        for component in Component::ALL {
            assert_eq!(Component::from_name(component.as_str()), Some(component));
        }
        assert_eq!(Component::from_name("rawCoherence"), None);
    }
}
