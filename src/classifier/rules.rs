use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::models::{BiometricField, BiometricSnapshot, CoherenceResult, Component, ProcessState};

/// A sample attribute a rule can constrain.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    Score,
    FirstDerivative,
    SecondDerivative,
    Component(Component),
    Biometric(BiometricField),
}

impl Field {
    /// Value of this field for a sample; `None` when the sample lacks it.
    fn read(&self, result: &CoherenceResult, biometrics: Option<&BiometricSnapshot>) -> Option<f64> {
        match self {
            Field::Score => Some(result.score),
            Field::FirstDerivative => Some(result.first_derivative),
            Field::SecondDerivative => Some(result.second_derivative),
            Field::Component(component) => result.component(*component),
            Field::Biometric(field) => biometrics.map(|b| b.get(*field)),
        }
    }
}

/// Inclusive range over one field. A missing bound is unbounded on that side.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RangeConstraint {
    pub field: Field,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl RangeConstraint {
    pub fn between(field: Field, min: f64, max: f64) -> Self {
        Self {
            field,
            min: Some(min),
            max: Some(max),
        }
    }

    pub fn at_least(field: Field, min: f64) -> Self {
        Self {
            field,
            min: Some(min),
            max: None,
        }
    }

    pub fn at_most(field: Field, max: f64) -> Self {
        Self {
            field,
            min: None,
            max: Some(max),
        }
    }

    /// Missing data (absent component, no biometrics) and NaN never satisfy.
    pub fn is_satisfied(&self, result: &CoherenceResult, biometrics: Option<&BiometricSnapshot>) -> bool {
        let Some(value) = self.field.read(result, biometrics) else {
            return false;
        };
        if value.is_nan() {
            return false;
        }
        self.min.map_or(true, |min| value >= min) && self.max.map_or(true, |max| value <= max)
    }
}

/// Conjunction of range constraints that labels a sample with `state`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StateRule {
    pub name: String,
    pub state: ProcessState,
    pub constraints: Vec<RangeConstraint>,
}

impl StateRule {
    pub fn new(name: impl Into<String>, state: ProcessState, constraints: Vec<RangeConstraint>) -> Self {
        Self {
            name: name.into(),
            state,
            constraints,
        }
    }

    pub fn matches(&self, result: &CoherenceResult, biometrics: Option<&BiometricSnapshot>) -> bool {
        self.constraints
            .iter()
            .all(|constraint| constraint.is_satisfied(result, biometrics))
    }

    pub fn validate(&self) -> Result<()> {
        if self.constraints.is_empty() {
            bail!("state rule '{}' has no constraints", self.name);
        }
        for constraint in &self.constraints {
            if let (Some(min), Some(max)) = (constraint.min, constraint.max) {
                if min > max {
                    bail!(
                        "state rule '{}' has an empty range [{min}, {max}] on {:?}",
                        self.name,
                        constraint.field
                    );
                }
            }
        }
        Ok(())
    }
}

/// Built-in rule table, evaluated top to bottom.
pub fn default_rules() -> Vec<StateRule> {
    use BiometricField::*;
    use Component::*;
    use Field::{FirstDerivative, Score, SecondDerivative};
    use RangeConstraint as R;

    let comp = Field::Component;
    let bio = Field::Biometric;

    vec![
        StateRule::new(
            "blocked_overdrive",
            ProcessState::Blocked,
            vec![R::at_least(comp(Activation), 0.7), R::at_most(comp(Consistency), 0.2)],
        ),
        StateRule::new(
            "blocked_collapse",
            ProcessState::Blocked,
            vec![R::at_most(Score, 0.2), R::at_most(FirstDerivative, 0.0)],
        ),
        StateRule::new(
            "flow_physiological",
            ProcessState::Flow,
            vec![
                R::at_least(Score, 0.6),
                R::at_least(bio(HeartRateVariability), 0.6),
                R::at_least(bio(GammaPower), 0.5),
                R::at_most(bio(EyeMovementEntropy), 0.4),
            ],
        ),
        StateRule::new(
            "flow",
            ProcessState::Flow,
            vec![
                R::at_least(Score, 0.75),
                R::between(FirstDerivative, -0.05, 0.05),
                R::between(comp(Activation), 0.4, 0.9),
            ],
        ),
        StateRule::new(
            "illumination",
            ProcessState::Illumination,
            vec![R::at_least(FirstDerivative, 0.1), R::at_least(SecondDerivative, 0.05)],
        ),
        StateRule::new(
            "incubation_physiological",
            ProcessState::Incubation,
            vec![
                R::at_least(bio(AlphaPower), 0.6),
                R::at_least(bio(ThetaPower), 0.5),
                R::at_most(comp(Activation), 0.4),
            ],
        ),
        StateRule::new(
            "incubation",
            ProcessState::Incubation,
            vec![
                R::at_most(comp(Activation), 0.35),
                R::between(FirstDerivative, -0.05, 0.05),
                R::between(Score, 0.2, 0.75),
            ],
        ),
        StateRule::new(
            "verification",
            ProcessState::Verification,
            vec![
                R::at_least(comp(Consistency), 0.7),
                R::at_least(comp(Depth), 0.5),
                R::between(FirstDerivative, -0.1, 0.1),
                R::at_least(Score, 0.5),
            ],
        ),
        StateRule::new(
            "exploration",
            ProcessState::Exploration,
            vec![R::at_most(comp(Connection), 0.4), R::at_least(comp(Activation), 0.5)],
        ),
        StateRule::new(
            "preparation",
            ProcessState::Preparation,
            vec![
                R::between(Score, 0.2, 0.5),
                R::between(FirstDerivative, 0.0, 0.1),
                R::at_most(comp(Depth), 0.4),
            ],
        ),
    ]
}
