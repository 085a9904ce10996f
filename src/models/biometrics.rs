use serde::{Deserialize, Serialize};

/// Optional physiological reading taken alongside a sample.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BiometricSnapshot {
    pub heart_rate_variability: f64,
    pub alpha_power: f64,
    pub theta_power: f64,
    pub gamma_power: f64,
    pub skin_conductance: f64,
    pub eye_movement_entropy: f64,
    pub posture_stability: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum BiometricField {
    HeartRateVariability,
    AlphaPower,
    ThetaPower,
    GammaPower,
    SkinConductance,
    EyeMovementEntropy,
    PostureStability,
}

impl BiometricSnapshot {
    pub fn get(&self, field: BiometricField) -> f64 {
        match field {
            BiometricField::HeartRateVariability => self.heart_rate_variability,
            BiometricField::AlphaPower => self.alpha_power,
            BiometricField::ThetaPower => self.theta_power,
            BiometricField::GammaPower => self.gamma_power,
            BiometricField::SkinConductance => self.skin_conductance,
            BiometricField::EyeMovementEntropy => self.eye_movement_entropy,
            BiometricField::PostureStability => self.posture_stability,
        }
    }
}

/// Signal about produced creative output, supplied by an external analyzer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreativeOutputSignal {
    /// Judged quality of the output, nominally `[0, 1]`.
    pub quality: f64,
}

impl CreativeOutputSignal {
    pub fn new(quality: f64) -> Self {
        Self { quality }
    }
}
