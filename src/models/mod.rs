//! Value types flowing through the analysis pipeline.
//!
//! Everything here is an immutable value object once produced and is safe to
//! serialise as-is for presentation layers.

mod biometrics;
mod coherence;
mod estimate;
mod record;
mod state;

pub use biometrics::{BiometricField, BiometricSnapshot, CreativeOutputSignal};
pub use coherence::{CoherenceResult, CoherenceVariables, Component, Sentiment};
pub use estimate::Estimate;
pub use record::{
    AnalysisRecord, Category, FlowEpisode, FlowStatus, ProcessMetrics, Recommendation, Urgency,
};
pub use state::ProcessState;
