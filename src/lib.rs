pub mod breakthrough;
pub mod classifier;
pub mod config;
pub mod environment;
pub mod flow;
pub mod metrics;
pub mod models;
pub mod recommend;
pub mod session;
pub mod settings;
pub mod source;
pub mod trajectory;
pub mod utils;

pub use breakthrough::{BreakthroughDetector, BreakthroughFactors};
pub use classifier::StateClassifier;
pub use config::EngineConfig;
pub use environment::EnvironmentPlan;
pub use flow::{FlowIndicators, FlowTracker};
pub use metrics::MetricsEngine;
pub use models::{
    AnalysisRecord, BiometricSnapshot, CoherenceResult, CoherenceVariables, CreativeOutputSignal,
    Estimate, ProcessState,
};
pub use recommend::RecommendationEngine;
pub use session::{
    CoherenceSession, SampleInput, SamplerController, SamplerReport, SessionRegistry,
    SessionSummary,
};
pub use settings::ConfigStore;
pub use source::{CoherenceSource, GctCoherenceSource};
pub use trajectory::{TrajectoryForecast, TrajectoryPredictor};
