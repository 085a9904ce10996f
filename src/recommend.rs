//! Rule-based, prioritised suggestions for the current sample.
//!
//! Rules fire independently and are appended in a fixed priority order. The
//! engine is a pure function of the record being built.

use crate::config::RecommendationConfig;
use crate::models::{
    Category, CoherenceResult, Component, FlowStatus, ProcessMetrics, ProcessState,
    Recommendation, Urgency,
};

#[derive(Debug, Clone, Default)]
pub struct RecommendationEngine {
    config: RecommendationConfig,
}

impl RecommendationEngine {
    pub fn new(config: RecommendationConfig) -> Self {
        Self { config }
    }

    pub fn recommend(
        &self,
        state: ProcessState,
        result: &CoherenceResult,
        metrics: &ProcessMetrics,
        flow: &FlowStatus,
    ) -> Vec<Recommendation> {
        let c = &self.config;
        let consistency = result.component_or_zero(Component::Consistency);
        let activation = result.component_or_zero(Component::Activation);
        let mut out = Vec::new();

        if state == ProcessState::Blocked && consistency < c.low_consistency {
            out.push(Recommendation {
                category: Category::ClarityBoost,
                action: "Write down the one question you are trying to answer, then list what you already know".into(),
                rationale: format!("Blocked with low consistency ({consistency:.2}); the work has lost its through-line"),
                urgency: Urgency::High,
            });
        }

        if state == ProcessState::Blocked && activation > c.high_activation {
            out.push(Recommendation {
                category: Category::EmotionalRegulation,
                action: "Pause for five slow breaths and step away from the screen for two minutes".into(),
                rationale: format!("Blocked with high activation ({activation:.2}); arousal is crowding out progress"),
                urgency: Urgency::High,
            });
        }

        if state == ProcessState::Exploration && metrics.flexibility_index < c.low_variation {
            out.push(Recommendation {
                category: Category::DivergencePrompt,
                action: "Generate three deliberately unusual alternatives before choosing a direction".into(),
                rationale: format!(
                    "Exploring with little variation (flexibility {:.2})",
                    metrics.flexibility_index
                ),
                urgency: Urgency::Medium,
            });
        }

        if state == ProcessState::Flow {
            // a closed or never-opened episode has no running time to report
            let rationale = if flow.in_flow {
                let elapsed = flow.elapsed();
                format!(
                    "In flow for {}m {:02}s",
                    elapsed.num_minutes(),
                    elapsed.num_seconds() % 60
                )
            } else {
                "Flow is just starting; protect the next few minutes".to_string()
            };
            out.push(Recommendation {
                category: Category::FlowMaintenance,
                action: "Keep going; defer notifications and non-urgent switches".into(),
                rationale,
                urgency: Urgency::Low,
            });
        }

        if metrics.breakthrough_probability > c.high_breakthrough {
            out.push(Recommendation {
                category: Category::BreakthroughPreparation,
                action: "Keep a capture tool at hand and protect the next stretch of time".into(),
                rationale: format!(
                    "Breakthrough probability {:.2}",
                    metrics.breakthrough_probability
                ),
                urgency: Urgency::Medium,
            });
        }

        if result.score < c.low_coherence {
            let weakest = weakest_component(result);
            let (action, rationale) = enhancement(weakest);
            out.push(Recommendation {
                category: Category::Enhancement(weakest),
                action: action.into(),
                rationale: format!(
                    "{rationale} (coherence {:.2}, {} {:.2})",
                    result.score,
                    weakest.as_str(),
                    result.component_or_zero(weakest)
                ),
                urgency: Urgency::Medium,
            });
        }

        out
    }
}

/// Smallest of the four named components; ties go to the earlier one in
/// [`Component::ALL`].
pub fn weakest_component(result: &CoherenceResult) -> Component {
    let mut weakest = Component::ALL[0];
    let mut lowest = result.component_or_zero(weakest);
    for component in &Component::ALL[1..] {
        let value = result.component_or_zero(*component);
        if value < lowest {
            weakest = *component;
            lowest = value;
        }
    }
    weakest
}

fn enhancement(component: Component) -> (&'static str, &'static str) {
    match component {
        Component::Consistency => (
            "Restate the core idea in one sentence and check the next piece against it",
            "Consistency is the weakest component",
        ),
        Component::Depth => (
            "Spend ten minutes developing one idea further instead of adding new ones",
            "Depth is the weakest component",
        ),
        Component::Activation => (
            "Take a brisk short walk or switch to a more energising sub-task",
            "Activation is the weakest component",
        ),
        Component::Connection => (
            "Share the current draft with someone and ask for one reaction",
            "Connection is the weakest component",
        ),
    }
}
