//! Target state -> environment preset, plus a transition plan when moving
//! between states. Nothing here is applied; callers own actuation.

mod presets;

pub use presets::{
    preset_for, EnvironmentPreset, InterruptionPolicy, Lighting, SoundProfile, SoundType,
};

use serde::{Deserialize, Serialize};

use crate::models::ProcessState;

/// Estimated minutes for pairs missing from the table.
const DEFAULT_TRANSITION_MINUTES: u32 = 10;

const TRANSITION_MINUTES: &[(ProcessState, ProcessState, u32)] = &[
    (ProcessState::Blocked, ProcessState::Flow, 15),
    (ProcessState::Preparation, ProcessState::Incubation, 20),
    (ProcessState::Incubation, ProcessState::Illumination, 5),
    (ProcessState::Exploration, ProcessState::Flow, 8),
    (ProcessState::Transition, ProcessState::Flow, 5),
    (ProcessState::Illumination, ProcessState::Verification, 10),
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TransitionStep {
    pub order: u32,
    pub action: String,
    pub rationale: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TransitionPlan {
    pub from: ProcessState,
    pub to: ProcessState,
    pub estimated_minutes: u32,
    /// Concrete micro-steps; empty for pairs without a scripted plan.
    pub steps: Vec<TransitionStep>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentPlan {
    pub preset: EnvironmentPreset,
    pub transition: Option<TransitionPlan>,
}

pub fn estimated_transition_minutes(from: ProcessState, to: ProcessState) -> u32 {
    TRANSITION_MINUTES
        .iter()
        .find(|(f, t, _)| *f == from && *t == to)
        .map_or(DEFAULT_TRANSITION_MINUTES, |(_, _, minutes)| *minutes)
}

/// Preset for `target`, with a transition plan when `current` differs.
pub fn plan(target: ProcessState, current: Option<ProcessState>) -> EnvironmentPlan {
    let transition = current.filter(|c| *c != target).map(|from| TransitionPlan {
        from,
        to: target,
        estimated_minutes: estimated_transition_minutes(from, target),
        steps: scripted_steps(from, target),
    });

    EnvironmentPlan {
        preset: preset_for(target),
        transition,
    }
}

fn scripted_steps(from: ProcessState, to: ProcessState) -> Vec<TransitionStep> {
    if (from, to) != (ProcessState::Blocked, ProcessState::Flow) {
        return Vec::new();
    }

    [
        (
            "Stand up, stretch and look away from the screen for two minutes",
            "Breaks the rumination loop that keeps activation high",
        ),
        (
            "Switch the audio to low brown noise and dim notifications",
            "Masks distractions without adding new stimulus",
        ),
        (
            "Pick the smallest concrete next action and work on only that for five minutes",
            "A tiny win rebuilds consistency before asking for depth",
        ),
        (
            "Move to the flow preset: warm-neutral light, 4 Hz binaural, do-not-disturb",
            "Locks in the conditions once momentum has returned",
        ),
    ]
    .into_iter()
    .enumerate()
    .map(|(i, (action, rationale))| TransitionStep {
        order: i as u32 + 1,
        action: action.to_string(),
        rationale: rationale.to_string(),
    })
    .collect()
}
