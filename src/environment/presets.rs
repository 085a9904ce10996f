use serde::{Deserialize, Serialize};

use crate::models::ProcessState;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum SoundType {
    #[serde(rename_all = "camelCase")]
    Binaural { left_freq: f32, right_freq: f32 },
    BrownNoise,
    Rain,
    Silence,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SoundProfile {
    pub sound: SoundType,
    pub volume: f32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Lighting {
    pub color_temperature_k: u32,
    /// Relative brightness in `[0, 1]`.
    pub brightness: f32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum InterruptionPolicy {
    /// Everything comes through.
    Open,
    /// Only urgent notifications.
    Filtered,
    /// Nothing until the state changes.
    DoNotDisturb,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentPreset {
    pub state: ProcessState,
    pub lighting: Lighting,
    pub sound: SoundProfile,
    /// How busy the visual workspace should be, `[0, 1]`.
    pub visual_complexity: f32,
    pub interruption_policy: InterruptionPolicy,
    pub suggested_tools: Vec<String>,
}

fn light(color_temperature_k: u32, brightness: f32) -> Lighting {
    Lighting {
        color_temperature_k,
        brightness,
    }
}

fn binaural(left_freq: f32, right_freq: f32, volume: f32) -> SoundProfile {
    SoundProfile {
        sound: SoundType::Binaural {
            left_freq,
            right_freq,
        },
        volume,
    }
}

fn ambient(sound: SoundType, volume: f32) -> SoundProfile {
    SoundProfile { sound, volume }
}

fn tools(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

/// The preset catalogue: one entry per process state.
pub fn preset_for(state: ProcessState) -> EnvironmentPreset {
    let (lighting, sound, visual_complexity, interruption_policy, suggested_tools) = match state {
        ProcessState::Preparation => (
            light(5000, 0.8),
            ambient(SoundType::Rain, 0.3),
            0.6,
            InterruptionPolicy::Filtered,
            tools(&["reference library", "notes", "outline"]),
        ),
        ProcessState::Incubation => (
            light(2700, 0.4),
            binaural(200.0, 206.0, 0.25),
            0.2,
            InterruptionPolicy::Filtered,
            tools(&["walk", "sketchbook"]),
        ),
        ProcessState::Illumination => (
            light(4500, 0.7),
            ambient(SoundType::Silence, 0.0),
            0.3,
            InterruptionPolicy::DoNotDisturb,
            tools(&["quick capture", "voice memo", "whiteboard"]),
        ),
        ProcessState::Verification => (
            light(5500, 0.9),
            ambient(SoundType::BrownNoise, 0.2),
            0.5,
            InterruptionPolicy::Filtered,
            tools(&["checklist", "test runner", "diff viewer"]),
        ),
        ProcessState::Exploration => (
            light(4000, 0.75),
            ambient(SoundType::Rain, 0.35),
            0.8,
            InterruptionPolicy::Open,
            tools(&["mind map", "random prompt deck", "search"]),
        ),
        ProcessState::Flow => (
            light(4000, 0.7),
            binaural(200.0, 204.0, 0.3),
            0.2,
            InterruptionPolicy::DoNotDisturb,
            tools(&["primary editor"]),
        ),
        ProcessState::Blocked => (
            light(6000, 1.0),
            ambient(SoundType::BrownNoise, 0.35),
            0.3,
            InterruptionPolicy::Filtered,
            tools(&["timer", "blank page", "breathing guide"]),
        ),
        ProcessState::Transition => (
            light(4500, 0.75),
            ambient(SoundType::Rain, 0.25),
            0.5,
            InterruptionPolicy::Filtered,
            tools(&["task list", "notes"]),
        ),
    };

    EnvironmentPreset {
        state,
        lighting,
        sound,
        visual_complexity,
        interruption_policy,
        suggested_tools,
    }
}
