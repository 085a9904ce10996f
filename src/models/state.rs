use serde::{Deserialize, Serialize};

/// Discrete creative process state. Exactly one holds per sample.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub enum ProcessState {
    Preparation,
    Incubation,
    Illumination,
    Verification,
    Exploration,
    Flow,
    Blocked,
    Transition,
}

impl Default for ProcessState {
    fn default() -> Self {
        ProcessState::Transition
    }
}

impl ProcessState {
    pub const ALL: [ProcessState; 8] = [
        ProcessState::Preparation,
        ProcessState::Incubation,
        ProcessState::Illumination,
        ProcessState::Verification,
        ProcessState::Exploration,
        ProcessState::Flow,
        ProcessState::Blocked,
        ProcessState::Transition,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessState::Preparation => "preparation",
            ProcessState::Incubation => "incubation",
            ProcessState::Illumination => "illumination",
            ProcessState::Verification => "verification",
            ProcessState::Exploration => "exploration",
            ProcessState::Flow => "flow",
            ProcessState::Blocked => "blocked",
            ProcessState::Transition => "transition",
        }
    }
}

impl std::fmt::Display for ProcessState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
