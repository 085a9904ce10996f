use serde::{Deserialize, Serialize};

/// Outcome of a window-dependent computation.
///
/// `InsufficientHistory` means "not available yet", not a failure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", tag = "status", content = "value")]
pub enum Estimate<T> {
    Ready(T),
    #[serde(rename_all = "camelCase")]
    InsufficientHistory { required: usize, available: usize },
}

impl<T> Estimate<T> {
    /// `Ready` when `available >= required`, otherwise the sentinel.
    pub fn require(required: usize, available: usize, compute: impl FnOnce() -> T) -> Self {
        if available < required {
            Estimate::InsufficientHistory {
                required,
                available,
            }
        } else {
            Estimate::Ready(compute())
        }
    }

    pub fn ready(self) -> Option<T> {
        match self {
            Estimate::Ready(value) => Some(value),
            Estimate::InsufficientHistory { .. } => None,
        }
    }

    pub fn as_ready(&self) -> Option<&T> {
        match self {
            Estimate::Ready(value) => Some(value),
            Estimate::InsufficientHistory { .. } => None,
        }
    }

    pub fn unwrap_or(self, default: T) -> T {
        self.ready().unwrap_or(default)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Estimate<U> {
        match self {
            Estimate::Ready(value) => Estimate::Ready(f(value)),
            Estimate::InsufficientHistory {
                required,
                available,
            } => Estimate::InsufficientHistory {
                required,
                available,
            },
        }
    }
}
