use chrono::{DateTime, Utc};

use super::FlowCheck;
use crate::models::{FlowEpisode, FlowStatus};

const ENABLE_LOGS: bool = true;

use crate::log_info;

/// Two-state episode machine: closed (no current episode) or open.
#[derive(Debug, Clone, Default)]
pub struct FlowTracker {
    current: Option<FlowEpisode>,
    closed: Vec<FlowEpisode>,
}

impl FlowTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&FlowEpisode> {
        self.current.as_ref()
    }

    pub fn closed_episodes(&self) -> &[FlowEpisode] {
        &self.closed
    }

    pub fn is_open(&self) -> bool {
        self.current.is_some()
    }

    /// Advance the machine with one sample's indicator outcome.
    pub fn update(&mut self, timestamp: DateTime<Utc>, check: FlowCheck) -> FlowStatus {
        let in_flow = check.is_majority();

        let episode = match (in_flow, self.current.take()) {
            (true, Some(mut episode)) => {
                episode.duration_ms = (timestamp - episode.started_at).num_milliseconds();
                self.current = Some(episode.clone());
                Some(episode)
            }
            (true, None) => {
                let episode = FlowEpisode::open(timestamp);
                log_info!("flow episode {} opened at {}", episode.id, timestamp);
                self.current = Some(episode.clone());
                Some(episode)
            }
            (false, Some(mut episode)) => {
                episode.ended_at = Some(timestamp);
                episode.duration_ms = (timestamp - episode.started_at).num_milliseconds();
                log_info!(
                    "flow episode {} closed after {}ms",
                    episode.id,
                    episode.duration_ms
                );
                self.closed.push(episode.clone());
                Some(episode)
            }
            (false, None) => None,
        };

        FlowStatus {
            in_flow,
            checks_passed: check.passed,
            checks_total: check.total,
            episode_id: episode.as_ref().map(|e| e.id),
            elapsed_ms: episode.map_or(0, |e| e.duration_ms),
        }
    }

    /// Time spent in flow: all closed episodes plus the open one, if any.
    pub fn total_flow_ms(&self) -> i64 {
        self.closed.iter().map(|e| e.duration_ms).sum::<i64>()
            + self.current.as_ref().map_or(0, |e| e.duration_ms)
    }

    pub fn reset(&mut self) {
        self.current = None;
        self.closed.clear();
    }
}
