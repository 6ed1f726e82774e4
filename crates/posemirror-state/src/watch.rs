//! Stream watch - detects a silent sender
//!
//! Purely diagnostic: a stale stream keeps the last known pose, the watch
//! only reports the transition once in each direction.

use std::time::{Duration, Instant};

use crate::RotationTable;

/// Liveness of the inbound orientation stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamStatus {
    /// No frame has arrived yet
    Waiting,
    Live,
    Stale,
}

/// Transition reported by [`StreamWatch::check`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamTransition {
    Started,
    WentStale { silent_for: Duration },
    Resumed,
}

#[derive(Debug, Clone)]
pub struct StreamWatch {
    stale_after: Duration,
    status: StreamStatus,
}

impl StreamWatch {
    pub fn new(stale_after: Duration) -> Self {
        Self {
            stale_after,
            status: StreamStatus::Waiting,
        }
    }

    pub fn status(&self) -> StreamStatus {
        self.status
    }

    /// Re-evaluate liveness against the table
    pub fn check(&mut self, table: &RotationTable, now: Instant) -> Option<StreamTransition> {
        let silent_for = table.time_since_frame(now)?;
        let stale = silent_for >= self.stale_after;

        let (next, transition) = match (self.status, stale) {
            (StreamStatus::Waiting, false) => (StreamStatus::Live, Some(StreamTransition::Started)),
            (StreamStatus::Waiting, true) | (StreamStatus::Live, true) => (
                StreamStatus::Stale,
                Some(StreamTransition::WentStale { silent_for }),
            ),
            (StreamStatus::Stale, false) => (StreamStatus::Live, Some(StreamTransition::Resumed)),
            (status, _) => (status, None),
        };

        if let Some(transition) = transition {
            match transition {
                StreamTransition::Started => tracing::info!("pose stream started"),
                StreamTransition::WentStale { silent_for } => tracing::warn!(
                    silent_ms = silent_for.as_millis() as u64,
                    "pose stream went silent, holding last known pose"
                ),
                StreamTransition::Resumed => tracing::info!("pose stream resumed"),
            }
        }

        self.status = next;
        transition
    }
}
