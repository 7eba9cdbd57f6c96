// Status Snapshot - everything one frame shows, built once per iteration

use chrono::{DateTime, Utc};
use std::time::Duration;

use super::clock::ClockSet;
use super::event::EventHandoff;

/// Network probe result as display text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkStatus {
    pub packet_loss: String,
    pub ping: String,
}

/// Immutable per-iteration aggregate handed to the compositor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub primary_clock: String,
    pub secondary_clocks: Vec<String>,
    pub packet_loss: String,
    pub ping: String,
    pub bandwidth: String,
    pub event: EventHandoff,
}

impl StatusSnapshot {
    /// Assemble a snapshot; clocks are read at `now + lead`
    pub fn assemble(
        clocks: &ClockSet,
        now: DateTime<Utc>,
        lead: Duration,
        network: NetworkStatus,
        bandwidth: &str,
        event: EventHandoff,
    ) -> Self {
        let (primary_clock, secondary_clocks) = clocks.readouts(now, lead);
        Self {
            primary_clock,
            secondary_clocks,
            packet_loss: network.packet_loss,
            ping: network.ping,
            bandwidth: bandwidth.to_string(),
            event,
        }
    }

    /// Status lines in panel order
    pub fn status_lines(&self) -> [&str; 5] {
        [
            &self.packet_loss,
            &self.ping,
            &self.bandwidth,
            &self.event.summary,
            &self.event.delta,
        ]
    }
}
