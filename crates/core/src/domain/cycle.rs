// Cycle State - the only state carried from one iteration to the next

use std::time::Duration;

/// Process-lifetime loop state, threaded through each iteration by value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleState {
    /// Zero-based index of the iteration about to run
    pub iteration: u64,
    /// Compose+display duration measured in the previous iteration
    pub last_render: Duration,
    /// Last non-empty bandwidth text
    pub bandwidth: String,
}

/// What one iteration hands back to the loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IterationReport {
    pub render_duration: Duration,
    /// `Some` only when the bandwidth probe ran and produced text
    pub bandwidth: Option<String>,
}

impl CycleState {
    pub fn new(initial_render: Duration) -> Self {
        Self {
            iteration: 0,
            last_render: initial_render,
            bandwidth: String::new(),
        }
    }

    /// Fold an iteration's report into the next state
    pub fn advance(self, report: IterationReport) -> Self {
        let bandwidth = match report.bandwidth {
            Some(text) if !text.is_empty() => text,
            _ => self.bandwidth,
        };
        Self {
            iteration: self.iteration + 1,
            last_render: report.render_duration,
            bandwidth,
        }
    }
}
