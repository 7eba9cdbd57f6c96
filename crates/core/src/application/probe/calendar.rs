// Calendar Probe - runs the calendar sub-invocation and reads its hand-off file

use std::sync::Arc;
use tracing::{info, warn};

use crate::application::constants::CALENDAR_TIMEOUT;
use crate::application::handoff::HandoffFile;
use crate::domain::EventHandoff;
use crate::port::{CommandOutcome, CommandRunner};

pub struct CalendarProbe {
    runner: Arc<dyn CommandRunner>,
    argv: Vec<String>,
    handoff: HandoffFile,
}

impl CalendarProbe {
    /// `command` is the sub-invocation argv; `--output-file <path>` is appended
    pub fn new(runner: Arc<dyn CommandRunner>, command: Vec<String>, handoff: HandoffFile) -> Self {
        let mut argv = command;
        argv.push("--output-file".to_string());
        argv.push(handoff.path().display().to_string());
        Self {
            runner,
            argv,
            handoff,
        }
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    /// Whatever the hand-off file holds after the run (placeholder if none)
    pub async fn probe(&self) -> EventHandoff {
        info!(command = ?self.argv, "Running calendar probe");
        let output = self.runner.run(&self.argv, CALENDAR_TIMEOUT).await;
        match &output.outcome {
            CommandOutcome::Completed { exit_code: Some(0) } => {}
            outcome => warn!(
                command = ?self.argv,
                outcome = ?outcome,
                "Calendar probe did not finish cleanly; using last hand-off"
            ),
        }
        self.handoff.read()
    }
}
