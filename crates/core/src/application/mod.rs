// Application Layer - Use Cases and Loop Orchestration

pub mod agent;
pub mod constants;
pub mod handoff;
pub mod probe;
pub mod sleep;
pub mod upcoming;

// Re-exports
pub use agent::{
    shutdown_channel, Agent, AgentConfig, Probes, RunOutcome, ShutdownSender, ShutdownToken,
    StopReason,
};
pub use handoff::HandoffFile;
pub use sleep::{sleep_duration, SleepPolicy};
pub use upcoming::UpcomingEventService;
