// Command Runner Port
// Abstraction for running an external command under a hard time bound

use async_trait::async_trait;
use std::time::Duration;

/// How a bounded command ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Exited on its own before the bound
    Completed { exit_code: Option<i32> },
    /// Still running at the bound and was terminated
    Killed,
    /// Could not be started (missing binary, permissions, ...)
    SpawnFailed(String),
}

/// Captured result of one bounded invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub argv: Vec<String>,
    /// Standard output captured up to completion or termination
    pub stdout: String,
    pub outcome: CommandOutcome,
}

impl CommandOutput {
    pub fn completed(&self) -> bool {
        matches!(self.outcome, CommandOutcome::Completed { .. })
    }
}

/// Command Runner trait
///
/// Implementations:
/// - BoundedCommandRunner (infra-system): spawns a child process
/// - mocks::ScriptedCommandRunner: canned output for tests
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `argv` and return its captured stdout.
    ///
    /// Never fails: a command still running after `timeout` is terminated and
    /// whatever it printed so far (possibly nothing) is returned. The caller
    /// is never held longer than `timeout` plus a small termination grace.
    async fn run(&self, argv: &[String], timeout: Duration) -> CommandOutput;
}

/// Build an owned argv from string slices
pub fn argv<I, S>(parts: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    parts.into_iter().map(Into::into).collect()
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    /// Canned reply for one program
    #[derive(Debug, Clone)]
    pub enum Reply {
        /// Completes with this stdout
        Output(String),
        /// Killed at the bound after printing this much
        TimedOut(String),
        /// Program missing
        Missing,
        /// Never returns; the caller has to drop the future
        Hang,
    }

    /// Mock runner keyed by program name (`argv[0]`)
    #[derive(Default)]
    pub struct ScriptedCommandRunner {
        replies: Arc<Mutex<HashMap<String, Reply>>>,
        calls: Arc<Mutex<Vec<Vec<String>>>>,
    }

    impl ScriptedCommandRunner {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_reply(self, program: impl Into<String>, reply: Reply) -> Self {
            self.replies.lock().unwrap().insert(program.into(), reply);
            self
        }

        pub fn set_reply(&self, program: impl Into<String>, reply: Reply) {
            self.replies.lock().unwrap().insert(program.into(), reply);
        }

        pub fn calls(&self) -> Vec<Vec<String>> {
            self.calls.lock().unwrap().clone()
        }

        pub fn call_count(&self, program: &str) -> usize {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|argv| argv.first().map(String::as_str) == Some(program))
                .count()
        }
    }

    #[async_trait]
    impl CommandRunner for ScriptedCommandRunner {
        async fn run(&self, argv: &[String], _timeout: Duration) -> CommandOutput {
            self.calls.lock().unwrap().push(argv.to_vec());
            let program = argv.first().cloned().unwrap_or_default();
            let reply = self
                .replies
                .lock()
                .unwrap()
                .get(&program)
                .cloned()
                .unwrap_or(Reply::Missing);

            let (stdout, outcome) = match reply {
                Reply::Output(out) => (out, CommandOutcome::Completed { exit_code: Some(0) }),
                Reply::TimedOut(partial) => (partial, CommandOutcome::Killed),
                Reply::Missing => (
                    String::new(),
                    CommandOutcome::SpawnFailed(format!("{program}: not found")),
                ),
                Reply::Hang => std::future::pending().await,
            };
            CommandOutput {
                argv: argv.to_vec(),
                stdout,
                outcome,
            }
        }
    }
}
