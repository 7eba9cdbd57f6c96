// Bounded subprocess runner
// reason: tokio::process for async child management, nix for SIGTERM
use async_trait::async_trait;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tokio::time::{timeout, Instant};
use tracing::{debug, info, warn};

use inkstat_core::port::{CommandOutcome, CommandOutput, CommandRunner};

/// How long a child gets after SIGTERM (and again after SIGKILL) before we stop waiting
pub const KILL_GRACE: Duration = Duration::from_millis(250);

/// Runner internals; surfaced to callers only as `CommandOutcome::SpawnFailed`
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Empty command line")]
    EmptyArgv,

    #[error("Failed to spawn {program}: {reason}")]
    SpawnFailed { program: String, reason: String },
}

/// Runs one child at a time and never waits past `timeout + 2 * kill_grace`.
///
/// On timeout the child gets SIGTERM, a short grace period to flush, then
/// SIGKILL. Output read before the kill is returned.
pub struct BoundedCommandRunner {
    kill_grace: Duration,
}

impl Default for BoundedCommandRunner {
    fn default() -> Self {
        Self::new(KILL_GRACE)
    }
}

/// Bytes read from the child's pipes so far
#[derive(Default)]
struct Captured {
    stdout: Vec<u8>,
    stderr: Vec<u8>,
}

impl BoundedCommandRunner {
    pub fn new(kill_grace: Duration) -> Self {
        Self { kill_grace }
    }

    fn spawn(argv: &[String]) -> Result<Child, ExecutionError> {
        let (program, args) = argv.split_first().ok_or(ExecutionError::EmptyArgv)?;
        Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ExecutionError::SpawnFailed {
                program: program.clone(),
                reason: e.to_string(),
            })
    }

    /// Pump both pipes and reap the child. Cancel-safe: whatever was read
    /// before cancellation stays in `captured`.
    async fn drain(
        child: &mut Child,
        stdout: &mut Option<ChildStdout>,
        stderr: &mut Option<ChildStderr>,
        captured: &mut Captured,
    ) -> std::io::Result<ExitStatus> {
        let (out, err, status) = tokio::join!(
            pump(stdout.as_mut(), &mut captured.stdout),
            pump(stderr.as_mut(), &mut captured.stderr),
            child.wait(),
        );
        if let Err(e) = out.and(err) {
            debug!(error = %e, "Pipe read ended with error");
        }
        status
    }

    /// SIGTERM, grace, SIGKILL, grace
    async fn terminate(
        &self,
        child: &mut Child,
        stdout: &mut Option<ChildStdout>,
        stderr: &mut Option<ChildStderr>,
        captured: &mut Captured,
    ) {
        #[cfg(unix)]
        if let Some(pid) = child.id() {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            if let Err(e) = kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
                debug!(pid, error = %e, "SIGTERM failed");
            }
        }

        let flushed = timeout(
            self.kill_grace,
            Self::drain(child, stdout, stderr, captured),
        )
        .await;
        if flushed.is_ok() {
            return;
        }

        warn!(pid = ?child.id(), "Child still running after SIGTERM, sending SIGKILL");
        if let Err(e) = child.start_kill() {
            debug!(error = %e, "SIGKILL failed");
        }
        if timeout(self.kill_grace, child.wait()).await.is_err() {
            warn!(pid = ?child.id(), "Child not reaped after SIGKILL; leaving it to kill_on_drop");
        }
    }
}

async fn pump<R: AsyncRead + Unpin>(reader: Option<&mut R>, sink: &mut Vec<u8>) -> std::io::Result<()> {
    let Some(reader) = reader else {
        return Ok(());
    };
    let mut chunk = [0u8; 4096];
    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        sink.extend_from_slice(&chunk[..n]);
    }
}

#[async_trait]
impl CommandRunner for BoundedCommandRunner {
    async fn run(&self, argv: &[String], limit: Duration) -> CommandOutput {
        let started = Instant::now();
        let mut child = match Self::spawn(argv) {
            Ok(child) => child,
            Err(e) => {
                warn!(command = ?argv, error = %e, "Command could not be started");
                return CommandOutput {
                    argv: argv.to_vec(),
                    stdout: String::new(),
                    outcome: CommandOutcome::SpawnFailed(e.to_string()),
                };
            }
        };
        debug!(command = ?argv, pid = ?child.id(), timeout_ms = limit.as_millis() as u64, "Command started");

        let mut stdout = child.stdout.take();
        let mut stderr = child.stderr.take();
        let mut captured = Captured::default();

        let finished = timeout(
            limit,
            Self::drain(&mut child, &mut stdout, &mut stderr, &mut captured),
        )
        .await;

        let outcome = match finished {
            Ok(status) => CommandOutcome::Completed {
                exit_code: status.ok().and_then(|s| s.code()),
            },
            Err(_) => {
                warn!(
                    command = ?argv,
                    timeout_ms = limit.as_millis() as u64,
                    partial_bytes = captured.stdout.len(),
                    "Command timed out; killing it"
                );
                self.terminate(&mut child, &mut stdout, &mut stderr, &mut captured)
                    .await;
                CommandOutcome::Killed
            }
        };

        let diagnostics = String::from_utf8_lossy(&captured.stderr);
        if !diagnostics.trim().is_empty() {
            warn!(command = ?argv, stderr = %diagnostics.trim(), "Command wrote to stderr");
        }

        info!(
            command = ?argv,
            outcome = ?outcome,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Command finished"
        );

        CommandOutput {
            argv: argv.to_vec(),
            stdout: String::from_utf8_lossy(&captured.stdout).into_owned(),
            outcome,
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use inkstat_core::port::argv;

    #[tokio::test]
    async fn test_completed_command_returns_output() {
        let runner = BoundedCommandRunner::default();
        let out = runner
            .run(&argv(["echo", "hello"]), Duration::from_secs(5))
            .await;

        assert_eq!(out.stdout, "hello\n");
        assert_eq!(out.outcome, CommandOutcome::Completed { exit_code: Some(0) });
        assert!(out.completed());
    }

    #[tokio::test]
    async fn test_nonzero_exit_still_completes() {
        let runner = BoundedCommandRunner::default();
        let out = runner
            .run(&argv(["sh", "-c", "echo oops >&2; echo ok; exit 3"]), Duration::from_secs(5))
            .await;

        assert_eq!(out.stdout, "ok\n");
        assert_eq!(out.outcome, CommandOutcome::Completed { exit_code: Some(3) });
    }

    #[tokio::test]
    async fn test_timeout_kills_within_bound() {
        let runner = BoundedCommandRunner::default();
        let limit = Duration::from_millis(200);
        let started = std::time::Instant::now();

        let out = runner.run(&argv(["sleep", "10"]), limit).await;

        assert_eq!(out.outcome, CommandOutcome::Killed);
        assert!(out.stdout.is_empty());
        assert!(started.elapsed() < limit + 2 * KILL_GRACE + Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_timeout_keeps_partial_output() {
        let runner = BoundedCommandRunner::default();
        let out = runner
            .run(
                &argv(["sh", "-c", "echo partial; exec sleep 10"]),
                Duration::from_millis(500),
            )
            .await;

        assert_eq!(out.outcome, CommandOutcome::Killed);
        assert_eq!(out.stdout, "partial\n");
    }

    #[tokio::test]
    async fn test_missing_program_is_reported_not_raised() {
        let runner = BoundedCommandRunner::default();
        let out = runner
            .run(&argv(["inkstat-no-such-program"]), Duration::from_secs(1))
            .await;

        assert!(matches!(out.outcome, CommandOutcome::SpawnFailed(_)));
        assert!(out.stdout.is_empty());
    }

    #[tokio::test]
    async fn test_empty_argv() {
        let runner = BoundedCommandRunner::default();
        let out = runner.run(&[], Duration::from_secs(1)).await;
        assert!(matches!(out.outcome, CommandOutcome::SpawnFailed(_)));
    }
}
