//! Agent - the collect / compose / display / sleep loop
//!
//! States: Setup (constructor) -> Collecting -> Composing -> Displaying ->
//! Sleeping -> Collecting ... until the iteration limit or a stop request.
//!
//! Only two places suspend: inside a probe's bounded command and the
//! end-of-iteration sleep. A stop request is observed at both; the panel is
//! then torn down before `run` returns. Panel errors end the loop; every other
//! failure is absorbed inside the iteration.

mod shutdown;

pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken, StopReason};

use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, error, info, warn};

use crate::application::constants::INITIAL_RENDER_ESTIMATE;
use crate::application::probe::{
    should_probe_bandwidth, BandwidthProbe, CalendarProbe, NetworkProbe,
};
use crate::application::sleep::SleepPolicy;
use crate::domain::{
    ClockSet, CycleState, EventHandoff, Frame, IterationReport, NetworkStatus, StatusSnapshot,
};
use crate::error::Result;
use crate::port::{DisplayAdapter, FrameComposer, TimeProvider};

/// Loop tuning
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub sleep: SleepPolicy,
    /// `None` runs until stopped
    pub max_iterations: Option<u64>,
    /// Render duration assumed for the first iteration's clock lead
    pub initial_render: Duration,
}

impl AgentConfig {
    pub fn new(sleep: SleepPolicy, max_iterations: Option<u64>) -> Self {
        Self {
            sleep,
            max_iterations,
            initial_render: INITIAL_RENDER_ESTIMATE,
        }
    }
}

/// The three probes run during Collecting
pub struct Probes {
    pub network: NetworkProbe,
    pub bandwidth: BandwidthProbe,
    pub calendar: CalendarProbe,
}

/// Raw inputs gathered for one snapshot
#[derive(Debug, Clone)]
pub struct Collected {
    pub network: NetworkStatus,
    /// `None` when the bandwidth probe was skipped this iteration
    pub bandwidth: Option<String>,
    pub event: EventHandoff,
}

impl Probes {
    pub async fn collect(&self, state: &CycleState) -> Collected {
        let network = self.network.probe().await;

        let bandwidth = if should_probe_bandwidth(state.iteration) {
            Some(self.bandwidth.probe().await)
        } else {
            debug!(iteration = state.iteration, "Bandwidth probe skipped");
            None
        };

        let event = self.calendar.probe().await;

        Collected {
            network,
            bandwidth,
            event,
        }
    }
}

/// How `run` ended without a fatal error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed { iterations: u64 },
    Stopped { iterations: u64, reason: StopReason },
}

pub struct Agent {
    config: AgentConfig,
    probes: Probes,
    clocks: ClockSet,
    composer: Arc<dyn FrameComposer>,
    display: Box<dyn DisplayAdapter>,
    time_provider: Arc<dyn TimeProvider>,
}

impl Agent {
    pub fn new(
        config: AgentConfig,
        probes: Probes,
        clocks: ClockSet,
        composer: Arc<dyn FrameComposer>,
        display: Box<dyn DisplayAdapter>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            config,
            probes,
            clocks,
            composer,
            display,
            time_provider,
        }
    }

    fn limit_reached(&self, iteration: u64) -> bool {
        self.config.max_iterations.is_some_and(|max| iteration >= max)
    }

    /// Run until the iteration limit, a stop request, or a panel failure
    pub async fn run(&mut self, mut shutdown: ShutdownToken) -> Result<RunOutcome> {
        let geometry = self.display.geometry();
        info!(
            width = geometry.width,
            height = geometry.height,
            period_secs = self.config.sleep.period.as_secs_f64(),
            max_iterations = ?self.config.max_iterations,
            "Agent started"
        );

        let mut state = CycleState::new(self.config.initial_render);
        loop {
            if self.limit_reached(state.iteration) {
                break;
            }
            if let Some(reason) = shutdown.reason() {
                return Ok(self.stop(state.iteration, reason));
            }

            let collected = tokio::select! {
                collected = self.probes.collect(&state) => collected,
                reason = shutdown.wait() => return Ok(self.stop(state.iteration, reason)),
            };

            let report = match self.present(&state, collected) {
                Ok(report) => report,
                Err(e) => {
                    error!(iteration = state.iteration, error = %e, "Panel failure; stopping");
                    return Err(e);
                }
            };
            state = state.advance(report);

            if self.limit_reached(state.iteration) {
                break;
            }

            let pause = self.config.sleep.sleep_after(state.last_render);
            info!(
                iteration = state.iteration,
                render_secs = state.last_render.as_secs_f64(),
                sleep_secs = pause.as_secs_f64(),
                "Sleeping"
            );
            tokio::select! {
                _ = sleep(pause) => {},
                reason = shutdown.wait() => return Ok(self.stop(state.iteration, reason)),
            }
        }

        info!(iterations = state.iteration, "Agent done");
        Ok(RunOutcome::Completed {
            iterations: state.iteration,
        })
    }

    /// One full iteration without sleeping
    pub async fn run_iteration(&mut self, state: &CycleState) -> Result<IterationReport> {
        let collected = self.probes.collect(state).await;
        self.present(state, collected)
    }

    /// Composing + Displaying; the returned duration spans both
    fn present(&mut self, state: &CycleState, collected: Collected) -> Result<IterationReport> {
        let started = Instant::now();
        let bandwidth_text = match collected.bandwidth.as_deref() {
            Some(fresh) if !fresh.is_empty() => fresh,
            _ => state.bandwidth.as_str(),
        };
        let snapshot = StatusSnapshot::assemble(
            &self.clocks,
            self.time_provider.now(),
            state.last_render,
            collected.network,
            bandwidth_text,
            collected.event,
        );
        info!(
            iteration = state.iteration,
            lead_secs = state.last_render.as_secs_f64(),
            clock = %snapshot.primary_clock,
            packet_loss = %snapshot.packet_loss,
            ping = %snapshot.ping,
            bandwidth = %snapshot.bandwidth,
            event = ?snapshot.event,
            "Drawing snapshot"
        );

        let geometry = self.display.geometry();
        match self.composer.compose(&snapshot, state.iteration, geometry) {
            Ok(frame) if frame.geometry() == geometry => self.push(&frame)?,
            Ok(frame) => warn!(
                expected = ?geometry,
                actual = ?frame.geometry(),
                "Composed frame does not match panel; skipping refresh"
            ),
            Err(e) => warn!(error = %e, "Frame composition failed; skipping refresh"),
        }

        Ok(IterationReport {
            render_duration: started.elapsed(),
            bandwidth: collected.bandwidth,
        })
    }

    fn push(&mut self, frame: &Frame) -> Result<()> {
        info!("Initializing panel and sending frame");
        self.display.init()?;
        let ink = self.display.get_buffer(&frame.ink);
        let accent = self.display.get_buffer(&frame.accent);
        self.display.display(&ink, &accent)?;

        info!("Putting panel into low-power mode");
        self.display.sleep()?;
        Ok(())
    }

    fn stop(&mut self, iterations: u64, reason: StopReason) -> RunOutcome {
        warn!(reason = ?reason, iterations, "Stop requested; releasing panel");
        self.display.teardown();
        RunOutcome::Stopped { iterations, reason }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handoff::HandoffFile;
    use crate::domain::{Frame, Geometry};
    use crate::port::command_runner::mocks::{Reply, ScriptedCommandRunner};
    use crate::port::display::mocks::{PanelCall, RecordingDisplay};
    use crate::port::frame_composer::mocks::TallyComposer;
    use crate::port::time_provider::SystemTimeProvider;
    use std::sync::Mutex;

    const PING_OK: &str = "10 packets transmitted, 10 received, 0% packet loss, time 459ms
rtt min/avg/max/mdev = 10.1/12.4/15.7/1.2 ms
";
    const SPEED_OK: &str = r#"{"download": 50000000.0, "upload": 10000000.0}"#;

    /// Keeps every snapshot it was asked to draw
    #[derive(Default)]
    struct SnapshotLog {
        seen: Mutex<Vec<(u64, StatusSnapshot)>>,
    }

    impl FrameComposer for SnapshotLog {
        fn compose(&self, snapshot: &StatusSnapshot, iteration: u64, geometry: Geometry) -> Result<Frame> {
            self.seen.lock().unwrap().push((iteration, snapshot.clone()));
            Ok(Frame::new(geometry))
        }
    }

    struct Fixture {
        runner: Arc<ScriptedCommandRunner>,
        panel_log: Arc<Mutex<Vec<PanelCall>>>,
        _dir: tempfile::TempDir,
    }

    fn agent_with(
        composer: Arc<dyn FrameComposer>,
        display: RecordingDisplay,
        max_iterations: Option<u64>,
    ) -> (Agent, Fixture) {
        agent_with_clock(composer, display, max_iterations, Arc::new(SystemTimeProvider))
    }

    fn agent_with_clock(
        composer: Arc<dyn FrameComposer>,
        display: RecordingDisplay,
        max_iterations: Option<u64>,
        clock: Arc<dyn TimeProvider>,
    ) -> (Agent, Fixture) {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(
            ScriptedCommandRunner::new()
                .with_reply("ping", Reply::Output(PING_OK.into()))
                .with_reply("speedtest-cli", Reply::Output(SPEED_OK.into())),
        );
        let probes = Probes {
            network: NetworkProbe::new(runner.clone(), "8.8.8.8"),
            bandwidth: BandwidthProbe::new(runner.clone()),
            calendar: CalendarProbe::new(
                runner.clone(),
                vec!["upcoming-events".into()],
                HandoffFile::new(dir.path().join("upcoming.json")),
            ),
        };
        let panel_log = display.log();
        let agent = Agent::new(
            AgentConfig::new(SleepPolicy::from_minutes(1.0).unwrap(), max_iterations),
            probes,
            ClockSet::parse("UTC,Europe/Paris,Asia/Tokyo,America/New_York").unwrap(),
            composer,
            Box::new(display),
            clock,
        );
        (
            agent,
            Fixture {
                runner,
                panel_log,
                _dir: dir,
            },
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_to_iteration_limit() {
        let (mut agent, fx) = agent_with(
            Arc::new(TallyComposer),
            RecordingDisplay::new(Geometry::new(126, 298)),
            Some(3),
        );
        let (_tx, token) = shutdown_channel();

        let outcome = agent.run(token).await.unwrap();

        assert_eq!(outcome, RunOutcome::Completed { iterations: 3 });
        assert_eq!(fx.runner.call_count("ping"), 3);
        assert_eq!(fx.runner.call_count("upcoming-events"), 3);
        assert_eq!(fx.runner.call_count("speedtest-cli"), 1);

        let log = fx.panel_log.lock().unwrap();
        let pushes = log.iter().filter(|c| matches!(c, PanelCall::Display { .. })).count();
        assert_eq!(pushes, 3);
        assert!(!log.contains(&PanelCall::Teardown));
        // init -> display -> sleep per iteration
        assert_eq!(log[0], PanelCall::Init);
        assert_eq!(log[2], PanelCall::Sleep);
    }

    #[tokio::test(start_paused = true)]
    async fn test_bandwidth_carried_across_iterations() {
        let composer = Arc::new(SnapshotLog::default());
        let (mut agent, fx) = agent_with(
            composer.clone(),
            RecordingDisplay::new(Geometry::new(126, 298)),
            Some(3),
        );
        let (_tx, token) = shutdown_channel();
        agent.run(token).await.unwrap();

        let seen = composer.seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[0].1.bandwidth, "");
        assert_eq!(seen[1].1.bandwidth, "50 Mb down 10 Mb up");
        assert_eq!(seen[2].1.bandwidth, "50 Mb down 10 Mb up");

        // speed test breaks: the last good value stays on screen
        fx.runner.set_reply("speedtest-cli", Reply::TimedOut(String::new()));
        let state = CycleState {
            iteration: 6,
            last_render: Duration::from_secs(1),
            bandwidth: "50 Mb down 10 Mb up".into(),
        };
        drop(seen);
        let report = agent.run_iteration(&state).await.unwrap();
        assert_eq!(report.bandwidth.as_deref(), Some(""));
        let next = state.advance(report);
        assert_eq!(next.bandwidth, "50 Mb down 10 Mb up");
        assert_eq!(
            composer.seen.lock().unwrap().last().unwrap().1.bandwidth,
            "50 Mb down 10 Mb up"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_panel_failure_is_fatal() {
        let (mut agent, fx) = agent_with(
            Arc::new(TallyComposer),
            RecordingDisplay::new(Geometry::new(126, 298)).failing_on_display(2),
            None,
        );
        let (_tx, token) = shutdown_channel();

        let err = agent.run(token).await.unwrap_err();

        assert!(err.is_fatal());
        assert_eq!(fx.runner.call_count("ping"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_request_tears_down_panel() {
        let (mut agent, fx) = agent_with(
            Arc::new(TallyComposer),
            RecordingDisplay::new(Geometry::new(126, 298)),
            None,
        );
        let (tx, token) = shutdown_channel();

        let handle = tokio::spawn(async move { agent.run(token).await });
        // first iteration finishes immediately, then the agent sleeps 50s
        tokio::time::sleep(Duration::from_secs(20)).await;
        tx.shutdown(StopReason::Terminate);

        let outcome = handle.await.unwrap().unwrap();
        assert_eq!(
            outcome,
            RunOutcome::Stopped {
                iterations: 1,
                reason: StopReason::Terminate
            }
        );
        let log = fx.panel_log.lock().unwrap();
        assert_eq!(log.last(), Some(&PanelCall::Teardown));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_while_collecting_tears_down_panel() {
        let (mut agent, fx) = agent_with(
            Arc::new(TallyComposer),
            RecordingDisplay::new(Geometry::new(126, 298)),
            None,
        );
        fx.runner.set_reply("upcoming-events", Reply::Hang);
        let (tx, token) = shutdown_channel();

        let handle = tokio::spawn(async move { agent.run(token).await });
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(!handle.is_finished());
        tx.shutdown(StopReason::Interrupt);

        let outcome = handle.await.unwrap().unwrap();
        assert_eq!(
            outcome,
            RunOutcome::Stopped {
                iterations: 0,
                reason: StopReason::Interrupt
            }
        );
        // network probe ran, calendar probe was in flight
        assert_eq!(fx.runner.call_count("ping"), 1);
        assert_eq!(fx.runner.call_count("upcoming-events"), 1);
        let log = fx.panel_log.lock().unwrap();
        assert_eq!(*log, vec![PanelCall::Teardown]);
    }

    /// Reads the wall clock slowly
    struct SlowClock(Duration);

    impl TimeProvider for SlowClock {
        fn now(&self) -> chrono::DateTime<chrono::Utc> {
            std::thread::sleep(self.0);
            chrono::Utc::now()
        }
    }

    #[tokio::test]
    async fn test_render_time_includes_snapshot_assembly() {
        let (mut agent, _fx) = agent_with_clock(
            Arc::new(TallyComposer),
            RecordingDisplay::new(Geometry::new(126, 298)),
            Some(1),
            Arc::new(SlowClock(Duration::from_millis(40))),
        );
        let state = CycleState::new(Duration::from_secs(15));

        let report = agent.run_iteration(&state).await.unwrap();

        assert!(report.render_duration >= Duration::from_millis(40));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_network_still_pushes_equal_planes() {
        let (mut agent, fx) = agent_with(
            Arc::new(TallyComposer),
            RecordingDisplay::new(Geometry::new(126, 298)),
            Some(1),
        );
        fx.runner.set_reply("ping", Reply::TimedOut(String::new()));
        let (_tx, token) = shutdown_channel();

        agent.run(token).await.unwrap();

        let log = fx.panel_log.lock().unwrap();
        let (ink, accent) = log
            .iter()
            .find_map(|c| match c {
                PanelCall::Display { ink, accent } => Some((ink.clone(), accent.clone())),
                _ => None,
            })
            .unwrap();
        assert_eq!(ink.len(), crate::port::display::buffer_len(Geometry::new(126, 298)));
        assert_eq!(ink.len(), accent.len());
    }
}
