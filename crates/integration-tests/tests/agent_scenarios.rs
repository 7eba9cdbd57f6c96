//! End-to-end agent scenarios: probes, compositor and panel wired together.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use inkstat_core::application::probe::{BandwidthProbe, CalendarProbe, NetworkProbe};
use inkstat_core::application::{
    shutdown_channel, Agent, AgentConfig, HandoffFile, Probes, RunOutcome, SleepPolicy,
};
use inkstat_core::domain::{ClockSet, EventHandoff, Geometry, StatusSnapshot};
use inkstat_core::port::command_runner::mocks::{Reply, ScriptedCommandRunner};
use inkstat_core::port::display::buffer_len;
use inkstat_core::port::display::mocks::{PanelCall, RecordingDisplay};
use inkstat_core::port::time_provider::SystemTimeProvider;
use inkstat_core::port::{CommandOutput, CommandRunner, DisplayAdapter, FrameComposer};
use inkstat_infra_system::{BoundedCommandRunner, NoopDisplay, NOOP_GEOMETRY};
use inkstat_render::{FrameCompositor, Polarity};

const PING_OK: &str = "PING 8.8.8.8 (8.8.8.8): 56 data bytes
--- 8.8.8.8 ping statistics ---
10 packets transmitted, 9 packets received, 10% packet loss
round-trip min/avg/max/stddev = 10.123/12.456/15.789/1.234 ms
rtt min/avg/max/mdev = 10.123/12.456/15.789/1.234 ms
";
const SPEED_OK: &str = r#"{"download": 94123456.7, "upload": 11234567.8, "ping": 12.3}"#;

/// Real subprocesses for `sh`, canned replies for everything else
struct ShellOnly {
    shell: BoundedCommandRunner,
    scripted: Arc<ScriptedCommandRunner>,
}

#[async_trait]
impl CommandRunner for ShellOnly {
    async fn run(&self, argv: &[String], timeout: Duration) -> CommandOutput {
        if argv.first().map(String::as_str) == Some("sh") {
            self.shell.run(argv, timeout).await
        } else {
            self.scripted.run(argv, timeout).await
        }
    }
}

fn scripted() -> Arc<ScriptedCommandRunner> {
    Arc::new(
        ScriptedCommandRunner::new()
            .with_reply("ping", Reply::Output(PING_OK.into()))
            .with_reply("speedtest-cli", Reply::Output(SPEED_OK.into())),
    )
}

fn probes(runner: Arc<dyn CommandRunner>, calendar: Vec<String>, handoff: HandoffFile) -> Probes {
    Probes {
        network: NetworkProbe::new(runner.clone(), "8.8.8.8"),
        bandwidth: BandwidthProbe::new(runner.clone()),
        calendar: CalendarProbe::new(runner, calendar, handoff),
    }
}

fn compositor() -> Arc<dyn FrameComposer> {
    Arc::new(FrameCompositor::new(vec![], vec!["buffalo".into()], Polarity::Light))
}

fn clocks() -> ClockSet {
    ClockSet::parse("local,America/Los_Angeles,America/New_York,Europe/Paris").unwrap()
}

#[tokio::test]
async fn test_no_network_still_renders_two_planes() {
    let runner = Arc::new(
        ScriptedCommandRunner::new().with_reply("ping", Reply::TimedOut(String::new())),
    );
    let status = NetworkProbe::new(runner, "8.8.8.8").probe().await;
    assert_eq!(status.packet_loss, "naurrr");
    assert_eq!(status.ping, "");

    let snapshot = StatusSnapshot::assemble(
        &clocks(),
        chrono::Utc::now(),
        Duration::from_secs(15),
        status,
        "",
        EventHandoff::placeholder(),
    );
    let frame = compositor().compose(&snapshot, 0, NOOP_GEOMETRY).unwrap();
    assert_eq!(frame.ink.geometry(), NOOP_GEOMETRY);
    assert_eq!(frame.accent.geometry(), NOOP_GEOMETRY);
    assert!(frame.ink.ink_count() > 0);

    let mut panel = NoopDisplay::default();
    let ink = panel.get_buffer(&frame.ink);
    let accent = panel.get_buffer(&frame.accent);
    assert_eq!(ink.len(), buffer_len(NOOP_GEOMETRY));
    assert_eq!(ink.len(), accent.len());
    panel.init().unwrap();
    panel.display(&ink, &accent).unwrap();
}

#[tokio::test]
async fn test_calendar_helper_result_reaches_agent() {
    let dir = tempfile::tempdir().unwrap();
    let handoff = HandoffFile::new(dir.path().join("upcoming.json"));
    let runner: Arc<dyn CommandRunner> = Arc::new(ShellOnly {
        shell: BoundedCommandRunner::default(),
        scripted: scripted(),
    });
    // `--output-file <path>` arrive as $1 and $2
    let helper = vec![
        "sh".to_string(),
        "-c".to_string(),
        r#"printf '{"summary":"Dentist","delta":"0:30:00"}' > "$2""#.to_string(),
        "upcoming-events".to_string(),
    ];
    let probes = probes(runner, helper, handoff.clone());

    let event = probes.calendar.probe().await;
    assert_eq!(event.summary, "Dentist");
    assert_eq!(event.delta, "0:30:00");

    let display = RecordingDisplay::new(NOOP_GEOMETRY);
    let log = display.log();
    let mut agent = Agent::new(
        AgentConfig::new(SleepPolicy::from_minutes(1.0).unwrap(), Some(1)),
        probes,
        clocks(),
        compositor(),
        Box::new(display),
        Arc::new(SystemTimeProvider),
    );
    let (_tx, token) = shutdown_channel();
    let outcome = agent.run(token).await.unwrap();

    assert_eq!(outcome, RunOutcome::Completed { iterations: 1 });
    let log = log.lock().unwrap();
    assert_eq!(
        log.iter().filter(|c| matches!(c, PanelCall::Display { .. })).count(),
        1
    );
}

#[tokio::test(start_paused = true)]
async fn test_bandwidth_probe_throttled_over_many_iterations() {
    let dir = tempfile::tempdir().unwrap();
    let runner = scripted();
    let display = RecordingDisplay::new(Geometry::new(126, 298));
    let mut agent = Agent::new(
        AgentConfig::new(SleepPolicy::from_minutes(1.0).unwrap(), Some(7)),
        probes(
            runner.clone(),
            vec!["upcoming-events".into()],
            HandoffFile::new(dir.path().join("upcoming.json")),
        ),
        clocks(),
        compositor(),
        Box::new(display),
        Arc::new(SystemTimeProvider),
    );
    let (_tx, token) = shutdown_channel();

    agent.run(token).await.unwrap();

    assert_eq!(runner.call_count("ping"), 7);
    // iterations 1 and 6
    assert_eq!(runner.call_count("speedtest-cli"), 2);
    let helper_calls: Vec<_> = runner
        .calls()
        .into_iter()
        .filter(|argv| argv[0] == "upcoming-events")
        .collect();
    assert_eq!(helper_calls.len(), 7);
    assert_eq!(helper_calls[0][1], "--output-file");
}

#[tokio::test(start_paused = true)]
async fn test_panel_failure_ends_run_without_teardown() {
    let dir = tempfile::tempdir().unwrap();
    let runner = scripted();
    let display = RecordingDisplay::new(NOOP_GEOMETRY).failing_on_display(1);
    let log = display.log();
    let mut agent = Agent::new(
        AgentConfig::new(SleepPolicy::from_minutes(1.0).unwrap(), None),
        probes(
            runner.clone(),
            vec!["upcoming-events".into()],
            HandoffFile::new(dir.path().join("upcoming.json")),
        ),
        clocks(),
        compositor(),
        Box::new(display),
        Arc::new(SystemTimeProvider),
    );
    let (_tx, token) = shutdown_channel();

    let err = agent.run(token).await.unwrap_err();

    assert!(err.is_fatal());
    assert_eq!(runner.call_count("ping"), 1);
    assert!(!log.lock().unwrap().contains(&PanelCall::Teardown));
}

#[cfg(target_os = "linux")]
fn process_gone(pid: &str) -> bool {
    match std::fs::read_to_string(format!("/proc/{pid}/stat")) {
        // zombie: killed, waiting to be reaped
        Ok(stat) => stat
            .rsplit_once(')')
            .is_some_and(|(_, rest)| rest.trim_start().starts_with('Z')),
        Err(_) => true,
    }
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn test_stop_during_calendar_probe_kills_helper_and_tears_down() {
    let dir = tempfile::tempdir().unwrap();
    let handoff_path = dir.path().join("upcoming.json");
    let pid_path = dir.path().join("upcoming.json.pid");
    let runner: Arc<dyn CommandRunner> = Arc::new(ShellOnly {
        shell: BoundedCommandRunner::default(),
        scripted: scripted(),
    });
    let helper = vec![
        "sh".to_string(),
        "-c".to_string(),
        r#"echo $$ > "$2.pid"; exec sleep 30"#.to_string(),
        "upcoming-events".to_string(),
    ];
    let display = RecordingDisplay::new(NOOP_GEOMETRY);
    let log = display.log();
    let mut agent = Agent::new(
        AgentConfig::new(SleepPolicy::from_minutes(1.0).unwrap(), None),
        probes(runner, helper, HandoffFile::new(handoff_path)),
        clocks(),
        compositor(),
        Box::new(display),
        Arc::new(SystemTimeProvider),
    );
    let (tx, token) = shutdown_channel();
    let started = std::time::Instant::now();
    let handle = tokio::spawn(async move { agent.run(token).await });

    let mut pid = String::new();
    for _ in 0..100 {
        if let Ok(raw) = std::fs::read_to_string(&pid_path) {
            if raw.ends_with('\n') {
                pid = raw.trim().to_string();
                break;
            }
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert!(!pid.is_empty(), "helper never started");
    assert!(!process_gone(&pid));

    tx.shutdown(inkstat_core::application::StopReason::Terminate);
    let outcome = handle.await.unwrap().unwrap();

    assert_eq!(
        outcome,
        RunOutcome::Stopped {
            iterations: 0,
            reason: inkstat_core::application::StopReason::Terminate
        }
    );
    assert!(started.elapsed() < Duration::from_secs(10));
    assert_eq!(*log.lock().unwrap(), vec![PanelCall::Teardown]);

    let mut gone = false;
    for _ in 0..60 {
        if process_gone(&pid) {
            gone = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert!(gone, "helper {pid} still running after stop");
}
