//! Inkstat - e-paper status agent entry point

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};

use inkstat_core::application::probe::{BandwidthProbe, CalendarProbe, NetworkProbe};
use inkstat_core::application::{
    shutdown_channel, Agent, AgentConfig, HandoffFile, Probes, RunOutcome, SleepPolicy,
};
use inkstat_core::domain::ClockSet;
use inkstat_core::port::time_provider::SystemTimeProvider;
use inkstat_core::port::{CommandRunner, DisplayAdapter};
use inkstat_daemon::config::{expand, AgentArgs};
use inkstat_daemon::logging::init_logging;
use inkstat_daemon::signals::forward_signals;
use inkstat_daemon::VERSION;
use inkstat_infra_system::{load_artworks, BoundedCommandRunner, NoopDisplay};
use inkstat_render::{FrameCompositor, Polarity};

fn build_display(args: &AgentArgs) -> Box<dyn DisplayAdapter> {
    if !args.dry_run {
        error!("No panel driver in this build; assuming dry-run mode");
    }
    let panel = NoopDisplay::default();
    match &args.frame_dump_dir {
        Some(dir) => Box::new(panel.with_dump_dir(expand(dir))),
        None => Box::new(panel),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = AgentArgs::parse();

    // 1. Logging (console + append-only file)
    let log_file = expand(&args.log_file);
    let _log_guard = init_logging(Some(&log_file))?;

    info!("Inkstat v{} starting...", VERSION);
    args.validate()?;
    let rotation = args.rotation();
    info!(
        background = if args.black_background { "black" } else { "white" },
        pictures = %rotation.join(", "),
        max_iterations = ?args.max_iterations,
        cycle_minutes = args.cycle,
        "Will draw on the panel approx. every cycle"
    );
    info!(log_file = %log_file.display(), "Log file");

    // 2. Setup: clocks, probes, artwork, panel
    let clocks = ClockSet::parse(&args.timezones)
        .with_context(|| format!("Invalid --timezones: {}", args.timezones))?;

    let runner: Arc<dyn CommandRunner> = Arc::new(BoundedCommandRunner::default());
    let handoff = HandoffFile::new(expand(&args.handoff_file));
    let probes = Probes {
        network: NetworkProbe::new(runner.clone(), &args.ping_target),
        bandwidth: BandwidthProbe::new(runner.clone()),
        calendar: CalendarProbe::new(runner.clone(), args.calendar_command()?, handoff),
    };
    info!(command = ?probes.calendar.argv(), "Calendar helper");

    let artworks = load_artworks(&expand(&args.art_dir), &rotation);
    let composer = Arc::new(FrameCompositor::new(
        artworks,
        rotation,
        Polarity::from_black_background(args.black_background),
    ));
    let display = build_display(&args);

    let sleep_policy = SleepPolicy::from_minutes(args.cycle).context("Invalid --cycle")?;
    let mut agent = Agent::new(
        AgentConfig::new(sleep_policy, args.max_iterations),
        probes,
        clocks,
        composer,
        display,
        Arc::new(SystemTimeProvider),
    );

    // 3. Signals -> stop requests
    let (shutdown_tx, shutdown_rx) = shutdown_channel();
    tokio::spawn(forward_signals(shutdown_tx));

    // 4. Run
    match agent.run(shutdown_rx).await {
        Ok(RunOutcome::Completed { iterations }) => info!(iterations, "Done"),
        Ok(RunOutcome::Stopped { iterations, reason }) => {
            warn!(iterations, reason = ?reason, "Stopped by signal")
        }
        Err(e) => {
            error!(error = %e, "Agent stopped on panel failure");
            return Err(e).context("Panel failure");
        }
    }

    Ok(())
}
