//! upcoming-events - fetch calendar feeds and write the next event hand-off

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use inkstat_core::application::{HandoffFile, UpcomingEventService};
use inkstat_core::port::time_provider::SystemTimeProvider;
use inkstat_core::port::CalendarCache;
use inkstat_daemon::config::{expand, parse_start_date, read_calendar_urls, UpcomingArgs};
use inkstat_daemon::logging::init_logging;
use inkstat_infra_system::{FileCalendarCache, HttpFeedFetcher, IcalCalendarParser};

#[tokio::main]
async fn main() -> Result<()> {
    let args = UpcomingArgs::parse();
    let log_file = args.log_file.as_deref().map(expand);
    let _log_guard = init_logging(log_file.as_deref())?;
    args.validate()?;

    let calendars_file = expand(&args.calendars_file);
    let urls = read_calendar_urls(&calendars_file)?;

    let anchor = parse_start_date(args.start_date.as_deref(), Utc::now())?;
    let window = chrono::Duration::try_hours(args.window_hours)
        .with_context(|| format!("--window-hours {} is out of range", args.window_hours))?;
    info!(
        sources = urls.len(),
        anchor = %anchor,
        end = %(anchor + window),
        cache = !args.no_cache,
        "Looking for the next event"
    );

    let fetcher = HttpFeedFetcher::new(Duration::from_secs(args.fetch_timeout_secs))
        .context("Failed to build HTTP client")?;
    let cache: Option<Arc<dyn CalendarCache>> = if args.no_cache {
        None
    } else {
        Some(Arc::new(FileCalendarCache::new(args.cache_dir(&calendars_file))))
    };
    let service = UpcomingEventService::new(
        Arc::new(fetcher),
        cache,
        Arc::new(IcalCalendarParser::new()),
        Arc::new(SystemTimeProvider),
        Duration::from_secs(args.cache_ttl_secs),
    );

    let handoff = service.upcoming(&urls, anchor, window).await;

    let output = HandoffFile::new(expand(&args.output_file));
    output
        .write(&handoff)
        .with_context(|| format!("Failed to write {}", output.path().display()))?;
    info!(
        summary = %handoff.summary,
        delta = %handoff.delta,
        path = %output.path().display(),
        "Hand-off written"
    );
    Ok(())
}
