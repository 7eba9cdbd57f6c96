//! Command-line configuration for both executables.
//!
//! Every option also reads an `INKSTAT_*` environment variable. Paths accept
//! a leading `~`.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use clap::Parser;
use std::path::{Path, PathBuf};

use inkstat_core::application::constants::DEFAULT_PING_TARGET;

pub const DEFAULT_PICTURES: &str = "buffalo,rose";
pub const DEFAULT_TIMEZONES: &str =
    "America/Denver,America/Los_Angeles,America/New_York,Europe/Paris";
pub const DEFAULT_ART_DIR: &str = "~/.inkstat/art";
pub const DEFAULT_HANDOFF_FILE: &str = "~/.inkstat/upcoming.json";
pub const DEFAULT_LOG_FILE: &str = "~/inkstat.log";
pub const CALENDAR_BINARY: &str = "upcoming-events";

pub const DEFAULT_CALENDARS_FILE: &str = "calendar_links.json";
pub const DEFAULT_OUTPUT_FILE: &str = "upcoming.json";
pub const CACHE_DIR_NAME: &str = "calendar-cache";

/// One week
pub const MAX_CYCLE_MINUTES: f64 = 7.0 * 24.0 * 60.0;
/// One leap year
pub const MAX_WINDOW_HOURS: i64 = 366 * 24;

pub fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}

/// Status display agent
#[derive(Parser, Debug, Clone)]
#[command(name = "inkstat")]
#[command(about = "Draws clocks, network health and the next calendar event on a two-color e-paper panel", long_about = None)]
#[command(version)]
pub struct AgentArgs {
    /// Run every X minutes
    #[arg(short = 'c', long, visible_alias = "period", env = "INKSTAT_CYCLE", default_value_t = 1.0)]
    pub cycle: f64,

    /// Draw artwork on a black background
    #[arg(short = 'b', long, env = "INKSTAT_BLACK_BACKGROUND")]
    pub black_background: bool,

    /// Use the logging panel instead of hardware
    #[arg(long, env = "INKSTAT_DRY_RUN")]
    pub dry_run: bool,

    /// Stop after this many refreshes (default: run until signalled)
    #[arg(short = 'm', long, env = "INKSTAT_MAX_ITERATIONS")]
    pub max_iterations: Option<u64>,

    /// Comma-separated artwork rotation
    #[arg(short = 'p', long, env = "INKSTAT_PICTURES", value_delimiter = ',', default_value = DEFAULT_PICTURES)]
    pub pictures: Vec<String>,

    /// Directory holding `<name>.black.png` / `<name>.red.png`
    #[arg(long, env = "INKSTAT_ART_DIR", default_value = DEFAULT_ART_DIR)]
    pub art_dir: String,

    /// Comma-separated zones, primary first (`local` for the system zone)
    #[arg(long, env = "INKSTAT_TIMEZONES", default_value = DEFAULT_TIMEZONES)]
    pub timezones: String,

    #[arg(long, env = "INKSTAT_PING_TARGET", default_value = DEFAULT_PING_TARGET)]
    pub ping_target: String,

    /// Where the calendar helper leaves its result
    #[arg(long, env = "INKSTAT_HANDOFF_FILE", default_value = DEFAULT_HANDOFF_FILE)]
    pub handoff_file: String,

    /// Calendar helper command line (default: `upcoming-events` beside this executable)
    #[arg(long, env = "INKSTAT_CALENDAR_COMMAND")]
    pub calendar_command: Option<String>,

    #[arg(long, env = "INKSTAT_LOG_FILE", default_value = DEFAULT_LOG_FILE)]
    pub log_file: String,

    /// Dry-run only: write `ink.png` / `accent.png` here on every refresh
    #[arg(long, env = "INKSTAT_FRAME_DUMP_DIR")]
    pub frame_dump_dir: Option<String>,
}

impl AgentArgs {
    /// Rotation without blank entries
    pub fn rotation(&self) -> Vec<String> {
        self.pictures
            .iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect()
    }

    /// Calendar helper argv, before `--output-file` is appended
    pub fn calendar_command(&self) -> Result<Vec<String>> {
        if let Some(command) = &self.calendar_command {
            let argv: Vec<String> = command.split_whitespace().map(str::to_string).collect();
            if argv.is_empty() {
                bail!("--calendar-command is empty");
            }
            return Ok(argv);
        }

        let sibling = std::env::current_exe()
            .context("Failed to locate the running executable")?
            .with_file_name(CALENDAR_BINARY);
        Ok(vec![sibling.to_string_lossy().into_owned()])
    }

    pub fn validate(&self) -> Result<()> {
        if !self.cycle.is_finite() || self.cycle <= 0.0 {
            bail!("--cycle must be a positive number of minutes, got {}", self.cycle);
        }
        if self.cycle > MAX_CYCLE_MINUTES {
            bail!("--cycle must be at most {MAX_CYCLE_MINUTES} minutes, got {}", self.cycle);
        }
        Ok(())
    }
}

/// Calendar helper: fetch the configured feeds and write the next event
#[derive(Parser, Debug, Clone)]
#[command(name = "upcoming-events")]
#[command(about = "Show upcoming calendar events from .ical links", long_about = None)]
#[command(version)]
pub struct UpcomingArgs {
    /// JSON array of calendar URLs
    #[arg(long, env = "INKSTAT_CALENDARS_FILE", default_value = DEFAULT_CALENDARS_FILE)]
    pub calendars_file: String,

    #[arg(long, env = "INKSTAT_OUTPUT_FILE", default_value = DEFAULT_OUTPUT_FILE)]
    pub output_file: String,

    /// ISO format or UNIX timestamp. Example: '2022-11-02 10:34'
    #[arg(long)]
    pub start_date: Option<String>,

    /// Length of the look-ahead window
    #[arg(long, env = "INKSTAT_WINDOW_HOURS", default_value_t = 24)]
    pub window_hours: i64,

    /// Never read or write the local calendar cache
    #[arg(long, env = "INKSTAT_NO_CACHE")]
    pub no_cache: bool,

    /// Cache directory (default: `calendar-cache` beside the calendars file)
    #[arg(long, env = "INKSTAT_CACHE_DIR")]
    pub cache_dir: Option<String>,

    #[arg(long, env = "INKSTAT_CACHE_TTL_SECS", default_value_t = 900)]
    pub cache_ttl_secs: u64,

    #[arg(long, env = "INKSTAT_FETCH_TIMEOUT_SECS", default_value_t = 20)]
    pub fetch_timeout_secs: u64,

    #[arg(long, env = "INKSTAT_CALENDAR_LOG_FILE")]
    pub log_file: Option<String>,
}

impl UpcomingArgs {
    pub fn cache_dir(&self, calendars_file: &Path) -> PathBuf {
        match &self.cache_dir {
            Some(dir) => expand(dir),
            None => calendars_file
                .parent()
                .unwrap_or_else(|| Path::new("."))
                .join(CACHE_DIR_NAME),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.window_hours <= 0 || self.window_hours > MAX_WINDOW_HOURS {
            bail!(
                "--window-hours must be between 1 and {MAX_WINDOW_HOURS}, got {}",
                self.window_hours
            );
        }
        Ok(())
    }
}

/// Read the calendars file: a JSON array of URL strings
pub fn read_calendar_urls(path: &Path) -> Result<Vec<String>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read calendars file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("{} must be a JSON array of URL strings", path.display()))
}

fn local_to_utc(naive: NaiveDateTime) -> Option<DateTime<Utc>> {
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|t| t.with_timezone(&Utc))
}

/// Anchor for event selection.
///
/// Accepts UNIX seconds, RFC 3339, or a local `YYYY-MM-DD[ HH:MM[:SS]]`
/// (space or `T` separated). `None` means `now`.
pub fn parse_start_date(value: Option<&str>, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    let Some(value) = value.map(str::trim) else {
        return Ok(now);
    };

    if let Ok(secs) = value.parse::<i64>() {
        return Utc
            .timestamp_opt(secs, 0)
            .single()
            .with_context(|| format!("UNIX timestamp out of range: {secs}"));
    }
    if let Ok(at) = DateTime::parse_from_rfc3339(value) {
        return Ok(at.with_timezone(&Utc));
    }

    const FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
    ];
    let naive = FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .with_context(|| format!("Unrecognized --start-date: {value}"))?;

    local_to_utc(naive).with_context(|| format!("{value} does not exist in the local timezone"))
}
