// Bandwidth Probe - throttled bandwidth test

use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::application::constants::{
    BANDWIDTH_ARGS, BANDWIDTH_THROTTLE_MODULUS, BANDWIDTH_THROTTLE_PHASE, BANDWIDTH_TIMEOUT,
};
use crate::port::CommandRunner;

/// The probe is expensive; run it on one iteration out of every five
pub fn should_probe_bandwidth(iteration: u64) -> bool {
    iteration % BANDWIDTH_THROTTLE_MODULUS == BANDWIDTH_THROTTLE_PHASE
}

/// Fields of the bandwidth test's JSON result (bits per second)
#[derive(Debug, Deserialize)]
struct SpeedReport {
    download: f64,
    upload: f64,
}

/// `"94.1 Mb down 11.2 Mb up"`; `None` for anything that is not a report
pub fn parse_bandwidth(output: &str) -> Option<String> {
    let report: SpeedReport = serde_json::from_str(output.trim()).ok()?;
    if !report.download.is_finite() || !report.upload.is_finite() {
        return None;
    }
    Some(format!(
        "{} Mb down {} Mb up",
        three_significant(report.download / 1e6),
        three_significant(report.upload / 1e6)
    ))
}

fn three_significant(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    let magnitude = value.abs().log10().floor() as i32;
    let decimals = (2 - magnitude).max(0) as usize;
    let text = format!("{value:.decimals$}");
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        text
    }
}

pub struct BandwidthProbe {
    runner: Arc<dyn CommandRunner>,
    argv: Vec<String>,
}

impl BandwidthProbe {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            argv: BANDWIDTH_ARGS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Empty string means "no update"; the caller keeps its last value
    pub async fn probe(&self) -> String {
        info!(command = ?self.argv, "Running bandwidth test");
        let output = self.runner.run(&self.argv, BANDWIDTH_TIMEOUT).await;

        match parse_bandwidth(&output.stdout) {
            Some(text) => text,
            None => {
                warn!(
                    command = ?self.argv,
                    outcome = ?output.outcome,
                    stdout_len = output.stdout.len(),
                    "Bandwidth test produced no usable result"
                );
                String::new()
            }
        }
    }
}
