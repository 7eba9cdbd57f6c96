// Network Probe - packet loss and round-trip figures from a ping burst

use regex::Regex;
use std::sync::{Arc, OnceLock};
use tracing::{info, warn};

use crate::application::constants::{PACKET_LOSS_SENTINEL, PING_ARGS, PING_TIMEOUT};
use crate::domain::{NetworkStatus, Parsed};
use crate::port::CommandRunner;

fn packet_loss_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?s).*, (.*% packet loss)").expect("valid regex"))
}

fn rtt_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?s).*mdev = (.*)ms").expect("valid regex"))
}

fn fraction_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\.\d+").expect("valid regex"))
}

/// `"0% packet loss"` from the summary line
pub fn parse_packet_loss(output: &str) -> Parsed<String> {
    Parsed::from_option(
        packet_loss_pattern()
            .captures(output)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string()),
    )
}

/// `"10/12/15/1 ms"` from the `min/avg/max/mdev` line, fractions dropped
pub fn parse_ping(output: &str) -> Parsed<String> {
    Parsed::from_option(
        rtt_pattern()
            .captures(output)
            .and_then(|c| c.get(1))
            .map(|m| {
                let whole = fraction_pattern().replacen(m.as_str(), 4, "");
                format!("{} ms", whole.trim())
            }),
    )
}

/// Runs a fixed ping burst against one target
pub struct NetworkProbe {
    runner: Arc<dyn CommandRunner>,
    argv: Vec<String>,
}

impl NetworkProbe {
    pub fn new(runner: Arc<dyn CommandRunner>, target: &str) -> Self {
        let mut argv: Vec<String> = PING_ARGS.iter().map(|s| s.to_string()).collect();
        argv.push(target.to_string());
        Self { runner, argv }
    }

    /// Never fails; missing figures become the sentinel / empty text
    pub async fn probe(&self) -> NetworkStatus {
        info!(command = ?self.argv, "Running ping burst");
        let output = self.runner.run(&self.argv, PING_TIMEOUT).await;

        let packet_loss = parse_packet_loss(&output.stdout);
        let ping = parse_ping(&output.stdout);
        if !packet_loss.is_matched() || !ping.is_matched() {
            warn!(
                command = ?self.argv,
                outcome = ?output.outcome,
                packet_loss_found = packet_loss.is_matched(),
                rtt_found = ping.is_matched(),
                "Ping output missing expected figures"
            );
        }

        NetworkStatus {
            packet_loss: packet_loss.or_sentinel(PACKET_LOSS_SENTINEL),
            ping: ping.or_sentinel(""),
        }
    }
}
