// Agent constants (no magic values)
use std::time::Duration;

/// Address pinged every iteration (a well-known public resolver)
pub const DEFAULT_PING_TARGET: &str = "8.8.8.8";

/// Ping burst: 10 probes, 50ms apart, 0.5s per-reply wait, TTL 250
pub const PING_ARGS: [&str; 9] = ["ping", "-W", "0.5", "-t", "250", "-i", "0.05", "-c", "10"];

/// Bound on the ping burst
pub const PING_TIMEOUT: Duration = Duration::from_secs(5);

/// Bandwidth test producing a JSON document on stdout
pub const BANDWIDTH_ARGS: [&str; 2] = ["speedtest-cli", "--json"];

/// Bound on the bandwidth test
pub const BANDWIDTH_TIMEOUT: Duration = Duration::from_secs(35);

/// Bandwidth probe runs on iterations where `index % MODULUS == PHASE`
pub const BANDWIDTH_THROTTLE_MODULUS: u64 = 5;
pub const BANDWIDTH_THROTTLE_PHASE: u64 = 1;

/// Bound on the calendar sub-invocation
pub const CALENDAR_TIMEOUT: Duration = Duration::from_secs(60);

/// Shortest sleep between iterations
pub const SLEEP_FLOOR: Duration = Duration::from_secs(10);

/// Subtracted from the period so the next refresh lands on time
pub const SLEEP_SAFETY_MARGIN: Duration = Duration::from_secs(10);

/// Render duration assumed before the first measurement
pub const INITIAL_RENDER_ESTIMATE: Duration = Duration::from_secs(15);

/// Display text when the packet-loss figure is missing from ping output
pub const PACKET_LOSS_SENTINEL: &str = "naurrr";
