// Probes - turn bounded command output into display text

pub mod bandwidth;
pub mod calendar;
pub mod network;

pub use bandwidth::{should_probe_bandwidth, BandwidthProbe};
pub use calendar::CalendarProbe;
pub use network::NetworkProbe;
