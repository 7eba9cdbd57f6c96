//! Inkstat daemon support: command-line configuration, logging and signal
//! handling shared by the `inkstat` agent and the `upcoming-events` helper.

pub mod config;
pub mod logging;
pub mod signals;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
