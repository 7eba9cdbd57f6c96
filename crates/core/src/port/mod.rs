// Port Layer - Interfaces for external dependencies

pub mod calendar_cache;
pub mod calendar_parser;
pub mod command_runner;
pub mod display;
pub mod feed_fetcher;
pub mod frame_composer;
pub mod time_provider;

// Re-exports
pub use calendar_cache::{CacheError, CalendarCache};
pub use calendar_parser::{CalendarParseError, CalendarParser};
pub use command_runner::{argv, CommandOutcome, CommandOutput, CommandRunner};
pub use display::{DisplayAdapter, DisplayError};
pub use feed_fetcher::{FeedFetcher, FetchError};
pub use frame_composer::FrameComposer;
pub use time_provider::TimeProvider;
