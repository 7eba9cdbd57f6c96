// Inkstat Infrastructure - System Adapters
// Implements: CommandRunner, CalendarCache, FeedFetcher, CalendarParser, DisplayAdapter

pub mod artwork;
pub mod file_cache;
pub mod http_fetcher;
pub mod ical_parser;
pub mod noop_display;
pub mod subprocess_runner;

pub use artwork::{load_artwork, load_artworks, ArtworkError};
pub use file_cache::{cache_key, FileCalendarCache};
pub use http_fetcher::{HttpFeedFetcher, DEFAULT_FETCH_TIMEOUT};
pub use ical_parser::IcalCalendarParser;
pub use noop_display::{NoopDisplay, NOOP_GEOMETRY};
pub use subprocess_runner::{BoundedCommandRunner, KILL_GRACE};
