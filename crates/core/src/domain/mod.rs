// Domain Layer - Pure data and rules, no I/O

pub mod cache;
pub mod clock;
pub mod cycle;
pub mod error;
pub mod event;
pub mod frame;
pub mod parse;
pub mod snapshot;

// Re-exports
pub use cache::CacheEntry;
pub use clock::{ClockSet, Zone};
pub use cycle::{CycleState, IterationReport};
pub use error::DomainError;
pub use event::{format_delta, select_upcoming, CalendarEvent, EventHandoff, UpcomingEvent};
pub use frame::{Artwork, Frame, Geometry, Plane};
pub use parse::Parsed;
pub use snapshot::{NetworkStatus, StatusSnapshot};
