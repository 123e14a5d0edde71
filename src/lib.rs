pub mod calendar;
pub mod mapping;
pub mod storage;
pub mod sync;

pub use calendar::{EventForm, NormalizedCalendar, NormalizedCategory, NormalizedEvent};
pub use storage::config::Config;
pub use sync::{DateRange, SyncEngine, SyncError};
