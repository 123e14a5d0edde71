pub mod calendar_type;
pub mod category;
pub mod color;
pub mod event;
pub mod form;

pub use calendar_type::{NormalizedCalendar, Service, AUTO_CALENDAR_COLOR};
pub use category::NormalizedCategory;
pub use color::{color_for_preset, DEFAULT_PRESET_COLOR, PALETTE};
pub use event::{EventAttendee, NormalizedEvent, UNTITLED_EVENT};
pub use form::{Categories, EventForm};
