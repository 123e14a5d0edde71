pub mod graph_api;
pub mod graph_auth;
pub mod graph_model;
pub mod sync_engine;

pub use graph_api::{ApiError, DateRange, GraphApi, HttpGraphClient};
pub use graph_auth::{AccountStore, AuthError, CalendarAccount, ConfigAccountStore};
pub use sync_engine::{EventSavedListener, SyncEngine, SyncError};
