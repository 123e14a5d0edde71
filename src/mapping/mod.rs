//! Translation between Microsoft Graph resources and the CRM's calendar records.
//!
//! Every mapper is a pure function of its inputs plus [`MappingConfig`] and the
//! read-only collaborators it is built with.

pub mod calendar_mapper;
pub mod category_mapper;
pub mod event_reader;
pub mod event_writer;
pub mod link;

use chrono_tz::Tz;

pub use event_reader::{EventReader, ReadError};
pub use event_writer::{EventWriter, WriteError};
pub use link::{CrmLinks, DeepLink, LinkCleaner, LinkGenerator};

#[derive(Debug, Clone, PartialEq)]
pub struct MappingConfig {
    /// CRM base URL without trailing slash.
    pub app_url: String,
    pub domain: Option<String>,
    pub timezone: Tz,
    pub date_format: String,
    pub datetime_format: String,
}

impl MappingConfig {
    pub fn timezone_name(&self) -> &'static str {
        self.timezone.name()
    }

    /// Public URL of a file stored by the CRM, e.g. a profile image.
    pub fn asset_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!("{}/{}", self.app_url, path.trim_start_matches('/'))
    }
}

#[cfg(test)]
pub(crate) fn test_mapping_config(timezone: Tz) -> MappingConfig {
    MappingConfig {
        app_url: "https://app.example".to_string(),
        domain: Some("42".to_string()),
        timezone,
        date_format: "%d/%m/%Y".to_string(),
        datetime_format: "%d/%m/%Y %H:%M".to_string(),
    }
}
