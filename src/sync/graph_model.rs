//! Serde shapes of the Microsoft Graph calendar resources used by this crate.

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct GraphListResponse<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphCalendar {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub can_edit: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphCategory {
    #[serde(default)]
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateTimeTimeZone {
    pub date_time: String,
    pub time_zone: String,
}

impl DateTimeTimeZone {
    pub fn new(date_time: impl Into<String>, time_zone: impl Into<String>) -> Self {
        Self {
            date_time: date_time.into(),
            time_zone: time_zone.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyContentType {
    #[serde(rename = "HTML", alias = "html")]
    Html,
    #[serde(rename = "Text", alias = "text")]
    Text,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemBody {
    pub content_type: BodyContentType,
    #[serde(default)]
    pub content: String,
}

impl ItemBody {
    pub fn html(content: impl Into<String>) -> Self {
        Self {
            content_type: BodyContentType::Html,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailAddress {
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AttendeeType {
    #[default]
    Required,
    Optional,
    Resource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphAttendee {
    pub email_address: EmailAddress,
    #[serde(rename = "type", default)]
    pub attendee_type: AttendeeType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphEvent {
    pub id: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub body: Option<ItemBody>,
    #[serde(default)]
    pub body_preview: Option<String>,
    pub start: DateTimeTimeZone,
    pub end: DateTimeTimeZone,
    #[serde(default)]
    pub is_all_day: bool,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub attendees: Vec<GraphAttendee>,
}

impl GraphEvent {
    pub fn body_content(&self) -> &str {
        self.body.as_ref().map(|b| b.content.as_str()).unwrap_or_default()
    }

    pub fn body_preview(&self) -> &str {
        self.body_preview.as_deref().unwrap_or_default()
    }

    pub fn location_name(&self) -> &str {
        self.location
            .as_ref()
            .and_then(|l| l.display_name.as_deref())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewCalendar {
    pub name: String,
}

/// Body of an event `POST` or `PATCH`. Unset fields are left out of the JSON
/// so that a `PATCH` leaves them untouched on the provider side.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventWritePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    pub start: DateTimeTimeZone,
    pub end: DateTimeTimeZone,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_all_day: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<ItemBody>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attendees: Option<Vec<GraphAttendee>>,
}

impl EventWritePayload {
    pub fn new(start: DateTimeTimeZone, end: DateTimeTimeZone) -> Self {
        Self {
            subject: None,
            start,
            end,
            is_all_day: None,
            location: None,
            body: None,
            categories: None,
            attendees: None,
        }
    }

    pub fn all_day(mut self) -> Self {
        self.is_all_day = Some(true);
        self
    }

    pub fn with_subject(mut self, subject: Option<String>) -> Self {
        self.subject = subject;
        self
    }

    pub fn with_location(mut self, display_name: String) -> Self {
        self.location = Some(Location {
            display_name: Some(display_name),
        });
        self
    }

    pub fn with_html_body(mut self, content: String) -> Self {
        self.body = Some(ItemBody::html(content));
        self
    }

    pub fn with_categories(mut self, categories: Vec<String>) -> Self {
        self.categories = Some(categories);
        self
    }

    pub fn with_attendees(mut self, attendees: Vec<GraphAttendee>) -> Self {
        self.attendees = Some(attendees);
        self
    }
}
