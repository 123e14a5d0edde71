use serde::{Deserialize, Serialize};

use crate::calendar::Service;

pub const UNTITLED_EVENT: &str = "(no title)";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedEvent {
    pub id: String,
    pub title: String,
    /// Date-only or local datetime string, depending on `all_day` and the read path.
    pub start: String,
    pub end: String,
    pub all_day: bool,
    pub location: String,
    pub description: String,
    pub module_name: String,
    pub record_id: String,
    pub calendar_id: String,
    pub account_id: String,
    pub calendar_type: Service,
    /// Only known when the event was listed through its calendar.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editable: Option<bool>,
    pub categories: Vec<String>,
    pub attendees: Vec<EventAttendee>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventAttendee {
    pub email: String,
    pub name: String,
    /// Profile image URL, empty for attendees unknown to the CRM.
    pub img: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_event(module_name: &str, record_id: &str) -> NormalizedEvent {
        NormalizedEvent {
            id: "evt-1".to_string(),
            title: UNTITLED_EVENT.to_string(),
            start: "2025-01-01".to_string(),
            end: "2025-01-02".to_string(),
            all_day: true,
            location: String::new(),
            description: String::new(),
            module_name: module_name.to_string(),
            record_id: record_id.to_string(),
            calendar_id: "cal-1".to_string(),
            account_id: "1".to_string(),
            calendar_type: Service::Microsoft,
            color: None,
            editable: None,
            categories: vec![],
            attendees: vec![],
        }
    }

    #[test]
    fn absent_color_and_editable_are_not_serialized() {
        let json = serde_json::to_value(create_test_event("", "")).unwrap();

        assert!(json.get("color").is_none());
        assert!(json.get("editable").is_none());
        assert_eq!(json["calendarType"], "microsoft");
        assert_eq!(json["allDay"], true);
    }
}
