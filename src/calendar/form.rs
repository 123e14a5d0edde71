use serde::{Deserialize, Deserializer, Serialize};

/// Event fields as submitted by the CRM front end.
///
/// Optional fields distinguish "not submitted" (`None`) from submitted values,
/// which is what the sparse update payload relies on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventForm {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "accountId")]
    pub account_id: String,
    #[serde(rename = "calendarId")]
    pub calendar_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Categories>,
    #[serde(rename = "allDay", default, deserialize_with = "deserialize_flag")]
    pub all_day: bool,
    pub start_date: String,
    pub end_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attendees: Option<Vec<String>>,
    #[serde(rename = "moduleName", default, skip_serializing_if = "Option::is_none")]
    pub module_name: Option<String>,
    #[serde(rename = "recordId", default, skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
}

impl EventForm {
    /// Module and record the event should link back to, when both were submitted.
    pub fn record_target(&self) -> Option<(&str, &str)> {
        match (self.module_name.as_deref(), self.record_id.as_deref()) {
            (Some(module), Some(record)) if !module.is_empty() && !record.is_empty() => {
                Some((module, record))
            }
            _ => None,
        }
    }
}

/// A category field submitted either as one label or as a list of labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Categories {
    One(String),
    Many(Vec<String>),
}

impl Categories {
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            Categories::One(label) => vec![label.clone()],
            Categories::Many(labels) => labels.clone(),
        }
    }
}

// Browser forms send "true"/"false" strings, JSON clients send booleans.
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    Ok(match Option::<Flag>::deserialize(deserializer)? {
        Some(Flag::Bool(value)) => value,
        Some(Flag::Text(text)) => text == "true",
        None => false,
    })
}
