use serde::{Deserialize, Serialize};

/// Substituted when the provider reports its `"auto"` color.
pub const AUTO_CALENDAR_COLOR: &str = "#03A9F4";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Service {
    #[default]
    Microsoft,
    Google,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedCalendar {
    pub id: String,
    pub name: String,
    pub service: Service,
    pub color: String,
    pub account_id: String,
    pub read_only: bool,
}
