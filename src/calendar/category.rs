use serde::{Deserialize, Serialize};

/// A CRM category option. `value` always mirrors `label`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedCategory {
    pub id: String,
    pub label: String,
    pub value: String,
    pub color: String,
}
