use crate::calendar::{NormalizedCalendar, Service, AUTO_CALENDAR_COLOR};
use crate::sync::graph_model::GraphCalendar;

const AUTO_COLOR: &str = "auto";

pub fn to_normalized(calendar: &GraphCalendar, account_id: &str) -> NormalizedCalendar {
    let color = match calendar.color.as_deref() {
        None | Some(AUTO_COLOR) => AUTO_CALENDAR_COLOR.to_string(),
        Some(color) => color.to_string(),
    };

    NormalizedCalendar {
        id: calendar.id.clone(),
        name: calendar.name.clone(),
        service: Service::Microsoft,
        color,
        account_id: account_id.to_string(),
        read_only: !calendar.can_edit.unwrap_or(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph_calendar(color: Option<&str>, can_edit: Option<bool>) -> GraphCalendar {
        GraphCalendar {
            id: "cal-1".to_string(),
            name: "Calendar".to_string(),
            color: color.map(str::to_string),
            can_edit,
        }
    }

    #[test]
    fn auto_color_becomes_default_blue() {
        let calendar = to_normalized(&graph_calendar(Some("auto"), Some(true)), "1");

        assert_eq!(calendar.color, "#03A9F4");
    }

    #[test]
    fn explicit_color_passes_through() {
        let calendar = to_normalized(&graph_calendar(Some("lightGreen"), Some(true)), "1");

        assert_eq!(calendar.color, "lightGreen");
    }

    #[test]
    fn editable_calendar_is_not_read_only() {
        let calendar = to_normalized(&graph_calendar(Some("auto"), Some(true)), "1");

        assert!(!calendar.read_only);
        assert_eq!(calendar.account_id, "1");
        assert_eq!(calendar.service, Service::Microsoft);
    }

    #[test]
    fn calendar_without_edit_flag_is_read_only() {
        let calendar = to_normalized(&graph_calendar(None, None), "1");

        assert!(calendar.read_only);
        assert_eq!(calendar.color, AUTO_CALENDAR_COLOR);
    }
}
