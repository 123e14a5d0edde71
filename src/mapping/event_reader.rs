use crate::calendar::{EventAttendee, NormalizedCalendar, NormalizedEvent, Service, UNTITLED_EVENT};
use crate::mapping::link::{DeepLink, DeepLinkPattern, LinkCleaner};
use crate::mapping::MappingConfig;
use crate::storage::directory::UserDirectory;
use crate::sync::graph_model::{DateTimeTimeZone, GraphEvent};
use chrono::{DateTime, Days, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::collections::HashMap;
use std::fmt::{Display, Write};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("Invalid {field} date/time: {value}")]
    InvalidDateTime { field: &'static str, value: String },
    #[error("Invalid date format: {0}")]
    InvalidFormat(String),
}

/// Converts Graph events into the CRM's event records.
pub struct EventReader {
    config: MappingConfig,
    directory: Arc<dyn UserDirectory>,
    cleaner: Arc<dyn LinkCleaner>,
    links: DeepLinkPattern,
}

impl EventReader {
    pub fn new(
        config: MappingConfig,
        directory: Arc<dyn UserDirectory>,
        cleaner: Arc<dyn LinkCleaner>,
    ) -> Self {
        let links = DeepLinkPattern::new(&config.app_url);
        Self {
            config,
            directory,
            cleaner,
            links,
        }
    }

    /// Calendar-view rendering of an event listed through `calendar`.
    ///
    /// All-day is inferred: an event starting and ending at midnight UTC is
    /// rendered as `YYYY-MM-DD` dates, anything else as `YYYY-MM-DDTHH:MM:SS`
    /// in the display timezone. The color is the one of the first category
    /// when known, the calendar's otherwise.
    pub fn read_listed(
        &self,
        event: &GraphEvent,
        calendar: &NormalizedCalendar,
        category_colors: &HashMap<String, String>,
    ) -> Result<NormalizedEvent, ReadError> {
        let start = parse_graph_datetime(&event.start, "start")?;
        let end = parse_graph_datetime(&event.end, "end")?;

        let all_day = is_midnight(&start) && is_midnight(&end);
        let (start, end) = if all_day {
            (start.date_naive().to_string(), end.date_naive().to_string())
        } else {
            (self.local_iso(&start), self.local_iso(&end))
        };

        let color = event
            .categories
            .first()
            .and_then(|label| category_colors.get(label))
            .filter(|color| !color.is_empty())
            .cloned()
            .unwrap_or_else(|| calendar.color.clone());

        let link = self.links.extract(event.body_content());
        let mut normalized =
            self.normalize(event, start, end, all_day, &calendar.id, &calendar.account_id, link);
        normalized.color = Some(color);
        normalized.editable = Some(!calendar.read_only);

        Ok(normalized)
    }

    /// Form rendering of a single event, using the configured date formats.
    ///
    /// Graph stores all-day events with an exclusive end date, so the end is
    /// moved back one day to get the last included day.
    pub fn read(
        &self,
        event: &GraphEvent,
        calendar_id: &str,
        account_id: &str,
    ) -> Result<NormalizedEvent, ReadError> {
        let start = parse_graph_datetime(&event.start, "start")?;
        let end = parse_graph_datetime(&event.end, "end")?;

        let (start, end) = if event.is_all_day {
            let first_day = start.date_naive();
            let last_day = end
                .date_naive()
                .checked_sub_days(Days::new(1))
                .unwrap_or_else(|| end.date_naive());
            let format = &self.config.date_format;
            (render(first_day.format(format), format)?, render(last_day.format(format), format)?)
        } else {
            let timezone = self.config.timezone;
            let format = &self.config.datetime_format;
            (
                render(start.with_timezone(&timezone).format(format), format)?,
                render(end.with_timezone(&timezone).format(format), format)?,
            )
        };

        let link = self.links.extract(event.body_preview());
        Ok(self.normalize(event, start, end, event.is_all_day, calendar_id, account_id, link))
    }

    #[allow(clippy::too_many_arguments)]
    fn normalize(
        &self,
        event: &GraphEvent,
        start: String,
        end: String,
        all_day: bool,
        calendar_id: &str,
        account_id: &str,
        link: Option<DeepLink>,
    ) -> NormalizedEvent {
        let (module_name, record_id) = link
            .map(|l| (l.module_name, l.record_id))
            .unwrap_or_default();
        let description =
            html_escape::decode_html_entities(&self.cleaner.clean(event.body_preview())).into_owned();

        NormalizedEvent {
            id: event.id.clone(),
            title: event
                .subject
                .clone()
                .unwrap_or_else(|| UNTITLED_EVENT.to_string()),
            start,
            end,
            all_day,
            location: event.location_name().to_string(),
            description,
            module_name,
            record_id,
            calendar_id: calendar_id.to_string(),
            account_id: account_id.to_string(),
            calendar_type: Service::Microsoft,
            color: None,
            editable: None,
            categories: event.categories.clone(),
            attendees: self.attendees(event),
        }
    }

    fn attendees(&self, event: &GraphEvent) -> Vec<EventAttendee> {
        event
            .attendees
            .iter()
            .map(|attendee| {
                let email = attendee.email_address.address.clone();
                match self.directory.find_by_email(&email) {
                    Some(user) => EventAttendee {
                        name: user.name,
                        img: user
                            .image
                            .map(|image| self.config.asset_url(&image))
                            .unwrap_or_default(),
                        email,
                    },
                    None => EventAttendee {
                        name: email.clone(),
                        img: String::new(),
                        email,
                    },
                }
            })
            .collect()
    }

    fn local_iso(&self, value: &DateTime<Utc>) -> String {
        value
            .with_timezone(&self.config.timezone)
            .format("%Y-%m-%dT%H:%M:%S")
            .to_string()
    }
}

/// Parses a Graph `dateTime`/`timeZone` pair. Offset-less values are wall-clock
/// times in `timeZone` when it names an IANA zone, and UTC otherwise.
pub fn parse_graph_datetime(
    value: &DateTimeTimeZone,
    field: &'static str,
) -> Result<DateTime<Utc>, ReadError> {
    let raw = value.date_time.trim();
    let invalid = || ReadError::InvalidDateTime {
        field,
        value: raw.to_string(),
    };

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }

    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .map_err(|_| invalid())?;

    match value.time_zone.parse::<Tz>() {
        Ok(zone) => zone
            .from_local_datetime(&naive)
            .earliest()
            .map(|local| local.with_timezone(&Utc))
            .ok_or_else(invalid),
        Err(_) => Ok(naive.and_utc()),
    }
}

fn is_midnight(value: &DateTime<Utc>) -> bool {
    value.time() == NaiveTime::MIN
}

// chrono reports bad format strings through fmt::Error instead of panicking here.
fn render(value: impl Display, format: &str) -> Result<String, ReadError> {
    let mut out = String::new();
    write!(out, "{}", value).map_err(|_| ReadError::InvalidFormat(format.to_string()))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::link::CrmLinks;
    use crate::mapping::test_mapping_config;
    use crate::storage::directory::{CrmUser, MockUserDirectory};
    use crate::sync::graph_model::{
        AttendeeType, EmailAddress, GraphAttendee, ItemBody, Location,
    };

    fn reader_with(directory: MockUserDirectory, timezone: Tz) -> EventReader {
        let config = test_mapping_config(timezone);
        let links = Arc::new(CrmLinks::new(&config.app_url));
        EventReader::new(config, Arc::new(directory), links)
    }

    fn reader(timezone: Tz) -> EventReader {
        reader_with(MockUserDirectory::new(), timezone)
    }

    fn graph_event(start: &str, end: &str) -> GraphEvent {
        GraphEvent {
            id: "evt-1".to_string(),
            subject: Some("Review".to_string()),
            body: None,
            body_preview: None,
            start: DateTimeTimeZone::new(start, "UTC"),
            end: DateTimeTimeZone::new(end, "UTC"),
            is_all_day: false,
            location: Some(Location {
                display_name: Some("Room 1".to_string()),
            }),
            categories: vec![],
            attendees: vec![],
        }
    }

    fn calendar(read_only: bool) -> NormalizedCalendar {
        NormalizedCalendar {
            id: "cal-1".to_string(),
            name: "Calendar".to_string(),
            service: Service::Microsoft,
            color: "#03A9F4".to_string(),
            account_id: "1".to_string(),
            read_only,
        }
    }

    fn attendee(address: &str) -> GraphAttendee {
        GraphAttendee {
            email_address: EmailAddress {
                address: address.to_string(),
                name: Some("Provider Name".to_string()),
            },
            attendee_type: AttendeeType::Required,
        }
    }

    #[test]
    fn parses_graph_datetime_with_fraction() {
        let parsed = parse_graph_datetime(
            &DateTimeTimeZone::new("2025-03-01T09:30:00.0000000", "UTC"),
            "start",
        )
        .unwrap();

        assert_eq!(parsed.to_rfc3339(), "2025-03-01T09:30:00+00:00");
    }

    #[test]
    fn parses_graph_datetime_in_named_zone() {
        let parsed = parse_graph_datetime(
            &DateTimeTimeZone::new("2025-03-01T10:30:00", "Europe/Paris"),
            "start",
        )
        .unwrap();

        assert_eq!(parsed.to_rfc3339(), "2025-03-01T09:30:00+00:00");
    }

    #[test]
    fn parses_graph_datetime_with_offset() {
        let parsed = parse_graph_datetime(
            &DateTimeTimeZone::new("2025-03-02T00:00:00+00:00", "UTC"),
            "end",
        )
        .unwrap();

        assert_eq!(parsed.to_rfc3339(), "2025-03-02T00:00:00+00:00");
    }

    #[test]
    fn rejects_garbage_datetime() {
        let result = parse_graph_datetime(&DateTimeTimeZone::new("yesterday", "UTC"), "start");

        assert!(matches!(result, Err(ReadError::InvalidDateTime { field: "start", .. })));
    }

    #[test]
    fn listed_midnight_event_is_all_day() {
        let event = graph_event("2025-03-01T00:00:00.0000000", "2025-03-02T00:00:00.0000000");

        let normalized = reader(chrono_tz::Europe::Paris)
            .read_listed(&event, &calendar(false), &HashMap::new())
            .unwrap();

        assert!(normalized.all_day);
        assert_eq!(normalized.start, "2025-03-01");
        assert_eq!(normalized.end, "2025-03-02");
    }

    #[test]
    fn listed_timed_event_uses_display_timezone() {
        let event = graph_event("2025-03-01T09:00:00.0000000", "2025-03-01T10:30:00.0000000");

        let normalized = reader(chrono_tz::Europe::Paris)
            .read_listed(&event, &calendar(false), &HashMap::new())
            .unwrap();

        assert!(!normalized.all_day);
        assert_eq!(normalized.start, "2025-03-01T10:00:00");
        assert_eq!(normalized.end, "2025-03-01T11:30:00");
    }

    #[test]
    fn listed_event_with_one_midnight_end_is_timed() {
        let event = graph_event("2025-03-01T00:00:00.0000000", "2025-03-01T12:00:00.0000000");

        let normalized = reader(chrono_tz::UTC)
            .read_listed(&event, &calendar(false), &HashMap::new())
            .unwrap();

        assert!(!normalized.all_day);
        assert_eq!(normalized.start, "2025-03-01T00:00:00");
    }

    #[test]
    fn listed_event_without_category_takes_calendar_color() {
        let event = graph_event("2025-03-01T09:00:00", "2025-03-01T10:00:00");

        let normalized = reader(chrono_tz::UTC)
            .read_listed(&event, &calendar(false), &HashMap::new())
            .unwrap();

        assert_eq!(normalized.color.as_deref(), Some("#03A9F4"));
    }

    #[test]
    fn listed_event_takes_first_category_color() {
        let mut event = graph_event("2025-03-01T09:00:00", "2025-03-01T10:00:00");
        event.categories = vec!["Red category".to_string(), "Blue category".to_string()];
        let mut colors = HashMap::new();
        colors.insert("Red category".to_string(), "#D6252E".to_string());
        colors.insert("Blue category".to_string(), "#3267B8".to_string());

        let normalized = reader(chrono_tz::UTC)
            .read_listed(&event, &calendar(false), &colors)
            .unwrap();

        assert_eq!(normalized.color.as_deref(), Some("#D6252E"));
        assert_eq!(normalized.categories, vec!["Red category", "Blue category"]);
    }

    #[test]
    fn listed_event_with_unknown_category_takes_calendar_color() {
        let mut event = graph_event("2025-03-01T09:00:00", "2025-03-01T10:00:00");
        event.categories = vec!["Deleted category".to_string()];

        let normalized = reader(chrono_tz::UTC)
            .read_listed(&event, &calendar(false), &HashMap::new())
            .unwrap();

        assert_eq!(normalized.color.as_deref(), Some("#03A9F4"));
    }

    #[test]
    fn listed_event_of_read_only_calendar_is_not_editable() {
        let event = graph_event("2025-03-01T09:00:00", "2025-03-01T10:00:00");

        let normalized = reader(chrono_tz::UTC)
            .read_listed(&event, &calendar(true), &HashMap::new())
            .unwrap();

        assert_eq!(normalized.editable, Some(false));
        assert_eq!(normalized.calendar_id, "cal-1");
        assert_eq!(normalized.account_id, "1");
    }

    #[test]
    fn listed_event_extracts_link_from_body() {
        let mut event = graph_event("2025-03-01T09:00:00", "2025-03-01T10:00:00");
        event.body = Some(ItemBody::html(
            r#"Notes<br><br><a href="https://app.example/42/contacts/7/link">link</a>"#,
        ));

        let normalized = reader(chrono_tz::UTC)
            .read_listed(&event, &calendar(false), &HashMap::new())
            .unwrap();

        assert_eq!(normalized.module_name, "contacts");
        assert_eq!(normalized.record_id, "7");
    }

    #[test]
    fn event_without_link_has_empty_module_and_record() {
        let mut event = graph_event("2025-03-01T09:00:00", "2025-03-01T10:00:00");
        event.body_preview = Some("Just a meeting".to_string());

        let normalized = reader(chrono_tz::UTC).read(&event, "cal-1", "1").unwrap();

        assert_eq!(normalized.module_name, "");
        assert_eq!(normalized.record_id, "");
    }

    #[test]
    fn missing_subject_and_location_are_defaulted() {
        let mut event = graph_event("2025-03-01T09:00:00", "2025-03-01T10:00:00");
        event.subject = None;
        event.location = None;

        let normalized = reader(chrono_tz::UTC).read(&event, "cal-1", "1").unwrap();

        assert_eq!(normalized.title, "(no title)");
        assert_eq!(normalized.location, "");
    }

    #[test]
    fn timed_event_is_formatted_with_configured_datetime_format() {
        let event = graph_event("2025-03-01T09:00:00.0000000", "2025-03-01T10:15:00.0000000");

        let normalized = reader(chrono_tz::Europe::Paris)
            .read(&event, "cal-1", "1")
            .unwrap();

        assert!(!normalized.all_day);
        assert_eq!(normalized.start, "01/03/2025 10:00");
        assert_eq!(normalized.end, "01/03/2025 11:15");
        assert_eq!(normalized.color, None);
        assert_eq!(normalized.editable, None);
    }

    #[test]
    fn all_day_event_end_is_last_included_day() {
        let mut event = graph_event("2025-03-01T00:00:00.0000000", "2025-03-04T00:00:00.0000000");
        event.is_all_day = true;

        let normalized = reader(chrono_tz::America::New_York)
            .read(&event, "cal-1", "1")
            .unwrap();

        assert!(normalized.all_day);
        assert_eq!(normalized.start, "01/03/2025");
        assert_eq!(normalized.end, "03/03/2025");
    }

    #[test]
    fn invalid_configured_format_is_an_error() {
        let mut config = test_mapping_config(chrono_tz::UTC);
        config.datetime_format = "%Q".to_string();
        let links = Arc::new(CrmLinks::new(&config.app_url));
        let reader = EventReader::new(config, Arc::new(MockUserDirectory::new()), links);
        let event = graph_event("2025-03-01T09:00:00", "2025-03-01T10:00:00");

        assert!(matches!(
            reader.read(&event, "cal-1", "1"),
            Err(ReadError::InvalidFormat(_))
        ));
    }

    #[test]
    fn description_is_cleaned_and_decoded() {
        let mut event = graph_event("2025-03-01T09:00:00", "2025-03-01T10:00:00");
        event.body_preview = Some(
            "Q&amp;A with &quot;sales&quot;\r\n\r\nhttps://app.example/42/contacts/7/link".to_string(),
        );

        let normalized = reader(chrono_tz::UTC).read(&event, "cal-1", "1").unwrap();

        assert_eq!(normalized.description, "Q&A with \"sales\"");
        assert_eq!(normalized.module_name, "contacts");
        assert_eq!(normalized.record_id, "7");
    }

    #[test]
    fn description_decodes_typographic_and_accented_entities() {
        let mut event = graph_event("2025-03-01T09:00:00", "2025-03-01T10:00:00");
        event.body_preview = Some("It&rsquo;s &uuml;ber &ldquo;gro&szlig;&rdquo; &bull; caf&#xE9;".to_string());

        let normalized = reader(chrono_tz::UTC).read(&event, "cal-1", "1").unwrap();

        assert_eq!(normalized.description, "It\u{2019}s über \u{201C}groß\u{201D} \u{2022} café");
    }

    #[test]
    fn description_is_decoded_once() {
        let mut event = graph_event("2025-03-01T09:00:00", "2025-03-01T10:00:00");
        event.body_preview = Some("&amp;lt;b&amp;gt;".to_string());

        let normalized = reader(chrono_tz::UTC).read(&event, "cal-1", "1").unwrap();

        assert_eq!(normalized.description, "&lt;b&gt;");
    }

    #[test]
    fn attendees_are_enriched_from_directory_in_order() {
        let mut directory = MockUserDirectory::new();
        directory
            .expect_find_by_email()
            .withf(|email| email == "jane@example.com")
            .times(1)
            .return_const(Some(CrmUser {
                username: "jane@example.com".to_string(),
                name: "Jane Doe".to_string(),
                image: Some("storage/jane.png".to_string()),
            }));
        directory
            .expect_find_by_email()
            .withf(|email| email == "guest@other.com")
            .times(1)
            .return_const(None);

        let mut event = graph_event("2025-03-01T09:00:00", "2025-03-01T10:00:00");
        event.attendees = vec![attendee("jane@example.com"), attendee("guest@other.com")];

        let normalized = reader_with(directory, chrono_tz::UTC)
            .read(&event, "cal-1", "1")
            .unwrap();

        assert_eq!(
            normalized.attendees,
            vec![
                EventAttendee {
                    email: "jane@example.com".to_string(),
                    name: "Jane Doe".to_string(),
                    img: "https://app.example/storage/jane.png".to_string(),
                },
                EventAttendee {
                    email: "guest@other.com".to_string(),
                    name: "guest@other.com".to_string(),
                    img: String::new(),
                },
            ]
        );
    }
}
