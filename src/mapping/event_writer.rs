use crate::calendar::{Categories, EventForm};
use crate::mapping::link::LinkGenerator;
use crate::mapping::MappingConfig;
use crate::storage::directory::UserDirectory;
use crate::sync::graph_model::{
    AttendeeType, DateTimeTimeZone, EmailAddress, EventWritePayload, GraphAttendee,
};
use chrono::{DateTime, Days, NaiveDate, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use std::sync::Arc;
use thiserror::Error;

const UTC_ZONE: &str = "UTC";

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("Invalid {field} '{value}', expected format '{format}'")]
    InvalidDate {
        field: &'static str,
        value: String,
        format: String,
    },
    #[error("{field} '{value}' does not exist in timezone {timezone}")]
    NonexistentLocalTime {
        field: &'static str,
        value: String,
        timezone: &'static str,
    },
}

/// Builds Graph event payloads from submitted CRM event fields.
pub struct EventWriter {
    config: MappingConfig,
    directory: Arc<dyn UserDirectory>,
    links: Arc<dyn LinkGenerator>,
}

impl EventWriter {
    pub fn new(
        config: MappingConfig,
        directory: Arc<dyn UserDirectory>,
        links: Arc<dyn LinkGenerator>,
    ) -> Self {
        Self {
            config,
            directory,
            links,
        }
    }

    /// Full payload for a new event. All-day end dates get one extra day
    /// because Graph treats the end date as exclusive.
    pub fn to_create_payload(&self, form: &EventForm) -> Result<EventWritePayload, WriteError> {
        let payload = self
            .dated_payload(form, 1)?
            .with_subject(Some(form.subject.clone().unwrap_or_default()))
            .with_location(form.location.clone().unwrap_or_default())
            .with_html_body(self.body_content(form))
            .with_categories(
                form.category
                    .as_ref()
                    .map(Categories::to_vec)
                    .unwrap_or_default(),
            );

        Ok(match form.attendees.as_deref() {
            Some(addresses) if !addresses.is_empty() => {
                payload.with_attendees(self.attendees(addresses))
            }
            _ => payload,
        })
    }

    /// Sparse payload for a `PATCH`: dates are always sent, every other field
    /// only when it was submitted.
    pub fn to_update_payload(&self, form: &EventForm) -> Result<EventWritePayload, WriteError> {
        let mut payload = self.dated_payload(form, 0)?;

        if let Some(subject) = &form.subject {
            payload = payload.with_subject(Some(subject.clone()));
        }
        if let Some(category) = &form.category {
            payload = payload.with_categories(category.to_vec());
        }
        if let Some(location) = &form.location {
            payload = payload.with_location(location.clone());
        }
        if form.description.is_some() {
            payload = payload.with_html_body(self.body_content(form));
        }
        if let Some(addresses) = &form.attendees {
            payload = payload.with_attendees(self.attendees(addresses));
        }

        Ok(payload)
    }

    fn dated_payload(
        &self,
        form: &EventForm,
        extra_end_days: u64,
    ) -> Result<EventWritePayload, WriteError> {
        if form.all_day {
            let start = self.parse_date(&form.start_date, "start_date")?;
            let end = self.parse_date(&form.end_date, "end_date")?;
            let end = end
                .checked_add_days(Days::new(extra_end_days))
                .ok_or_else(|| self.invalid_date(&form.end_date, "end_date", &self.config.date_format))?;

            return Ok(EventWritePayload::new(utc_midnight(start), utc_midnight(end)).all_day());
        }

        let timezone = self.config.timezone_name();
        let start = self.parse_datetime(&form.start_date, "start_date")?;
        let end = self.parse_datetime(&form.end_date, "end_date")?;

        Ok(EventWritePayload::new(
            DateTimeTimeZone::new(atom(&start), timezone),
            DateTimeTimeZone::new(atom(&end), timezone),
        ))
    }

    fn body_content(&self, form: &EventForm) -> String {
        let mut content = form.description.clone().unwrap_or_default();
        if let Some((module_name, record_id)) = form.record_target() {
            content.push_str(&self.links.generate(
                module_name,
                record_id,
                self.config.domain.as_deref(),
            ));
        }
        content
    }

    fn attendees(&self, addresses: &[String]) -> Vec<GraphAttendee> {
        addresses
            .iter()
            .map(|address| GraphAttendee {
                email_address: EmailAddress {
                    address: address.clone(),
                    name: self.directory.find_by_email(address).map(|user| user.name),
                },
                attendee_type: AttendeeType::Required,
            })
            .collect()
    }

    fn parse_date(&self, value: &str, field: &'static str) -> Result<NaiveDate, WriteError> {
        let format = &self.config.date_format;
        NaiveDate::parse_from_str(value.trim(), format)
            .map_err(|_| self.invalid_date(value, field, format))
    }

    fn parse_datetime(&self, value: &str, field: &'static str) -> Result<DateTime<Tz>, WriteError> {
        let format = &self.config.datetime_format;
        let naive = NaiveDateTime::parse_from_str(value.trim(), format)
            .map_err(|_| self.invalid_date(value, field, format))?;

        self.config
            .timezone
            .from_local_datetime(&naive)
            .earliest()
            .ok_or_else(|| WriteError::NonexistentLocalTime {
                field,
                value: value.to_string(),
                timezone: self.config.timezone_name(),
            })
    }

    fn invalid_date(&self, value: &str, field: &'static str, format: &str) -> WriteError {
        WriteError::InvalidDate {
            field,
            value: value.to_string(),
            format: format.to_string(),
        }
    }
}

fn utc_midnight(date: NaiveDate) -> DateTimeTimeZone {
    DateTimeTimeZone::new(format!("{}T00:00:00+00:00", date.format("%Y-%m-%d")), UTC_ZONE)
}

fn atom(value: &DateTime<Tz>) -> String {
    value.format("%Y-%m-%dT%H:%M:%S%:z").to_string()
}
