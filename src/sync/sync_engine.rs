use crate::calendar::{EventForm, NormalizedCalendar, NormalizedCategory, NormalizedEvent, Service};
use crate::mapping::{
    calendar_mapper, category_mapper, CrmLinks, EventReader, EventWriter, ReadError, WriteError,
};
use crate::storage::config::{Config, ConfigError};
use crate::storage::directory::{DisabledCalendars, InMemoryDirectory};
use crate::sync::graph_api::{ApiError, DateRange, GraphApi};
use crate::sync::graph_auth::{AccountStore, AuthError, ConfigAccountStore};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Authentication error: {0}")]
    AuthError(#[from] AuthError),
    #[error("API error: {0}")]
    ApiError(#[from] ApiError),
    #[error("Could not read event: {0}")]
    ReadError(#[from] ReadError),
    #[error("Could not build event: {0}")]
    WriteError(#[from] WriteError),
    #[error("Event id is required to update an event")]
    MissingEventId,
}

/// Notified with the CRM rendering of every event created or updated.
#[cfg_attr(test, mockall::automock)]
pub trait EventSavedListener: Send + Sync {
    fn event_saved(&self, event: &NormalizedEvent);
}

pub struct SyncEngine {
    accounts: Arc<dyn AccountStore>,
    disabled: Arc<dyn DisabledCalendars>,
    reader: EventReader,
    writer: EventWriter,
    listener: Option<Arc<dyn EventSavedListener>>,
}

impl SyncEngine {
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        disabled: Arc<dyn DisabledCalendars>,
        reader: EventReader,
        writer: EventWriter,
    ) -> Self {
        Self {
            accounts,
            disabled,
            reader,
            writer,
            listener: None,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let mapping = config.mapping()?;
        let directory = Arc::new(InMemoryDirectory::new(config.users.clone()));
        let links = Arc::new(CrmLinks::new(&mapping.app_url));
        let accounts = Arc::new(ConfigAccountStore::new(
            config.accounts.clone(),
            config.graph.base_url.clone(),
        ));

        Ok(Self::new(
            accounts,
            Arc::new(config.calendars.disabled.clone()),
            EventReader::new(mapping.clone(), directory.clone(), links.clone()),
            EventWriter::new(mapping, directory, links),
        ))
    }

    pub fn with_listener(mut self, listener: Arc<dyn EventSavedListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    pub async fn list_calendars(&self, account_id: &str) -> Result<Vec<NormalizedCalendar>, SyncError> {
        let client = self.accounts.client_for(account_id)?;
        tracing::info!("Listing calendars of account {}", account_id);
        self.fetch_calendars(client.as_ref(), account_id).await
    }

    pub async fn create_calendar(
        &self,
        account_id: &str,
        name: &str,
    ) -> Result<NormalizedCalendar, SyncError> {
        let client = self.accounts.client_for(account_id)?;
        tracing::info!("Creating calendar '{}' for account {}", name, account_id);
        let created = client.create_calendar(name).await?;
        Ok(calendar_mapper::to_normalized(&created, account_id))
    }

    pub async fn delete_calendar(&self, account_id: &str, calendar_id: &str) -> Result<(), SyncError> {
        let client = self.accounts.client_for(account_id)?;
        tracing::info!("Deleting calendar {} of account {}", calendar_id, account_id);
        client.delete_calendar(calendar_id).await?;
        Ok(())
    }

    pub async fn categories(&self, account_id: &str) -> Result<Vec<NormalizedCategory>, SyncError> {
        let client = self.accounts.client_for(account_id)?;
        let categories = client.list_master_categories().await?;
        Ok(category_mapper::to_normalized_list(&categories))
    }

    /// Events of every enabled calendar of every Microsoft account of `user_id`
    /// whose start falls within `range`. A calendar reachable through several
    /// accounts is fetched once, through the first of them.
    pub async fn list_events(
        &self,
        user_id: &str,
        range: DateRange,
    ) -> Result<Vec<NormalizedEvent>, SyncError> {
        let mut events = Vec::new();
        let mut fetched = HashSet::new();

        for account in self.accounts.accounts_for_user(user_id, Service::Microsoft) {
            let client = self.accounts.client_for(&account.id)?;
            let disabled = self.disabled.disabled_calendars(&account.id);
            let calendars = self.fetch_calendars(client.as_ref(), &account.id).await?;
            let categories =
                category_mapper::to_normalized_list(&client.list_master_categories().await?);
            let colors = category_mapper::color_by_label(&categories);

            for calendar in calendars {
                if disabled.contains(&calendar.id) {
                    tracing::debug!("Skipping disabled calendar {}", calendar.id);
                    continue;
                }
                if !fetched.insert(calendar.id.clone()) {
                    tracing::debug!("Calendar {} already fetched", calendar.id);
                    continue;
                }

                let listed = client.list_events(&calendar.id, range).await?;
                tracing::debug!("Reading {} events of calendar {}", listed.len(), calendar.id);

                events.extend(listed.iter().filter_map(|event| {
                    self.reader
                        .read_listed(event, &calendar, &colors)
                        .map_err(|e| tracing::warn!("Skipping event {}: {}", event.id, e))
                        .ok()
                }));
            }
        }

        Ok(events)
    }

    /// A single event in form rendering. Unknown accounts and provider
    /// failures both come back as `None`.
    pub async fn retrieve_event(
        &self,
        account_id: &str,
        calendar_id: &str,
        event_id: &str,
    ) -> Result<Option<NormalizedEvent>, SyncError> {
        if self.accounts.account(account_id).is_none() {
            tracing::warn!("Event {} requested for unknown account {}", event_id, account_id);
            return Ok(None);
        }

        let client = match self.accounts.client_for(account_id) {
            Ok(client) => client,
            Err(e) => {
                tracing::warn!("No client for account {}: {}", account_id, e);
                return Ok(None);
            }
        };

        match client.get_event(calendar_id, event_id).await {
            Ok(event) => Ok(Some(self.reader.read(&event, calendar_id, account_id)?)),
            Err(e) => {
                tracing::warn!("Failed to retrieve event {}: {}", event_id, e);
                Ok(None)
            }
        }
    }

    pub async fn create_event(&self, form: &EventForm) -> Result<NormalizedEvent, SyncError> {
        let client = self.accounts.client_for(&form.account_id)?;
        let payload = self.writer.to_create_payload(form)?;
        tracing::debug!("Create payload: {:?}", payload);

        let created = client.create_event(&form.calendar_id, &payload).await?;
        tracing::info!("Created event {} in calendar {}", created.id, form.calendar_id);

        self.saved(self.reader.read(&created, &form.calendar_id, &form.account_id)?)
    }

    pub async fn update_event(&self, form: &EventForm) -> Result<NormalizedEvent, SyncError> {
        let event_id = form.id.as_deref().ok_or(SyncError::MissingEventId)?;
        let client = self.accounts.client_for(&form.account_id)?;
        let payload = self.writer.to_update_payload(form)?;
        tracing::debug!("Update payload: {:?}", payload);

        let updated = client
            .update_event(&form.calendar_id, event_id, &payload)
            .await?;
        tracing::info!("Updated event {} in calendar {}", updated.id, form.calendar_id);

        self.saved(self.reader.read(&updated, &form.calendar_id, &form.account_id)?)
    }

    pub async fn delete_event(
        &self,
        account_id: &str,
        calendar_id: &str,
        event_id: &str,
    ) -> Result<(), SyncError> {
        let client = self.accounts.client_for(account_id)?;
        tracing::info!("Deleting event {} from calendar {}", event_id, calendar_id);
        client.delete_event(calendar_id, event_id).await?;
        Ok(())
    }

    async fn fetch_calendars(
        &self,
        client: &dyn GraphApi,
        account_id: &str,
    ) -> Result<Vec<NormalizedCalendar>, SyncError> {
        let calendars = client.list_calendars().await?;
        Ok(calendars
            .iter()
            .map(|calendar| calendar_mapper::to_normalized(calendar, account_id))
            .collect())
    }

    fn saved(&self, event: NormalizedEvent) -> Result<NormalizedEvent, SyncError> {
        if let Some(listener) = &self.listener {
            listener.event_saved(&event);
        }
        Ok(event)
    }
}
