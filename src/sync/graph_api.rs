use crate::sync::graph_model::{
    EventWritePayload, GraphCalendar, GraphCategory, GraphEvent, GraphListResponse, NewCalendar,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

pub const DEFAULT_GRAPH_BASE_URL: &str = "https://graph.microsoft.com/v1.0";

/// Graph returns at most this many events per calendar listing.
pub const EVENT_PAGE_SIZE: u32 = 100;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("Request error: {0}")]
    RequestError(String),
    #[error("Resource not found: {0}")]
    NotFound(String),
    #[error("Rate limit exceeded")]
    RateLimited,
    #[error("Authentication failed")]
    AuthenticationFailed,
    #[error("Parse error: {0}")]
    ParseError(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// OData filter selecting events that start within the range, both days included.
    pub fn start_filter(&self) -> String {
        format!(
            "start/dateTime ge '{}T00:00:00' and start/dateTime le '{}T23:59:59'",
            self.start.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d"),
        )
    }
}

#[async_trait]
pub trait GraphApi: Send + Sync {
    async fn list_calendars(&self) -> Result<Vec<GraphCalendar>, ApiError>;

    async fn create_calendar(&self, name: &str) -> Result<GraphCalendar, ApiError>;

    async fn delete_calendar(&self, calendar_id: &str) -> Result<(), ApiError>;

    async fn list_master_categories(&self) -> Result<Vec<GraphCategory>, ApiError>;

    async fn list_events(
        &self,
        calendar_id: &str,
        date_range: DateRange,
    ) -> Result<Vec<GraphEvent>, ApiError>;

    async fn get_event(&self, calendar_id: &str, event_id: &str) -> Result<GraphEvent, ApiError>;

    async fn create_event(
        &self,
        calendar_id: &str,
        payload: &EventWritePayload,
    ) -> Result<GraphEvent, ApiError>;

    async fn update_event(
        &self,
        calendar_id: &str,
        event_id: &str,
        payload: &EventWritePayload,
    ) -> Result<GraphEvent, ApiError>;

    async fn delete_event(&self, calendar_id: &str, event_id: &str) -> Result<(), ApiError>;
}

pub struct HttpGraphClient {
    base_url: String,
    access_token: String,
    client: reqwest::Client,
}

impl HttpGraphClient {
    pub fn new(access_token: String) -> Self {
        Self {
            base_url: DEFAULT_GRAPH_BASE_URL.to_string(),
            access_token,
            client: reqwest::Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn calendar_url(&self, calendar_id: &str) -> String {
        format!("{}/me/calendars/{}", self.base_url, urlencoding::encode(calendar_id))
    }

    fn event_url(&self, calendar_id: &str, event_id: &str) -> String {
        format!(
            "{}/events/{}",
            self.calendar_url(calendar_id),
            urlencoding::encode(event_id)
        )
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        tracing::debug!("{} {}", method, url);
        self.client
            .request(method, url)
            .bearer_auth(&self.access_token)
            .header(reqwest::header::ACCEPT, "application/json")
    }

    async fn send(&self, request: RequestBuilder, resource: &str) -> Result<Response, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        tracing::info!("Graph response status for {}: {}", resource, status);

        if status == StatusCode::UNAUTHORIZED {
            tracing::error!("Authentication failed for {}", resource);
            return Err(ApiError::AuthenticationFailed);
        }

        if status == StatusCode::NOT_FOUND {
            tracing::error!("Resource not found: {}", resource);
            return Err(ApiError::NotFound(resource.to_string()));
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            tracing::warn!("Rate limit exceeded");
            return Err(ApiError::RateLimited);
        }

        if !status.is_success() {
            let body = response.text().await?;
            tracing::error!("Graph request for {} failed. Status: {}, Body: {}", resource, status, body);
            return Err(ApiError::RequestError(format!("Status {}: {}", status, body)));
        }

        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        resource: &str,
    ) -> Result<T, ApiError> {
        let response = self.send(request, resource).await?;
        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| ApiError::ParseError(format!("Invalid {} payload: {}", resource, e)))
    }

    async fn send_with_body<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        body: &B,
        resource: &str,
    ) -> Result<T, ApiError> {
        let request = self.request(method, url).json(body);
        self.send_json(request, resource).await
    }
}

#[async_trait]
impl GraphApi for HttpGraphClient {
    async fn list_calendars(&self) -> Result<Vec<GraphCalendar>, ApiError> {
        let url = format!("{}/me/calendars", self.base_url);
        let list: GraphListResponse<GraphCalendar> =
            self.send_json(self.request(Method::GET, &url), "calendars").await?;

        tracing::info!("Fetched {} calendars", list.value.len());
        Ok(list.value)
    }

    async fn create_calendar(&self, name: &str) -> Result<GraphCalendar, ApiError> {
        let url = format!("{}/me/calendars", self.base_url);
        let body = NewCalendar {
            name: name.to_string(),
        };

        tracing::info!("Creating calendar: {}", name);
        let calendar: GraphCalendar = self
            .send_with_body(Method::POST, &url, &body, "calendar")
            .await?;

        tracing::info!("Calendar created with ID: {}", calendar.id);
        Ok(calendar)
    }

    async fn delete_calendar(&self, calendar_id: &str) -> Result<(), ApiError> {
        let url = self.calendar_url(calendar_id);
        self.send(self.request(Method::DELETE, &url), calendar_id).await?;

        tracing::info!("Calendar {} deleted", calendar_id);
        Ok(())
    }

    async fn list_master_categories(&self) -> Result<Vec<GraphCategory>, ApiError> {
        let url = format!("{}/me/outlook/masterCategories", self.base_url);
        let list: GraphListResponse<GraphCategory> =
            self.send_json(self.request(Method::GET, &url), "masterCategories").await?;

        Ok(list.value)
    }

    async fn list_events(
        &self,
        calendar_id: &str,
        date_range: DateRange,
    ) -> Result<Vec<GraphEvent>, ApiError> {
        let url = format!("{}/events", self.calendar_url(calendar_id));
        let filter = date_range.start_filter();
        let top = EVENT_PAGE_SIZE.to_string();

        tracing::info!(
            "Fetching events of {} from {} to {}",
            calendar_id,
            date_range.start,
            date_range.end
        );

        let request = self.request(Method::GET, &url).query(&[
            ("$select", "*"),
            ("$filter", filter.as_str()),
            ("$orderby", "start/dateTime"),
            ("$top", top.as_str()),
        ]);
        let list: GraphListResponse<GraphEvent> = self.send_json(request, calendar_id).await?;

        tracing::info!("Fetched {} events from {}", list.value.len(), calendar_id);
        Ok(list.value)
    }

    async fn get_event(&self, calendar_id: &str, event_id: &str) -> Result<GraphEvent, ApiError> {
        let url = self.event_url(calendar_id, event_id);
        self.send_json(self.request(Method::GET, &url), event_id).await
    }

    async fn create_event(
        &self,
        calendar_id: &str,
        payload: &EventWritePayload,
    ) -> Result<GraphEvent, ApiError> {
        let url = format!("{}/events", self.calendar_url(calendar_id));
        tracing::debug!("POST {} with payload: {:?}", url, payload);

        let event: GraphEvent = self
            .send_with_body(Method::POST, &url, payload, "event")
            .await?;

        tracing::info!("Event created successfully with ID: {}", event.id);
        Ok(event)
    }

    async fn update_event(
        &self,
        calendar_id: &str,
        event_id: &str,
        payload: &EventWritePayload,
    ) -> Result<GraphEvent, ApiError> {
        let url = self.event_url(calendar_id, event_id);
        tracing::debug!("PATCH {} with payload: {:?}", url, payload);

        let event: GraphEvent = self
            .send_with_body(Method::PATCH, &url, payload, event_id)
            .await?;

        tracing::info!("Event {} updated successfully", event_id);
        Ok(event)
    }

    async fn delete_event(&self, calendar_id: &str, event_id: &str) -> Result<(), ApiError> {
        let url = self.event_url(calendar_id, event_id);
        self.send(self.request(Method::DELETE, &url), event_id).await?;

        tracing::info!("Event {} deleted", event_id);
        Ok(())
    }
}
