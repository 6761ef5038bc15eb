//! Activity calendar: events are fetched fresh after every write, there is
//! no local cache.

use crate::client::{decode, RemoteClient};
use crate::directory::Confirmation;
use crate::errors::{ApiError, ApiResult};
use crate::models::{CalendarEvent, EventPayload, FieldErrors};
use chrono::NaiveDate;
use reqwest::Method;
use tracing::info;

pub const EVENTS_PATH: &str = "/api/calendario/events/";

pub fn event_path(id: u64) -> String {
    format!("{EVENTS_PATH}{id}/")
}

/// Backend start value for a calendar day. Noon UTC keeps the day stable
/// in every timezone.
pub fn format_for_backend(date: NaiveDate) -> String {
    format!("{}T12:00:00Z", date.format("%Y-%m-%d"))
}

/// Calendar day of a backend start value, read from its date part without
/// any timezone conversion.
pub fn date_from_backend(raw: &str) -> Option<NaiveDate> {
    let date_part = raw.trim().split('T').next()?;
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDraft {
    pub title: String,
    pub description: String,
    pub date: NaiveDate,
}

impl EventDraft {
    fn into_payload(self) -> ApiResult<EventPayload> {
        if self.title.trim().is_empty() {
            return Err(ApiError::ValidationFailed(FieldErrors::single("title", "is required")));
        }
        Ok(EventPayload {
            title: self.title.trim().to_string(),
            description: self.description,
            start: format_for_backend(self.date),
            end: None,
        })
    }
}

pub struct CalendarClient {
    client: RemoteClient,
}

impl CalendarClient {
    pub fn new(client: RemoteClient) -> Self {
        Self { client }
    }

    /// Events sorted by day, then title.
    pub async fn list(&self) -> ApiResult<Vec<CalendarEvent>> {
        let mut events: Vec<CalendarEvent> = decode(self.client.get(EVENTS_PATH).await?)?;
        events.sort_by(|a, b| {
            date_from_backend(&a.start)
                .cmp(&date_from_backend(&b.start))
                .then_with(|| a.title.cmp(&b.title))
        });
        Ok(events)
    }

    pub async fn create(&self, draft: EventDraft) -> ApiResult<()> {
        let payload = draft.into_payload()?;
        self.client.send(Method::POST, EVENTS_PATH, Some(&payload)).await?;
        info!(title = %payload.title, "calendar event created");
        Ok(())
    }

    pub async fn update(&self, id: u64, draft: EventDraft) -> ApiResult<()> {
        let payload = draft.into_payload()?;
        self.client.send(Method::PUT, &event_path(id), Some(&payload)).await?;
        info!(id, "calendar event updated");
        Ok(())
    }

    pub async fn delete(&self, id: u64, confirmation: Confirmation) -> ApiResult<bool> {
        if confirmation == Confirmation::Declined {
            return Ok(false);
        }
        self.client.send::<()>(Method::DELETE, &event_path(id), None).await?;
        info!(id, "calendar event deleted");
        Ok(true)
    }
}
