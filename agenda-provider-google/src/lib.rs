//! Google Calendar backend for agenda.
//!
//! [`GoogleCalendar`] implements the remote contract on top of the
//! `google-calendar` client. The [`auth`] module runs the OAuth flow that
//! produces the [`Credentials`] it is built from.

pub mod auth;
mod convert;

use agenda_core::credentials::Credentials;
use agenda_core::error::{AgendaError, AgendaResult};
use agenda_core::remote::{NewRemoteEvent, Remote, RemoteEvent, Window};
use google_calendar::Client;
use google_calendar::types::{OrderBy, SendUpdates};

use crate::convert::{FromGoogle, ToGoogle};

pub struct GoogleCalendar {
    client: Client,
    calendar_id: String,
}

impl GoogleCalendar {
    pub fn new(credentials: &Credentials, calendar_id: &str) -> Self {
        GoogleCalendar {
            client: auth::client(credentials),
            calendar_id: calendar_id.to_string(),
        }
    }
}

impl Remote for GoogleCalendar {
    async fn list(&self, window: Window) -> AgendaResult<Vec<RemoteEvent>> {
        let time_min = window.from.to_rfc3339();
        let time_max = window.to.to_rfc3339();

        let response = self
            .client
            .events()
            .list_all(
                &self.calendar_id,
                "",
                0,
                OrderBy::StartTime,
                &[],
                "", // search query
                &[],
                false,
                false,
                true, // expand recurring events into single occurrences
                &time_max,
                &time_min,
                "",
                "",
            )
            .await
            .map_err(|e| classify(e.to_string()))?;

        let mut events = Vec::new();
        for event in response.body {
            if event.status == "cancelled" {
                continue;
            }
            match RemoteEvent::from_google(event) {
                Ok(event) => events.push(event),
                Err(e) => tracing::warn!(calendar = %self.calendar_id, error = %e, "skipping unreadable Google event"),
            }
            if events.len() == window.max_results {
                break;
            }
        }

        Ok(events)
    }

    async fn insert(&self, event: &NewRemoteEvent) -> AgendaResult<String> {
        let response = self
            .client
            .events()
            .insert(
                &self.calendar_id,
                0,
                0,
                false,
                SendUpdates::None,
                false,
                &event.to_google(),
            )
            .await
            .map_err(|e| classify(e.to_string()))?;

        Ok(response.body.id)
    }
}

/// Map a Google client error onto the agenda taxonomy.
fn classify(message: String) -> AgendaError {
    if is_auth_failure(&message) {
        AgendaError::AuthRequired
    } else {
        AgendaError::RemoteFetch(message)
    }
}

fn is_auth_failure(message: &str) -> bool {
    ["401", "Unauthorized", "UNAUTHENTICATED", "invalid_grant"]
        .iter()
        .any(|marker| message.contains(marker))
}
