//! Conversions between Google API types and agenda's remote types.

use agenda_core::remote::{NewRemoteEvent, RemoteEvent, RemoteTime};
use anyhow::{Result, bail};
use google_calendar::types::EventDateTime;

/// Convert from Google API types to agenda types
pub trait FromGoogle<T> {
    fn from_google(value: T) -> Result<Self>
    where
        Self: Sized;
}

/// Convert to Google API types from agenda types
pub trait ToGoogle<T> {
    fn to_google(&self) -> T;
}

impl FromGoogle<google_calendar::types::Event> for RemoteEvent {
    fn from_google(event: google_calendar::types::Event) -> Result<Self> {
        let Some(start) = event.start.as_ref().and_then(remote_time) else {
            bail!("Event {} has no start time", event.id);
        };
        let Some(end) = event.end.as_ref().and_then(remote_time) else {
            bail!("Event {} has no end time", event.id);
        };

        Ok(RemoteEvent {
            id: event.id,
            title: event.summary,
            description: if event.description.is_empty() {
                None
            } else {
                Some(event.description)
            },
            start,
            end,
            color_id: if event.color_id.is_empty() {
                None
            } else {
                Some(event.color_id)
            },
        })
    }
}

fn remote_time(time: &EventDateTime) -> Option<RemoteTime> {
    if let Some(dt) = time.date_time {
        Some(RemoteTime::DateTime(dt))
    } else {
        time.date.map(RemoteTime::Date)
    }
}

impl ToGoogle<google_calendar::types::Event> for NewRemoteEvent {
    fn to_google(&self) -> google_calendar::types::Event {
        google_calendar::types::Event {
            summary: self.summary.clone(),
            description: self.description.clone(),
            start: Some(EventDateTime {
                date: None,
                date_time: Some(self.start),
                time_zone: self.time_zone.clone(),
            }),
            end: Some(EventDateTime {
                date: None,
                date_time: Some(self.end),
                time_zone: self.time_zone.clone(),
            }),
            color_id: self.color_id.clone(),
            ..Default::default()
        }
    }
}
