//! Remote calendar contract and conversion into the local schema.
//!
//! A [`Remote`] lists a forward-looking window of single occurrences and
//! inserts new events. Providers convert their API types into
//! [`RemoteEvent`]; everything after that is provider-neutral.

use std::future::Future;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::color;
use crate::error::{AgendaError, AgendaResult};
use crate::event::{ALL_DAY_MINUTES, Event, EventId};

/// Upper bound on a single remote request.
pub const REMOTE_TIMEOUT: StdDuration = StdDuration::from_secs(30);

/// Maximum number of events requested per window.
pub const MAX_RESULTS: usize = 100;

/// Title given to remote events that have none.
pub const UNTITLED: &str = "(No title)";

/// Start or end of a remote event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RemoteTime {
    DateTime(DateTime<Utc>),
    Date(NaiveDate),
}

/// An event as read from the remote calendar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteEvent {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub start: RemoteTime,
    pub end: RemoteTime,
    pub color_id: Option<String>,
}

/// The body of a remote insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRemoteEvent {
    pub summary: String,
    pub description: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub time_zone: String,
    pub color_id: String,
}

/// A `[from, to)` listing window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub max_results: usize,
}

impl Window {
    /// The next `days` days starting now.
    pub fn ahead(days: i64) -> AgendaResult<Self> {
        Self::ahead_from(Utc::now(), days)
    }

    /// Fails for a non-positive span or one past the end of the calendar.
    pub fn ahead_from(now: DateTime<Utc>, days: i64) -> AgendaResult<Self> {
        let to = Duration::try_days(days)
            .filter(|_| days > 0)
            .and_then(|span| now.checked_add_signed(span))
            .ok_or_else(|| AgendaError::Config(format!("Cannot list {days} days ahead")))?;

        Ok(Window {
            from: now,
            to,
            max_results: MAX_RESULTS,
        })
    }
}

/// A remote calendar account.
pub trait Remote {
    /// List single occurrences in `window`, ordered by start time.
    fn list(&self, window: Window) -> impl Future<Output = AgendaResult<Vec<RemoteEvent>>> + Send;

    /// Insert an event and return the id the remote assigned.
    fn insert(&self, event: &NewRemoteEvent) -> impl Future<Output = AgendaResult<String>> + Send;
}

/// Run a remote request under [`REMOTE_TIMEOUT`].
pub async fn bounded<T>(request: impl Future<Output = AgendaResult<T>>) -> AgendaResult<T> {
    tokio::time::timeout(REMOTE_TIMEOUT, request)
        .await
        .map_err(|_| AgendaError::RemoteTimeout(REMOTE_TIMEOUT.as_secs()))?
}

/// Fetch the next `days` days, failing loudly.
pub async fn fetch_window<R: Remote>(remote: &R, days: i64) -> AgendaResult<Vec<RemoteEvent>> {
    let window = Window::ahead(days)?;
    let mut events = bounded(remote.list(window)).await?;
    events.truncate(window.max_results);
    Ok(events)
}

/// Outcome of a best-effort fetch.
///
/// `failure` separates "nothing scheduled" from "could not ask".
#[derive(Debug, Default)]
pub struct RemoteWindow {
    pub events: Vec<RemoteEvent>,
    pub failure: Option<String>,
}

impl RemoteWindow {
    pub fn is_degraded(&self) -> bool {
        self.failure.is_some()
    }
}

/// Fetch the next `days` days for context or display, degrading to empty.
pub async fn fetch_window_or_empty<R: Remote>(remote: Option<&R>, days: i64) -> RemoteWindow {
    let Some(remote) = remote else {
        return RemoteWindow::default();
    };

    match fetch_window(remote, days).await {
        Ok(events) => RemoteWindow {
            events,
            failure: None,
        },
        Err(e) => {
            tracing::warn!(operation = "list", days, error = %e, "remote fetch failed, continuing without remote events");
            RemoteWindow {
                events: Vec::new(),
                failure: Some(e.to_string()),
            }
        }
    }
}

impl RemoteEvent {
    /// Convert into the local schema as an imported event.
    ///
    /// Timed events are read in `tz`; all-day events start at 00:00 and last
    /// a full day. Returns `None` for records whose start and end mix a date
    /// with a date-time.
    pub fn to_local(&self, tz: Tz) -> Option<Event> {
        let (date, time, duration) = match (&self.start, &self.end) {
            (RemoteTime::DateTime(start), RemoteTime::DateTime(end)) => {
                let local = start.with_timezone(&tz).naive_local();
                let minutes = (*end - *start).num_minutes();
                let duration = u32::try_from(minutes).ok().filter(|m| *m > 0)?;
                let time = NaiveTime::from_hms_opt(local.hour(), local.minute(), 0)?;
                (local.date(), time, duration)
            }
            (RemoteTime::Date(start), RemoteTime::Date(_)) => {
                (*start, NaiveTime::from_hms_opt(0, 0, 0)?, ALL_DAY_MINUTES)
            }
            _ => return None,
        };

        Some(Event {
            id: EventId::new(),
            title: if self.title.trim().is_empty() {
                UNTITLED.to_string()
            } else {
                self.title.clone()
            },
            date,
            time,
            duration,
            description: self.description.clone().filter(|d| !d.is_empty()),
            color: self
                .color_id
                .as_deref()
                .map(color::to_local_hex)
                .unwrap_or(color::DEFAULT_HEX)
                .to_string(),
            imported_from_google: true,
        })
    }

    /// One-line summary used in advisor context and listings.
    pub fn describe(&self) -> String {
        format!("{} to {} - {}", fmt_time(&self.start), fmt_time(&self.end), self.title)
    }
}

fn fmt_time(time: &RemoteTime) -> String {
    match time {
        RemoteTime::DateTime(dt) => dt.to_rfc3339(),
        RemoteTime::Date(d) => d.format("%Y-%m-%d").to_string(),
    }
}

impl NewRemoteEvent {
    /// Build the insert body for a local event, reading its wall-clock time in `tz`.
    pub fn from_local(event: &Event, tz: Tz) -> AgendaResult<Self> {
        let start = localize(event.starts_at(), tz).ok_or_else(|| {
            AgendaError::InvalidEvent(format!(
                "'{}' starts at a time that does not exist in {}",
                event.title,
                tz.name()
            ))
        })?;
        let end = start + Duration::minutes(i64::from(event.duration));

        Ok(NewRemoteEvent {
            summary: event.title.clone(),
            description: event.description.clone().unwrap_or_default(),
            start,
            end,
            time_zone: tz.name().to_string(),
            color_id: color::to_remote_id(&event.color).to_string(),
        })
    }
}

/// Resolve a wall-clock time in `tz`, taking the earlier instant when ambiguous.
fn localize(naive: NaiveDateTime, tz: Tz) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}
