//! In-memory remote calendar for reconciliation tests.

use std::sync::Mutex;
use std::time::Duration;

use crate::error::{AgendaError, AgendaResult};
use crate::remote::{NewRemoteEvent, Remote, RemoteEvent, RemoteTime, Window};

#[derive(Default)]
pub(crate) struct FakeRemote {
    pub events: Vec<RemoteEvent>,
    pub inserted: Mutex<Vec<NewRemoteEvent>>,
    /// Zero-based insert attempt that fails.
    pub fail_insert_at: Option<usize>,
    /// Error returned by the failing insert; a 503 when unset.
    pub insert_error: Option<fn() -> AgendaError>,
    /// Latency of every insert.
    pub insert_delay: Option<Duration>,
    pub list_error: Option<fn() -> AgendaError>,
    pub attempts: Mutex<usize>,
}

impl FakeRemote {
    pub fn with_events(events: Vec<RemoteEvent>) -> Self {
        FakeRemote {
            events,
            ..Default::default()
        }
    }

    pub fn failing_insert_at(attempt: usize, error: fn() -> AgendaError) -> Self {
        FakeRemote {
            fail_insert_at: Some(attempt),
            insert_error: Some(error),
            ..Default::default()
        }
    }

    pub fn slow(delay: Duration) -> Self {
        FakeRemote {
            insert_delay: Some(delay),
            ..Default::default()
        }
    }

    pub fn inserted(&self) -> Vec<NewRemoteEvent> {
        self.inserted.lock().unwrap().clone()
    }
}

impl Remote for FakeRemote {
    async fn list(&self, _window: Window) -> AgendaResult<Vec<RemoteEvent>> {
        match self.list_error {
            Some(err) => Err(err()),
            None => Ok(self.events.clone()),
        }
    }

    async fn insert(&self, event: &NewRemoteEvent) -> AgendaResult<String> {
        if let Some(delay) = self.insert_delay {
            tokio::time::sleep(delay).await;
        }

        let attempt = {
            let mut attempts = self.attempts.lock().unwrap();
            let current = *attempts;
            *attempts += 1;
            current
        };

        if self.fail_insert_at == Some(attempt) {
            return Err(match self.insert_error {
                Some(err) => err(),
                None => AgendaError::RemoteFetch("backend error 503".to_string()),
            });
        }

        let mut inserted = self.inserted.lock().unwrap();
        inserted.push(event.clone());
        Ok(format!("remote-{}", inserted.len()))
    }
}

pub(crate) fn timed(title: &str, start: &str, minutes: i64) -> RemoteEvent {
    let start: chrono::DateTime<chrono::Utc> = start.parse().unwrap();
    RemoteEvent {
        id: format!("g-{title}"),
        title: title.to_string(),
        description: None,
        start: RemoteTime::DateTime(start),
        end: RemoteTime::DateTime(start + chrono::Duration::minutes(minutes)),
        color_id: None,
    }
}
