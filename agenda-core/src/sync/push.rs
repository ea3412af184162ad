use crate::error::{AgendaError, AgendaResult};
use crate::event::Event;
use crate::identity::PartitionKey;
use crate::remote::{self, NewRemoteEvent, Remote};

use super::Ledger;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PushReport {
    pub synced: usize,
    /// Imported events, which are never exported back.
    pub skipped: usize,
}

impl Ledger {
    /// Export every non-imported event, then keep only the imported ones.
    ///
    /// Inserts run one at a time. The first failure aborts the push and the
    /// store is left exactly as it was; events inserted before the failure
    /// stay on the remote and are reported in the error.
    pub async fn push<R: Remote>(&self, key: &PartitionKey, remote: &R) -> AgendaResult<PushReport> {
        let _guard = self.lock(key).await?;

        let events = self.store.load(key);
        let mut report = PushReport::default();

        for event in &events {
            if event.imported_from_google {
                tracing::info!(title = %event.title, "skipping imported event");
                report.skipped += 1;
                continue;
            }

            let remote_id = self.export(remote, event, report.synced).await?;
            report.synced += 1;
            tracing::info!(title = %event.title, start = %event.starts_at(), remote_id = %remote_id, "synced event");
        }

        let remaining: Vec<Event> = events
            .into_iter()
            .filter(|e| e.imported_from_google)
            .collect();
        self.store.save(key, &remaining)?;

        tracing::info!(partition = %key, synced = report.synced, skipped = report.skipped, "push finished");
        Ok(report)
    }

    async fn export<R: Remote>(&self, remote: &R, event: &Event, synced_before: usize) -> AgendaResult<String> {
        let failed = |message: String| {
            tracing::error!(title = %event.title, start = %event.starts_at(), synced_before, error = %message, "push aborted");
            AgendaError::RemotePush {
                title: event.title.clone(),
                message,
                synced_before,
            }
        };

        let body = NewRemoteEvent::from_local(event, self.tz).map_err(|e| failed(e.to_string()))?;

        match remote::bounded(remote.insert(&body)).await {
            Ok(id) => Ok(id),
            Err(AgendaError::AuthRequired) => {
                tracing::error!(title = %event.title, synced_before, "push aborted, authentication required");
                Err(AgendaError::AuthRequired)
            }
            Err(e) => Err(failed(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::EventStore;
    use crate::store::tests::{event, guest_key};
    use crate::sync::testing::FakeRemote;
    use std::sync::Arc;
    use std::time::Duration;

    fn ledger(dir: &tempfile::TempDir) -> Ledger {
        Ledger::new(EventStore::new(dir.path()), chrono_tz::Europe::Warsaw)
    }

    fn imported(title: &str, date: &str, time: &str) -> Event {
        let mut e = event(title, date, time);
        e.imported_from_google = true;
        e
    }

    #[tokio::test]
    async fn test_push_syncs_fresh_and_keeps_imported() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ledger(&dir);
        let key = guest_key("aa");
        let kept = imported("Standup", "2025-06-10", "09:00");
        ledger
            .store()
            .save(&key, &[kept.clone(), event("Gym", "2025-06-10", "18:00")])
            .unwrap();
        let remote = FakeRemote::default();

        let report = ledger.push(&key, &remote).await.unwrap();

        assert_eq!(report, PushReport { synced: 1, skipped: 1 });
        assert_eq!(ledger.list(&key).await.unwrap(), vec![kept]);

        let inserted = remote.inserted();
        assert_eq!(inserted.len(), 1);
        assert_eq!(inserted[0].summary, "Gym");
        assert_eq!(inserted[0].time_zone, "Europe/Warsaw");
        assert_eq!(inserted[0].color_id, "1");
        assert_eq!((inserted[0].end - inserted[0].start).num_minutes(), 60);
    }

    #[tokio::test]
    async fn test_failed_insert_leaves_store_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ledger(&dir);
        let key = guest_key("aa");
        let before = vec![
            event("One", "2025-06-10", "08:00"),
            imported("Pulled", "2025-06-10", "09:00"),
            event("Two", "2025-06-10", "10:00"),
            event("Three", "2025-06-10", "11:00"),
        ];
        ledger.store().save(&key, &before).unwrap();
        let remote = FakeRemote {
            fail_insert_at: Some(1),
            ..Default::default()
        };

        let err = ledger.push(&key, &remote).await.unwrap_err();

        match err {
            AgendaError::RemotePush { title, synced_before, .. } => {
                assert_eq!(title, "Two");
                assert_eq!(synced_before, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(ledger.list(&key).await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_push_never_exports_imported_events() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ledger(&dir);
        let key = guest_key("aa");
        ledger
            .store()
            .save(&key, &[imported("A", "2025-06-10", "09:00"), imported("B", "2025-06-11", "09:00")])
            .unwrap();
        let remote = FakeRemote::default();

        let report = ledger.push(&key, &remote).await.unwrap();

        assert_eq!(report, PushReport { synced: 0, skipped: 2 });
        assert!(remote.inserted().is_empty());
        assert_eq!(ledger.list(&key).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_remaining_events_are_all_imported_after_push() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ledger(&dir);
        let key = guest_key("aa");
        ledger
            .store()
            .save(
                &key,
                &[
                    event("A", "2025-06-10", "09:00"),
                    imported("B", "2025-06-11", "09:00"),
                    event("C", "2025-06-12", "09:00"),
                ],
            )
            .unwrap();

        ledger.push(&key, &FakeRemote::default()).await.unwrap();

        assert!(ledger.list(&key).await.unwrap().iter().all(|e| e.imported_from_google));
    }

    #[tokio::test]
    async fn test_auth_required_is_not_wrapped() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ledger(&dir);
        let key = guest_key("aa");
        let before = vec![event("One", "2025-06-10", "08:00"), event("Two", "2025-06-10", "10:00")];
        ledger.store().save(&key, &before).unwrap();
        let remote = FakeRemote::failing_insert_at(0, || AgendaError::AuthRequired);

        let result = ledger.push(&key, &remote).await;

        assert!(matches!(result, Err(AgendaError::AuthRequired)));
        assert!(remote.inserted().is_empty());
        assert_eq!(ledger.list(&key).await.unwrap(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_insert_times_out_and_keeps_store() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ledger(&dir);
        let key = guest_key("aa");
        let before = vec![event("Gym", "2025-06-10", "18:00")];
        ledger.store().save(&key, &before).unwrap();
        let remote = FakeRemote::slow(Duration::from_secs(60));

        let err = ledger.push(&key, &remote).await.unwrap_err();

        match err {
            AgendaError::RemotePush { title, message, synced_before } => {
                assert_eq!(title, "Gym");
                assert_eq!(synced_before, 0);
                assert!(message.contains("timed out after 30s"), "{message}");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(ledger.list(&key).await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_push_exports_legacy_records_without_ids() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ledger(&dir);
        let key = guest_key("aa");
        std::fs::write(
            ledger.store().path(&key),
            r##"[
                {"title":"Gym","date":"2025-06-10","time":"18:00","duration":60,"color":"#4285f4"},
                {"title":"Standup","date":"2025-06-11","time":"09:00","duration":15,"color":"#4285f4","imported_from_google":true}
            ]"##,
        )
        .unwrap();
        let remote = FakeRemote::default();

        let report = ledger.push(&key, &remote).await.unwrap();

        assert_eq!(report, PushReport { synced: 1, skipped: 1 });
        assert_eq!(remote.inserted()[0].summary, "Gym");
        let remaining = ledger.list(&key).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].title, "Standup");
        assert!(!remaining[0].id.is_unassigned());
    }

    #[tokio::test]
    async fn test_create_from_another_process_waits_for_push() {
        let dir = tempfile::tempdir().unwrap();
        let key = guest_key("aa");
        // Two ledgers stand in for two `agenda` processes sharing one events dir
        let pushing = Arc::new(ledger(&dir));
        let creating = ledger(&dir);
        pushing
            .store()
            .save(&key, &[event("Gym", "2025-06-10", "18:00")])
            .unwrap();
        let remote = Arc::new(FakeRemote::slow(Duration::from_millis(200)));

        let push = {
            let pushing = pushing.clone();
            let remote = remote.clone();
            let key = key.clone();
            tokio::spawn(async move { pushing.push(&key, &*remote).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        creating
            .create(&key, crate::event::EventDraft {
                title: "Dentist".to_string(),
                date: "2025-06-12".to_string(),
                time: "09:00".to_string(),
                duration: 30,
                description: None,
                color: None,
            })
            .await
            .unwrap();
        let report = push.await.unwrap().unwrap();

        assert_eq!(report, PushReport { synced: 1, skipped: 0 });
        assert_eq!(remote.inserted().len(), 1);
        let titles: Vec<String> = creating
            .list(&key)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.title)
            .collect();
        assert_eq!(titles, vec!["Dentist".to_string()]);
    }
}
