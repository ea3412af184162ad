use crate::error::AgendaResult;
use crate::identity::PartitionKey;
use crate::remote::{self, Remote};

use super::Ledger;

/// How far ahead a pull imports.
pub const PULL_DAYS: i64 = 90;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PullReport {
    pub imported: usize,
    pub duplicates: usize,
    /// Remote records that could not be converted and were skipped.
    pub malformed: usize,
}

impl Ledger {
    /// Import the next [`PULL_DAYS`] of remote events into the partition.
    ///
    /// A remote event is skipped when a local event already has exactly the
    /// same title, date and time. The merged list is saved once at the end.
    pub async fn pull<R: Remote>(&self, key: &PartitionKey, remote: &R) -> AgendaResult<PullReport> {
        let _guard = self.lock(key).await?;

        let remote_events = remote::fetch_window(remote, PULL_DAYS).await?;
        let mut events = self.store.load(key);
        let mut report = PullReport::default();

        for remote_event in &remote_events {
            let Some(candidate) = remote_event.to_local(self.tz) else {
                tracing::warn!(remote_id = %remote_event.id, title = %remote_event.title, "skipping remote event with unusable start/end");
                report.malformed += 1;
                continue;
            };

            if events.iter().any(|e| e.same_slot(&candidate)) {
                report.duplicates += 1;
                continue;
            }

            events.push(candidate);
            report.imported += 1;
        }

        self.store.save(key, &events)?;

        tracing::info!(
            partition = %key,
            imported = report.imported,
            duplicates = report.duplicates,
            malformed = report.malformed,
            "pull finished"
        );
        Ok(report)
    }
}
