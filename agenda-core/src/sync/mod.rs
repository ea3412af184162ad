//! Reconciliation between the local event store and a remote calendar.
//!
//! [`Ledger`] owns the store and serializes every load-modify-save cycle per
//! partition key, so a pull and a push for the same user never interleave,
//! whether they run in one process or in two.

mod locks;
mod pull;
mod push;

#[cfg(test)]
pub(crate) mod testing;

use chrono_tz::Tz;

pub use locks::{PartitionGuard, PartitionLocks};
pub use pull::{PULL_DAYS, PullReport};
pub use push::PushReport;

use crate::error::{AgendaError, AgendaResult};
use crate::event::{Event, EventDraft, EventId};
use crate::identity::PartitionKey;
use crate::store::EventStore;

pub struct Ledger {
    store: EventStore,
    tz: Tz,
    locks: PartitionLocks,
}

impl Ledger {
    pub fn new(store: EventStore, tz: Tz) -> Self {
        Ledger {
            store,
            tz,
            locks: PartitionLocks::default(),
        }
    }

    pub fn store(&self) -> &EventStore {
        &self.store
    }

    pub fn time_zone(&self) -> Tz {
        self.tz
    }

    pub(crate) async fn lock(&self, key: &PartitionKey) -> AgendaResult<PartitionGuard> {
        self.locks.lock(self.store.dir(), key).await
    }

    pub async fn list(&self, key: &PartitionKey) -> AgendaResult<Vec<Event>> {
        let _guard = self.lock(key).await?;
        Ok(self.store.load(key))
    }

    /// Validate and append a new event.
    pub async fn create(&self, key: &PartitionKey, draft: EventDraft) -> AgendaResult<Event> {
        let event = draft.into_event()?;

        let _guard = self.lock(key).await?;
        let mut events = self.store.load(key);
        events.push(event.clone());
        self.store.save(key, &events)?;

        tracing::info!(partition = %key, title = %event.title, id = %event.id, "created event");
        Ok(event)
    }

    /// Remove the event with `id`, returning it.
    pub async fn delete(&self, key: &PartitionKey, id: EventId) -> AgendaResult<Event> {
        let _guard = self.lock(key).await?;
        let mut events = self.store.load(key);

        let index = events
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| AgendaError::EventNotFound(id.to_string()))?;
        let removed = events.remove(index);
        self.store.save(key, &events)?;

        tracing::info!(partition = %key, title = %removed.title, id = %id, "deleted event");
        Ok(removed)
    }

    /// Drop a partition entirely (guest logout).
    pub async fn discard(&self, key: &PartitionKey) -> AgendaResult<()> {
        let _guard = self.lock(key).await?;
        self.store.remove(key)
    }
}
