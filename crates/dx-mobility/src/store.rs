//! The replicated store contract and its in-memory implementation.
//!
//! # Contract
//!
//! - Movement rows are keyed by `(session, resource)` and written with
//!   upsert semantics.  A missing row means `AT_BASE`.
//! - Every committed write is published on the change feed in commit order,
//!   so per-row write order is the same for every subscriber.
//! - [`MovementStore::finalize`] is the only conditional write: it applies
//!   only while the row is `MOVING` with the given epoch.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::{Mutex, broadcast};

use dx_core::{Epoch, IncidentId, ResourceId, SessionId};

use crate::feed::FEED_CAPACITY;
use crate::{
    ChangeEvent, ChangeFeed, ChangeKind, Incident, LogEntry, MovementRecord, MovementState,
    StoreError, StoreResult,
};

/// Result of a conditional finalization write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalizeOutcome {
    /// This call moved the row from `MOVING` to `DEPLOYED`.
    Applied,
    /// The row was no longer `MOVING` at the given epoch; nothing changed.
    Stale,
}

/// Port for the replicated row store.
#[async_trait]
pub trait MovementStore: Send + Sync {
    /// Insert or replace the movement row for `(record.session, record.resource)`.
    async fn upsert(&self, record: MovementRecord) -> StoreResult<()>;

    async fn get(
        &self,
        session:  &SessionId,
        resource: &ResourceId,
    ) -> StoreResult<Option<MovementRecord>>;

    /// Every movement row of `session`, ordered by resource.
    async fn list(&self, session: &SessionId) -> StoreResult<Vec<MovementRecord>>;

    /// Set `DEPLOYED` at the destination and clear motion, only if the row is
    /// `MOVING` with `epoch_start == epoch`.
    async fn finalize(
        &self,
        session:  &SessionId,
        resource: &ResourceId,
        epoch:    Epoch,
    ) -> StoreResult<FinalizeOutcome>;

    async fn insert_incident(&self, incident: Incident) -> StoreResult<()>;

    /// Mark an incident solved and return the updated row.
    async fn resolve_incident(&self, session: &SessionId, id: &IncidentId)
    -> StoreResult<Incident>;

    /// Incidents of `session` in creation order.
    async fn list_incidents(&self, session: &SessionId) -> StoreResult<Vec<Incident>>;

    async fn append_log(&self, entry: LogEntry) -> StoreResult<()>;

    /// Log entries of `session` in append order.
    async fn list_log(&self, session: &SessionId) -> StoreResult<Vec<LogEntry>>;

    /// Delete every movement row and incident of `session`.
    async fn reset_session(&self, session: &SessionId) -> StoreResult<()>;

    fn subscribe(&self, session: &SessionId) -> ChangeFeed;
}

// ── MemoryStore ───────────────────────────────────────────────────────────────

#[derive(Default)]
struct Tables {
    movements: BTreeMap<(SessionId, ResourceId), MovementRecord>,
    incidents: HashMap<(SessionId, IncidentId), Incident>,
    log:       Vec<LogEntry>,
}

/// Process-local store.  Clients share it through an `Arc`.
///
/// Events are published while the table lock is held, so feed order equals
/// commit order.
pub struct MemoryStore {
    tables: Mutex<Tables>,
    tx:     broadcast::Sender<ChangeEvent>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_capacity(FEED_CAPACITY)
    }

    /// `capacity` bounds how far a subscriber may fall behind before it
    /// observes a lag.
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tables: Mutex::new(Tables::default()), tx }
    }

    fn publish(&self, event: ChangeEvent) {
        // No subscribers is not an error.
        let _ = self.tx.send(event);
    }
}

#[async_trait]
impl MovementStore for MemoryStore {
    async fn upsert(&self, record: MovementRecord) -> StoreResult<()> {
        let mut tables = self.tables.lock().await;
        let key = (record.session.clone(), record.resource.clone());
        let kind = match tables.movements.insert(key, record.clone()) {
            Some(_) => ChangeKind::Update,
            None => ChangeKind::Insert,
        };
        self.publish(ChangeEvent::movement(kind, record));
        Ok(())
    }

    async fn get(
        &self,
        session:  &SessionId,
        resource: &ResourceId,
    ) -> StoreResult<Option<MovementRecord>> {
        let tables = self.tables.lock().await;
        Ok(tables.movements.get(&(session.clone(), resource.clone())).cloned())
    }

    async fn list(&self, session: &SessionId) -> StoreResult<Vec<MovementRecord>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .movements
            .values()
            .filter(|r| &r.session == session)
            .cloned()
            .collect())
    }

    async fn finalize(
        &self,
        session:  &SessionId,
        resource: &ResourceId,
        epoch:    Epoch,
    ) -> StoreResult<FinalizeOutcome> {
        let mut tables = self.tables.lock().await;
        let Some(row) = tables.movements.get_mut(&(session.clone(), resource.clone())) else {
            return Ok(FinalizeOutcome::Stale);
        };
        let destination = match row.state {
            MovementState::Moving { motion, .. } if motion.epoch == epoch => motion.destination,
            _ => return Ok(FinalizeOutcome::Stale),
        };
        row.state = MovementState::Deployed { position: destination };
        let record = row.clone();
        self.publish(ChangeEvent::movement(ChangeKind::Update, record));
        Ok(FinalizeOutcome::Applied)
    }

    async fn insert_incident(&self, incident: Incident) -> StoreResult<()> {
        let mut tables = self.tables.lock().await;
        let key = (incident.session.clone(), incident.id.clone());
        if tables.incidents.contains_key(&key) {
            return Err(StoreError::DuplicateIncident(incident.id));
        }
        tables.incidents.insert(key, incident.clone());
        self.publish(ChangeEvent::incident(ChangeKind::Insert, incident));
        Ok(())
    }

    async fn resolve_incident(
        &self,
        session: &SessionId,
        id:      &IncidentId,
    ) -> StoreResult<Incident> {
        let mut tables = self.tables.lock().await;
        let Some(incident) = tables.incidents.get_mut(&(session.clone(), id.clone())) else {
            return Err(StoreError::IncidentNotFound(id.clone()));
        };
        incident.solved = true;
        let incident = incident.clone();
        self.publish(ChangeEvent::incident(ChangeKind::Update, incident.clone()));
        Ok(incident)
    }

    async fn list_incidents(&self, session: &SessionId) -> StoreResult<Vec<Incident>> {
        let tables = self.tables.lock().await;
        let mut out: Vec<Incident> = tables
            .incidents
            .values()
            .filter(|i| &i.session == session)
            .cloned()
            .collect();
        out.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(out)
    }

    async fn append_log(&self, entry: LogEntry) -> StoreResult<()> {
        let mut tables = self.tables.lock().await;
        tables.log.push(entry.clone());
        self.publish(ChangeEvent::log(entry));
        Ok(())
    }

    async fn list_log(&self, session: &SessionId) -> StoreResult<Vec<LogEntry>> {
        let tables = self.tables.lock().await;
        Ok(tables.log.iter().filter(|e| &e.session == session).cloned().collect())
    }

    async fn reset_session(&self, session: &SessionId) -> StoreResult<()> {
        let mut tables = self.tables.lock().await;

        let movement_keys: Vec<_> = tables
            .movements
            .keys()
            .filter(|(s, _)| s == session)
            .cloned()
            .collect();
        for key in movement_keys {
            if let Some(record) = tables.movements.remove(&key) {
                self.publish(ChangeEvent::movement(ChangeKind::Delete, record));
            }
        }

        let incident_keys: Vec<_> = tables
            .incidents
            .keys()
            .filter(|(s, _)| s == session)
            .cloned()
            .collect();
        for key in incident_keys {
            if let Some(incident) = tables.incidents.remove(&key) {
                self.publish(ChangeEvent::incident(ChangeKind::Delete, incident));
            }
        }
        Ok(())
    }

    fn subscribe(&self, session: &SessionId) -> ChangeFeed {
        ChangeFeed::new(self.tx.subscribe(), session.clone())
    }
}

// Shared stores are used through `Arc` by every client task.
#[async_trait]
impl<S: MovementStore + ?Sized> MovementStore for std::sync::Arc<S> {
    async fn upsert(&self, record: MovementRecord) -> StoreResult<()> {
        (**self).upsert(record).await
    }

    async fn get(
        &self,
        session:  &SessionId,
        resource: &ResourceId,
    ) -> StoreResult<Option<MovementRecord>> {
        (**self).get(session, resource).await
    }

    async fn list(&self, session: &SessionId) -> StoreResult<Vec<MovementRecord>> {
        (**self).list(session).await
    }

    async fn finalize(
        &self,
        session:  &SessionId,
        resource: &ResourceId,
        epoch:    Epoch,
    ) -> StoreResult<FinalizeOutcome> {
        (**self).finalize(session, resource, epoch).await
    }

    async fn insert_incident(&self, incident: Incident) -> StoreResult<()> {
        (**self).insert_incident(incident).await
    }

    async fn resolve_incident(
        &self,
        session: &SessionId,
        id:      &IncidentId,
    ) -> StoreResult<Incident> {
        (**self).resolve_incident(session, id).await
    }

    async fn list_incidents(&self, session: &SessionId) -> StoreResult<Vec<Incident>> {
        (**self).list_incidents(session).await
    }

    async fn append_log(&self, entry: LogEntry) -> StoreResult<()> {
        (**self).append_log(entry).await
    }

    async fn list_log(&self, session: &SessionId) -> StoreResult<Vec<LogEntry>> {
        (**self).list_log(session).await
    }

    async fn reset_session(&self, session: &SessionId) -> StoreResult<()> {
        (**self).reset_session(session).await
    }

    fn subscribe(&self, session: &SessionId) -> ChangeFeed {
        (**self).subscribe(session)
    }
}
