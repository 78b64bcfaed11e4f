use async_trait::async_trait;

use dx_core::{Epoch, IncidentId, ResourceId, SessionId};

use crate::{
    ChangeFeed, FinalizeOutcome, Incident, LogEntry, MemoryStore, MovementRecord, MovementStore,
    StoreError, StoreResult,
};

#[derive(Clone, Copy, Default)]
pub(crate) struct FailureFlags {
    pub upsert:     bool,
    pub finalize:   bool,
    pub append_log: bool,
}

// Memory store whose writes can be made to fail per operation.
pub(crate) struct FlakyStore {
    inner:    MemoryStore,
    failures: FailureFlags,
}

impl FlakyStore {
    pub(crate) fn new() -> Self {
        Self { inner: MemoryStore::new(), failures: FailureFlags::default() }
    }

    pub(crate) fn with_failures(mut self, failures: FailureFlags) -> Self {
        self.failures = failures;
        self
    }
}

#[async_trait]
impl MovementStore for FlakyStore {
    async fn upsert(&self, record: MovementRecord) -> StoreResult<()> {
        if self.failures.upsert {
            return Err(StoreError::Backend("upsert failed".to_string()));
        }
        self.inner.upsert(record).await
    }

    async fn get(
        &self,
        session:  &SessionId,
        resource: &ResourceId,
    ) -> StoreResult<Option<MovementRecord>> {
        self.inner.get(session, resource).await
    }

    async fn list(&self, session: &SessionId) -> StoreResult<Vec<MovementRecord>> {
        self.inner.list(session).await
    }

    async fn finalize(
        &self,
        session:  &SessionId,
        resource: &ResourceId,
        epoch:    Epoch,
    ) -> StoreResult<FinalizeOutcome> {
        if self.failures.finalize {
            return Err(StoreError::Backend("finalize failed".to_string()));
        }
        self.inner.finalize(session, resource, epoch).await
    }

    async fn insert_incident(&self, incident: Incident) -> StoreResult<()> {
        self.inner.insert_incident(incident).await
    }

    async fn resolve_incident(
        &self,
        session: &SessionId,
        id:      &IncidentId,
    ) -> StoreResult<Incident> {
        self.inner.resolve_incident(session, id).await
    }

    async fn list_incidents(&self, session: &SessionId) -> StoreResult<Vec<Incident>> {
        self.inner.list_incidents(session).await
    }

    async fn append_log(&self, entry: LogEntry) -> StoreResult<()> {
        if self.failures.append_log {
            return Err(StoreError::Backend("append failed".to_string()));
        }
        self.inner.append_log(entry).await
    }

    async fn list_log(&self, session: &SessionId) -> StoreResult<Vec<LogEntry>> {
        self.inner.list_log(session).await
    }

    async fn reset_session(&self, session: &SessionId) -> StoreResult<()> {
        self.inner.reset_session(session).await
    }

    fn subscribe(&self, session: &SessionId) -> ChangeFeed {
        self.inner.subscribe(session)
    }
}
