//! Session-filtered change notifications.
//!
//! Stores publish every committed write on one `tokio::sync::broadcast`
//! channel, in commit order.  A [`ChangeFeed`] is a receiver that skips
//! events from other sessions.

use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};

use dx_core::SessionId;

use crate::{FeedError, Incident, LogEntry, MovementRecord};

/// Default broadcast capacity used by the bundled stores.
pub const FEED_CAPACITY: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// The row a change refers to.  For deletes it is the row as it was before
/// removal.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeRow {
    Movement(MovementRecord),
    Incident(Incident),
    Log(LogEntry),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    pub session: SessionId,
    pub kind:    ChangeKind,
    pub row:     ChangeRow,
}

impl ChangeEvent {
    pub fn movement(kind: ChangeKind, record: MovementRecord) -> Self {
        Self { session: record.session.clone(), kind, row: ChangeRow::Movement(record) }
    }

    pub fn incident(kind: ChangeKind, incident: Incident) -> Self {
        Self { session: incident.session.clone(), kind, row: ChangeRow::Incident(incident) }
    }

    pub fn log(entry: LogEntry) -> Self {
        Self { session: entry.session.clone(), kind: ChangeKind::Insert, row: ChangeRow::Log(entry) }
    }
}

/// Receiving half of a store's change stream, scoped to one session.
pub struct ChangeFeed {
    rx:      broadcast::Receiver<ChangeEvent>,
    session: SessionId,
}

impl ChangeFeed {
    pub fn new(rx: broadcast::Receiver<ChangeEvent>, session: SessionId) -> Self {
        Self { rx, session }
    }

    pub fn session(&self) -> &SessionId {
        &self.session
    }

    /// Next event for this session without waiting.  `Ok(None)` when the
    /// channel is currently empty.
    pub fn try_recv(&mut self) -> Result<Option<ChangeEvent>, FeedError> {
        loop {
            match self.rx.try_recv() {
                Ok(event) if event.session == self.session => return Ok(Some(event)),
                Ok(_) => continue,
                Err(TryRecvError::Empty) => return Ok(None),
                Err(TryRecvError::Lagged(n)) => return Err(FeedError::Lagged(n)),
                Err(TryRecvError::Closed) => return Err(FeedError::Closed),
            }
        }
    }

    /// Wait for the next event for this session.
    pub async fn recv(&mut self) -> Result<ChangeEvent, FeedError> {
        loop {
            match self.rx.recv().await {
                Ok(event) if event.session == self.session => return Ok(event),
                Ok(_) => continue,
                Err(RecvError::Lagged(n)) => return Err(FeedError::Lagged(n)),
                Err(RecvError::Closed) => return Err(FeedError::Closed),
            }
        }
    }
}
