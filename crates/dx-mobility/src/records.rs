//! Incident and operations-log rows shared through the store.

use dx_core::{Epoch, GeoPoint, IncidentId, ResourceId, SessionId};
use uuid::Uuid;

use crate::{MobilityError, MobilityResult};

// ── Incident ──────────────────────────────────────────────────────────────────

/// A map-placed incident.  Created open, later marked solved.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Incident {
    pub id:         IncidentId,
    pub session:    SessionId,
    pub title:      String,
    pub position:   GeoPoint,
    pub solved:     bool,
    pub created_at: Epoch,
}

impl Incident {
    /// Validate and build an open incident.  The title is trimmed.
    pub fn open(
        id:       IncidentId,
        session:  SessionId,
        title:    &str,
        position: GeoPoint,
        now:      Epoch,
    ) -> MobilityResult<Self> {
        let title = title.trim();
        if title.is_empty() {
            return Err(MobilityError::InvalidIncident("title is empty".into()));
        }
        if !position.is_finite() {
            return Err(MobilityError::InvalidIncident(format!(
                "position {position} is not finite"
            )));
        }
        Ok(Self {
            id,
            session,
            title: title.to_owned(),
            position,
            solved: false,
            created_at: now,
        })
    }
}

/// Incident codes are `H` followed by the last six digits of the creation
/// instant in milliseconds.
pub fn incident_id_at(now: Epoch) -> IncidentId {
    IncidentId::new(format!("H{:06}", now.as_millis().rem_euclid(1_000_000)))
}

// ── LogEntry ──────────────────────────────────────────────────────────────────

/// One line of the session's operations log.  Insert-only.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LogEntry {
    pub id:       Uuid,
    pub session:  SessionId,
    pub resource: Option<ResourceId>,
    pub message:  String,
    pub at:       Epoch,
}

impl LogEntry {
    pub fn new(
        session:  SessionId,
        resource: Option<ResourceId>,
        message:  impl Into<String>,
        at:       Epoch,
    ) -> Self {
        Self { id: Uuid::new_v4(), session, resource, message: message.into(), at }
    }
}
