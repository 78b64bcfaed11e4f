//! The client's local copy of the session's replicated rows.

use std::collections::BTreeMap;

use dx_core::{GeoPoint, IncidentId, ResourceId, SessionId};
use dx_mobility::{
    ChangeEvent, ChangeKind, ChangeRow, Incident, LogEntry, Motion, MovementRecord, MovementState,
};

/// What a replicated movement change means for the resource's marker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MirrorChange {
    /// The row is `MOVING`; the frame loop owns the marker.
    Moving,
    /// The row is `DEPLOYED` at this position.
    Settled(GeoPoint),
    /// The row is `AT_BASE` or was deleted.
    Removed,
}

/// Movement rows, incidents and log lines of one session, as last seen on
/// the change feed.
#[derive(Debug, Clone)]
pub struct LocalMirror {
    session:   SessionId,
    movements: BTreeMap<ResourceId, MovementState>,
    incidents: BTreeMap<IncidentId, Incident>,
    log:       Vec<LogEntry>,
}

impl LocalMirror {
    pub fn new(session: SessionId) -> Self {
        Self {
            session,
            movements: BTreeMap::new(),
            incidents: BTreeMap::new(),
            log:       Vec::new(),
        }
    }

    #[inline]
    pub fn session(&self) -> &SessionId {
        &self.session
    }

    /// The mirrored state; a missing row is `AT_BASE`.
    pub fn state(&self, resource: &ResourceId) -> MovementState {
        self.movements.get(resource).copied().unwrap_or_default()
    }

    /// Every mirrored `MOVING` row in resource order.
    pub fn moving(&self) -> impl Iterator<Item = (&ResourceId, &Motion)> {
        self.movements
            .iter()
            .filter_map(|(resource, state)| state.motion().map(|m| (resource, m)))
    }

    pub fn movements(&self) -> impl Iterator<Item = (&ResourceId, &MovementState)> {
        self.movements.iter()
    }

    /// Incidents in creation order.
    pub fn incidents(&self) -> Vec<&Incident> {
        let mut out: Vec<&Incident> = self.incidents.values().collect();
        out.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        out
    }

    pub fn log(&self) -> &[LogEntry] {
        &self.log
    }

    /// Apply one feed event.  Returns the marker consequence for movement
    /// rows and `None` for everything else.
    pub fn apply(&mut self, event: &ChangeEvent) -> Option<(ResourceId, MirrorChange)> {
        if event.session != self.session {
            return None;
        }
        match (&event.row, event.kind) {
            (ChangeRow::Movement(record), ChangeKind::Delete) => {
                self.movements.remove(&record.resource);
                Some((record.resource.clone(), MirrorChange::Removed))
            }
            (ChangeRow::Movement(record), _) => {
                self.movements.insert(record.resource.clone(), record.state);
                Some((record.resource.clone(), change_for(&record.state)))
            }
            (ChangeRow::Incident(incident), ChangeKind::Delete) => {
                self.incidents.remove(&incident.id);
                None
            }
            (ChangeRow::Incident(incident), _) => {
                self.incidents.insert(incident.id.clone(), incident.clone());
                None
            }
            (ChangeRow::Log(entry), _) => {
                self.log.push(entry.clone());
                None
            }
        }
    }

    /// Replace every movement row with a fresh read from the store.
    ///
    /// Returns the marker consequence for every resource whose row was or is
    /// now present.
    pub fn replace_movements(
        &mut self,
        records: Vec<MovementRecord>,
    ) -> Vec<(ResourceId, MirrorChange)> {
        let previous = std::mem::take(&mut self.movements);
        for record in records {
            if record.session == self.session {
                self.movements.insert(record.resource, record.state);
            }
        }

        let mut changes: Vec<(ResourceId, MirrorChange)> = previous
            .keys()
            .filter(|r| !self.movements.contains_key(*r))
            .map(|r| (r.clone(), MirrorChange::Removed))
            .collect();
        changes.extend(
            self.movements
                .iter()
                .map(|(r, state)| (r.clone(), change_for(state))),
        );
        changes
    }

    pub fn replace_incidents(&mut self, incidents: Vec<Incident>) {
        self.incidents = incidents
            .into_iter()
            .filter(|i| i.session == self.session)
            .map(|i| (i.id.clone(), i))
            .collect();
    }

    pub fn replace_log(&mut self, log: Vec<LogEntry>) {
        self.log = log.into_iter().filter(|e| e.session == self.session).collect();
    }
}

fn change_for(state: &MovementState) -> MirrorChange {
    match state {
        MovementState::AtBase                => MirrorChange::Removed,
        MovementState::Deployed { position } => MirrorChange::Settled(*position),
        MovementState::Moving { .. }         => MirrorChange::Moving,
    }
}
