//! The dispatcher: redirection, recall, finalization and incident writes for
//! one session.
//!
//! Every write is a single store call, so a failed write leaves the row as it
//! was.  Log lines are appended after the write succeeds and never fail the
//! operation they describe.

use std::sync::Arc;

use tracing::{debug, info, warn};

use dx_core::{Clock, Epoch, GeoPoint, IncidentId, ResourceId, SessionId, SyncConfig};
use dx_fleet::Fleet;

use crate::records::incident_id_at;
use crate::{
    FinalizeOutcome, Incident, LogEntry, MobilityError, MobilityResult, Motion, MovementRecord,
    MovementState, MovementStore,
};

/// Origin of a new movement.
///
/// Preference order: the live interpolated position (moving resources
/// only), the last replicated coordinate, the home station, the anchor.
/// Non-finite candidates are skipped.
pub fn resolve_origin(
    current: &MovementState,
    live:    Option<GeoPoint>,
    home:    Option<GeoPoint>,
    anchor:  GeoPoint,
) -> GeoPoint {
    let live = if current.is_moving() { live } else { None };
    live.filter(|p| p.is_finite())
        .or_else(|| current.last_known().filter(|p| p.is_finite()))
        .or_else(|| home.filter(|p| p.is_finite()))
        .unwrap_or(anchor)
}

/// Writes movements for one session through a [`MovementStore`].
///
/// # Type parameters
///
/// `S` is the store (usually `Arc<MemoryStore>` or an SQLite store) and `C`
/// the shared clock.
pub struct Dispatcher<S: MovementStore, C: Clock> {
    store:   S,
    clock:   C,
    fleet:   Arc<Fleet>,
    config:  SyncConfig,
    session: SessionId,
}

impl<S: MovementStore, C: Clock> Dispatcher<S, C> {
    pub fn new(store: S, clock: C, fleet: Arc<Fleet>, config: SyncConfig, session: SessionId) -> Self {
        Self { store, clock, fleet, config, session }
    }

    #[inline]
    pub fn store(&self) -> &S {
        &self.store
    }

    #[inline]
    pub fn session(&self) -> &SessionId {
        &self.session
    }

    #[inline]
    pub fn fleet(&self) -> &Fleet {
        &self.fleet
    }

    #[inline]
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    #[inline]
    pub fn now(&self) -> Epoch {
        self.clock.now()
    }

    /// Dispatch or redirect `resource` towards `destination`.
    ///
    /// `current` is the caller's view of the row and `live` its interpolated
    /// position for a moving resource.  The write is one upsert of a fresh
    /// `MOVING` row, superseding any motion in flight.
    ///
    /// # Errors
    ///
    /// Unknown resource, non-finite destination, a speed override that is not
    /// a positive finite number, or a failed store write.  Nothing is written
    /// in any of these cases.
    pub async fn move_to(
        &self,
        resource:    &ResourceId,
        current:     &MovementState,
        live:        Option<GeoPoint>,
        destination: GeoPoint,
        speed_mps:   Option<f64>,
    ) -> MobilityResult<MovementRecord> {
        if self.fleet.resource(resource).is_none() {
            return Err(MobilityError::UnknownResource(resource.clone()));
        }
        if !destination.is_finite() {
            return Err(MobilityError::InvalidDestination);
        }
        let speed_mps = match speed_mps {
            Some(speed) if speed.is_finite() && speed > 0.0 => speed,
            Some(speed) => return Err(MobilityError::InvalidSpeed(speed)),
            None => self.config.default_speed_mps,
        };

        let origin = resolve_origin(
            current,
            live,
            self.fleet.home_position(resource),
            self.config.default_anchor,
        );
        let epoch = Epoch::next_after(self.clock.now(), current.epoch());

        let record = MovementRecord::new(
            self.session.clone(),
            resource.clone(),
            MovementState::Moving {
                motion:     Motion { origin, destination, epoch, speed_mps },
                checkpoint: Some(origin),
            },
        );
        self.store.upsert(record.clone()).await?;

        let verb = match current {
            MovementState::AtBase => "dispatched",
            _ => "redirected",
        };
        info!(
            session  = %self.session,
            resource = %resource,
            %epoch,
            %origin,
            %destination,
            speed_mps,
            "resource {verb}"
        );
        self.log(Some(resource), format!("{resource} {verb} to {destination}"), epoch)
            .await;

        Ok(record)
    }

    /// Send `resource` home: one write of an `AT_BASE` row with no motion.
    pub async fn recall(&self, resource: &ResourceId) -> MobilityResult<MovementRecord> {
        if self.fleet.resource(resource).is_none() {
            return Err(MobilityError::UnknownResource(resource.clone()));
        }
        let record =
            MovementRecord::new(self.session.clone(), resource.clone(), MovementState::AtBase);
        self.store.upsert(record.clone()).await?;

        let now = self.clock.now();
        info!(session = %self.session, resource = %resource, "resource recalled");
        self.log(Some(resource), format!("{resource} recalled to station"), now)
            .await;
        Ok(record)
    }

    /// Propose completion of the movement started at `epoch`.
    ///
    /// Exactly one proposal per epoch is [`Applied`](FinalizeOutcome::Applied);
    /// the rest, and any proposal for a superseded epoch, are
    /// [`Stale`](FinalizeOutcome::Stale).
    pub async fn finalize(
        &self,
        resource: &ResourceId,
        epoch:    Epoch,
    ) -> MobilityResult<FinalizeOutcome> {
        let outcome = self.store.finalize(&self.session, resource, epoch).await?;
        match outcome {
            FinalizeOutcome::Applied => {
                info!(session = %self.session, resource = %resource, %epoch, "resource arrived");
                self.log(Some(resource), format!("{resource} arrived"), self.clock.now())
                    .await;
            }
            FinalizeOutcome::Stale => {
                debug!(session = %self.session, resource = %resource, %epoch, "stale finalization ignored");
            }
        }
        Ok(outcome)
    }

    /// Place a new open incident at `position`.
    pub async fn open_incident(&self, title: &str, position: GeoPoint) -> MobilityResult<Incident> {
        let now = self.clock.now();
        let incident = Incident::open(incident_id_at(now), self.session.clone(), title, position, now)?;
        self.store.insert_incident(incident.clone()).await?;

        info!(session = %self.session, incident = %incident.id, "incident opened");
        self.log(None, format!("incident {} opened: {}", incident.id, incident.title), now)
            .await;
        Ok(incident)
    }

    pub async fn resolve_incident(&self, id: &IncidentId) -> MobilityResult<Incident> {
        let incident = self.store.resolve_incident(&self.session, id).await?;

        info!(session = %self.session, incident = %id, "incident resolved");
        self.log(None, format!("incident {id} resolved"), self.clock.now())
            .await;
        Ok(incident)
    }

    /// Delete every movement row and incident of the session.
    pub async fn reset(&self) -> MobilityResult<()> {
        self.store.reset_session(&self.session).await?;
        info!(session = %self.session, "session reset");
        Ok(())
    }

    async fn log(&self, resource: Option<&ResourceId>, message: String, at: Epoch) {
        let entry = LogEntry::new(self.session.clone(), resource.cloned(), message, at);
        if let Err(error) = self.store.append_log(entry).await {
            warn!(session = %self.session, %error, "log append failed");
        }
    }
}
