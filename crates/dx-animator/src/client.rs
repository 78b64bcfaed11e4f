//! One connected operator: dispatcher, animator, session context and feed.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use dx_core::{Clock, GeoPoint, IncidentId, ResourceId};
use dx_mobility::{ChangeFeed, Dispatcher, FeedError, Incident, MovementRecord, MovementStore};
use dx_spatial::Router;

use crate::{
    Animator, AnimatorError, AnimatorObserver, AnimatorResult, ClickAction, ClientSession,
    FrameStats,
};

/// A client of a shared session.
///
/// Owns its animator and selection; shares the store, clock and fleet with
/// every other client through its [`Dispatcher`].
pub struct Client<S: MovementStore, C: Clock, R: Router> {
    dispatcher: Arc<Dispatcher<S, C>>,
    animator:   Animator<R>,
    session:    ClientSession,
    feed:       ChangeFeed,
    /// Set by a lagged feed or a failed resync; cleared by a successful one.
    resync_pending: bool,
}

impl<S: MovementStore, C: Clock, R: Router> Client<S, C, R> {
    /// Subscribes to the session's change feed immediately, so nothing
    /// written after construction is missed.  Call [`resync`](Self::resync)
    /// before the first frame to load rows written earlier.
    pub fn new(dispatcher: Arc<Dispatcher<S, C>>, animator: Animator<R>) -> Self {
        let feed = dispatcher.store().subscribe(dispatcher.session());
        Self { dispatcher, animator, session: ClientSession::new(), feed, resync_pending: false }
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    #[inline]
    pub fn animator(&self) -> &Animator<R> {
        &self.animator
    }

    #[inline]
    pub fn dispatcher(&self) -> &Arc<Dispatcher<S, C>> {
        &self.dispatcher
    }

    #[inline]
    pub fn session(&self) -> &ClientSession {
        &self.session
    }

    #[inline]
    pub fn session_mut(&mut self) -> &mut ClientSession {
        &mut self.session
    }

    // ── Replication ───────────────────────────────────────────────────────

    /// Replace the mirror with a full read of the session from the store.
    /// On failure the resync stays pending and the next
    /// [`drain`](Self::drain) retries it.
    pub async fn resync<O: AnimatorObserver>(&mut self, observer: &mut O) -> AnimatorResult<()> {
        self.resync_pending = true;
        let store = self.dispatcher.store();
        let session = self.dispatcher.session();
        let movements = store.list(session).await?;
        let incidents = store.list_incidents(session).await?;
        let log = store.list_log(session).await?;

        debug!(%session, rows = movements.len(), "mirror resynced");
        self.animator.resync(movements, observer);
        let mirror = self.animator.mirror_mut();
        mirror.replace_incidents(incidents);
        mirror.replace_log(log);
        self.resync_pending = false;
        Ok(())
    }

    #[inline]
    pub fn resync_pending(&self) -> bool {
        self.resync_pending
    }

    /// Apply every change waiting on the feed without blocking.  A lagged
    /// feed triggers a resync once the backlog is drained; a resync that
    /// fails is retried on the next drain.  Only a closed feed is an error.
    ///
    /// Returns the number of events applied.
    pub async fn drain<O: AnimatorObserver>(&mut self, observer: &mut O) -> AnimatorResult<usize> {
        let mut applied = 0;
        loop {
            match self.feed.try_recv() {
                Ok(Some(event)) => {
                    self.animator.apply(&event, observer);
                    applied += 1;
                }
                Ok(None) => break,
                Err(FeedError::Lagged(missed)) => {
                    warn!(session = %self.dispatcher.session(), missed, "change feed lagged, resyncing");
                    self.resync_pending = true;
                }
                Err(FeedError::Closed) => return Err(AnimatorError::FeedClosed),
            }
        }
        if self.resync_pending {
            if let Err(error) = self.resync(observer).await {
                warn!(session = %self.dispatcher.session(), %error, "resync failed, retrying next frame");
            }
        }
        Ok(applied)
    }

    /// Draw one frame at the shared clock's current instant.
    pub fn frame<O: AnimatorObserver>(&mut self, observer: &mut O) -> FrameStats {
        let now = self.dispatcher.now();
        self.animator.tick(now, observer)
    }

    /// Drain the feed, then draw a frame.
    pub async fn step<O: AnimatorObserver>(&mut self, observer: &mut O) -> AnimatorResult<FrameStats> {
        self.drain(observer).await?;
        Ok(self.frame(observer))
    }

    // ── Operator actions ──────────────────────────────────────────────────

    /// Dispatch or redirect `resource`.  A moving resource departs from the
    /// position this client currently draws it at.
    pub async fn dispatch(
        &mut self,
        resource:    &ResourceId,
        destination: GeoPoint,
        speed_mps:   Option<f64>,
    ) -> AnimatorResult<MovementRecord> {
        let now = self.dispatcher.now();
        let current = self.animator.mirror().state(resource);
        let live = self.animator.live_position(resource, now);
        let record = self
            .dispatcher
            .move_to(resource, &current, live, destination, speed_mps)
            .await?;
        Ok(record)
    }

    pub async fn recall(&mut self, resource: &ResourceId) -> AnimatorResult<MovementRecord> {
        let record = self.dispatcher.recall(resource).await?;
        self.session.on_recall();
        Ok(record)
    }

    /// Act on a map click.  See [`ClientSession::map_click`].
    pub async fn click(&mut self, point: GeoPoint, title: Option<&str>) -> AnimatorResult<ClickAction> {
        let action = self.session.map_click(point, title);
        match &action {
            ClickAction::OpenIncident { title, position } => {
                self.dispatcher.open_incident(title, *position).await?;
            }
            ClickAction::Dispatch { resource, destination } => {
                self.dispatch(resource, *destination, None).await?;
            }
            ClickAction::Ignored => {}
        }
        Ok(action)
    }

    pub async fn resolve_incident(&mut self, id: &IncidentId) -> AnimatorResult<Incident> {
        Ok(self.dispatcher.resolve_incident(id).await?)
    }

    /// Clear the whole session for every client.
    pub async fn reset(&mut self) -> AnimatorResult<()> {
        self.dispatcher.reset().await?;
        self.session.on_reset();
        Ok(())
    }

    // ── Loop ──────────────────────────────────────────────────────────────

    /// Resync, then draw frames at the configured interval until `shutdown`
    /// turns `true` or its sender is dropped.  Store failures are logged and
    /// retried; only a closed change feed ends the loop early.
    pub async fn run<O: AnimatorObserver>(
        &mut self,
        observer:     &mut O,
        mut shutdown: watch::Receiver<bool>,
    ) -> AnimatorResult<()> {
        let period = Duration::from_millis(self.animator.config().frame_interval_ms);
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        if let Err(error) = self.resync(observer).await {
            warn!(session = %self.dispatcher.session(), %error, "initial resync failed, retrying next frame");
        }
        info!(session = %self.dispatcher.session(), "client loop started");

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = interval.tick() => {
                    self.step(observer).await?;
                }
            }
        }

        info!(session = %self.dispatcher.session(), "client loop stopped");
        Ok(())
    }
}
