//! The per-client frame loop.
//!
//! # Frame
//!
//! ```text
//! for each mirrored MOVING row (resource order):
//!   ① traveled = max(0, now - epoch) * speed
//!   ② route    = resolver cache hit, or queue a resolution request (once per
//!                key) and draw on the straight line for this frame
//!   ③ position = route.position_at(traveled)
//!   ④ resolved route and traveled >= total - tolerance:
//!        snap to destination, report arrival once per epoch,
//!        queue a finalization proposal once per epoch (retried while the
//!        queue is full, and again every FINALIZE_RETRY_MS while the row
//!        stays MOVING)
//!   ⑤ draw the marker
//! prune bookkeeping and the route cache of superseded epochs
//! ```
//!
//! `tick` never awaits.  Route resolution and finalization writes happen on
//! the tasks that drain the two queues (see [`crate::tasks`]).

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info};

use dx_core::{Epoch, GeoPoint, Polyline, ResourceId, SyncConfig};
use dx_mobility::{ChangeEvent, Motion, MovementRecord};
use dx_spatial::{RouteKey, RouteResolver, Router};

use crate::mirror::{LocalMirror, MirrorChange};
use crate::AnimatorObserver;

/// How long a queued finalization may stay unconfirmed before the frame
/// proposes it again.  Covers a finalizer that gave up on a failing store.
pub const FINALIZE_RETRY_MS: i64 = 5_000;

// ── Queue messages ────────────────────────────────────────────────────────────

/// Ask the route task to resolve `key` starting at `origin`.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteRequest {
    pub key:    RouteKey,
    pub origin: GeoPoint,
}

/// Ask the finalizer task to complete the movement `(resource, epoch)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizeProposal {
    pub resource: ResourceId,
    pub epoch:    Epoch,
}

/// Counts for one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Markers drawn.
    pub moving:      usize,
    /// Markers drawn on the provisional straight line.
    pub provisional: usize,
    /// Arrivals first reported this frame.
    pub arrivals:    usize,
    /// Finalization proposals queued this frame.
    pub proposals:   usize,
}

// Where a motion is drawn at an instant.
struct Placement {
    key:      RouteKey,
    position: GeoPoint,
    arrived:  bool,
    resolved: bool,
}

// ── Animator ──────────────────────────────────────────────────────────────────

/// Local animator for one client.
///
/// Create via [`AnimatorBuilder`][crate::AnimatorBuilder].
pub struct Animator<R: Router> {
    pub(crate) config:   SyncConfig,
    pub(crate) resolver: Arc<RouteResolver<R>>,
    pub(crate) mirror:   LocalMirror,

    /// Last drawn or settled position per resource with a visible marker.
    pub(crate) markers:   HashMap<ResourceId, GeoPoint>,
    /// Route keys already handed to the route task.
    pub(crate) requested: HashSet<RouteKey>,
    /// Epoch whose arrival was reported, per resource.
    pub(crate) arrived:   HashMap<ResourceId, Epoch>,
    /// Epoch whose finalization was queued, and when, per resource.
    pub(crate) proposed:  HashMap<ResourceId, (Epoch, Epoch)>,

    pub(crate) route_tx:    mpsc::Sender<RouteRequest>,
    pub(crate) finalize_tx: mpsc::Sender<FinalizeProposal>,
}

impl<R: Router> Animator<R> {
    // ── Accessors ─────────────────────────────────────────────────────────

    #[inline]
    pub fn mirror(&self) -> &LocalMirror {
        &self.mirror
    }

    #[inline]
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    #[inline]
    pub fn resolver(&self) -> &Arc<RouteResolver<R>> {
        &self.resolver
    }

    /// Last drawn or settled marker position.  `None` when the resource is
    /// at its station.
    pub fn marker(&self, resource: &ResourceId) -> Option<GeoPoint> {
        self.markers.get(resource).copied()
    }

    /// Where `resource` is drawn at `now`, computed exactly as a frame would.
    /// `None` unless the mirrored row is `MOVING`.
    pub fn live_position(&self, resource: &ResourceId, now: Epoch) -> Option<GeoPoint> {
        let state = self.mirror.state(resource);
        let motion = state.motion()?;
        Some(self.place(resource, motion, now).position)
    }

    // ── Replicated changes ────────────────────────────────────────────────

    /// Apply one change-feed event to the mirror and the markers.
    ///
    /// A `MOVING` row never moves its marker here; the next frame does.
    pub fn apply<O: AnimatorObserver>(&mut self, event: &ChangeEvent, observer: &mut O) {
        if let Some((resource, change)) = self.mirror.apply(event) {
            self.apply_marker(resource, change, observer);
        }
    }

    /// Replace the mirrored movement rows with a full read from the store.
    pub fn resync<O: AnimatorObserver>(&mut self, records: Vec<MovementRecord>, observer: &mut O) {
        for (resource, change) in self.mirror.replace_movements(records) {
            self.apply_marker(resource, change, observer);
        }
    }

    pub(crate) fn mirror_mut(&mut self) -> &mut LocalMirror {
        &mut self.mirror
    }

    fn apply_marker<O: AnimatorObserver>(
        &mut self,
        resource: ResourceId,
        change:   MirrorChange,
        observer: &mut O,
    ) {
        match change {
            MirrorChange::Moving => {}
            MirrorChange::Settled(position) => {
                observer.on_settled(&resource, position);
                self.markers.insert(resource, position);
            }
            MirrorChange::Removed => {
                if self.markers.remove(&resource).is_some() {
                    observer.on_removed(&resource);
                }
            }
        }
    }

    // ── Frame ─────────────────────────────────────────────────────────────

    /// Draw one frame at `now`.
    pub fn tick<O: AnimatorObserver>(&mut self, now: Epoch, observer: &mut O) -> FrameStats {
        observer.on_frame_start(now);
        let mut stats = FrameStats::default();

        let moving: Vec<(ResourceId, Motion)> = self
            .mirror
            .moving()
            .map(|(resource, motion)| (resource.clone(), *motion))
            .collect();
        let mut live = HashSet::with_capacity(moving.len());

        for (resource, motion) in &moving {
            let placement = self.place(resource, motion, now);

            if !placement.resolved && !self.requested.contains(&placement.key) {
                self.request_route(&placement.key, motion.origin);
            }
            if !placement.resolved {
                stats.provisional += 1;
            }

            if placement.arrived {
                if self.arrived.get(resource) != Some(&motion.epoch) {
                    info!(resource = %resource, epoch = %motion.epoch, "arrival observed");
                    observer.on_arrival(resource, motion.epoch, placement.position, now);
                    self.arrived.insert(resource.clone(), motion.epoch);
                    stats.arrivals += 1;
                }
                if self.proposal_due(resource, motion.epoch, now)
                    && self.propose(resource, motion.epoch, now)
                {
                    stats.proposals += 1;
                }
            }

            observer.on_position(resource, placement.position, now);
            self.markers.insert(resource.clone(), placement.position);
            live.insert(placement.key);
            stats.moving += 1;
        }

        // Forget everything that belongs to a superseded or finished epoch.
        let current: HashMap<&ResourceId, Epoch> =
            moving.iter().map(|(r, m)| (r, m.epoch)).collect();
        self.requested.retain(|key| live.contains(key));
        self.arrived.retain(|r, e| current.get(r) == Some(e));
        self.proposed.retain(|r, (e, _)| current.get(r) == Some(e));
        self.resolver.prune(&live);

        observer.on_frame_end(now, stats.moving);
        stats
    }

    // ── Internals ─────────────────────────────────────────────────────────

    fn place(&self, resource: &ResourceId, motion: &Motion, now: Epoch) -> Placement {
        let key = RouteKey::new(resource.clone(), motion.epoch, motion.destination);
        let traveled = motion.traveled_m(now);

        match self.resolver.cached(&key) {
            Some(route) => {
                let arrived = traveled >= route.total_m() - self.config.arrival_tolerance_m;
                let position = if arrived {
                    motion.destination
                } else {
                    route.position_at(traveled)
                };
                Placement { key, position, arrived, resolved: true }
            }
            None => {
                let position =
                    Polyline::straight(motion.origin, motion.destination).position_at(traveled);
                Placement { key, position, arrived: false, resolved: false }
            }
        }
    }

    fn request_route(&mut self, key: &RouteKey, origin: GeoPoint) {
        let request = RouteRequest { key: key.clone(), origin };
        match self.route_tx.try_send(request) {
            Ok(()) => {
                self.requested.insert(key.clone());
            }
            Err(TrySendError::Full(_)) => {
                debug!(resource = %key.resource, "route queue full, retrying next frame");
            }
            Err(TrySendError::Closed(_)) => {
                debug!(resource = %key.resource, "route queue closed");
            }
        }
    }

    // Never proposed for this epoch, or the last proposal went unanswered
    // for FINALIZE_RETRY_MS.
    fn proposal_due(&self, resource: &ResourceId, epoch: Epoch, now: Epoch) -> bool {
        match self.proposed.get(resource) {
            Some(&(proposed, at)) if proposed == epoch => {
                let due = now.as_millis() - at.as_millis() >= FINALIZE_RETRY_MS;
                if due {
                    debug!(resource = %resource, %epoch, "finalization still pending, proposing again");
                }
                due
            }
            _ => true,
        }
    }

    // Returns `true` when the proposal was queued.
    fn propose(&mut self, resource: &ResourceId, epoch: Epoch, now: Epoch) -> bool {
        let proposal = FinalizeProposal { resource: resource.clone(), epoch };
        match self.finalize_tx.try_send(proposal) {
            Ok(()) => {
                self.proposed.insert(resource.clone(), (epoch, now));
                true
            }
            Err(TrySendError::Full(_)) => {
                debug!(resource = %resource, %epoch, "finalize queue full, retrying next frame");
                false
            }
            Err(TrySendError::Closed(_)) => {
                debug!(resource = %resource, %epoch, "finalize queue closed");
                false
            }
        }
    }
}
