//! Replicated per-resource movement state.
//!
//! [`MovementState`] is the tagged form every client works with: the motion
//! fields exist exactly when the resource is moving.  [`MovementRow`] is the
//! flat shape a row store holds, with every motion column nullable; decoding
//! a row into a [`MovementRecord`] rejects partial motion.

use std::fmt;
use std::str::FromStr;

use dx_core::{Epoch, GeoPoint, ResourceId, SessionId};

use crate::{StoreError, StoreResult};

// ── Motion ────────────────────────────────────────────────────────────────────

/// One movement attempt.  `epoch` is both its start instant and its version
/// token.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Motion {
    pub origin:      GeoPoint,
    pub destination: GeoPoint,
    pub epoch:       Epoch,
    /// Metres per second.
    pub speed_mps:   f64,
}

impl Motion {
    /// Distance covered along the route at `now` (metres, `>= 0`).
    #[inline]
    pub fn traveled_m(&self, now: Epoch) -> f64 {
        now.secs_since(self.epoch) * self.speed_mps
    }
}

// ── MovementState ─────────────────────────────────────────────────────────────

/// Where a resource is, as far as the replicated store knows.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MovementState {
    /// At its home station.  Also the meaning of a missing row.
    #[default]
    AtBase,

    /// Settled away from the station.
    Deployed { position: GeoPoint },

    /// Travelling.  `checkpoint` is the last coordinate written with the
    /// movement (the origin the writer computed), if any.
    Moving { motion: Motion, checkpoint: Option<GeoPoint> },
}

impl MovementState {
    pub fn status(&self) -> MovementStatus {
        match self {
            MovementState::AtBase           => MovementStatus::AtBase,
            MovementState::Deployed { .. }  => MovementStatus::Deployed,
            MovementState::Moving { .. }    => MovementStatus::Moving,
        }
    }

    #[inline]
    pub fn is_moving(&self) -> bool {
        matches!(self, MovementState::Moving { .. })
    }

    #[inline]
    pub fn motion(&self) -> Option<&Motion> {
        match self {
            MovementState::Moving { motion, .. } => Some(motion),
            _ => None,
        }
    }

    #[inline]
    pub fn epoch(&self) -> Option<Epoch> {
        self.motion().map(|m| m.epoch)
    }

    /// The last replicated coordinate: the settled position when deployed,
    /// the checkpoint when moving, nothing at base.
    pub fn last_known(&self) -> Option<GeoPoint> {
        match self {
            MovementState::AtBase                    => None,
            MovementState::Deployed { position }     => Some(*position),
            MovementState::Moving { checkpoint, .. } => *checkpoint,
        }
    }
}

// ── MovementStatus ────────────────────────────────────────────────────────────

/// The `status` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MovementStatus {
    AtBase,
    Deployed,
    Moving,
}

impl MovementStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            MovementStatus::AtBase   => "AT_BASE",
            MovementStatus::Deployed => "DEPLOYED",
            MovementStatus::Moving   => "MOVING",
        }
    }
}

impl FromStr for MovementStatus {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AT_BASE"  => Ok(MovementStatus::AtBase),
            "DEPLOYED" => Ok(MovementStatus::Deployed),
            "MOVING"   => Ok(MovementStatus::Moving),
            other => Err(StoreError::Decode(format!("unknown status {other:?}"))),
        }
    }
}

impl fmt::Display for MovementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── MovementRecord ────────────────────────────────────────────────────────────

/// One replicated row, keyed by `(session, resource)`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MovementRecord {
    pub session:  SessionId,
    pub resource: ResourceId,
    pub state:    MovementState,
}

impl MovementRecord {
    pub fn new(session: SessionId, resource: ResourceId, state: MovementState) -> Self {
        Self { session, resource, state }
    }
}

// ── MovementRow ───────────────────────────────────────────────────────────────

/// Flat wire/storage shape of a [`MovementRecord`].
#[derive(Debug, Clone, PartialEq)]
pub struct MovementRow {
    pub session:     SessionId,
    pub resource:    ResourceId,
    pub status:      MovementStatus,
    pub position:    Option<GeoPoint>,
    pub origin:      Option<GeoPoint>,
    pub destination: Option<GeoPoint>,
    pub epoch_start: Option<Epoch>,
    pub speed_mps:   Option<f64>,
}

impl From<&MovementRecord> for MovementRow {
    fn from(record: &MovementRecord) -> Self {
        let motion = record.state.motion();
        Self {
            session:     record.session.clone(),
            resource:    record.resource.clone(),
            status:      record.state.status(),
            position:    record.state.last_known(),
            origin:      motion.map(|m| m.origin),
            destination: motion.map(|m| m.destination),
            epoch_start: motion.map(|m| m.epoch),
            speed_mps:   motion.map(|m| m.speed_mps),
        }
    }
}

impl TryFrom<MovementRow> for MovementRecord {
    type Error = StoreError;

    /// Rejects `MOVING` rows missing any motion column, non-`MOVING` rows
    /// carrying one, and `DEPLOYED` rows without a position.
    fn try_from(row: MovementRow) -> StoreResult<Self> {
        let motion_columns = [
            row.origin.is_some(),
            row.destination.is_some(),
            row.epoch_start.is_some(),
            row.speed_mps.is_some(),
        ];

        let state = match row.status {
            MovementStatus::Moving => {
                let (Some(origin), Some(destination), Some(epoch), Some(speed_mps)) =
                    (row.origin, row.destination, row.epoch_start, row.speed_mps)
                else {
                    return Err(StoreError::Decode(format!(
                        "MOVING row for {} is missing motion fields",
                        row.resource
                    )));
                };
                if !(speed_mps.is_finite() && speed_mps > 0.0) {
                    return Err(StoreError::Decode(format!(
                        "MOVING row for {} has speed {speed_mps}",
                        row.resource
                    )));
                }
                MovementState::Moving {
                    motion: Motion { origin, destination, epoch, speed_mps },
                    checkpoint: row.position,
                }
            }
            status if motion_columns.iter().any(|present| *present) => {
                return Err(StoreError::Decode(format!(
                    "{status} row for {} carries motion fields",
                    row.resource
                )));
            }
            MovementStatus::Deployed => match row.position {
                Some(position) => MovementState::Deployed { position },
                None => {
                    return Err(StoreError::Decode(format!(
                        "DEPLOYED row for {} has no position",
                        row.resource
                    )));
                }
            },
            MovementStatus::AtBase => MovementState::AtBase,
        };

        Ok(MovementRecord { session: row.session, resource: row.resource, state })
    }
}
