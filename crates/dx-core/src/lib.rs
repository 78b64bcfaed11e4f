//! `dx-core`: foundational types for the `rust_dispatch` movement engine.
//!
//! This crate is a dependency of every other `dx-*` crate.  It intentionally
//! has no `dx-*` dependencies and minimal external ones (only `rand` and
//! `thiserror`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module          | Contents                                              |
//! |-----------------|-------------------------------------------------------|
//! | [`ids`]         | `ResourceId`, `StationId`, `SessionId`, `IncidentId`  |
//! | [`geo`]         | `GeoPoint`, haversine distance                        |
//! | [`polyline`]    | cumulative distances, constant-speed interpolation    |
//! | [`time`]        | `Epoch` version token, `Clock` trait                  |
//! | [`kind`]        | `ResourceKind` enum                                   |
//! | [`config`]      | `SyncConfig`, `DEFAULT_ANCHOR`                        |
//! | [`rng`]         | `OperatorRng` (per simulated operator)                |
//! | [`error`]       | `DxError`, `DxResult`                                 |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod config;
pub mod error;
pub mod geo;
pub mod ids;
pub mod kind;
pub mod polyline;
pub mod rng;
pub mod time;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::{DEFAULT_ANCHOR, SyncConfig};
pub use error::{DxError, DxResult};
pub use geo::GeoPoint;
pub use ids::{IncidentId, ResourceId, SessionId, StationId};
pub use kind::ResourceKind;
pub use polyline::{Polyline, cumulative_distances, position_at_distance};
pub use rng::OperatorRng;
pub use time::{Clock, Epoch, ManualClock, SystemClock};
