//! `dx-mobility`: replicated movement state and the write protocols.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                          |
//! |-------------|-------------------------------------------------------------------|
//! | [`state`]   | `MovementState`, `Motion`, `MovementRecord`, flat `MovementRow`   |
//! | [`records`] | `Incident`, `LogEntry`                                            |
//! | [`feed`]    | `ChangeEvent`, session-filtered `ChangeFeed`                      |
//! | [`store`]   | `MovementStore` trait, `MemoryStore`, `FinalizeOutcome`           |
//! | [`engine`]  | `Dispatcher<S, C>`: redirect, recall, finalize, incidents        |
//! | [`error`]   | `MobilityError`, `StoreError`, `FeedError`                        |
//!
//! # Movement model (epoch-versioned constant-speed travel)
//!
//! 1. A dispatch or redirect upserts a `MOVING` row carrying origin,
//!    destination, speed and a fresh epoch.  The epoch is the version token;
//!    writing a new one supersedes whatever was in flight.
//! 2. Every client derives the position locally from
//!    `(now - epoch) * speed` along the route; no client stores positions
//!    while a resource moves.
//! 3. Clients that see the movement arrive propose finalization for that
//!    epoch.  The store applies the first proposal and reports the rest as
//!    [`FinalizeOutcome::Stale`].
//! 4. A recall writes `AT_BASE` with all motion cleared in the same row.

pub mod engine;
pub mod error;
pub mod feed;
pub mod records;
pub mod state;
pub mod store;

#[cfg(test)]
mod test_support;


pub use engine::{Dispatcher, resolve_origin};
pub use error::{FeedError, MobilityError, MobilityResult, StoreError, StoreResult};
pub use feed::{ChangeEvent, ChangeFeed, ChangeKind, ChangeRow, FEED_CAPACITY};
pub use records::{Incident, LogEntry, incident_id_at};
pub use state::{Motion, MovementRecord, MovementRow, MovementState, MovementStatus};
pub use store::{FinalizeOutcome, MemoryStore, MovementStore};
