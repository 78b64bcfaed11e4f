//! `dx-store`: durable replicated store.
//!
//! # Crate layout
//!
//! | Module     | Contents                                                  |
//! |------------|-----------------------------------------------------------|
//! | [`sqlite`] | `SqliteStore`: `MovementStore` over one SQLite database  |
//!
//! The store satisfies the same contract as
//! [`MemoryStore`][dx_mobility::MemoryStore]: upserts keyed by
//! `(session, resource)`, a compare-and-swap finalization on
//! `status + epoch_start`, and a commit-ordered change feed.  The feed is
//! process-local; clients in other processes see rows but not events.

pub mod sqlite;


pub use sqlite::SqliteStore;
