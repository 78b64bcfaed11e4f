//! `dx-fleet`: the station and resource catalog.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                 |
//! |---------------|----------------------------------------------------------|
//! | [`store`]     | `Station`, `Resource`, `Fleet` (read-only catalog)       |
//! | [`builder`]   | `FleetBuilder` (validated construction)                  |
//! | [`loader`]    | `load_fleet_csv`, `load_fleet_readers`                   |
//! | [`roster`]    | `default_roster()`: the three-station demo fleet        |
//! | [`error`]     | `FleetError`, `FleetResult<T>`                           |
//!
//! The catalog is master data: it is built once at configuration time and
//! never mutated.  It defines the universe of movable entities and where each
//! one lives when it is at base.

pub mod builder;
pub mod error;
pub mod loader;
pub mod roster;
pub mod store;


pub use builder::FleetBuilder;
pub use error::{FleetError, FleetResult};
pub use loader::{load_fleet_csv, load_fleet_readers};
pub use roster::default_roster;
pub use store::{Fleet, Resource, Station};
