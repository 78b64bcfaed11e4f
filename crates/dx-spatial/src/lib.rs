//! `dx-spatial`: route providers and the per-epoch route resolver.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                    |
//! |--------------|-------------------------------------------------------------|
//! | [`router`]   | `Router` trait, `StraightLineRouter`                        |
//! | [`osrm`]     | `OsrmRouter`: OSRM-compatible HTTP provider                |
//! | [`resolver`] | `RouteKey`, `ResolvedRoute`, `RouteResolver<R>`             |
//! | [`error`]    | `SpatialError`, `SpatialResult<T>`                          |
//!
//! # Failure model
//!
//! Providers return errors; the resolver never does.  Any provider failure,
//! and any geometry with fewer than two usable points, degrades to the
//! straight line between the endpoints with `fallback = true`.  Resolution
//! is memoized per [`RouteKey`] and single-flight: concurrent callers for
//! one key share a single provider request.
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                       |
//! |---------|--------------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on public types.           |

pub mod error;
pub mod osrm;
pub mod resolver;
pub mod router;

#[cfg(test)]
mod tests;

pub use error::{SpatialError, SpatialResult};
pub use osrm::OsrmRouter;
pub use resolver::{ResolvedRoute, RouteKey, RouteResolver};
pub use router::{Router, StraightLineRouter};
