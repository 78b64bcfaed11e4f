use dx_core::{IncidentId, ResourceId};
use thiserror::Error;

/// Failures of the replicated store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store backend error: {0}")]
    Backend(String),

    #[error("cannot decode stored row: {0}")]
    Decode(String),

    #[error("incident {0} already exists")]
    DuplicateIncident(IncidentId),

    #[error("incident {0} not found")]
    IncidentNotFound(IncidentId),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum MobilityError {
    #[error("resource {0} is not in the fleet")]
    UnknownResource(ResourceId),

    #[error("speed must be a positive number of metres per second, got {0}")]
    InvalidSpeed(f64),

    #[error("destination is not a finite coordinate")]
    InvalidDestination,

    #[error("invalid incident: {0}")]
    InvalidIncident(String),

    #[error("store write failed: {0}")]
    Store(#[from] StoreError),
}

pub type MobilityResult<T> = Result<T, MobilityError>;

/// Why a change feed could not deliver the next event.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FeedError {
    /// The subscriber fell behind and `0` events were dropped.  The mirror
    /// must be reloaded from the store.
    #[error("change feed lagged by {0} events")]
    Lagged(u64),

    #[error("change feed closed")]
    Closed,
}
