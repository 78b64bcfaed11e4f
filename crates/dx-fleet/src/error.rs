use dx_core::{ResourceId, StationId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FleetError {
    #[error("duplicate station {0}")]
    DuplicateStation(StationId),

    #[error("duplicate resource {0}")]
    DuplicateResource(ResourceId),

    #[error("resource {resource} references unknown station {station}")]
    UnknownStation { resource: ResourceId, station: StationId },

    #[error("station {0} has a non-finite coordinate")]
    InvalidPosition(StationId),

    #[error("fleet parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type FleetResult<T> = Result<T, FleetError>;
