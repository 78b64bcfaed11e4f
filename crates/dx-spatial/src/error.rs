//! Spatial-subsystem error type.

use thiserror::Error;

/// Errors produced by route providers.
///
/// [`RouteResolver`][crate::RouteResolver] absorbs all of these into a
/// straight-line fallback; they only surface when a provider is called
/// directly.
#[derive(Debug, Error)]
pub enum SpatialError {
    #[error("routing request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("routing provider answered HTTP {0}")]
    Status(u16),

    #[error("routing provider answered code {0:?}")]
    ProviderCode(String),

    #[error("routing provider returned no geometry")]
    EmptyGeometry,

    #[error("cannot decode routing response: {0}")]
    Decode(String),
}

pub type SpatialResult<T> = Result<T, SpatialError>;
