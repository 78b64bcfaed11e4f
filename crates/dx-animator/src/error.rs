use dx_core::DxError;
use dx_mobility::{MobilityError, StoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnimatorError {
    #[error("animator configuration error: {0}")]
    Config(#[from] DxError),

    #[error("{0}")]
    Mobility(#[from] MobilityError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("change feed closed")]
    FeedClosed,
}

pub type AnimatorResult<T> = Result<T, AnimatorError>;
