//! Framework error type.
//!
//! Sub-crates define their own error enums and either convert into `DxError`
//! or wrap it as one variant, whichever keeps error sites clean.

use thiserror::Error;

/// The top-level error type for `dx-core` and a common base for sub-crates.
#[derive(Debug, Error)]
pub enum DxError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shorthand result type for all `dx-*` crates.
pub type DxResult<T> = Result<T, DxError>;
