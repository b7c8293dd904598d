//! Base error type.
//!
//! Sub-crates define their own error enums and wrap `EpiError` as one variant
//! via `#[from]`.

use thiserror::Error;

/// Errors raised by `epi-core` primitives.
#[derive(Debug, Error, PartialEq)]
pub enum EpiError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid distribution: {0}")]
    Distribution(String),
}

/// Shorthand result type for `epi-core`.
pub type EpiResult<T> = Result<T, EpiError>;
