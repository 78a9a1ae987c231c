//! Core error type.
//!
//! Sub-crates define their own error enums; only configuration loading and
//! validation fail inside `fc-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shorthand result type for `fc-core`.
pub type CoreResult<T> = Result<T, CoreError>;
