// src/errors.rs

//! Crate-wide error type and `Result` alias.

use thiserror::Error;

use crate::action::TargetId;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("duplicate target submitted: {0}")]
    DuplicateTarget(TargetId),

    #[error("cyclic dependency involving target: {0}")]
    CyclicDependency(TargetId),

    #[error("build aborted after a required action failed")]
    Aborted,

    #[error("worker pool shut down with actions still in flight")]
    WorkerPoolClosed,

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, BuildError>;
