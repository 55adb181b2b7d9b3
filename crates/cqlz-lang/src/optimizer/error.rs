use std::path::PathBuf;

use thiserror::Error;

use crate::compiler::CompileError;

#[derive(Error, Debug)]
pub enum OptimizerError {
    #[error("Optimization was cancelled")]
    Cancelled,
    #[error("Dataset contains no usable samples")]
    EmptyDataset,
    #[error("Invalid optimizer configuration: {0}")]
    InvalidConfig(String),
    #[error("Failed to start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error(transparent)]
    Weights(#[from] CompileError),
}

/// Errors raised while loading configuration, weights or datasets.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid configuration: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid weights: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid dataset: {0}")]
    Csv(#[from] csv::Error),
}

impl ConfigError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::Io {
            path: path.into(),
            source,
        }
    }
}
