//! CLI error types.

use std::path::PathBuf;

use thiserror::Error;

/// Failure to load `sinopia.config.json`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("no template files found matching {}", .0.join(", "))]
    NoFiles(Vec<String>),

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid data file {}: {source}", path.display())]
    Data {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid delimiters {0:?}: expected two comma-separated strings, e.g. \"[[,]]\"")]
    Delimiters(String),

    #[error("{} has template errors:\n{}", path.display(), errors.join("\n"))]
    Compile { path: PathBuf, errors: Vec<String> },

    #[error("{failed} file(s) failed to compile")]
    Failed { failed: usize },

    #[error("failed to configure thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
