use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("engine was already started")]
    AlreadyStarted,
    #[error("engine was stopped and cannot be restarted")]
    Stopped,
    #[error("simulation unit panicked: {0}")]
    UnitPanicked(#[from] tokio::task::JoinError),
}
