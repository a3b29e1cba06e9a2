use super::config::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Model contains no atoms")]
    EmptyStructure,

    #[error("Model {index} not found (structure has {available} models)")]
    ModelNotFound { index: usize, available: usize },

    #[error("Computation cancelled during '{phase}'")]
    Cancelled { phase: &'static str },

    #[error("Invalid configuration: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },
}
