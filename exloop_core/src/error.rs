use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PipelineError {
    #[error("glucose unavailable: {0}")]
    GlucoseUnavailable(String),
    #[error("invalid state: {0}")]
    State(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("io error: {0}")]
    Io(String),
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing sample store")]
    MissingSampleStore,
    #[error("missing dose recorder")]
    MissingDoseRecorder,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
