/// Core error type for mongoprom
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    /// Metric definition rejected before it reached the registry
    #[error("Invalid metric definition: {0}")]
    InvalidMetric(String),

    /// Name already taken by an instrument of another shape
    #[error("Conflicting metric registration: {0}")]
    MetricConflict(String),

    #[error("Encoding error: {0}")]
    Encoding(String),
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Error::Config(err.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
