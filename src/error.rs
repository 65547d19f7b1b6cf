use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SmoothError {
    #[error("invalid input: {field} = {value}")]
    InvalidInput { field: &'static str, value: f64 },
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("endpoint returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("upstream reported an error: {0}")]
    Upstream(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{0} environment variable not set")]
    Missing(&'static str),

    #[error("invalid value for {key}: '{value}'")]
    Invalid { key: &'static str, value: String },

    #[error("invalid endpoint URL '{0}'")]
    InvalidUrl(String),
}
