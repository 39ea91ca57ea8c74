use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Could not determine a config directory, set XDG_CONFIG_HOME or HOME")]
    ConfigPathUnavailable,

    #[error("Failed to read {}: {source}", path.display())]
    ReadFailed { path: PathBuf, source: std::io::Error },

    #[error("Failed to parse {}: {source}", path.display())]
    ParseFailed { path: PathBuf, source: toml::de::Error },

    #[error("Failed to serialize settings: {0}")]
    SerializeFailed(#[from] toml::ser::Error),

    #[error("Failed to write {}: {source}", path.display())]
    WriteFailed { path: PathBuf, source: std::io::Error },

    #[error("An alert topic is required, set SNSTopic or defaults.alert_topic")]
    MissingAlertTopic,

    #[error("A customer id is required when metrics are sent, set CustomerId or defaults.customer_id")]
    MissingCustomerId,
}
