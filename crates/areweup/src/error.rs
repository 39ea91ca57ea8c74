use thiserror::Error;

use crate::models::Protocol;

/// The check document could not be turned into a configuration.
///
/// This is the only error that aborts an invocation.
#[derive(Debug, Error)]
pub enum ConfigParseError {
    #[error("Health check document is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Health check document must be a JSON object")]
    NotAnObject,

    #[error("Section {section} must be an array of endpoint objects")]
    SectionNotArray { section: String },

    #[error("{section}[{index}] must be a JSON object")]
    EntryNotObject { section: String, index: usize },

    #[error("{section}[{index}] is missing required field {field}")]
    MissingField { section: String, index: usize, field: &'static str },

    #[error("{section}[{index}] has an invalid {field}: {reason}")]
    InvalidField { section: String, index: usize, field: &'static str, reason: String },
}

/// A checker was called in a way its contract does not allow.
///
/// Network failures never surface as this type; they become failing outcomes.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("The {checker} checker cannot probe a {protocol} request")]
    ProtocolMismatch { checker: &'static str, protocol: Protocol },

    #[error("Invalid request for {target}: {reason}")]
    InvalidRequest { target: String, reason: String },
}

/// A metric or alert could not be delivered.
#[derive(Debug, Error)]
pub enum ReportingError {
    #[error("Metric {metric} publish failed: {reason}")]
    Metric { metric: &'static str, reason: String },

    #[error("Alert publish to {topic} failed: {reason}")]
    Alert { topic: String, reason: String },
}
