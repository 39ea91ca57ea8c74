use serde::Serialize;

/// How loudly an outcome should be logged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "INFO"),
            Severity::Warning => write!(f, "WARNING"),
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

/// Verdict of a single probe
///
/// `latency_millis` is only ever set on a successful outcome; elapsed time on
/// a failed attempt is not an availability signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeOutcome {
    pub success: bool,
    pub severity: Severity,
    pub message: String,
    pub latency_millis: Option<u64>,
}

impl ProbeOutcome {
    /// The endpoint answered
    pub fn up(message: impl Into<String>, latency_millis: u64) -> Self {
        Self {
            success: true,
            severity: Severity::Info,
            message: message.into(),
            latency_millis: Some(latency_millis),
        }
    }

    /// The endpoint was reachable but the answer counts as down
    pub fn warning(message: impl Into<String>) -> Self {
        Self { success: false, severity: Severity::Warning, message: message.into(), latency_millis: None }
    }

    /// The endpoint is down or the probe itself failed
    pub fn down(message: impl Into<String>) -> Self {
        Self { success: false, severity: Severity::Error, message: message.into(), latency_millis: None }
    }
}

impl std::fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] : {}", self.severity, self.message)
    }
}
