//! AreWeUp - scheduled availability monitoring
//!
//! This library resolves a declarative health check document into probe
//! requests, runs one probe per endpoint concurrently over HTTP, HTTPS, TCP,
//! UDP or ICMP, and reports every outcome to a metrics sink and an alert
//! publisher.

pub mod config;
pub mod error;
pub mod models;
pub mod monitoring;
pub mod reporting;

// Re-export main types
pub use config::resolve;
pub use error::{ConfigParseError, ProbeError, ReportingError};
pub use models::{
    ClientDefaults, EndpointRequest, HealthCheckConfiguration, ProbeKind, ProbeOutcome, Protocol,
    Severity,
};
pub use monitoring::{CheckerSet, DispatchSummary, HealthCheckDispatcher};
pub use reporting::{AlertPublisher, LogAlertPublisher, LogMetricsSink, MetricsSink, ResultReporter};

/// CloudWatch-style namespace every datum is published under
pub const METRIC_NAMESPACE: &str = "AWS/AreWeUp";

/// Default per-probe timeout in milliseconds
pub const DEFAULT_TIMEOUT_MILLIS: u64 = 500;
