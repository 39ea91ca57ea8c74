//! Delivery of probe outcomes to logs, metrics and alerts.

pub mod reporter;
pub mod sinks;

pub use reporter::ResultReporter;
pub use sinks::{
    Alert, AlertPublisher, LogAlertPublisher, LogMetricsSink, MetricDatum, MetricDimensions, MetricName, MetricUnit,
    MetricsSink,
};
