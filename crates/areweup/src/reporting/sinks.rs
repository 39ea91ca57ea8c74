use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::ReportingError;
use crate::models::Protocol;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MetricName {
    Availability,
    Latency,
}

impl MetricName {
    pub fn as_str(self) -> &'static str {
        match self {
            MetricName::Availability => "Availability",
            MetricName::Latency => "Latency",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MetricUnit {
    Count,
    Milliseconds,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct MetricDimensions {
    pub path: String,
    pub customer_id: String,
    pub protocol: Protocol,
}

/// A single datapoint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricDatum {
    pub namespace: &'static str,
    pub name: MetricName,
    pub value: f64,
    pub unit: MetricUnit,
    pub dimensions: MetricDimensions,
    pub timestamp: DateTime<Utc>,
}

/// Failure notification for a topic
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alert {
    pub topic: String,
    pub subject: Option<String>,
    pub body: String,
}

/// Destination for metric datapoints
#[async_trait::async_trait]
pub trait MetricsSink: Send + Sync {
    async fn put_metric(&self, datum: MetricDatum) -> Result<(), ReportingError>;
}

/// Destination for failure alerts
#[async_trait::async_trait]
pub trait AlertPublisher: Send + Sync {
    async fn publish(&self, alert: Alert) -> Result<(), ReportingError>;
}

/// Writes every datum as a structured tracing event
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMetricsSink;

#[async_trait::async_trait]
impl MetricsSink for LogMetricsSink {
    async fn put_metric(&self, datum: MetricDatum) -> Result<(), ReportingError> {
        info!(
            target: "areweup::metrics",
            namespace = datum.namespace,
            metric = datum.name.as_str(),
            value = datum.value,
            unit = ?datum.unit,
            path = %datum.dimensions.path,
            customer_id = %datum.dimensions.customer_id,
            protocol = %datum.dimensions.protocol,
            timestamp = %datum.timestamp.to_rfc3339(),
            "metric datum"
        );
        Ok(())
    }
}

/// Writes every alert as a structured tracing event
#[derive(Debug, Default, Clone, Copy)]
pub struct LogAlertPublisher;

#[async_trait::async_trait]
impl AlertPublisher for LogAlertPublisher {
    async fn publish(&self, alert: Alert) -> Result<(), ReportingError> {
        warn!(
            target: "areweup::alerts",
            topic = %alert.topic,
            subject = alert.subject.as_deref().unwrap_or_default(),
            "{}",
            alert.body
        );
        Ok(())
    }
}
