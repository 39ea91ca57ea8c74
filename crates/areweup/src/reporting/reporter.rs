use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use super::sinks::{
    Alert, AlertPublisher, LogAlertPublisher, LogMetricsSink, MetricDatum, MetricDimensions, MetricName, MetricUnit,
    MetricsSink,
};
use crate::METRIC_NAMESPACE;
use crate::models::{EndpointRequest, ProbeOutcome, Severity};

/// Logs, measures and alerts on every probe outcome
///
/// Reporting never fails the invocation: sink and publisher errors are logged
/// and dropped.
pub struct ResultReporter {
    metrics: Arc<dyn MetricsSink>,
    alerts: Arc<dyn AlertPublisher>,
}

impl ResultReporter {
    pub fn new(metrics: Arc<dyn MetricsSink>, alerts: Arc<dyn AlertPublisher>) -> Self {
        Self { metrics, alerts }
    }

    /// Reporter that only writes tracing events
    pub fn logging() -> Self {
        Self::new(Arc::new(LogMetricsSink), Arc::new(LogAlertPublisher))
    }

    pub async fn report(&self, request: &EndpointRequest, outcome: &ProbeOutcome) {
        match outcome.severity {
            Severity::Info => info!("{outcome}"),
            Severity::Warning => warn!("{outcome}"),
            Severity::Error => error!("{outcome}"),
        }

        if request.send_metric {
            for datum in metric_data(request, outcome, Utc::now()) {
                let name = datum.name.as_str();
                if let Err(e) = self.metrics.put_metric(datum).await {
                    error!("Failed to send {name} metric for {}: {e}", request.target);
                }
            }
        }

        if !outcome.success {
            self.alert(request, outcome).await;
        }
    }

    async fn alert(&self, request: &EndpointRequest, outcome: &ProbeOutcome) {
        if request.alert_topic.is_empty() {
            warn!("No alert topic configured for {}, skipping notification", request.target);
            return;
        }

        let alert = Alert {
            topic: request.alert_topic.clone(),
            subject: (!request.alert_subject.is_empty()).then(|| request.alert_subject.clone()),
            body: outcome.to_string(),
        };

        if let Err(e) = self.alerts.publish(alert).await {
            error!("Failed to publish alert for {}: {e}", request.target);
        }
    }
}

/// Datapoints for one outcome: availability always, latency when measured
pub fn metric_data(request: &EndpointRequest, outcome: &ProbeOutcome, timestamp: DateTime<Utc>) -> Vec<MetricDatum> {
    let dimensions = MetricDimensions {
        path: request.metric_path(),
        customer_id: request.customer_id().to_string(),
        protocol: request.protocol(),
    };

    let mut data = vec![MetricDatum {
        namespace: METRIC_NAMESPACE,
        name: MetricName::Availability,
        value: if outcome.success { 1.0 } else { 0.0 },
        unit: MetricUnit::Count,
        dimensions: dimensions.clone(),
        timestamp,
    }];

    if let Some(latency) = outcome.latency_millis {
        data.push(MetricDatum {
            namespace: METRIC_NAMESPACE,
            name: MetricName::Latency,
            value: latency as f64,
            unit: MetricUnit::Milliseconds,
            dimensions,
            timestamp,
        });
    }

    data
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::error::ReportingError;
    use crate::models::{NetworkOptions, ProbeKind, Protocol};

    #[derive(Default)]
    struct Recorder {
        metrics: Mutex<Vec<MetricDatum>>,
        alerts: Mutex<Vec<Alert>>,
    }

    #[async_trait::async_trait]
    impl MetricsSink for Recorder {
        async fn put_metric(&self, datum: MetricDatum) -> Result<(), ReportingError> {
            self.metrics.lock().unwrap().push(datum);
            Ok(())
        }
    }

    #[async_trait::async_trait]
    impl AlertPublisher for Recorder {
        async fn publish(&self, alert: Alert) -> Result<(), ReportingError> {
            self.alerts.lock().unwrap().push(alert);
            Ok(())
        }
    }

    struct Broken;

    #[async_trait::async_trait]
    impl MetricsSink for Broken {
        async fn put_metric(&self, datum: MetricDatum) -> Result<(), ReportingError> {
            Err(ReportingError::Metric { metric: datum.name.as_str(), reason: "throttled".to_string() })
        }
    }

    #[async_trait::async_trait]
    impl AlertPublisher for Broken {
        async fn publish(&self, alert: Alert) -> Result<(), ReportingError> {
            Err(ReportingError::Alert { topic: alert.topic, reason: "not found".to_string() })
        }
    }

    fn tcp_request(send_metric: bool) -> EndpointRequest {
        EndpointRequest {
            target: "db.internal".to_string(),
            customer_id: Some("acme".to_string()),
            send_metric,
            alert_topic: "arn:aws:sns:us-east-1:123456789012:alerts".to_string(),
            alert_subject: "Endpoint down".to_string(),
            timeout_millis: 500,
            kind: ProbeKind::Tcp(NetworkOptions { port: 5432 }),
        }
    }

    fn recording() -> (Arc<Recorder>, ResultReporter) {
        let recorder = Arc::new(Recorder::default());
        let reporter = ResultReporter::new(recorder.clone(), recorder.clone());
        (recorder, reporter)
    }

    #[test]
    fn test_metric_data_for_success() {
        let now = Utc::now();
        let data = metric_data(&tcp_request(true), &ProbeOutcome::up("up", 42), now);

        assert_eq!(data.len(), 2);
        assert_eq!(data[0].name, MetricName::Availability);
        assert_eq!(data[0].value, 1.0);
        assert_eq!(data[0].unit, MetricUnit::Count);
        assert_eq!(data[1].name, MetricName::Latency);
        assert_eq!(data[1].value, 42.0);
        assert_eq!(data[1].unit, MetricUnit::Milliseconds);

        for datum in &data {
            assert_eq!(datum.namespace, "AWS/AreWeUp");
            assert_eq!(datum.timestamp, now);
            assert_eq!(datum.dimensions.path, "db.internal");
            assert_eq!(datum.dimensions.customer_id, "acme");
            assert_eq!(datum.dimensions.protocol, Protocol::Tcp);
        }
    }

    #[test]
    fn test_metric_data_for_failure_has_no_latency() {
        let data = metric_data(&tcp_request(true), &ProbeOutcome::down("down"), Utc::now());

        assert_eq!(data.len(), 1);
        assert_eq!(data[0].value, 0.0);
    }

    #[tokio::test]
    async fn test_success_without_metrics_is_silent() {
        let (recorder, reporter) = recording();
        reporter.report(&tcp_request(false), &ProbeOutcome::up("up", 5)).await;

        assert!(recorder.metrics.lock().unwrap().is_empty());
        assert!(recorder.alerts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failure_publishes_alert() {
        let (recorder, reporter) = recording();
        let outcome = ProbeOutcome::down("db.internal via TCP on port 5432 is down!");
        reporter.report(&tcp_request(true), &outcome).await;

        let alerts = recorder.alerts.lock().unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].topic, "arn:aws:sns:us-east-1:123456789012:alerts");
        assert_eq!(alerts[0].subject.as_deref(), Some("Endpoint down"));
        assert_eq!(alerts[0].body, "[ERROR] : db.internal via TCP on port 5432 is down!");
        assert_eq!(recorder.metrics.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_subject_is_omitted() {
        let (recorder, reporter) = recording();
        let mut request = tcp_request(false);
        request.alert_subject.clear();
        reporter.report(&request, &ProbeOutcome::warning("empty reply")).await;

        assert_eq!(recorder.alerts.lock().unwrap()[0].subject, None);
    }

    #[tokio::test]
    async fn test_empty_topic_skips_alert() {
        let (recorder, reporter) = recording();
        let mut request = tcp_request(false);
        request.alert_topic.clear();
        reporter.report(&request, &ProbeOutcome::down("down")).await;

        assert!(recorder.alerts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sink_errors_are_swallowed() {
        let reporter = ResultReporter::new(Arc::new(Broken), Arc::new(Broken));

        reporter.report(&tcp_request(true), &ProbeOutcome::down("down")).await;
        reporter.report(&tcp_request(true), &ProbeOutcome::up("up", 1)).await;
    }
}
