use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, error, info};

use super::checker::{Checker, CheckerSet};
use crate::models::{EndpointRequest, HealthCheckConfiguration, ProbeOutcome};
use crate::reporting::ResultReporter;

/// Tally of one invocation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchSummary {
    pub total: usize,
    pub up: usize,
    pub down: usize,
}

impl DispatchSummary {
    fn record(&mut self, success: bool) {
        self.total += 1;
        if success {
            self.up += 1;
        } else {
            self.down += 1;
        }
    }
}

/// Fans a configuration out to one probe task per endpoint
pub struct HealthCheckDispatcher {
    checker: Arc<dyn Checker>,
    reporter: Arc<ResultReporter>,
}

impl HealthCheckDispatcher {
    pub fn new(checker: Arc<dyn Checker>, reporter: Arc<ResultReporter>) -> Self {
        Self { checker, reporter }
    }

    /// Dispatcher with the protocol checkers and a log-only reporter
    pub fn logging() -> Self {
        Self::new(Arc::new(CheckerSet::new()), Arc::new(ResultReporter::logging()))
    }

    /// Probe every endpoint concurrently and report each outcome
    ///
    /// Always returns after every probe has finished. A failing or panicking
    /// checker or reporter only affects its own endpoint.
    pub async fn execute(&self, config: &HealthCheckConfiguration) -> DispatchSummary {
        match serde_json::to_string(config) {
            Ok(json) => debug!("Resolved configuration: {json}"),
            Err(_) => debug!("Resolved configuration: {config:?}"),
        }
        info!("Running {} health checks", config.len());

        let probes = config.requests().cloned().map(|request| self.probe(request));
        let results = join_all(probes).await;

        let mut summary = DispatchSummary::default();
        for success in results {
            summary.record(success);
        }

        summary
    }

    async fn probe(&self, request: EndpointRequest) -> bool {
        let request = Arc::new(request);
        let checker = Arc::clone(&self.checker);
        let task_request = Arc::clone(&request);

        let handle = tokio::spawn(async move { checker.check(&task_request).await });

        let outcome = match handle.await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => ProbeOutcome::down(format!(
                "The {} health check for {} failed: {e}",
                request.protocol(),
                request.target
            )),
            Err(e) => ProbeOutcome::down(format!(
                "The {} health check for {} failed unexpectedly: {e}",
                request.protocol(),
                request.target
            )),
        };

        let success = outcome.success;
        let target = request.target.clone();
        let reporter = Arc::clone(&self.reporter);
        let reported = tokio::spawn(async move { reporter.report(&request, &outcome).await });
        if let Err(e) = reported.await {
            error!("Reporting the health check for {target} failed unexpectedly: {e}");
        }

        success
    }
}
