use std::time::{Duration, Instant};

use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

use super::checker::{Checker, elapsed_millis, invalid_port_outcome, protocol_mismatch, valid_port};
use crate::error::ProbeError;
use crate::models::{EndpointRequest, ProbeKind, ProbeOutcome};

/// TCP port checker
///
/// The connect, including name resolution, is raced against the request's
/// timeout. Whichever finishes first decides the outcome.
#[derive(Debug, Default)]
pub struct TcpChecker;

impl TcpChecker {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl Checker for TcpChecker {
    async fn check(&self, request: &EndpointRequest) -> Result<ProbeOutcome, ProbeError> {
        let ProbeKind::Tcp(options) = &request.kind else {
            return Err(protocol_mismatch("TCP", request));
        };

        let Some(port) = valid_port(options.port) else {
            return Ok(invalid_port_outcome(request, options.port));
        };

        let deadline = Duration::from_millis(request.timeout_millis);
        let target = &request.target;
        let start = Instant::now();

        let outcome = match timeout(deadline, TcpStream::connect((target.as_str(), port))).await {
            Ok(Ok(_stream)) => {
                let latency = elapsed_millis(start);
                debug!("TCP probe to {target}:{port} connected in {latency}ms");
                ProbeOutcome::up(
                    format!("{target} via TCP on port {port} is up! ({latency}ms latency)"),
                    latency,
                )
            }
            Ok(Err(e)) => {
                debug!("TCP probe to {target}:{port} failed: {e}");
                ProbeOutcome::down(format!("{target} via TCP on port {port} is down! ({e})"))
            }
            Err(_) => {
                debug!("TCP probe to {target}:{port} timed out after {deadline:?}");
                ProbeOutcome::down(format!(
                    "{target} via TCP on port {port} is down! (no connection within {}ms)",
                    request.timeout_millis
                ))
            }
        };

        Ok(outcome)
    }
}
