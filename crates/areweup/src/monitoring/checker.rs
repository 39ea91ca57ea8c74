use std::time::Instant;

use crate::error::ProbeError;
use crate::models::{EndpointRequest, ProbeOutcome, Protocol};

use super::http::{HttpChecker, HttpTransport};
use super::icmp::IcmpChecker;
use super::tcp::TcpChecker;
use super::udp::UdpChecker;

/// Checker trait for the different protocols
///
/// Implementations turn every network level problem into a failing
/// [`ProbeOutcome`]. An `Err` means the checker was used against its
/// contract, e.g. handed a request of another protocol.
#[async_trait::async_trait]
pub trait Checker: Send + Sync {
    /// Probe the endpoint described by `request`
    async fn check(&self, request: &EndpointRequest) -> Result<ProbeOutcome, ProbeError>;
}

/// Routes each request to the checker for its protocol
pub struct CheckerSet {
    http: HttpChecker,
    tcp: TcpChecker,
    udp: UdpChecker,
    icmp: IcmpChecker,
}

impl CheckerSet {
    /// Create a checker set with a fresh cookie jar
    pub fn new() -> Self {
        Self::with_transport(HttpTransport::new())
    }

    /// Create a checker set whose web checks share `transport`
    pub fn with_transport(transport: HttpTransport) -> Self {
        Self {
            http: HttpChecker::new(transport),
            tcp: TcpChecker::new(),
            udp: UdpChecker::new(),
            icmp: IcmpChecker::new(),
        }
    }

    pub fn http_transport(&self) -> &HttpTransport {
        self.http.transport()
    }
}

impl Default for CheckerSet {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Checker for CheckerSet {
    async fn check(&self, request: &EndpointRequest) -> Result<ProbeOutcome, ProbeError> {
        let checker: &dyn Checker = match request.protocol() {
            Protocol::Http | Protocol::Https => &self.http,
            Protocol::Tcp => &self.tcp,
            Protocol::Udp => &self.udp,
            Protocol::Icmp => &self.icmp,
        };

        checker.check(request).await
    }
}

pub(crate) fn protocol_mismatch(checker: &'static str, request: &EndpointRequest) -> ProbeError {
    ProbeError::ProtocolMismatch { checker, protocol: request.protocol() }
}

/// A usable TCP/UDP port, if `port` is one
pub(crate) fn valid_port(port: i32) -> Option<u16> {
    u16::try_from(port).ok().filter(|port| *port > 0)
}

/// Outcome for a TCP/UDP request that resolved with an unusable port
pub(crate) fn invalid_port_outcome(request: &EndpointRequest, port: i32) -> ProbeOutcome {
    ProbeOutcome::down(format!(
        "The {} health check for {} was not configured with a valid port: {port}.",
        request.protocol(),
        request.target
    ))
}

pub(crate) fn elapsed_millis(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}
