//! UDP reachability checks.
//!
//! UDP health is ambiguous: a silent listener and no listener at all look the
//! same from the sender. The socket error classification below is a fixed
//! heuristic that leans towards reporting the host as up.

use std::io;
use std::net::{IpAddr, SocketAddr};
use std::time::{Duration, Instant};

use tokio::net::{UdpSocket, lookup_host};
use tokio::time::timeout_at;
use tracing::debug;

use super::checker::{Checker, elapsed_millis, invalid_port_outcome, protocol_mismatch, valid_port};
use crate::error::ProbeError;
use crate::models::{EndpointRequest, ProbeKind, ProbeOutcome, UdpOptions};

/// Socket level status of a failed send or receive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketStatus {
    ConnectionReset,
    TimedOut,
    AccessDenied,
    AlreadyConnected,
    IoPending,
    ConnectionRefused,
    Other,
}

/// How a socket status is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UdpVerdict {
    /// The host answered at the network level, count it as up
    Reachable,
    /// The port explicitly rejected the datagram
    Rejected,
    /// Anything else
    Failed,
}

impl SocketStatus {
    pub fn from_io(error: &io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::ConnectionReset => return SocketStatus::ConnectionReset,
            io::ErrorKind::TimedOut => return SocketStatus::TimedOut,
            io::ErrorKind::PermissionDenied => return SocketStatus::AccessDenied,
            io::ErrorKind::ConnectionRefused => return SocketStatus::ConnectionRefused,
            io::ErrorKind::WouldBlock => return SocketStatus::IoPending,
            _ => {}
        }

        match error.raw_os_error() {
            Some(code) if code == libc::EISCONN => SocketStatus::AlreadyConnected,
            Some(code) if code == libc::EINPROGRESS || code == libc::EALREADY => {
                SocketStatus::IoPending
            }
            Some(code) if code == libc::EACCES || code == libc::EPERM => SocketStatus::AccessDenied,
            _ => SocketStatus::Other,
        }
    }

    /// Access denied sits in the reachable set: a firewall answering for the
    /// host still proves the host exists.
    pub fn verdict(self) -> UdpVerdict {
        match self {
            SocketStatus::ConnectionReset
            | SocketStatus::TimedOut
            | SocketStatus::AccessDenied
            | SocketStatus::AlreadyConnected
            | SocketStatus::IoPending => UdpVerdict::Reachable,
            SocketStatus::ConnectionRefused => UdpVerdict::Rejected,
            SocketStatus::Other => UdpVerdict::Failed,
        }
    }
}

impl std::fmt::Display for SocketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SocketStatus::ConnectionReset => "ConnectionReset",
            SocketStatus::TimedOut => "TimedOut",
            SocketStatus::AccessDenied => "AccessDenied",
            SocketStatus::AlreadyConnected => "IsConnected",
            SocketStatus::IoPending => "IOPending",
            SocketStatus::ConnectionRefused => "ConnectionRefused",
            SocketStatus::Other => "Other",
        };
        write!(f, "{name}")
    }
}

/// Why an exchange produced no datagram
#[derive(Debug)]
enum ExchangeError {
    Resolve(io::Error),
    Socket(io::Error),
}

/// UDP checker
#[derive(Debug, Default)]
pub struct UdpChecker;

impl UdpChecker {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl Checker for UdpChecker {
    async fn check(&self, request: &EndpointRequest) -> Result<ProbeOutcome, ProbeError> {
        let ProbeKind::Udp(options) = &request.kind else {
            return Err(protocol_mismatch("UDP", request));
        };

        let Some(port) = valid_port(options.port) else {
            return Ok(invalid_port_outcome(request, options.port));
        };

        let target = &request.target;
        let deadline = Duration::from_millis(request.timeout_millis);
        let start = Instant::now();

        let outcome = match exchange(target, port, options, deadline).await {
            Ok(0) => ProbeOutcome::warning(format!(
                "{target} via UDP on port {port} received a zero byte response, this is being treated as down."
            )),
            Ok(received) => {
                let latency = elapsed_millis(start);
                debug!("UDP probe to {target}:{port} received {received} bytes");
                ProbeOutcome::up(
                    format!("{target} via UDP on port {port} is up! ({latency}ms latency)"),
                    latency,
                )
            }
            Err(ExchangeError::Resolve(e)) => ProbeOutcome::down(format!(
                "{target} via UDP on port {port} could not be resolved: {e}"
            )),
            Err(ExchangeError::Socket(e)) => classify(target, port, &e, elapsed_millis(start)),
        };

        Ok(outcome)
    }
}

/// Turn a socket error into an outcome
pub fn classify(target: &str, port: u16, error: &io::Error, latency: u64) -> ProbeOutcome {
    let status = SocketStatus::from_io(error);
    debug!("UDP probe to {target}:{port} ended with {status}: {error}");

    match status.verdict() {
        UdpVerdict::Reachable => ProbeOutcome::up(
            format!(
                "{target} via UDP on port {port} had status {status}, this is being treated as a success."
            ),
            latency,
        ),
        UdpVerdict::Rejected => ProbeOutcome::warning(format!(
            "{target} via UDP on port {port} was reachable, but the port could not be connected to. This is being treated as a failure."
        )),
        UdpVerdict::Failed => ProbeOutcome::down(format!(
            "{target} via UDP on port {port} failed with an error: {error}"
        )),
    }
}

async fn resolve(target: &str, port: u16) -> Result<SocketAddr, io::Error> {
    if let Ok(ip) = target.parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, port));
    }

    lookup_host((target, port)).await?.next().ok_or_else(|| {
        io::Error::new(io::ErrorKind::NotFound, format!("no addresses found for {target}"))
    })
}

/// Send the payload and wait for one datagram, returning its size
///
/// Name resolution and the receive share one deadline.
async fn exchange(
    target: &str,
    port: u16,
    options: &UdpOptions,
    deadline: Duration,
) -> Result<usize, ExchangeError> {
    let expires = tokio::time::Instant::now() + deadline;

    let address = match timeout_at(expires, resolve(target, port)).await {
        Ok(resolved) => resolved.map_err(ExchangeError::Resolve)?,
        Err(_) => {
            return Err(ExchangeError::Resolve(io::Error::new(
                io::ErrorKind::TimedOut,
                "name resolution timed out",
            )));
        }
    };

    let local: SocketAddr = if address.is_ipv4() {
        SocketAddr::from(([0, 0, 0, 0], 0))
    } else {
        SocketAddr::from(([0u16; 8], 0))
    };

    let socket = UdpSocket::bind(local).await.map_err(ExchangeError::Socket)?;
    socket.connect(address).await.map_err(ExchangeError::Socket)?;
    socket.send(&options.payload).await.map_err(ExchangeError::Socket)?;

    let mut buffer = vec![0u8; options.receive_buffer_size];
    match timeout_at(expires, socket.recv(&mut buffer)).await {
        Ok(received) => received.map_err(ExchangeError::Socket),
        Err(_) => Err(ExchangeError::Socket(io::Error::new(
            io::ErrorKind::TimedOut,
            "no datagram received before the deadline",
        ))),
    }
}
