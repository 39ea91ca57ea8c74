//! Probe execution
//!
//! One checker per protocol, a [`CheckerSet`] routing requests between them,
//! and the [`HealthCheckDispatcher`] that runs every endpoint of a
//! configuration concurrently.

pub mod checker;
pub mod dispatcher;
pub mod http;
pub mod icmp;
pub mod tcp;
pub mod udp;

pub use checker::{Checker, CheckerSet};
pub use dispatcher::{DispatchSummary, HealthCheckDispatcher};
pub use http::{HttpChecker, HttpTransport, TransportOptions};
pub use icmp::IcmpChecker;
pub use tcp::TcpChecker;
pub use udp::UdpChecker;
