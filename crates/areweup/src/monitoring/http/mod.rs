//! HTTP and HTTPS checks.

mod check;
mod transport;

pub use check::{HttpChecker, TRANSPORT_DEFAULT_TIMEOUT};
pub use transport::{Exchange, HttpTransport, TransportOptions, USER_AGENT, WebCall, error_chain, is_tls_error};
