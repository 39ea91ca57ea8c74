//! Data model shared by the resolver, the checkers and the reporter.

pub mod configuration;
pub mod defaults;
pub mod outcome;
pub mod protocol;
pub mod request;

pub use configuration::HealthCheckConfiguration;
pub use defaults::ClientDefaults;
pub use outcome::{ProbeOutcome, Severity};
pub use protocol::Protocol;
pub use request::{EndpointRequest, NetworkOptions, ProbeKind, UdpOptions, WebOptions};
