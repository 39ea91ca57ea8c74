use serde::Serialize;

use super::{EndpointRequest, Protocol};

/// Fully resolved checks for one invocation, one ordered list per protocol
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HealthCheckConfiguration {
    pub http: Vec<EndpointRequest>,
    pub https: Vec<EndpointRequest>,
    pub tcp: Vec<EndpointRequest>,
    pub udp: Vec<EndpointRequest>,
    pub icmp: Vec<EndpointRequest>,
}

impl HealthCheckConfiguration {
    pub fn section(&self, protocol: Protocol) -> &[EndpointRequest] {
        match protocol {
            Protocol::Http => &self.http,
            Protocol::Https => &self.https,
            Protocol::Tcp => &self.tcp,
            Protocol::Udp => &self.udp,
            Protocol::Icmp => &self.icmp,
        }
    }

    pub(crate) fn section_mut(&mut self, protocol: Protocol) -> &mut Vec<EndpointRequest> {
        match protocol {
            Protocol::Http => &mut self.http,
            Protocol::Https => &mut self.https,
            Protocol::Tcp => &mut self.tcp,
            Protocol::Udp => &mut self.udp,
            Protocol::Icmp => &mut self.icmp,
        }
    }

    /// Every request across all sections, in section order
    pub fn requests(&self) -> impl Iterator<Item = &EndpointRequest> {
        Protocol::ALL.into_iter().flat_map(move |protocol| self.section(protocol).iter())
    }

    pub fn len(&self) -> usize {
        Protocol::ALL.into_iter().map(|protocol| self.section(protocol).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
