use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use url::Url;

use super::Protocol;

/// A resolved endpoint check, ready to probe.
///
/// Requests are built fresh per invocation and never mutated, so they can be
/// probed concurrently without synchronization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointRequest {
    /// Host, IP address or URL being checked
    pub target: String,

    /// Customer the metric datapoints are attributed to
    pub customer_id: Option<String>,

    /// Whether availability and latency datapoints are emitted
    pub send_metric: bool,

    /// Topic alerts are published to on failure
    pub alert_topic: String,

    /// Alert subject line, empty for none
    pub alert_subject: String,

    /// Probe deadline in milliseconds
    pub timeout_millis: u64,

    /// Protocol specific settings
    pub kind: ProbeKind,
}

/// Protocol specific part of a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "protocol", rename_all = "UPPERCASE")]
pub enum ProbeKind {
    Http(WebOptions),
    Https {
        web: WebOptions,
        ignore_tls_errors: bool,
    },
    Tcp(NetworkOptions),
    Udp(UdpOptions),
    Icmp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkOptions {
    pub port: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UdpOptions {
    pub port: i32,
    pub payload: Vec<u8>,
    pub receive_buffer_size: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebOptions {
    /// Absolute URL derived from the target
    pub url: Url,
    /// Upper-cased HTTP method
    pub method: String,
    pub body: String,
    pub content_type: String,
    pub prevent_redirect: bool,
    pub redirect_header_expectations: BTreeMap<String, String>,
    pub cookies_required: BTreeSet<String>,
    pub expected_status: u16,
    /// Timeout the endpoint itself asked for, in milliseconds
    ///
    /// Web checks otherwise run with the transport default rather than the
    /// invocation-wide default timeout.
    pub timeout_millis: Option<u64>,
}

impl WebOptions {
    /// Whether the body should be sent with this method
    pub fn sends_body(&self) -> bool {
        !self.body.is_empty() && matches!(self.method.as_str(), "POST" | "PUT" | "PATCH")
    }
}

impl EndpointRequest {
    pub fn protocol(&self) -> Protocol {
        match self.kind {
            ProbeKind::Http(_) => Protocol::Http,
            ProbeKind::Https { .. } => Protocol::Https,
            ProbeKind::Tcp(_) => Protocol::Tcp,
            ProbeKind::Udp(_) => Protocol::Udp,
            ProbeKind::Icmp => Protocol::Icmp,
        }
    }

    pub fn web(&self) -> Option<&WebOptions> {
        match &self.kind {
            ProbeKind::Http(web) | ProbeKind::Https { web, .. } => Some(web),
            _ => None,
        }
    }

    /// Only HTTPS requests can tolerate certificate errors
    pub fn ignore_tls_errors(&self) -> bool {
        matches!(self.kind, ProbeKind::Https { ignore_tls_errors: true, .. })
    }

    /// `Path` dimension of the metric datapoints.
    ///
    /// Web requests drop the scheme since the protocol is its own dimension.
    pub fn metric_path(&self) -> String {
        match self.web() {
            Some(web) => {
                let host = web.url.host_str().unwrap_or_default();
                let query = web.url.query().map(|query| format!("?{query}")).unwrap_or_default();
                format!("{host}{}{query}", web.url.path())
            }
            None => self.target.clone(),
        }
    }

    pub fn customer_id(&self) -> &str {
        self.customer_id.as_deref().unwrap_or_default()
    }
}
