use serde::{Deserialize, Serialize};

/// Protocol a health check is performed over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Protocol {
    Http,
    Https,
    Tcp,
    Udp,
    Icmp,
}

impl Protocol {
    pub const ALL: [Protocol; 5] =
        [Protocol::Http, Protocol::Https, Protocol::Tcp, Protocol::Udp, Protocol::Icmp];

    /// Key of this protocol's section in the check document
    pub fn section(self) -> &'static str {
        match self {
            Protocol::Http => "Http",
            Protocol::Https => "Https",
            Protocol::Tcp => "Tcp",
            Protocol::Udp => "Udp",
            Protocol::Icmp => "Icmp",
        }
    }

    /// Look up a protocol from a document section key, ignoring case
    pub fn from_section(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|protocol| protocol.section().eq_ignore_ascii_case(key))
    }

    pub fn is_web(self) -> bool {
        matches!(self, Protocol::Http | Protocol::Https)
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Protocol::Http => write!(f, "HTTP"),
            Protocol::Https => write!(f, "HTTPS"),
            Protocol::Tcp => write!(f, "TCP"),
            Protocol::Udp => write!(f, "UDP"),
            Protocol::Icmp => write!(f, "ICMP"),
        }
    }
}
