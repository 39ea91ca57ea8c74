use serde::{Deserialize, Serialize};

use crate::DEFAULT_TIMEOUT_MILLIS;

/// Values the resolver fills into endpoints that omit them.
///
/// Built once by the entry point from its bootstrap settings; the library
/// never reads the environment itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientDefaults {
    pub customer_id: String,
    pub send_metric: bool,
    pub ignore_tls_errors: bool,
    pub timeout_millis: u64,
    pub alert_topic: String,
    pub alert_subject: String,
}

impl Default for ClientDefaults {
    fn default() -> Self {
        Self {
            customer_id: String::new(),
            send_metric: false,
            ignore_tls_errors: false,
            timeout_millis: DEFAULT_TIMEOUT_MILLIS,
            alert_topic: String::new(),
            alert_subject: String::new(),
        }
    }
}
