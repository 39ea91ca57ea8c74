use std::net::IpAddr;
use std::time::Duration;

use surge_ping::{Client, Config, ICMP, PingIdentifier, PingSequence, SurgeError};
use tokio::net::lookup_host;
use tokio::time::timeout;
use tracing::debug;

use super::checker::{Checker, protocol_mismatch};
use crate::error::ProbeError;
use crate::models::{EndpointRequest, ProbeKind, ProbeOutcome};

/// Echo requests never wait longer than this, whatever the endpoint timeout
pub const ICMP_TIMEOUT: Duration = Duration::from_millis(1000);

const ECHO_PAYLOAD: [u8; 32] = [0; 32];

/// ICMP echo checker
#[derive(Debug, Default)]
pub struct IcmpChecker;

impl IcmpChecker {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl Checker for IcmpChecker {
    async fn check(&self, request: &EndpointRequest) -> Result<ProbeOutcome, ProbeError> {
        if !matches!(request.kind, ProbeKind::Icmp) {
            return Err(protocol_mismatch("ICMP", request));
        }

        let target = &request.target;
        let address = match resolve(target).await {
            Ok(address) => address,
            Err(reason) => {
                return Ok(ProbeOutcome::down(format!(
                    "{target} via ICMP could not be resolved: {reason}"
                )));
            }
        };

        let outcome = match ping(address).await {
            Ok(rtt) => {
                let latency = u64::try_from(rtt.as_millis()).unwrap_or(u64::MAX);
                ProbeOutcome::up(format!("{target} via ICMP is up! ({latency}ms latency)"), latency)
            }
            Err(SurgeError::Timeout { .. }) => ProbeOutcome::down(format!(
                "{target} via ICMP is down! (status TimedOut after {}ms)",
                ICMP_TIMEOUT.as_millis()
            )),
            Err(e) => ProbeOutcome::down(format!("{target} via ICMP is down! ({e})")),
        };

        Ok(outcome)
    }
}

async fn resolve(target: &str) -> Result<IpAddr, String> {
    if let Ok(ip) = target.parse::<IpAddr>() {
        return Ok(ip);
    }

    match timeout(ICMP_TIMEOUT, lookup_host((target, 0))).await {
        Ok(Ok(mut addresses)) => addresses
            .next()
            .map(|address| address.ip())
            .ok_or_else(|| format!("no addresses found for {target}")),
        Ok(Err(e)) => Err(e.to_string()),
        Err(_) => Err("name resolution timed out".to_string()),
    }
}

async fn ping(address: IpAddr) -> Result<Duration, SurgeError> {
    let config = match address {
        IpAddr::V4(_) => Config::default(),
        IpAddr::V6(_) => Config::builder().kind(ICMP::V6).build(),
    };

    let client = Client::new(&config)?;
    let mut pinger = client.pinger(address, PingIdentifier(rand::random())).await;
    pinger.timeout(ICMP_TIMEOUT);

    let (_, rtt) = pinger.ping(PingSequence(0), &ECHO_PAYLOAD).await?;
    debug!("ICMP reply from {address} in {rtt:?}");
    Ok(rtt)
}
