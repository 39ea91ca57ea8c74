//! HTTPS checks against a self-signed loopback server.

mod common;

use std::net::SocketAddr;
use std::time::Duration;

use areweup::monitoring::http::{HttpTransport, TransportOptions, WebCall, is_tls_error};
use areweup::monitoring::{Checker, CheckerSet};
use areweup::{ClientDefaults, EndpointRequest, Severity, resolve};
use reqwest::Method;
use serde_json::json;
use url::Url;

fn https_request(address: SocketAddr, path: &str, ignore_tls_errors: bool) -> EndpointRequest {
    let raw = serde_json::to_vec(&json!({
        "Https": [{ "Path": format!("https://{address}{path}"), "IgnoreSslErrors": ignore_tls_errors }]
    }))
    .unwrap();

    resolve(&raw, &ClientDefaults::default()).unwrap().https[0].clone()
}

#[tokio::test]
async fn test_untrusted_certificate_is_down() {
    let _ = tracing_subscriber::fmt::try_init();
    let address = common::spawn_https_server().await;

    let outcome = CheckerSet::new().check(&https_request(address, "/ok", false)).await.unwrap();

    assert!(!outcome.success);
    assert_eq!(outcome.severity, Severity::Error);
    assert_eq!(outcome.latency_millis, None);
    assert!(outcome.message.contains("via HTTPS HEAD failed with an error"), "{}", outcome.message);
}

#[tokio::test]
async fn test_tolerated_certificate_is_retried() {
    let address = common::spawn_https_server().await;

    let outcome = CheckerSet::new().check(&https_request(address, "/ok", true)).await.unwrap();

    assert!(outcome.success, "{}", outcome.message);
    assert!(outcome.latency_millis.is_some());
    assert!(outcome.message.contains("via HTTPS HEAD is up!"));
}

#[tokio::test]
async fn test_tolerated_certificate_still_checks_status() {
    let address = common::spawn_https_server().await;

    let outcome = CheckerSet::new().check(&https_request(address, "/missing", true)).await.unwrap();

    assert!(!outcome.success);
    assert!(outcome.message.contains("received 404 Not Found"), "{}", outcome.message);
}

#[tokio::test]
async fn test_certificate_failure_is_detected() {
    let address = common::spawn_https_server().await;
    let call = WebCall {
        method: Method::GET,
        url: Url::parse(&format!("https://{address}/ok")).unwrap(),
        body: None,
    };
    let options = TransportOptions {
        ignore_tls_errors: false,
        follow_redirects: true,
        timeout: Duration::from_secs(5),
    };
    let transport = HttpTransport::new();

    let error = transport.send(&call, options).await.unwrap_err();
    assert!(is_tls_error(&error), "{error:?}");

    let exchange = transport.send(&call, TransportOptions { ignore_tls_errors: true, ..options }).await.unwrap();
    assert_eq!(exchange.status.as_u16(), 200);
}
