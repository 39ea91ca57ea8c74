use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use reqwest::header::{HeaderMap, LOCATION};
use reqwest::{Method, StatusCode};
use tracing::debug;
use url::Url;

use super::transport::{Exchange, HttpTransport, TransportOptions, WebCall, error_chain};
use crate::error::ProbeError;
use crate::models::{EndpointRequest, ProbeOutcome, WebOptions};
use crate::monitoring::checker::{Checker, protocol_mismatch};

const DEFAULT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Web checks without their own `Timeout` only get this transport-wide bound
pub const TRANSPORT_DEFAULT_TIMEOUT: Duration = Duration::from_secs(100);

/// HTTP/HTTPS checker
pub struct HttpChecker {
    transport: HttpTransport,
}

impl HttpChecker {
    pub fn new(transport: HttpTransport) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &HttpTransport {
        &self.transport
    }
}

#[async_trait::async_trait]
impl Checker for HttpChecker {
    async fn check(&self, request: &EndpointRequest) -> Result<ProbeOutcome, ProbeError> {
        let Some(web) = request.web() else {
            return Err(protocol_mismatch("HTTP", request));
        };

        let method = Method::from_bytes(web.method.as_bytes()).map_err(|e| ProbeError::InvalidRequest {
            target: request.target.clone(),
            reason: format!("invalid method {}: {e}", web.method),
        })?;

        let label = format!("{} via {} {}", web.url, request.protocol(), web.method);
        let options = TransportOptions {
            ignore_tls_errors: request.ignore_tls_errors(),
            follow_redirects: !web.prevent_redirect,
            timeout: web.timeout_millis.map_or(TRANSPORT_DEFAULT_TIMEOUT, Duration::from_millis),
        };

        Ok(self.probe(&label, web, method, options).await)
    }
}

impl HttpChecker {
    async fn probe(&self, label: &str, web: &WebOptions, method: Method, options: TransportOptions) -> ProbeOutcome {
        let body = web.sends_body().then(|| {
            let content_type =
                if web.content_type.is_empty() { DEFAULT_CONTENT_TYPE } else { web.content_type.as_str() };
            (web.body.clone(), content_type.to_string())
        });
        let call = WebCall { method, url: web.url.clone(), body };

        let mut exchange = match self.transport.send(&call, options).await {
            Ok(exchange) => exchange,
            Err(e) => return ProbeOutcome::down(format!("{label} failed with an error: {}", error_chain(&e))),
        };
        let mut elapsed = exchange.elapsed;

        if web.prevent_redirect && exchange.status.is_redirection() {
            if let Err(reason) = validate_redirect_headers(&exchange.headers, &web.redirect_header_expectations) {
                return ProbeOutcome::down(format!("{label} failed because {reason}"));
            }

            let location = match redirect_location(&exchange) {
                Ok(location) => location,
                Err(reason) => return ProbeOutcome::down(format!("{label} failed because {reason}")),
            };
            debug!("following redirect from {} to {location}", exchange.url);

            let follow = WebCall { method: Method::GET, url: location, body: None };
            let options = TransportOptions { follow_redirects: true, ..options };
            exchange = match self.transport.send(&follow, options).await {
                Ok(exchange) => exchange,
                Err(e) => {
                    return ProbeOutcome::down(format!(
                        "{label} failed with an error following the redirect: {}",
                        error_chain(&e)
                    ));
                }
            };
            elapsed += exchange.elapsed;
        }

        if exchange.status.as_u16() != web.expected_status {
            return ProbeOutcome::down(format!(
                "{label} did not match the expected response of {}: received {}",
                status_text(web.expected_status),
                status_text(exchange.status.as_u16())
            ));
        }

        let missing = missing_cookies(&web.cookies_required, &self.transport.cookie_names(&web.url));
        if !missing.is_empty() {
            return ProbeOutcome::down(format!(
                "{label} failed because the response was missing required cookies {}.",
                missing.join(",")
            ));
        }

        let latency = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        ProbeOutcome::up(format!("{label} is up! ({latency}ms latency)"), latency)
    }
}

/// Check every expected header of a redirect response
///
/// A header may be repeated; the expectation holds when any value equals it.
pub fn validate_redirect_headers(
    headers: &HeaderMap,
    expectations: &BTreeMap<String, String>,
) -> Result<(), String> {
    for (name, expected) in expectations {
        let values: Vec<String> = headers
            .get_all(name.as_str())
            .iter()
            .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
            .collect();

        if values.is_empty() {
            let present: Vec<&str> = headers.keys().map(|key| key.as_str()).collect();
            return Err(format!(
                "the {name} header was not present in the redirect response. The response contained these headers: {}",
                present.join(", ")
            ));
        }

        if values.iter().all(|value| value.is_empty()) {
            return Err(format!("the {name} header did not contain any values."));
        }

        if !values.iter().any(|value| value == expected) {
            return Err(format!(
                "the {name} header did not contain the value {expected}, it contained {}.",
                values.join(",")
            ));
        }
    }

    Ok(())
}

fn redirect_location(exchange: &Exchange) -> Result<Url, String> {
    let Some(location) = exchange.headers.get(LOCATION) else {
        return Err("the redirect response did not contain a Location header.".to_string());
    };

    let location = String::from_utf8_lossy(location.as_bytes());
    exchange
        .url
        .join(&location)
        .map_err(|e| format!("the redirect location {location} is not a valid URL: {e}"))
}

fn missing_cookies(required: &BTreeSet<String>, present: &BTreeSet<String>) -> Vec<String> {
    required.difference(present).cloned().collect()
}

fn status_text(code: u16) -> String {
    match StatusCode::from_u16(code).ok().and_then(|status| status.canonical_reason()) {
        Some(reason) => format!("{code} {reason}"),
        None => code.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use reqwest::header::HeaderValue;

    use super::*;

    fn expectations(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_redirect_headers_match() {
        let mut headers = HeaderMap::new();
        headers.append("x-target", HeaderValue::from_static("blue"));
        headers.append("x-target", HeaderValue::from_static("green"));

        assert!(validate_redirect_headers(&headers, &expectations(&[("X-Target", "green")])).is_ok());
    }

    #[test]
    fn test_redirect_header_missing() {
        let mut headers = HeaderMap::new();
        headers.insert("location", HeaderValue::from_static("/final"));

        let reason = validate_redirect_headers(&headers, &expectations(&[("X-Target", "green")])).unwrap_err();
        assert!(reason.contains("X-Target header was not present"));
        assert!(reason.contains("location"));
    }

    #[test]
    fn test_redirect_header_empty() {
        let mut headers = HeaderMap::new();
        headers.insert("x-target", HeaderValue::from_static(""));

        let reason = validate_redirect_headers(&headers, &expectations(&[("X-Target", "green")])).unwrap_err();
        assert!(reason.contains("did not contain any values"));
    }

    #[test]
    fn test_redirect_header_mismatch() {
        let mut headers = HeaderMap::new();
        headers.insert("x-target", HeaderValue::from_static("blue"));

        let reason = validate_redirect_headers(&headers, &expectations(&[("X-Target", "green")])).unwrap_err();
        assert_eq!(reason, "the X-Target header did not contain the value green, it contained blue.");
    }

    #[test]
    fn test_location_resolves_against_response_url() {
        let mut headers = HeaderMap::new();
        headers.insert(LOCATION, HeaderValue::from_static("/final?step=2"));
        let exchange = Exchange {
            status: StatusCode::FOUND,
            headers,
            url: Url::parse("http://127.0.0.1:8080/redirect").unwrap(),
            elapsed: Duration::ZERO,
        };

        assert_eq!(redirect_location(&exchange).unwrap().as_str(), "http://127.0.0.1:8080/final?step=2");
    }

    #[test]
    fn test_missing_cookies_listed_in_order() {
        let required = BTreeSet::from(["b".to_string(), "a".to_string(), "c".to_string()]);
        let present = BTreeSet::from(["b".to_string()]);

        assert_eq!(missing_cookies(&required, &present), vec!["a", "c"]);
    }

    #[test]
    fn test_status_text() {
        assert_eq!(status_text(404), "404 Not Found");
        assert_eq!(status_text(299), "299");
    }
}
