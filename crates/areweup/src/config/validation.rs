//! Parse-time validation of endpoint targets and web settings.
//!
//! Failures are returned as plain reasons; the resolver attaches the section,
//! index and field they belong to.

use reqwest::{Method, StatusCode, header::HeaderName};
use url::Url;

use crate::models::Protocol;

/// Build the absolute URL of a web endpoint.
///
/// A target without a scheme gets the protocol's scheme prefixed. An explicit
/// port is applied when the URL carries none and it is not the scheme default.
pub fn web_url(protocol: Protocol, target: &str, port: Option<u16>) -> Result<Url, String> {
    let target = target.trim();
    if target.is_empty() {
        return Err("Target cannot be empty".to_string());
    }

    let scheme = match protocol {
        Protocol::Http => "http",
        Protocol::Https => "https",
        other => return Err(format!("{other} is not a web protocol")),
    };

    let candidate =
        if target.contains("://") { target.to_string() } else { format!("{scheme}://{target}") };

    let mut url = Url::parse(&candidate).map_err(|e| format!("Invalid URL: {e}"))?;

    if !url.scheme().eq_ignore_ascii_case(scheme) {
        return Err(format!("Invalid scheme '{}'. Must be {scheme}", url.scheme()));
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err("URL must have a valid host".to_string());
    }

    if let Some(port) = port {
        if url.port().is_none() && Some(port) != url.port_or_known_default() {
            url.set_port(Some(port)).map_err(|_| format!("Cannot apply port {port} to {url}"))?;
        }
    }

    Ok(url)
}

/// Validate port is in valid range
pub fn validate_port(port: i64) -> Result<u16, String> {
    match u16::try_from(port) {
        Ok(port) if port > 0 => Ok(port),
        _ => Err(format!("Port must be between 1 and 65535, got {port}")),
    }
}

/// Validate an HTTP method name and return it upper-cased
pub fn validate_method(method: &str) -> Result<String, String> {
    let method = method.trim().to_ascii_uppercase();
    if method.is_empty() {
        return Err("Method cannot be empty".to_string());
    }
    Method::from_bytes(method.as_bytes())
        .map(|_| method.clone())
        .map_err(|_| format!("Unsupported HTTP method: {method}"))
}

/// Validate an expected status code
pub fn validate_status(code: i64) -> Result<u16, String> {
    u16::try_from(code)
        .ok()
        .and_then(|code| StatusCode::from_u16(code).ok())
        .map(|status| status.as_u16())
        .ok_or_else(|| format!("{code} is not a valid HTTP status code"))
}

/// Resolve a status given by name, such as `OK`, `NotFound` or `Moved Permanently`
pub fn status_from_name(name: &str) -> Result<u16, String> {
    let wanted = normalize_reason(name);

    // Names that differ from the canonical reason phrase
    let alias = match wanted.as_str() {
        "ambiguous" => Some(300),
        "moved" => Some(301),
        "redirect" => Some(302),
        "redirectmethod" => Some(303),
        "redirectkeepverb" => Some(307),
        _ => None,
    };
    if let Some(code) = alias {
        return Ok(code);
    }

    (100..=599)
        .filter_map(|code| StatusCode::from_u16(code).ok())
        .find(|status| status.canonical_reason().is_some_and(|reason| normalize_reason(reason) == wanted))
        .map(|status| status.as_u16())
        .ok_or_else(|| format!("Unknown HTTP status \"{name}\""))
}

fn normalize_reason(reason: &str) -> String {
    reason.chars().filter(char::is_ascii_alphanumeric).map(|c| c.to_ascii_lowercase()).collect()
}

/// Validate a header name used in a redirect expectation
pub fn validate_header_name(name: &str) -> Result<(), String> {
    HeaderName::from_bytes(name.as_bytes())
        .map(|_| ())
        .map_err(|_| format!("Invalid header name: {name}"))
}
