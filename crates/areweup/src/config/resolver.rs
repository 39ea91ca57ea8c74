use std::collections::{BTreeMap, BTreeSet};

use base64::{Engine, engine::general_purpose::STANDARD};
use serde_json::Value;
use tracing::{debug, warn};

use super::fields::{self as field, EntryFields};
use super::validation;
use crate::error::ConfigParseError;
use crate::models::{
    ClientDefaults, EndpointRequest, HealthCheckConfiguration, NetworkOptions, ProbeKind,
    Protocol, UdpOptions, WebOptions,
};

/// Default HTTP method when an endpoint names none
pub const DEFAULT_METHOD: &str = "HEAD";

/// Default expected status
pub const DEFAULT_EXPECTED_STATUS: u16 = 200;

/// Default UDP receive buffer in bytes
pub const DEFAULT_RECEIVE_BUFFER_SIZE: usize = 512;

/// Largest receive buffer accepted, the maximum UDP datagram size
pub const MAX_RECEIVE_BUFFER_SIZE: usize = 65_536;

/// Payload sent when a UDP endpoint names none
pub const DEFAULT_UDP_PAYLOAD: [u8; 1] = [0x00];

/// Parse the raw check document and resolve it against `defaults`.
///
/// ```rust
/// use areweup::{ClientDefaults, resolve};
///
/// let raw = br#"{ "Tcp": [ { "Path": "db.internal", "Port": 5432 } ] }"#;
/// let config = resolve(raw, &ClientDefaults::default()).unwrap();
/// assert_eq!(config.tcp.len(), 1);
/// assert_eq!(config.tcp[0].timeout_millis, 500);
/// ```
pub fn resolve(
    raw: &[u8],
    defaults: &ClientDefaults,
) -> Result<HealthCheckConfiguration, ConfigParseError> {
    let document: Value = serde_json::from_slice(raw)?;
    resolve_document(&document, defaults)
}

/// Resolve an already parsed check document
pub fn resolve_document(
    document: &Value,
    defaults: &ClientDefaults,
) -> Result<HealthCheckConfiguration, ConfigParseError> {
    let Value::Object(sections) = document else {
        return Err(ConfigParseError::NotAnObject);
    };

    let mut configuration = HealthCheckConfiguration::default();

    for (key, value) in sections {
        let Some(protocol) = Protocol::from_section(key) else {
            warn!(section = %key, "Ignoring unknown section in health check document");
            continue;
        };

        let entries = match value {
            Value::Array(entries) => entries,
            Value::Null => continue,
            _ => return Err(ConfigParseError::SectionNotArray { section: key.clone() }),
        };

        for (index, entry) in entries.iter().enumerate() {
            let Value::Object(object) = entry else {
                return Err(ConfigParseError::EntryNotObject { section: key.clone(), index });
            };

            let fields = EntryFields::new(key, index, object);
            let request = resolve_entry(protocol, &fields, defaults)?;
            configuration.section_mut(protocol).push(request);
        }
    }

    debug!(endpoints = configuration.len(), "Resolved health check configuration");
    Ok(configuration)
}

/// Apply the defaults to one endpoint, then validate it
fn resolve_entry(
    protocol: Protocol,
    fields: &EntryFields<'_>,
    defaults: &ClientDefaults,
) -> Result<EndpointRequest, ConfigParseError> {
    let target = fields.string(field::TARGET)?.ok_or_else(|| fields.missing(field::TARGET))?;
    let target = target.trim().to_string();
    if target.is_empty() {
        return Err(fields.invalid(field::TARGET, "Target cannot be empty"));
    }

    let customer_id =
        fields.string(field::CUSTOMER_ID)?.or_else(|| non_empty(&defaults.customer_id));

    let send_metric = fields.bool(field::SEND_METRIC)?.unwrap_or(defaults.send_metric);

    let timeout_millis = endpoint_timeout(fields)?.unwrap_or(defaults.timeout_millis);

    let alert_topic =
        fields.string(field::ALERT_TOPIC)?.unwrap_or_else(|| defaults.alert_topic.clone());

    let alert_subject = fields
        .string(field::ALERT_SUBJECT)?
        .or_else(|| non_empty(&defaults.alert_subject))
        .unwrap_or_default();

    let kind = match protocol {
        Protocol::Http => ProbeKind::Http(web_options(protocol, &target, fields)?),
        Protocol::Https => ProbeKind::Https {
            web: web_options(protocol, &target, fields)?,
            ignore_tls_errors: fields
                .bool(field::IGNORE_TLS_ERRORS)?
                .unwrap_or(defaults.ignore_tls_errors),
        },
        Protocol::Tcp => ProbeKind::Tcp(NetworkOptions { port: required_port(fields)? }),
        Protocol::Udp => ProbeKind::Udp(udp_options(fields)?),
        Protocol::Icmp => ProbeKind::Icmp,
    };

    Ok(EndpointRequest {
        target,
        customer_id,
        send_metric,
        alert_topic,
        alert_subject,
        timeout_millis,
        kind,
    })
}

/// The endpoint's own `Timeout`, which must be positive
fn endpoint_timeout(fields: &EntryFields<'_>) -> Result<Option<u64>, ConfigParseError> {
    match fields.integer(field::TIMEOUT)? {
        Some(timeout) if timeout > 0 => Ok(Some(timeout as u64)),
        Some(timeout) => Err(fields.invalid(
            field::TIMEOUT,
            format!("Timeout must be greater than zero, got {timeout}"),
        )),
        None => Ok(None),
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

/// TCP and UDP ports must be present. Out of range values are kept so the
/// probe can report the misconfiguration as a failed check.
fn required_port(fields: &EntryFields<'_>) -> Result<i32, ConfigParseError> {
    let port = fields.integer(field::PORT)?.ok_or_else(|| fields.missing(field::PORT))?;
    i32::try_from(port).map_err(|_| fields.invalid(field::PORT, format!("{port} is out of range")))
}

fn udp_options(fields: &EntryFields<'_>) -> Result<UdpOptions, ConfigParseError> {
    let port = required_port(fields)?;

    let payload = match fields.string(field::PAYLOAD)? {
        Some(encoded) if !encoded.trim().is_empty() => STANDARD
            .decode(encoded.trim())
            .map_err(|e| fields.invalid(field::PAYLOAD, format!("Payload is not valid base64: {e}")))?,
        _ => DEFAULT_UDP_PAYLOAD.to_vec(),
    };

    let receive_buffer_size = match fields.integer(field::RECEIVE_BUFFER_SIZE)? {
        None => DEFAULT_RECEIVE_BUFFER_SIZE,
        Some(size) => usize::try_from(size)
            .ok()
            .filter(|size| (1..=MAX_RECEIVE_BUFFER_SIZE).contains(size))
            .ok_or_else(|| {
                fields.invalid(
                    field::RECEIVE_BUFFER_SIZE,
                    format!("Buffer size must be between 1 and {MAX_RECEIVE_BUFFER_SIZE}, got {size}"),
                )
            })?,
    };

    Ok(UdpOptions { port, payload, receive_buffer_size })
}

fn web_options(
    protocol: Protocol,
    target: &str,
    fields: &EntryFields<'_>,
) -> Result<WebOptions, ConfigParseError> {
    let port = fields
        .integer(field::PORT)?
        .map(|port| validation::validate_port(port).map_err(|e| fields.invalid(field::PORT, e)))
        .transpose()?;

    let url = validation::web_url(protocol, target, port)
        .map_err(|reason| fields.invalid(field::TARGET, reason))?;

    let cookies_required: BTreeSet<String> = fields
        .string_list(field::COOKIES)?
        .unwrap_or_default()
        .into_iter()
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect();

    Ok(WebOptions {
        url,
        method: method(fields)?,
        body: fields.string(field::BODY)?.unwrap_or_default(),
        content_type: fields.string(field::CONTENT_TYPE)?.unwrap_or_default(),
        prevent_redirect: fields.bool(field::PREVENT_REDIRECT)?.unwrap_or(false),
        redirect_header_expectations: header_expectations(fields)?,
        cookies_required,
        expected_status: expected_status(fields)?,
        timeout_millis: endpoint_timeout(fields)?,
    })
}

/// The method is either a plain string or an object carrying a `method` key
fn method(fields: &EntryFields<'_>) -> Result<String, ConfigParseError> {
    let name = match fields.get(field::METHOD) {
        None => return Ok(DEFAULT_METHOD.to_string()),
        Some(Value::String(name)) => name.as_str(),
        Some(Value::Object(object)) => object
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case("method"))
            .and_then(|(_, value)| value.as_str())
            .ok_or_else(|| fields.invalid(field::METHOD, "Method object must carry a method string"))?,
        Some(other) => {
            return Err(fields.invalid(field::METHOD, format!("expected a string, found {other}")));
        }
    };

    validation::validate_method(name).map_err(|e| fields.invalid(field::METHOD, e))
}

/// Accepts `{ "Name": "value" }` or `[ { "Name": "value" }, ... ]`
fn header_expectations(
    fields: &EntryFields<'_>,
) -> Result<BTreeMap<String, String>, ConfigParseError> {
    let pairs: Vec<(&String, &Value)> = match fields.get(field::REDIRECT_HEADERS) {
        None => return Ok(BTreeMap::new()),
        Some(Value::Object(object)) => object.iter().collect(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::Object(pair) if pair.len() == 1 => Ok(pair.iter().next()),
                other => Err(fields.invalid(
                    field::REDIRECT_HEADERS,
                    format!("expected a single-key object, found {other}"),
                )),
            })
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .flatten()
            .collect(),
        Some(other) => {
            return Err(fields.invalid(
                field::REDIRECT_HEADERS,
                format!("expected an object, found {other}"),
            ));
        }
    };

    let mut expectations = BTreeMap::new();
    for (name, value) in pairs {
        validation::validate_header_name(name)
            .map_err(|e| fields.invalid(field::REDIRECT_HEADERS, e))?;
        let Value::String(value) = value else {
            return Err(fields.invalid(
                field::REDIRECT_HEADERS,
                format!("value of header {name} must be a string"),
            ));
        };
        expectations.insert(name.clone(), value.clone());
    }

    Ok(expectations)
}

fn expected_status(fields: &EntryFields<'_>) -> Result<u16, ConfigParseError> {
    let status = match fields.get(field::EXPECTED_STATUS) {
        None => return Ok(DEFAULT_EXPECTED_STATUS),
        Some(Value::Number(number)) => match number.as_i64() {
            Some(code) => validation::validate_status(code),
            None => Err(format!("{number} is not a valid HTTP status code")),
        },
        Some(Value::String(value)) => match value.trim().parse::<i64>() {
            Ok(code) => validation::validate_status(code),
            Err(_) => validation::status_from_name(value),
        },
        Some(other) => Err(format!("expected a status code, found {other}")),
    };

    status.map_err(|e| fields.invalid(field::EXPECTED_STATUS, e))
}
