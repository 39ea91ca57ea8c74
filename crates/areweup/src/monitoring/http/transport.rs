use std::collections::BTreeSet;
use std::error::Error as StdError;
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{CONTENT_TYPE, HeaderMap};
use reqwest::redirect::Policy;
use reqwest::{Client, Method, StatusCode};
use tracing::warn;
use url::Url;

pub const USER_AGENT: &str = concat!("areweup/", env!("CARGO_PKG_VERSION"));

/// Per-call client behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportOptions {
    /// Retry with certificate validation disabled after a TLS failure
    pub ignore_tls_errors: bool,
    pub follow_redirects: bool,
    pub timeout: Duration,
}

/// One request to send
#[derive(Debug, Clone)]
pub struct WebCall {
    pub method: Method,
    pub url: Url,
    /// Body and its content type
    pub body: Option<(String, String)>,
}

/// What came back from a [`WebCall`]
#[derive(Debug, Clone)]
pub struct Exchange {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// URL of the response, after any redirects the client followed
    pub url: Url,
    pub elapsed: Duration,
}

/// Builds per-call HTTP clients around one shared cookie jar
///
/// Cloning is cheap and clones share the jar, so cookies set by one probe are
/// visible to every other probe of the same invocation.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    jar: Arc<Jar>,
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::with_jar(Arc::new(Jar::default()))
    }

    pub fn with_jar(jar: Arc<Jar>) -> Self {
        Self { jar }
    }

    pub fn jar(&self) -> &Arc<Jar> {
        &self.jar
    }

    /// Build a client for `options`
    ///
    /// Certificates are only ever skipped when `accept_invalid_certs` is set,
    /// which [`HttpTransport::send`] does for its retry.
    pub fn client(&self, options: TransportOptions, accept_invalid_certs: bool) -> reqwest::Result<Client> {
        let redirect = if options.follow_redirects { Policy::default() } else { Policy::none() };

        Client::builder()
            .user_agent(USER_AGENT)
            .cookie_provider(Arc::clone(&self.jar))
            .redirect(redirect)
            .timeout(options.timeout)
            .danger_accept_invalid_certs(accept_invalid_certs)
            .build()
    }

    /// Send `call`, measuring the time to the response head
    pub async fn send(&self, call: &WebCall, options: TransportOptions) -> reqwest::Result<Exchange> {
        let strict = self.client(options, false)?;

        match execute(&strict, call).await {
            Err(e) if is_tls_error(&e) => {
                warn!("TLS validation failed for {}: {}", call.url, error_chain(&e));
                if !options.ignore_tls_errors {
                    return Err(e);
                }

                let lenient = self.client(options, true)?;
                execute(&lenient, call).await
            }
            result => result,
        }
    }

    /// Names of the cookies the jar would send to `url`
    pub fn cookie_names(&self, url: &Url) -> BTreeSet<String> {
        let Some(header) = self.jar.cookies(url) else {
            return BTreeSet::new();
        };

        String::from_utf8_lossy(header.as_bytes())
            .split(';')
            .filter_map(|pair| pair.split('=').next())
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect()
    }
}

async fn execute(client: &Client, call: &WebCall) -> reqwest::Result<Exchange> {
    let mut builder = client.request(call.method.clone(), call.url.clone());
    if let Some((body, content_type)) = &call.body {
        builder = builder.header(CONTENT_TYPE, content_type.as_str()).body(body.clone());
    }

    let start = Instant::now();
    let response = builder.send().await?;
    let elapsed = start.elapsed();

    Ok(Exchange {
        status: response.status(),
        headers: response.headers().clone(),
        url: response.url().clone(),
        elapsed,
    })
}

/// Whether the request failed inside the TLS layer
///
/// Only typed rustls errors count. The handshake surfaces them wrapped in an
/// `io::Error`, whose `source` skips the wrapped error, so both are checked.
pub fn is_tls_error(error: &reqwest::Error) -> bool {
    let mut current = error.source();
    while let Some(e) = current {
        if e.is::<rustls::Error>() {
            return true;
        }
        if let Some(inner) = e.downcast_ref::<io::Error>().and_then(io::Error::get_ref) {
            if inner.is::<rustls::Error>() {
                return true;
            }
        }
        current = e.source();
    }

    false
}

/// An error and all its sources, joined with `: `
pub fn error_chain(error: &(dyn StdError + 'static)) -> String {
    let mut parts = vec![error.to_string()];
    let mut current = error.source();
    while let Some(e) = current {
        let text = e.to_string();
        if !parts.iter().any(|part| part == &text) {
            parts.push(text);
        }
        current = e.source();
    }

    parts.join(": ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_names_from_jar() {
        let transport = HttpTransport::new();
        let url = Url::parse("http://example.com/login").unwrap();
        transport.jar().add_cookie_str("session=abc; Path=/", &url);
        transport.jar().add_cookie_str("theme=dark; Path=/", &url);

        let names = transport.cookie_names(&url);
        assert_eq!(names, BTreeSet::from(["session".to_string(), "theme".to_string()]));
    }

    #[tokio::test]
    async fn test_refused_connection_is_not_tls_error() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let options = TransportOptions {
            ignore_tls_errors: true,
            follow_redirects: true,
            timeout: Duration::from_secs(2),
        };
        let call = WebCall {
            method: Method::GET,
            url: Url::parse(&format!("http://127.0.0.1:{port}/ssl-status/tls/certificates")).unwrap(),
            body: None,
        };

        let error = HttpTransport::new().send(&call, options).await.unwrap_err();
        assert!(error.is_connect(), "{error}");
        assert!(!is_tls_error(&error));
    }

    #[test]
    fn test_cookie_names_empty_jar() {
        let transport = HttpTransport::new();
        let url = Url::parse("http://example.com/").unwrap();

        assert!(transport.cookie_names(&url).is_empty());
    }

    #[test]
    fn test_clones_share_the_jar() {
        let transport = HttpTransport::new();
        let clone = transport.clone();
        let url = Url::parse("http://example.com/").unwrap();
        clone.jar().add_cookie_str("id=1", &url);

        assert!(transport.cookie_names(&url).contains("id"));
    }

    #[derive(Debug)]
    struct Wrapped(std::io::Error);

    impl std::fmt::Display for Wrapped {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "request failed")
        }
    }

    impl StdError for Wrapped {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn test_error_chain_joins_sources() {
        let error = Wrapped(std::io::Error::new(std::io::ErrorKind::Other, "connection reset"));

        assert_eq!(error_chain(&error), "request failed: connection reset");
    }
}
