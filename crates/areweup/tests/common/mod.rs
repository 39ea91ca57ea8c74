//! Shared fixtures: recording collaborators and a minimal HTTP server.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use areweup::error::ReportingError;
use areweup::reporting::{Alert, AlertPublisher, MetricDatum, MetricsSink, ResultReporter};
use rcgen::generate_simple_self_signed;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;
use tokio_rustls::rustls::ServerConfig;
use tokio_rustls::rustls::crypto::ring::default_provider;
use tokio_rustls::rustls::pki_types::{PrivateKeyDer, PrivatePkcs8KeyDer};

#[derive(Default)]
pub struct RecordingSinks {
    pub metrics: Mutex<Vec<MetricDatum>>,
    pub alerts: Mutex<Vec<Alert>>,
}

impl RecordingSinks {
    pub fn reporter(self: &Arc<Self>) -> Arc<ResultReporter> {
        Arc::new(ResultReporter::new(self.clone(), self.clone()))
    }

    pub fn metrics(&self) -> Vec<MetricDatum> {
        self.metrics.lock().unwrap().clone()
    }

    pub fn alerts(&self) -> Vec<Alert> {
        self.alerts.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl MetricsSink for RecordingSinks {
    async fn put_metric(&self, datum: MetricDatum) -> Result<(), ReportingError> {
        self.metrics.lock().unwrap().push(datum);
        Ok(())
    }
}

#[async_trait::async_trait]
impl AlertPublisher for RecordingSinks {
    async fn publish(&self, alert: Alert) -> Result<(), ReportingError> {
        self.alerts.lock().unwrap().push(alert);
        Ok(())
    }
}

/// Serve a handful of fixed routes on an ephemeral loopback port
///
/// - `/ok`, `/final`: 200
/// - `/missing`: 404
/// - `/redirect`: 302 to `/final` with `X-Target: green`
/// - `/login`: 200 setting the `session` cookie
/// - `/created`: 201 for a POST with body `ping` and a content type, 400 otherwise
/// - `/slow`: 200 after two seconds
pub async fn spawn_http_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(handle(stream));
        }
    });

    address
}

/// Serve the same routes over TLS with a freshly generated self-signed certificate
pub async fn spawn_https_server() -> SocketAddr {
    let certified = generate_simple_self_signed(vec!["localhost".to_string(), "127.0.0.1".to_string()]).unwrap();
    let key = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(certified.key_pair.serialize_der()));

    let config = ServerConfig::builder_with_provider(Arc::new(default_provider()))
        .with_safe_default_protocol_versions()
        .unwrap()
        .with_no_client_auth()
        .with_single_cert(vec![certified.cert.der().clone()], key)
        .unwrap();
    let acceptor = TlsAcceptor::from(Arc::new(config));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let acceptor = acceptor.clone();
            tokio::spawn(async move {
                // Strict clients abort the handshake, nothing to serve then
                if let Ok(stream) = acceptor.accept(stream).await {
                    handle(stream).await;
                }
            });
        }
    });

    address
}

struct ParsedRequest {
    method: String,
    path: String,
    content_type: Option<String>,
    body: Vec<u8>,
}

async fn handle<S: AsyncRead + AsyncWrite + Unpin>(mut stream: S) {
    let Some(request) = read_request(&mut stream).await else {
        return;
    };

    let (status, headers) = route(&request).await;
    let response = format!("HTTP/1.1 {status}\r\nContent-Length: 0\r\nConnection: close\r\n{headers}\r\n");
    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.shutdown().await;
}

async fn read_request<S: AsyncRead + Unpin>(stream: &mut S) -> Option<ParsedRequest> {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 1024];

    let head_end = loop {
        let read = stream.read(&mut chunk).await.ok()?;
        if read == 0 {
            return None;
        }
        buffer.extend_from_slice(&chunk[..read]);
        if let Some(position) = buffer.windows(4).position(|window| window == b"\r\n\r\n") {
            break position + 4;
        }
    };

    let head = String::from_utf8_lossy(&buffer[..head_end]).into_owned();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let target = request_line.next()?;
    let path = target.split('?').next().unwrap_or(target).to_string();

    let mut content_length = 0usize;
    let mut content_type = None;
    for line in lines {
        if let Some((name, value)) = line.split_once(':') {
            match name.trim().to_ascii_lowercase().as_str() {
                "content-length" => content_length = value.trim().parse().unwrap_or(0),
                "content-type" => content_type = Some(value.trim().to_string()),
                _ => {}
            }
        }
    }

    let mut body = buffer[head_end..].to_vec();
    while body.len() < content_length {
        let read = stream.read(&mut chunk).await.ok()?;
        if read == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..read]);
    }

    Some(ParsedRequest { method, path, content_type, body })
}

async fn route(request: &ParsedRequest) -> (&'static str, &'static str) {
    match request.path.as_str() {
        "/ok" | "/final" => ("200 OK", ""),
        "/missing" => ("404 Not Found", ""),
        "/redirect" => ("302 Found", "Location: /final\r\nX-Target: green\r\n"),
        "/login" => ("200 OK", "Set-Cookie: session=abc; Path=/\r\n"),
        "/created" => {
            if request.method == "POST" && request.body == b"ping" && request.content_type.is_some() {
                ("201 Created", "")
            } else {
                ("400 Bad Request", "")
            }
        }
        "/slow" => {
            tokio::time::sleep(Duration::from_secs(2)).await;
            ("200 OK", "")
        }
        _ => ("404 Not Found", ""),
    }
}
