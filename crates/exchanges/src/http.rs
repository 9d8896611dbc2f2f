//! Monoio-native HTTPS transport
//!
//! - Single-threaded async with monoio, one connection per request
//! - Direct TLS integration with rustls
//! - Default headers (the API key) injected once at construction
//! - Per-request timeout, chunked response bodies decoded

use crate::errors::{ExchangeError, Result};
use crate::traits::HttpTransport;
use async_trait::async_trait;
use monoio::io::{AsyncReadRent, AsyncWriteRentExt};
use monoio::net::TcpStream;
use rustls::pki_types::ServerName;
use rustls::{ClientConfig, ClientConnection};
use serde::Serialize;
use std::fmt;
use std::io::{Read, Write};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// HTTP methods the exchange client issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = ExchangeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "DELETE" => Ok(HttpMethod::Delete),
            _ => Err(ExchangeError::ConfigurationError(format!(
                "Unsupported method: {s}"
            ))),
        }
    }
}

/// A fully built request as handed to the transport.
///
/// `query` is transmitted byte for byte; for signed requests it is the exact
/// string the signature was computed over plus the trailing signature field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub query: String,
    pub timeout: Duration,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>, query: impl Into<String>, timeout: Duration) -> Self {
        Self {
            method,
            url: url.into(),
            query: query.into(),
            timeout,
        }
    }

    /// URL with the query string appended
    pub fn full_url(&self) -> String {
        if self.query.is_empty() {
            self.url.clone()
        } else {
            format!("{}?{}", self.url, self.query)
        }
    }
}

/// HTTP response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Monoio-native HTTPS client
pub struct MonoioHttpsClient {
    tls_config: Arc<ClientConfig>,
    default_headers: Vec<(String, String)>,
}

impl MonoioHttpsClient {
    /// Create a new HTTPS client with the webpki root store
    pub fn new() -> Result<Self> {
        let mut root_store = rustls::RootCertStore::empty();
        root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

        let tls_config = ClientConfig::builder()
            .with_root_certificates(root_store)
            .with_no_client_auth();

        Ok(Self {
            tls_config: Arc::new(tls_config),
            default_headers: Vec::new(),
        })
    }

    /// Add a header sent with every request (e.g. `X-MBX-APIKEY`)
    pub fn with_default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    pub fn default_headers(&self) -> &[(String, String)] {
        &self.default_headers
    }

    async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let full_url = request.full_url();
        let parsed_url = url::Url::parse(&full_url)?;

        let host = parsed_url
            .host_str()
            .ok_or_else(|| ExchangeError::InvalidUrl("No host in URL".to_string()))?
            .to_string();
        let port = parsed_url.port_or_known_default().unwrap_or(443);

        let mut path_and_query = parsed_url.path().to_string();
        if path_and_query.is_empty() {
            path_and_query.push('/');
        }
        if let Some(query) = parsed_url.query() {
            path_and_query.push('?');
            path_and_query.push_str(query);
        }

        let tcp_stream = TcpStream::connect(format!("{host}:{port}"))
            .await
            .map_err(|e| ExchangeError::ConnectionFailed(format!("TCP connect to {host}:{port} failed: {e}")))?;

        let server_name = ServerName::try_from(host.clone())
            .map_err(|e| ExchangeError::NetworkError(format!("Invalid server name: {e:?}")))?;
        let tls_conn = ClientConnection::new(self.tls_config.clone(), server_name)
            .map_err(|e| ExchangeError::NetworkError(format!("TLS setup failed: {e}")))?;

        let mut tls_stream = TlsStream::new(tcp_stream, tls_conn);

        let mut raw = format!(
            "{} {path_and_query} HTTP/1.1\r\n\
             Host: {host}\r\n\
             User-Agent: basicbot/0.1\r\n\
             Accept: application/json\r\n\
             Connection: close\r\n\
             Content-Length: 0\r\n",
            request.method
        );
        for (key, value) in &self.default_headers {
            raw.push_str(&format!("{key}: {value}\r\n"));
        }
        raw.push_str("\r\n");

        tls_stream.write_all(raw.as_bytes()).await?;
        let response_data = tls_stream.read_to_end().await?;

        parse_http_response(&response_data)
    }
}

#[async_trait(?Send)]
impl HttpTransport for MonoioHttpsClient {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse> {
        match monoio::time::timeout(request.timeout, self.execute(request)).await {
            Ok(result) => result,
            Err(_) => Err(ExchangeError::Timeout(format!(
                "{} {} exceeded {:?}",
                request.method, request.url, request.timeout
            ))),
        }
    }
}

/// Parse a raw HTTP/1.1 response, decoding chunked bodies.
pub fn parse_http_response(data: &[u8]) -> Result<HttpResponse> {
    let header_end = find_subslice(data, b"\r\n\r\n").ok_or_else(|| {
        ExchangeError::NetworkError("Invalid HTTP response: no header terminator".to_string())
    })?;

    let header_part = String::from_utf8_lossy(&data[..header_end]);
    let body_bytes = &data[header_end + 4..];

    let mut lines = header_part.lines();
    let status_line = lines
        .next()
        .ok_or_else(|| ExchangeError::NetworkError("Empty response".to_string()))?;
    let status = status_line
        .split_whitespace()
        .nth(1)
        .and_then(|s| s.parse::<u16>().ok())
        .ok_or_else(|| ExchangeError::NetworkError(format!("Invalid status line: {status_line}")))?;

    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();

    let chunked = headers.iter().any(|(k, v)| {
        k.eq_ignore_ascii_case("transfer-encoding") && v.to_ascii_lowercase().contains("chunked")
    });

    let body = if chunked {
        decode_chunked(body_bytes)?
    } else {
        body_bytes.to_vec()
    };

    Ok(HttpResponse {
        status,
        headers,
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

fn decode_chunked(mut data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(data.len());
    loop {
        let line_end = find_subslice(data, b"\r\n")
            .ok_or_else(|| ExchangeError::NetworkError("Truncated chunk header".to_string()))?;
        let size_line = String::from_utf8_lossy(&data[..line_end]);
        let size_hex = size_line.split(';').next().unwrap_or("").trim();
        let size = usize::from_str_radix(size_hex, 16)
            .map_err(|_| ExchangeError::NetworkError(format!("Invalid chunk size: {size_hex}")))?;

        data = &data[line_end + 2..];
        if size == 0 {
            return Ok(out);
        }
        if data.len() < size {
            return Err(ExchangeError::NetworkError("Truncated chunk body".to_string()));
        }
        out.extend_from_slice(&data[..size]);
        data = data.get(size + 2..).unwrap_or(&[]);
    }
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// TLS stream over a monoio TCP socket
struct TlsStream {
    stream: TcpStream,
    tls_conn: ClientConnection,
    handshake_complete: bool,
}

impl TlsStream {
    fn new(stream: TcpStream, tls_conn: ClientConnection) -> Self {
        Self {
            stream,
            tls_conn,
            handshake_complete: false,
        }
    }

    async fn flush_tls(&mut self) -> Result<()> {
        while self.tls_conn.wants_write() {
            let mut buf = Vec::with_capacity(8192);
            self.tls_conn
                .write_tls(&mut buf)
                .map_err(|e| ExchangeError::NetworkError(format!("TLS write failed: {e}")))?;
            if !buf.is_empty() {
                let (result, _) = self.stream.write_all(buf).await;
                result.map_err(|e| ExchangeError::NetworkError(format!("TCP write failed: {e}")))?;
            }
        }
        Ok(())
    }

    /// Read one batch of ciphertext from TCP into rustls. Returns false on EOF.
    async fn fill_tls(&mut self) -> Result<bool> {
        let buffer = vec![0u8; 4096];
        let (result, buf) = self.stream.read(buffer).await;
        let bytes_read =
            result.map_err(|e| ExchangeError::NetworkError(format!("TCP read failed: {e}")))?;
        if bytes_read == 0 {
            return Ok(false);
        }

        self.tls_conn
            .read_tls(&mut std::io::Cursor::new(&buf[..bytes_read]))
            .map_err(|e| ExchangeError::NetworkError(format!("TLS read failed: {e}")))?;
        self.tls_conn
            .process_new_packets()
            .map_err(|e| ExchangeError::NetworkError(format!("TLS process failed: {e}")))?;
        Ok(true)
    }

    async fn complete_handshake(&mut self) -> Result<()> {
        if self.handshake_complete {
            return Ok(());
        }

        loop {
            self.flush_tls().await?;

            if !self.tls_conn.is_handshaking() {
                self.handshake_complete = true;
                return Ok(());
            }

            if self.tls_conn.wants_read() {
                if !self.fill_tls().await? {
                    return Err(ExchangeError::NetworkError(
                        "Connection closed during handshake".to_string(),
                    ));
                }
            } else if !self.tls_conn.wants_write() {
                return Err(ExchangeError::NetworkError("TLS handshake stalled".to_string()));
            }
        }
    }

    async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        self.complete_handshake().await?;

        self.tls_conn
            .writer()
            .write_all(data)
            .map_err(|e| ExchangeError::NetworkError(format!("TLS application write failed: {e}")))?;

        self.flush_tls().await
    }

    async fn read_to_end(&mut self) -> Result<Vec<u8>> {
        self.complete_handshake().await?;

        let mut response_data = Vec::new();
        let mut plain = vec![0u8; 4096];

        loop {
            match self.tls_conn.reader().read(&mut plain) {
                Ok(0) => return Ok(response_data),
                Ok(n) => {
                    response_data.extend_from_slice(&plain[..n]);
                    continue;
                }
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {}
                // Servers closing with `Connection: close` often skip close_notify.
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(response_data),
                Err(e) => return Err(ExchangeError::NetworkError(format!("TLS read failed: {e}"))),
            }

            if !self.fill_tls().await? {
                return Ok(response_data);
            }
        }
    }
}
