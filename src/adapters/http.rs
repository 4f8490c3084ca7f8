//! HTTP transport adapter.
//!
//! Implements [`HttpTransport`] for the request/response client: one
//! blocking POST per connection.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `esp_idf_svc::http::client::EspHttpConnection`.
//! - **all other targets**: plain HTTP/1.1 over `std::net::TcpStream`
//!   (`Connection: close`, only the status line of the reply is read).

use core::fmt;
use log::{debug, info, warn};

use crate::app::ports::HttpTransport;

#[cfg(target_os = "espidf")]
use esp_idf_svc::http::Method;
#[cfg(target_os = "espidf")]
use esp_idf_svc::http::client::{Configuration, EspHttpConnection};
#[cfg(target_os = "espidf")]
use esp_idf_svc::io::Write as _;

#[cfg(not(target_os = "espidf"))]
use std::io::{BufRead, BufReader, Write};
#[cfg(not(target_os = "espidf"))]
use std::net::TcpStream;
#[cfg(not(target_os = "espidf"))]
use std::time::Duration;

/// Socket read/write timeout (simulation) and request timeout (ESP-IDF).
const IO_TIMEOUT_MS: u64 = 5_000;

// ───────────────────────────────────────────────────────────────
// Error type
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpError {
    /// Operation requires an open connection.
    NotConnected,
    /// Socket or HTTP client failure.
    Io,
    /// No response has been received yet.
    NoResponse,
    /// The server's status line could not be parsed.
    MalformedResponse,
    /// Host or URL does not fit its buffer.
    TooLong,
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConnected => write!(f, "no open connection"),
            Self::Io => write!(f, "HTTP I/O error"),
            Self::NoResponse => write!(f, "no response received"),
            Self::MalformedResponse => write!(f, "malformed status line"),
            Self::TooLong => write!(f, "host or URL too long"),
        }
    }
}

/// Status code from an HTTP/1.x status line (`HTTP/1.1 200 OK`).
pub fn parse_status_line(line: &str) -> Option<u16> {
    let mut parts = line.split_ascii_whitespace();
    let version = parts.next()?;
    if !version.starts_with("HTTP/") {
        return None;
    }
    let code = parts.next()?;
    if code.len() != 3 {
        return None;
    }
    code.parse().ok()
}

// ───────────────────────────────────────────────────────────────
// HttpAdapter
// ───────────────────────────────────────────────────────────────

pub struct HttpAdapter {
    host: heapless::String<64>,
    port: u16,
    status: Option<u16>,

    #[cfg(target_os = "espidf")]
    conn: Option<EspHttpConnection>,

    #[cfg(not(target_os = "espidf"))]
    stream: Option<TcpStream>,
}

impl Default for HttpAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpAdapter {
    pub fn new() -> Self {
        Self {
            host: heapless::String::new(),
            port: 0,
            status: None,
            #[cfg(target_os = "espidf")]
            conn: None,
            #[cfg(not(target_os = "espidf"))]
            stream: None,
        }
    }

    // ── Platform helpers: connect ─────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_connect(&mut self) -> Result<(), HttpError> {
        let conf = Configuration {
            timeout: Some(std::time::Duration::from_millis(IO_TIMEOUT_MS)),
            ..Default::default()
        };
        let conn = EspHttpConnection::new(&conf).map_err(|e| {
            warn!("HTTP(espidf): client init failed: {:?}", e);
            HttpError::Io
        })?;
        self.conn = Some(conn);
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(&mut self) -> Result<(), HttpError> {
        let stream = TcpStream::connect((self.host.as_str(), self.port)).map_err(|e| {
            warn!(
                "HTTP(sim): connect to {}:{} failed: {}",
                self.host, self.port, e
            );
            HttpError::Io
        })?;
        let timeout = Some(Duration::from_millis(IO_TIMEOUT_MS));
        stream
            .set_read_timeout(timeout)
            .and_then(|()| stream.set_write_timeout(timeout))
            .map_err(|_| HttpError::Io)?;
        self.stream = Some(stream);
        Ok(())
    }

    // ── Platform helpers: post ────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_post(
        &mut self,
        path: &str,
        content_type: &str,
        body: &[u8],
    ) -> Result<u16, HttpError> {
        use core::fmt::Write as _;

        let conn = self.conn.as_mut().ok_or(HttpError::NotConnected)?;

        let mut url: heapless::String<192> = heapless::String::new();
        write!(url, "http://{}:{}{}", self.host, self.port, path).map_err(|_| HttpError::TooLong)?;
        let mut content_len: heapless::String<12> = heapless::String::new();
        write!(content_len, "{}", body.len()).map_err(|_| HttpError::TooLong)?;

        let headers = [
            ("Content-Type", content_type),
            ("Content-Length", content_len.as_str()),
        ];
        conn.initiate_request(Method::Post, &url, &headers).map_err(|e| {
            warn!("HTTP(espidf): request to {} failed: {:?}", url, e);
            HttpError::Io
        })?;
        conn.write_all(body).map_err(|_| HttpError::Io)?;
        conn.initiate_response().map_err(|_| HttpError::Io)?;
        Ok(conn.status())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_post(
        &mut self,
        path: &str,
        content_type: &str,
        body: &[u8],
    ) -> Result<u16, HttpError> {
        let stream = self.stream.as_mut().ok_or(HttpError::NotConnected)?;

        let head = format!(
            "POST {} HTTP/1.1\r\nHost: {}:{}\r\nContent-Type: {}\r\n\
             Content-Length: {}\r\nConnection: close\r\n\r\n",
            path,
            self.host,
            self.port,
            content_type,
            body.len()
        );
        stream
            .write_all(head.as_bytes())
            .and_then(|()| stream.write_all(body))
            .and_then(|()| stream.flush())
            .map_err(|e| {
                warn!("HTTP(sim): write failed: {}", e);
                HttpError::Io
            })?;

        let mut status_line = String::new();
        BufReader::new(&*stream).read_line(&mut status_line).map_err(|e| {
            warn!("HTTP(sim): read failed: {}", e);
            HttpError::Io
        })?;
        parse_status_line(&status_line).ok_or(HttpError::MalformedResponse)
    }

    #[cfg(target_os = "espidf")]
    fn platform_close(&mut self) {
        self.conn = None;
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_close(&mut self) {
        if let Some(stream) = self.stream.take() {
            let _ = stream.shutdown(std::net::Shutdown::Both);
        }
    }

    #[cfg(target_os = "espidf")]
    fn platform_is_connected(&self) -> bool {
        self.conn.is_some()
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_is_connected(&self) -> bool {
        self.stream.is_some()
    }
}

// ───────────────────────────────────────────────────────────────
// HttpTransport implementation
// ───────────────────────────────────────────────────────────────

impl HttpTransport for HttpAdapter {
    type Error = HttpError;

    fn connect(&mut self, host: &str, port: u16) -> Result<(), HttpError> {
        self.platform_close();
        self.host = heapless::String::try_from(host).map_err(|_| HttpError::TooLong)?;
        self.port = port;
        self.status = None;
        self.platform_connect()?;
        debug!("HTTP: connected to {}:{}", self.host, self.port);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.platform_is_connected()
    }

    fn post(&mut self, path: &str, content_type: &str, body: &[u8]) -> Result<(), HttpError> {
        self.status = None;
        let status = self.platform_post(path, content_type, body)?;
        info!("HTTP: POST {} ({} bytes) -> {}", path, body.len(), status);
        self.status = Some(status);
        Ok(())
    }

    fn response_status_code(&mut self) -> Result<u16, HttpError> {
        self.status.ok_or(HttpError::NoResponse)
    }

    fn close(&mut self) {
        self.platform_close();
    }
}

// ───────────────────────────────────────────────────────────────
// Tests (host / simulation path only)
// ───────────────────────────────────────────────────────────────
