//! HTTP transport used by the remote API client.
//!
//! The [`ApiClient`](super::api::ApiClient) builds URLs, headers and JSON
//! bodies; a transport only moves bytes.  On ESP-IDF each request opens a
//! fresh `EspHttpConnection` with the configured timeout; host builds use
//! [`OfflineTransport`] or a scripted test double.

use crate::error::CommsError;

/// Responses larger than this are rejected rather than buffered.
pub const MAX_RESPONSE_BYTES: usize = 8 * 1024;

/// Status line and body of a completed exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Blocking request/response transport.
///
/// `Err` means the exchange never completed (no link, timeout, oversize
/// body).  A completed exchange with a non-2xx status is `Ok`.
pub trait HttpTransport {
    fn get(&mut self, url: &str, headers: &[(&str, &str)]) -> Result<HttpResponse, CommsError>;

    fn post_json(
        &mut self,
        url: &str,
        headers: &[(&str, &str)],
        body: &[u8],
    ) -> Result<HttpResponse, CommsError>;
}

/// Transport for builds with no network: every request fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineTransport;

impl HttpTransport for OfflineTransport {
    fn get(&mut self, _url: &str, _headers: &[(&str, &str)]) -> Result<HttpResponse, CommsError> {
        Err(CommsError::WifiDisconnected)
    }

    fn post_json(
        &mut self,
        _url: &str,
        _headers: &[(&str, &str)],
        _body: &[u8],
    ) -> Result<HttpResponse, CommsError> {
        Err(CommsError::WifiDisconnected)
    }
}

// ───────────────────────────────────────────────────────────────
// ESP-IDF client
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub use esp::EspHttpTransport;

#[cfg(target_os = "espidf")]
mod esp {
    use core::time::Duration;

    use embedded_svc::http::client::Client;
    use embedded_svc::http::{Method, Status};
    use embedded_svc::io::{Read, Write};
    use esp_idf_svc::http::client::{Configuration, EspHttpConnection};
    use log::debug;

    use super::{HttpResponse, HttpTransport, MAX_RESPONSE_BYTES};
    use crate::error::CommsError;

    pub struct EspHttpTransport {
        timeout: Duration,
    }

    impl EspHttpTransport {
        pub fn new(timeout_ms: u32) -> Self {
            Self { timeout: Duration::from_millis(u64::from(timeout_ms)) }
        }

        fn exchange(
            &mut self,
            method: Method,
            url: &str,
            headers: &[(&str, &str)],
            body: Option<&[u8]>,
        ) -> Result<HttpResponse, CommsError> {
            let conf = Configuration {
                timeout: Some(self.timeout),
                ..Default::default()
            };
            let conn = EspHttpConnection::new(&conf).map_err(|_| CommsError::HttpRequestFailed)?;
            let mut client = Client::wrap(conn);

            let len = body.map(|b| b.len().to_string());
            let mut all: Vec<(&str, &str)> = headers.to_vec();
            if let Some(len) = len.as_deref() {
                all.push(("Content-Length", len));
            }

            let mut request = client
                .request(method, url, &all)
                .map_err(|_| CommsError::HttpRequestFailed)?;
            if let Some(body) = body {
                request.write_all(body).map_err(|_| CommsError::HttpRequestFailed)?;
                request.flush().map_err(|_| CommsError::HttpRequestFailed)?;
            }
            let mut response = request.submit().map_err(|_| CommsError::HttpRequestFailed)?;
            let status = response.status();

            let mut out = Vec::new();
            let mut chunk = [0u8; 512];
            loop {
                let n = response.read(&mut chunk).map_err(|_| CommsError::HttpRequestFailed)?;
                if n == 0 {
                    break;
                }
                if out.len() + n > MAX_RESPONSE_BYTES {
                    return Err(CommsError::BadPayload);
                }
                out.extend_from_slice(&chunk[..n]);
            }
            debug!("http: {} -> {} ({} bytes)", url, status, out.len());
            Ok(HttpResponse { status, body: out })
        }
    }

    impl HttpTransport for EspHttpTransport {
        fn get(&mut self, url: &str, headers: &[(&str, &str)]) -> Result<HttpResponse, CommsError> {
            self.exchange(Method::Get, url, headers, None)
        }

        fn post_json(
            &mut self,
            url: &str,
            headers: &[(&str, &str)],
            body: &[u8],
        ) -> Result<HttpResponse, CommsError> {
            self.exchange(Method::Post, url, headers, Some(body))
        }
    }
}
