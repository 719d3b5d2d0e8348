//! WHOIS protocol round-trip (RFC 3912).
//!
//! A query is one line terminated by CRLF; the response is whatever the
//! server writes until it closes the connection. There is no other framing,
//! so a zero-length read is the only end-of-response signal.

use crate::error::WhoisError;
use crate::types::{normalize_host, ClientConfig, WhoisText};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

const READ_CHUNK: usize = 4096;

lazy_static! {
    /// `whois:` followed by whitespace and a host name, as printed by IANA.
    static ref REFERRAL_PATTERN: Regex =
        Regex::new(r"whois:[ \t]+([A-Za-z0-9.\-]+)").expect("valid referral regex");
}

/// Raw TCP transport for WHOIS queries.
///
/// Holds only the settings a single round-trip needs. Every call opens its
/// own connection, which is dropped (closed) on every return path.
#[derive(Debug, Clone)]
pub struct WhoisTransport {
    /// Timeout for connect, write, and each read
    timeout: Duration,
    /// Responses above this size are rejected
    max_response_bytes: usize,
    /// Pinned addresses consulted before DNS
    server_addresses: HashMap<(String, u16), SocketAddr>,
}

impl WhoisTransport {
    /// Create a transport from the client configuration.
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            timeout: config.timeout,
            max_response_bytes: config.max_response_bytes,
            server_addresses: config.server_addresses.clone(),
        }
    }

    /// Perform one connect–send–receive–close cycle.
    ///
    /// `query` must already be in ASCII-compatible form; CRLF is appended
    /// here.
    ///
    /// # Errors
    ///
    /// - `ConnectTimeout` if connecting, writing, or any read stalls past
    ///   the timeout
    /// - `Connection` if the connection is refused or breaks
    /// - `ResponseTooLarge` if the server sends more than the cap
    pub async fn fetch(
        &self,
        server: &str,
        port: u16,
        query: &str,
    ) -> Result<WhoisText, WhoisError> {
        let mut stream = self.connect(server, port).await?;

        let line = format!("{}\r\n", query);
        timeout(self.timeout, stream.write_all(line.as_bytes()))
            .await
            .map_err(|_| WhoisError::connect_timeout(server, port, "send", self.timeout))?
            .map_err(|e| {
                WhoisError::connection(server, port, format!("Failed to send query: {}", e))
            })?;

        let mut response = Vec::new();
        let mut buf = [0u8; READ_CHUNK];

        loop {
            let n = timeout(self.timeout, stream.read(&mut buf))
                .await
                .map_err(|_| WhoisError::connect_timeout(server, port, "read", self.timeout))?
                .map_err(|e| WhoisError::connection(server, port, format!("Read error: {}", e)))?;

            if n == 0 {
                break;
            }

            response.extend_from_slice(&buf[..n]);
            if response.len() > self.max_response_bytes {
                return Err(WhoisError::ResponseTooLarge {
                    server: server.to_string(),
                    limit: self.max_response_bytes,
                });
            }
        }

        debug!(server = %server, port = port, bytes = response.len(), "WHOIS response received");

        Ok(decode_response(&response))
    }

    async fn connect(&self, server: &str, port: u16) -> Result<TcpStream, WhoisError> {
        let pinned = self
            .server_addresses
            .get(&(normalize_host(server), port))
            .copied();

        let connecting = match pinned {
            Some(addr) => {
                debug!(server = %server, port = port, addr = %addr, "Using pinned server address");
                timeout(self.timeout, TcpStream::connect(addr)).await
            }
            None => timeout(self.timeout, TcpStream::connect((server, port))).await,
        };

        connecting
            .map_err(|_| WhoisError::connect_timeout(server, port, "connect", self.timeout))?
            .map_err(|e| WhoisError::connection(server, port, e.to_string()))
    }
}

/// Decode response bytes, replacing anything that is not valid UTF-8.
pub fn decode_response(bytes: &[u8]) -> WhoisText {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Find the authority referral in a root registry response.
///
/// Matches the first `whois:` label followed by spaces or tabs and a host
/// made of letters, digits, dots, and hyphens.
///
/// ```text
/// domain:       COM
/// whois:        whois.verisign-grs.com
/// ```
pub fn extract_referral(response: &str) -> Option<String> {
    REFERRAL_PATTERN
        .captures(response)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_referral_from_iana_response() {
        let response = "% IANA WHOIS server\n\
                        % for more information on IANA, visit http://www.iana.org\n\
                        \n\
                        refer:        whois.verisign-grs.com\n\
                        \n\
                        domain:       COM\n\
                        \n\
                        whois:        whois.verisign-grs.com\n\
                        \n\
                        status:       ACTIVE\n";
        assert_eq!(
            extract_referral(response),
            Some("whois.verisign-grs.com".to_string())
        );
    }

    #[test]
    fn test_extract_referral_stub_format() {
        let response = "...\nwhois:  whois.example-registry.test\n...";
        assert_eq!(
            extract_referral(response),
            Some("whois.example-registry.test".to_string())
        );
    }

    #[test]
    fn test_extract_referral_absent() {
        let response = "% IANA WHOIS server\ndomain: TEST\nstatus: ACTIVE\n";
        assert_eq!(extract_referral(response), None);
        // refer: alone is not an authority line here
        assert_eq!(extract_referral("refer:        whois.nic.test\n"), None);
        // label with no whitespace-separated value
        assert_eq!(extract_referral("whois:\n\ndomain: TEST\n"), None);
        assert_eq!(extract_referral("whois:whois.nic.test\n"), None);
    }

    #[test]
    fn test_extract_referral_stops_at_token_end() {
        let response = "whois:\twhois.nic.test   # registry\n";
        assert_eq!(
            extract_referral(response),
            Some("whois.nic.test".to_string())
        );
    }

    #[test]
    fn test_decode_response_replaces_invalid_utf8() {
        let bytes = b"Domain Name: example.test\n\xff\xfeStatus: ok\n";
        let text = decode_response(bytes);
        assert!(text.starts_with("Domain Name: example.test\n"));
        assert!(text.contains('\u{FFFD}'));
        assert!(text.ends_with("Status: ok\n"));
    }
}
