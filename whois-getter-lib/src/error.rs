//! Error handling for WHOIS operations.
//!
//! This module defines the error type shared by the client, the encoding step
//! and the configuration loader. Parser operations never fail and have no
//! error variants of their own.

use std::fmt;
use std::time::Duration;

/// Main error type for WHOIS operations.
///
/// Every variant carries enough context (domain, server, port) to be printed
/// on its own, since batch operations report errors per domain.
#[derive(Debug, Clone)]
pub enum WhoisError {
    /// The domain could not be converted to its ASCII-compatible form
    Encoding {
        domain: String,
        reason: String,
    },

    /// Connecting, sending, or a single read exceeded the configured timeout
    ConnectTimeout {
        server: String,
        port: u16,
        operation: String,
        duration: Duration,
    },

    /// The connection failed for a reason other than a timeout
    /// (refused, unresolvable host, reset while reading)
    Connection {
        server: String,
        port: u16,
        message: String,
    },

    /// The root registry response carried no `whois:` referral line
    NoAuthorityServer {
        domain: String,
        root_server: String,
    },

    /// The server kept sending past the configured response size cap
    ResponseTooLarge {
        server: String,
        limit: usize,
    },

    /// Configuration errors (invalid settings, unparseable TOML, etc.)
    ConfigError {
        message: String,
    },

    /// File I/O errors when reading configuration or saved responses
    FileError {
        path: String,
        message: String,
    },
}

impl WhoisError {
    /// Create a new encoding error.
    pub fn encoding<D: Into<String>, R: Into<String>>(domain: D, reason: R) -> Self {
        Self::Encoding {
            domain: domain.into(),
            reason: reason.into(),
        }
    }

    /// Create a new timeout error for one stage of a round-trip.
    pub fn connect_timeout<S: Into<String>, O: Into<String>>(
        server: S,
        port: u16,
        operation: O,
        duration: Duration,
    ) -> Self {
        Self::ConnectTimeout {
            server: server.into(),
            port,
            operation: operation.into(),
            duration,
        }
    }

    /// Create a new connection error.
    pub fn connection<S: Into<String>, M: Into<String>>(server: S, port: u16, message: M) -> Self {
        Self::Connection {
            server: server.into(),
            port,
            message: message.into(),
        }
    }

    /// Create a new missing-referral error.
    pub fn no_authority_server<D: Into<String>, R: Into<String>>(
        domain: D,
        root_server: R,
    ) -> Self {
        Self::NoAuthorityServer {
            domain: domain.into(),
            root_server: root_server.into(),
        }
    }

    /// Create a new configuration error.
    pub fn config<M: Into<String>>(message: M) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a new file error.
    pub fn file_error<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::FileError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Whether this error is a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::ConnectTimeout { .. })
    }

    /// Check if this error suggests the operation could succeed if retried.
    ///
    /// The client never retries on its own; this is a hint for callers.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConnectTimeout { .. } | Self::Connection { .. })
    }
}

impl fmt::Display for WhoisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Encoding { domain, reason } => {
                write!(f, "Cannot encode domain '{}': {}", domain, reason)
            }
            Self::ConnectTimeout {
                server,
                port,
                operation,
                duration,
            } => {
                write!(
                    f,
                    "Timeout after {:?} during {} with {}:{}",
                    duration, operation, server, port
                )
            }
            Self::Connection {
                server,
                port,
                message,
            } => {
                write!(f, "Connection to {}:{} failed: {}", server, port, message)
            }
            Self::NoAuthorityServer {
                domain,
                root_server,
            } => {
                write!(
                    f,
                    "No authority WHOIS server for '{}' in response from {}",
                    domain, root_server
                )
            }
            Self::ResponseTooLarge { server, limit } => {
                write!(f, "Response from {} exceeded {} bytes", server, limit)
            }
            Self::ConfigError { message } => {
                write!(f, "Configuration error: {}", message)
            }
            Self::FileError { path, message } => {
                write!(f, "File error at '{}': {}", path, message)
            }
        }
    }
}

impl std::error::Error for WhoisError {}

impl From<toml::de::Error> for WhoisError {
    fn from(err: toml::de::Error) -> Self {
        Self::ConfigError {
            message: format!("Failed to parse TOML configuration: {}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_kinds() {
        let timeout =
            WhoisError::connect_timeout("whois.iana.org", 43, "connect", Duration::from_secs(5));
        assert!(timeout.is_timeout());
        assert!(timeout.is_retryable());

        let refused = WhoisError::connection("whois.iana.org", 43, "connection refused");
        assert!(!refused.is_timeout());
        assert!(refused.is_retryable());

        let no_referral = WhoisError::no_authority_server("example.test", "whois.iana.org");
        assert!(!no_referral.is_retryable());
        let invalid = WhoisError::encoding("bad<>", "disallowed character");
        assert!(!invalid.is_retryable());
    }

    #[test]
    fn test_display_mentions_context() {
        let err = WhoisError::no_authority_server("example.test", "whois.iana.org");
        let text = err.to_string();
        assert!(text.contains("example.test"));
        assert!(text.contains("whois.iana.org"));

        let err =
            WhoisError::connect_timeout("whois.nic.test", 4343, "read", Duration::from_millis(250));
        assert_eq!(
            err.to_string(),
            "Timeout after 250ms during read with whois.nic.test:4343"
        );
    }
}
