//! Core data types for WHOIS querying and response parsing.
//!
//! This module defines the query and result values used throughout the library,
//! together with the client configuration and its defaults.

use crate::error::WhoisError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

/// Well-known WHOIS port.
pub const DEFAULT_PORT: u16 = 43;

/// Default timeout for connecting and for each read.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Root registry queried first during authority resolution.
pub const ROOT_SERVER: &str = "whois.iana.org";

/// Default number of round-trips a batch keeps in flight.
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Upper bound on batch concurrency.
pub const MAX_CONCURRENCY: usize = 100;

/// Default cap on a single response (1 MiB).
pub const DEFAULT_MAX_RESPONSE_BYTES: usize = 1024 * 1024;

/// Raw decoded response of one WHOIS round-trip.
pub type WhoisText = String;

/// Mapping of lifecycle event label to the date text printed by the registry.
pub type DateFields = BTreeMap<String, String>;

/// A query against a WHOIS server the caller already knows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhoisQuery {
    /// Domain as supplied by the user; encoded just before sending
    pub domain: String,

    /// WHOIS server host name
    pub server: String,

    /// TCP port, `None` means the client's default port (43)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

impl WhoisQuery {
    /// Create a query on the default port.
    pub fn new<D: Into<String>, S: Into<String>>(domain: D, server: S) -> Self {
        Self {
            domain: domain.into(),
            server: server.into(),
            port: None,
        }
    }

    /// Set an explicit port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }
}

/// A nameserver with the glue addresses published next to it.
///
/// Records are merged by host: one host never appears twice in an
/// extraction result, and its address lists are the union of every line
/// that mentioned it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nameserver {
    /// Lower-cased host name without the trailing root dot
    pub host: String,

    /// IPv4 glue, in first-seen order
    #[serde(default)]
    pub ipv4: Vec<Ipv4Addr>,

    /// IPv6 glue, in first-seen order
    #[serde(default)]
    pub ipv6: Vec<Ipv6Addr>,
}

impl Nameserver {
    /// Create a nameserver record with no addresses.
    pub fn new<H: AsRef<str>>(host: H) -> Self {
        Self {
            host: normalize_host(host.as_ref()),
            ipv4: Vec::new(),
            ipv6: Vec::new(),
        }
    }

    /// Add an address unless it is already known.
    pub fn add_address(&mut self, addr: IpAddr) {
        match addr {
            IpAddr::V4(v4) => {
                if !self.ipv4.contains(&v4) {
                    self.ipv4.push(v4);
                }
            }
            IpAddr::V6(v6) => {
                if !self.ipv6.contains(&v6) {
                    self.ipv6.push(v6);
                }
            }
        }
    }

    /// Whether any glue address is known for this host.
    pub fn has_glue(&self) -> bool {
        !self.ipv4.is_empty() || !self.ipv6.is_empty()
    }
}

/// Canonical form used for merge-by-host comparisons.
pub(crate) fn normalize_host(host: &str) -> String {
    host.trim().trim_end_matches('.').to_lowercase()
}

/// The three extraction targets of one WHOIS response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhoisRecord {
    /// Status codes in source order, duplicates kept
    pub statuses: Vec<String>,

    /// Event label to verbatim date text
    pub dates: DateFields,

    /// Nameservers merged by host
    pub nameservers: Vec<Nameserver>,
}

impl WhoisRecord {
    /// Whether nothing at all was extracted.
    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty() && self.dates.is_empty() && self.nameservers.is_empty()
    }
}

/// Per-domain result of a batch that does not stop at the first failure.
#[derive(Debug, Clone)]
pub enum QueryOutcome {
    /// The round-trip completed
    Success(WhoisText),

    /// The round-trip (or the referral lookup before it) failed
    Failure(WhoisError),
}

impl QueryOutcome {
    /// Whether this outcome holds response text.
    pub fn is_success(&self) -> bool {
        matches!(self, QueryOutcome::Success(_))
    }

    /// The response text, if the query succeeded.
    pub fn text(&self) -> Option<&str> {
        match self {
            QueryOutcome::Success(text) => Some(text),
            QueryOutcome::Failure(_) => None,
        }
    }

    /// The error, if the query failed.
    pub fn error(&self) -> Option<&WhoisError> {
        match self {
            QueryOutcome::Success(_) => None,
            QueryOutcome::Failure(err) => Some(err),
        }
    }

    /// Convert back into a `Result`.
    pub fn into_result(self) -> Result<WhoisText, WhoisError> {
        match self {
            QueryOutcome::Success(text) => Ok(text),
            QueryOutcome::Failure(err) => Err(err),
        }
    }
}

impl From<Result<WhoisText, WhoisError>> for QueryOutcome {
    fn from(result: Result<WhoisText, WhoisError>) -> Self {
        match result {
            Ok(text) => QueryOutcome::Success(text),
            Err(err) => QueryOutcome::Failure(err),
        }
    }
}

/// Configuration for a [`WhoisClient`](crate::WhoisClient).
///
/// Defaults are the named constants of this module; nothing is read from
/// global state, so tests can build a client pointing at stub servers.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Timeout applied to connecting, sending, and every single read
    /// Default: 5 seconds
    pub timeout: Duration,

    /// Port used when a query does not name one, including the
    /// follow-up query of authority resolution
    /// Default: 43
    pub default_port: u16,

    /// Root registry for authority resolution
    /// Default: whois.iana.org
    pub root_server: String,

    /// Port of the root registry
    /// Default: 43
    pub root_port: u16,

    /// Maximum number of concurrent round-trips in a batch
    /// Default: 10, Range: 1-100
    pub concurrency: usize,

    /// Responses larger than this fail with `ResponseTooLarge`
    /// Default: 1 MiB
    pub max_response_bytes: usize,

    /// Fixed socket addresses for (host, port) pairs, consulted before DNS
    pub server_addresses: HashMap<(String, u16), SocketAddr>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            default_port: DEFAULT_PORT,
            root_server: ROOT_SERVER.to_string(),
            root_port: DEFAULT_PORT,
            concurrency: DEFAULT_CONCURRENCY,
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
            server_addresses: HashMap::new(),
        }
    }
}

impl ClientConfig {
    /// Set the per-operation timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the default port.
    pub fn with_default_port(mut self, port: u16) -> Self {
        self.default_port = port;
        self
    }

    /// Set the root registry used for authority resolution.
    pub fn with_root_server<S: Into<String>>(mut self, server: S, port: u16) -> Self {
        self.root_server = server.into();
        self.root_port = port;
        self
    }

    /// Set batch concurrency.
    ///
    /// Automatically clamped to 1..=100.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.clamp(1, MAX_CONCURRENCY);
        self
    }

    /// Set the response size cap.
    pub fn with_max_response_bytes(mut self, limit: usize) -> Self {
        self.max_response_bytes = limit;
        self
    }

    /// Route connections for `host:port` to a fixed socket address.
    pub fn with_server_address<H: AsRef<str>>(
        mut self,
        host: H,
        port: u16,
        addr: SocketAddr,
    ) -> Self {
        self.server_addresses.insert((normalize_host(host.as_ref()), port), addr);
        self
    }

    /// Look up a pinned address for `host:port`.
    pub fn server_address(&self, host: &str, port: u16) -> Option<SocketAddr> {
        self.server_addresses
            .get(&(normalize_host(host), port))
            .copied()
    }
}
