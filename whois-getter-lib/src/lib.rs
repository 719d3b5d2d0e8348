//! # whois-getter Library
//!
//! A WHOIS (RFC 3912) client that finds a domain's authoritative registry
//! through the IANA root server, plus a parser that pulls status codes,
//! lifecycle dates, and nameservers out of the free-text responses.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use whois_getter_lib::{WhoisClient, WhoisTextParser};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = WhoisClient::new();
//!     let text = client.query_authority("example.com").await?;
//!
//!     let record = WhoisTextParser::for_domain("example.com", &text).record();
//!     println!("{:?}", record.dates);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Authority referral**: one hop from `whois.iana.org` to the registry
//! - **Bounded batches**: concurrent queries with fail-fast or per-domain outcomes
//! - **Registry formats**: ICANN, RIPE-style, DENIC, and Nominet parsers,
//!   extensible with custom [`LineRules`]

// Re-export main public API types and functions
pub use client::WhoisClient;
pub use concurrent::ConcurrentProcessor;
pub use config::{
    load_env_config, parse_timeout, ClientSection, ConfigManager, EnvConfig, FileConfig,
    OutputConfig,
};
pub use encoding::encode_domain;
pub use error::WhoisError;
pub use parser::{
    FormatRegistry, LineRules, NominetFormat, RegistryFormat, RuleFormat, StatusStyle,
    WhoisTextParser, FORMAT_REGISTRY,
};
pub use protocols::{decode_response, extract_referral};
pub use types::{
    ClientConfig, DateFields, Nameserver, QueryOutcome, WhoisQuery, WhoisRecord, WhoisText,
    DEFAULT_CONCURRENCY, DEFAULT_MAX_RESPONSE_BYTES, DEFAULT_PORT, DEFAULT_TIMEOUT,
    MAX_CONCURRENCY, ROOT_SERVER,
};

// Internal modules - these are not part of the public API
mod client;
mod concurrent;
mod config;
mod encoding;
mod error;
mod parser;
mod protocols;
mod types;

// Type alias for convenience
pub type Result<T> = std::result::Result<T, WhoisError>;

// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
