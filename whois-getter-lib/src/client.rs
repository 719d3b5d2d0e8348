//! Main WHOIS client implementation.
//!
//! This module provides the `WhoisClient` struct that orchestrates single,
//! batch, and authority-resolving queries on top of the raw transport.

use crate::concurrent::ConcurrentProcessor;
use crate::encoding::encode_domain;
use crate::error::WhoisError;
use crate::protocols::{extract_referral, WhoisTransport};
use crate::types::{ClientConfig, QueryOutcome, WhoisQuery, WhoisText};
use std::collections::HashMap;
use tracing::{debug, instrument, warn};

/// WHOIS client that resolves the registry of record and fetches raw text.
///
/// The client holds only its configuration; every operation opens its own
/// connections and can be retried independently.
///
/// # Example
///
/// ```rust,no_run
/// use whois_getter_lib::{WhoisClient, WhoisTextParser};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = WhoisClient::new();
///     let text = client.query_authority("example.com").await?;
///
///     let parser = WhoisTextParser::for_domain("example.com", &text);
///     println!("Statuses: {:?}", parser.extract_statuses());
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct WhoisClient {
    /// Configuration settings for this client instance
    config: ClientConfig,
    /// TCP round-trip handling
    transport: WhoisTransport,
}

impl WhoisClient {
    /// Create a new client with default configuration.
    ///
    /// Default settings:
    /// - Timeout: 5 seconds
    /// - Port: 43
    /// - Root server: whois.iana.org
    /// - Concurrency: 10
    pub fn new() -> Self {
        Self::with_config(ClientConfig::default())
    }

    /// Create a new client with custom configuration.
    ///
    /// # Example
    ///
    /// ```rust
    /// use whois_getter_lib::{ClientConfig, WhoisClient};
    /// use std::time::Duration;
    ///
    /// let config = ClientConfig::default()
    ///     .with_timeout(Duration::from_secs(10))
    ///     .with_concurrency(4);
    ///
    /// let client = WhoisClient::with_config(config);
    /// assert_eq!(client.config().concurrency, 4);
    /// ```
    pub fn with_config(config: ClientConfig) -> Self {
        let transport = WhoisTransport::new(&config);
        Self { config, transport }
    }

    /// Get the current configuration for this client.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Query one server for one domain.
    ///
    /// Exactly one connect–send–receive–close cycle: the domain is encoded
    /// to its ASCII-compatible form, sent with a CRLF terminator, and the
    /// response is read until the server closes the connection.
    ///
    /// # Errors
    ///
    /// - `Encoding` if the domain cannot be encoded (no connection is made)
    /// - `ConnectTimeout` if connecting or any read stalls past the timeout
    /// - `Connection` if the server refuses or breaks the connection
    #[instrument(skip(self), fields(domain = %domain, server = %server, port = port))]
    pub async fn query_one(
        &self,
        domain: &str,
        server: &str,
        port: u16,
    ) -> Result<WhoisText, WhoisError> {
        let encoded = encode_domain(domain)?;
        debug!(query = %encoded, "Querying WHOIS server");
        self.transport.fetch(server, port, &encoded).await
    }

    /// Run a [`WhoisQuery`], using the default port when it names none.
    pub async fn query(&self, query: &WhoisQuery) -> Result<WhoisText, WhoisError> {
        let port = query.port.unwrap_or(self.config.default_port);
        self.query_one(&query.domain, &query.server, port).await
    }

    /// Query many domains against servers the caller already knows.
    ///
    /// Up to `concurrency` queries run at once. Results are keyed by domain;
    /// a domain listed twice keeps the result of its later request.
    ///
    /// # Errors
    ///
    /// Fails on the first error; queries still in flight are dropped.
    /// Use [`query_many_settled`](Self::query_many_settled) to keep
    /// partial results.
    pub async fn query_many(
        &self,
        requests: &[WhoisQuery],
    ) -> Result<HashMap<String, WhoisText>, WhoisError> {
        self.processor()
            .try_collect_all(requests, |request| {
                (request.domain.clone(), self.query(request))
            })
            .await
    }

    /// Query many domains and report each outcome separately.
    ///
    /// One unreachable registry does not discard the other results.
    pub async fn query_many_settled(
        &self,
        requests: &[WhoisQuery],
    ) -> HashMap<String, QueryOutcome> {
        self.processor()
            .collect_all(requests, |request| {
                let fut = async move {
                    let result = self.query(request).await;
                    self.settle(&request.domain, result)
                };
                (request.domain.clone(), fut)
            })
            .await
    }

    /// Find the authoritative WHOIS server for a domain.
    ///
    /// Queries the root registry and returns the host named on its
    /// `whois:` line.
    ///
    /// # Errors
    ///
    /// - `NoAuthorityServer` if the root response has no referral line
    /// - any error of [`query_one`](Self::query_one) against the root
    #[instrument(skip(self), fields(domain = %domain))]
    pub async fn find_authority(&self, domain: &str) -> Result<String, WhoisError> {
        let root = self
            .query_one(domain, &self.config.root_server, self.config.root_port)
            .await?;

        match extract_referral(&root) {
            Some(server) => {
                debug!(referral = %server, "Root registry referral found");
                Ok(server)
            }
            None => Err(WhoisError::no_authority_server(
                domain,
                &self.config.root_server,
            )),
        }
    }

    /// Query the authoritative WHOIS server for a domain.
    ///
    /// The process:
    /// 1. Query the root registry (`whois.iana.org:43` by default)
    /// 2. Extract the `whois:` referral; stop with `NoAuthorityServer` if absent
    /// 3. Query the referred server once on the default port
    ///
    /// Only one referral hop is followed.
    ///
    /// # Errors
    ///
    /// Errors of either query propagate unchanged.
    #[instrument(skip(self), fields(domain = %domain))]
    pub async fn query_authority(&self, domain: &str) -> Result<WhoisText, WhoisError> {
        let server = self.find_authority(domain).await?;
        self.query_one(domain, &server, self.config.default_port).await
    }

    /// Run [`query_authority`](Self::query_authority) for each domain.
    ///
    /// Same keying and fail-fast rules as [`query_many`](Self::query_many).
    pub async fn query_authority_many<S: AsRef<str>>(
        &self,
        domains: &[S],
    ) -> Result<HashMap<String, WhoisText>, WhoisError> {
        self.processor()
            .try_collect_all(domains, |domain| {
                let domain = domain.as_ref();
                (domain.to_string(), self.query_authority(domain))
            })
            .await
    }

    /// Run [`query_authority`](Self::query_authority) for each domain,
    /// keeping failures next to successes.
    pub async fn query_authority_many_settled<S: AsRef<str>>(
        &self,
        domains: &[S],
    ) -> HashMap<String, QueryOutcome> {
        self.processor()
            .collect_all(domains, |domain| {
                let domain = domain.as_ref();
                let fut = async move {
                    let result = self.query_authority(domain).await;
                    self.settle(domain, result)
                };
                (domain.to_string(), fut)
            })
            .await
    }

    fn processor(&self) -> ConcurrentProcessor {
        ConcurrentProcessor::new(self.config.concurrency)
    }

    fn settle(&self, domain: &str, result: Result<WhoisText, WhoisError>) -> QueryOutcome {
        if let Err(e) = &result {
            warn!(domain = %domain, error = %e, "WHOIS query failed");
        }
        QueryOutcome::from(result)
    }
}

impl Default for WhoisClient {
    fn default() -> Self {
        Self::new()
    }
}
