//! WHOIS response text parsing.
//!
//! Registries do not share one output grammar, so extraction goes through a
//! [`RegistryFormat`] strategy. A [`FormatRegistry`] picks the strategy by
//! TLD or by the shape of the response, falling back to the ICANN gTLD
//! grammar. Extraction is best-effort and never fails: a field the format
//! does not find yields an empty result.

mod nominet;
mod rules;

use lazy_static::lazy_static;
use std::net::IpAddr;

use crate::types::{normalize_host, DateFields, Nameserver, WhoisRecord};
pub use nominet::NominetFormat;
pub use rules::{LineRules, RuleFormat, StatusStyle};

/// Field-extraction rules for one family of registry output.
///
/// Implementors must be pure: the same text always gives the same result.
pub trait RegistryFormat: Send + Sync {
    /// Short identifier, e.g. `"icann"`.
    fn name(&self) -> &str;

    /// TLDs (or second-level suffixes like `co.uk`) served by this format.
    fn supported_tlds(&self) -> &[String];

    /// Whether the response looks like this format.
    fn matches(&self, text: &str) -> bool;

    /// Status codes in source order, duplicates kept.
    fn extract_statuses(&self, text: &str) -> Vec<String>;

    /// Date labels mapped to their verbatim values.
    fn extract_dates(&self, text: &str) -> DateFields;

    /// Nameservers merged by host.
    fn extract_nameservers(&self, text: &str) -> Vec<Nameserver>;
}

/// Ordered set of registry formats with a fallback.
///
/// Specialised formats are tried in registration order; the fallback is
/// the ICANN grammar, used when nothing else claims a response.
pub struct FormatRegistry {
    formats: Vec<Box<dyn RegistryFormat>>,
    fallback: RuleFormat,
}

impl FormatRegistry {
    /// Creates a registry with every built-in format.
    pub fn new() -> Self {
        Self {
            formats: vec![
                Box::new(NominetFormat::new()), // .uk
                Box::new(RuleFormat::denic()),  // .de
                Box::new(RuleFormat::ripe()),   // .ru, .su, .fr
            ],
            fallback: RuleFormat::icann(),
        }
    }

    /// Creates a registry that only knows the fallback format.
    pub fn empty() -> Self {
        Self {
            formats: Vec::new(),
            fallback: RuleFormat::icann(),
        }
    }

    /// Add a format, tried after the ones already registered.
    pub fn register(&mut self, format: Box<dyn RegistryFormat>) {
        self.formats.push(format);
    }

    /// The format used when nothing else matches.
    pub fn fallback(&self) -> &dyn RegistryFormat {
        &self.fallback
    }

    /// Look up a format by name, including the fallback.
    pub fn by_name(&self, name: &str) -> Option<&dyn RegistryFormat> {
        if self.fallback.name().eq_ignore_ascii_case(name) {
            return Some(&self.fallback);
        }
        self.formats
            .iter()
            .map(|f| f.as_ref())
            .find(|f| f.name().eq_ignore_ascii_case(name))
    }

    /// Names of every known format, fallback last.
    pub fn names(&self) -> Vec<&str> {
        self.formats
            .iter()
            .map(|f| f.name())
            .chain(std::iter::once(self.fallback.name()))
            .collect()
    }

    /// Find the format registered for the domain's TLD.
    ///
    /// Second-level suffixes (`co.uk`) and plain TLDs (`uk`) both match.
    pub fn for_tld(&self, domain: &str) -> Option<&dyn RegistryFormat> {
        let domain = normalize_host(domain);
        self.formats
            .iter()
            .map(|f| f.as_ref())
            .find(|f| {
                f.supported_tlds()
                    .iter()
                    .any(|tld| has_suffix(&domain, tld))
            })
    }

    /// Pick a format from the shape of the response.
    pub fn infer(&self, text: &str) -> &dyn RegistryFormat {
        self.formats
            .iter()
            .map(|f| f.as_ref())
            .find(|f| f.matches(text))
            .unwrap_or(&self.fallback)
    }

    /// TLD match first, then shape inference.
    pub fn for_domain(&self, domain: &str, text: &str) -> &dyn RegistryFormat {
        self.for_tld(domain).unwrap_or_else(|| self.infer(text))
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::new()
    }
}

lazy_static! {
    /// Process-wide registry of the built-in formats.
    pub static ref FORMAT_REGISTRY: FormatRegistry = FormatRegistry::new();
}

fn has_suffix(domain: &str, tld: &str) -> bool {
    let tld = tld.trim_start_matches('.').to_lowercase();
    domain == tld || domain.ends_with(&format!(".{}", tld))
}

/// Extracts statuses, dates, and nameservers from one WHOIS response.
///
/// All operations are pure reads of the text and may be called in any
/// order, any number of times.
///
/// # Example
///
/// ```rust
/// use whois_getter_lib::WhoisTextParser;
///
/// let text = "Domain Status: clientTransferProhibited\nDomain Status: clientUpdateProhibited\n";
/// let parser = WhoisTextParser::new(text);
/// assert_eq!(
///     parser.extract_statuses(),
///     vec!["clientTransferProhibited", "clientUpdateProhibited"]
/// );
/// ```
pub struct WhoisTextParser<'a> {
    text: &'a str,
    format: &'a dyn RegistryFormat,
}

impl<'a> WhoisTextParser<'a> {
    /// Parser whose format is inferred from the response shape.
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            format: FORMAT_REGISTRY.infer(text),
        }
    }

    /// Parser whose format is chosen by the domain's TLD, then by shape.
    pub fn for_domain(domain: &str, text: &'a str) -> Self {
        Self {
            text,
            format: FORMAT_REGISTRY.for_domain(domain, text),
        }
    }

    /// Parser using a caller-supplied format.
    pub fn with_format(text: &'a str, format: &'a dyn RegistryFormat) -> Self {
        Self { text, format }
    }

    /// Name of the format in use.
    pub fn format_name(&self) -> &str {
        self.format.name()
    }

    /// Status codes in source order, duplicates kept.
    pub fn extract_statuses(&self) -> Vec<String> {
        self.format.extract_statuses(self.text)
    }

    /// Date labels mapped to the values exactly as the registry printed them.
    pub fn extract_dates(&self) -> DateFields {
        self.format.extract_dates(self.text)
    }

    /// Nameservers with their glue addresses, one record per host.
    pub fn extract_nameservers(&self) -> Vec<Nameserver> {
        self.format.extract_nameservers(self.text)
    }

    /// All three extractions at once.
    pub fn record(&self) -> WhoisRecord {
        WhoisRecord {
            statuses: self.extract_statuses(),
            dates: self.extract_dates(),
            nameservers: self.extract_nameservers(),
        }
    }
}

/// Split a `Label: value` line.
///
/// The label must start with a letter, and none of its words may start
/// with a digit; this keeps free-text lines such as
/// `Last updated on 2024-11-20T11:21:31Z` from being read as a label
/// ending inside the timestamp. Letters outside ASCII are allowed.
pub(crate) fn split_field(line: &str) -> Option<(&str, &str)> {
    let line = line.trim();
    let (label, value) = line.split_once(':')?;
    let label = label.trim();

    let first = label.chars().next()?;
    if !first.is_alphabetic() {
        return None;
    }

    let chars_ok = label.chars().all(|c| {
        c.is_alphanumeric()
            || c.is_whitespace()
            || matches!(c, '-' | '_' | '/' | '.' | '(' | ')' | '\'')
    });
    let words_ok = label
        .split_whitespace()
        .all(|word| !word.starts_with(|c: char| c.is_ascii_digit()));
    if !chars_ok || !words_ok {
        return None;
    }

    Some((label, value.trim()))
}

/// Lower-case a label and collapse inner whitespace.
pub(crate) fn normalize_label(label: &str) -> String {
    label
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Split a value into address-like tokens.
fn tokens(value: &str) -> impl Iterator<Item = &str> {
    value
        .split(|c: char| c.is_whitespace() || c == ',')
        .map(|t| t.trim_matches(|c| matches!(c, '(' | ')' | '[' | ']')))
        .filter(|t| !t.is_empty())
}

/// Parse every token that is an IP address.
pub(crate) fn parse_addresses(value: &str) -> Vec<IpAddr> {
    tokens(value).filter_map(|t| t.parse::<IpAddr>().ok()).collect()
}

/// Accumulates nameserver records, merging by host.
#[derive(Debug, Default)]
pub(crate) struct NameserverCollector {
    records: Vec<Nameserver>,
    last: Option<usize>,
}

impl NameserverCollector {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Record a `host [addr...]` value. Values whose first token is an
    /// address rather than a host are ignored.
    pub(crate) fn add_line(&mut self, value: &str) {
        let mut parts = tokens(value);
        let host = match parts.next() {
            Some(host) if host.parse::<IpAddr>().is_err() => host,
            _ => return,
        };

        let index = self.entry(host);
        for addr in parts.filter_map(|t| t.parse::<IpAddr>().ok()) {
            self.records[index].add_address(addr);
        }
        self.last = Some(index);
    }

    /// Attach glue from a separate address line to the last host seen.
    pub(crate) fn add_glue(&mut self, value: &str) {
        if let Some(index) = self.last {
            for addr in parse_addresses(value) {
                self.records[index].add_address(addr);
            }
        }
    }

    pub(crate) fn finish(self) -> Vec<Nameserver> {
        self.records
    }

    fn entry(&mut self, host: &str) -> usize {
        let host = normalize_host(host);
        if let Some(index) = self.records.iter().position(|ns| ns.host == host) {
            return index;
        }
        self.records.push(Nameserver::new(&host));
        self.records.len() - 1
    }
}
