//! Rule-driven parsing for `Label: value` registry output.
//!
//! Most registries print one field per line. They differ in which labels
//! they use, so the labels are data: a [`LineRules`] value names them, and
//! [`RuleFormat`] applies them. The built-in rule sets cover the ICANN gTLD
//! layout, the lower-case RIPE-style layout, and DENIC.

use lazy_static::lazy_static;
use regex::Regex;

use super::{normalize_label, split_field, NameserverCollector, RegistryFormat};
use crate::types::{DateFields, Nameserver};

lazy_static! {
    /// Labels that carry a lifecycle date in at least one registry.
    static ref DATE_LABELS: Regex = Regex::new(
        r"(?i)\b(date|created|creation|changed|updated|modified|expir\w*|registered|paid-till|free-date|renewal)\b"
    )
    .expect("valid date label regex");
}

/// How the value of a status line is turned into status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusStyle {
    /// First whitespace-separated token (`clientHold https://icann.org/epp#clientHold`)
    FirstToken,
    /// Comma-separated list (`REGISTERED, DELEGATED, VERIFIED`)
    CommaList,
    /// The whole trimmed value
    WholeValue,
}

impl StatusStyle {
    fn split(self, value: &str) -> Vec<String> {
        match self {
            StatusStyle::FirstToken => value
                .split_whitespace()
                .next()
                .map(|s| vec![s.to_string()])
                .unwrap_or_default(),
            StatusStyle::CommaList => value
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            StatusStyle::WholeValue => vec![value.to_string()],
        }
    }
}

/// Labels and value handling for one registry grammar.
///
/// Label comparisons ignore case and repeated whitespace.
#[derive(Debug, Clone)]
pub struct LineRules {
    status_labels: Vec<String>,
    status_style: StatusStyle,
    date_labels: Regex,
    nameserver_labels: Vec<String>,
    glue_labels: Vec<String>,
}

impl LineRules {
    /// Rules with no labels at all; extend them with the `with_*` methods.
    pub fn new() -> Self {
        Self {
            status_labels: Vec::new(),
            status_style: StatusStyle::FirstToken,
            date_labels: DATE_LABELS.clone(),
            nameserver_labels: Vec::new(),
            glue_labels: Vec::new(),
        }
    }

    /// ICANN gTLD layout (Verisign, PIR, most registrars).
    pub fn icann() -> Self {
        Self::new()
            .with_status_label("Domain Status")
            .with_status_label("Status")
            .with_nameserver_label("Name Server")
            .with_nameserver_label("Nameserver")
            .with_nameserver_label("Nameservers")
            .with_nameserver_label("nserver")
            .with_glue_label("IP Address")
            .with_glue_label("IP Addresses")
            .with_glue_label("IPv4 Address")
            .with_glue_label("IPv6 Address")
            .with_glue_label("Name Server IP")
    }

    /// Lower-case RIPE-style layout used by .ru, .su, and AFNIC.
    pub fn ripe() -> Self {
        Self::new()
            .with_status_label("state")
            .with_status_label("status")
            .with_status_style(StatusStyle::CommaList)
            .with_nameserver_label("nserver")
            .with_glue_label("ip-address")
    }

    /// DENIC (.de) layout.
    pub fn denic() -> Self {
        Self::new()
            .with_status_label("Status")
            .with_nameserver_label("Nserver")
    }

    /// Treat lines with this label as status lines.
    pub fn with_status_label<S: AsRef<str>>(mut self, label: S) -> Self {
        self.status_labels.push(normalize_label(label.as_ref()));
        self
    }

    /// Set how status values are split.
    pub fn with_status_style(mut self, style: StatusStyle) -> Self {
        self.status_style = style;
        self
    }

    /// Replace the pattern deciding which labels carry dates.
    pub fn with_date_labels(mut self, pattern: Regex) -> Self {
        self.date_labels = pattern;
        self
    }

    /// Treat lines with this label as nameserver lines.
    pub fn with_nameserver_label<S: AsRef<str>>(mut self, label: S) -> Self {
        self.nameserver_labels.push(normalize_label(label.as_ref()));
        self
    }

    /// Treat lines with this label as glue for the preceding nameserver.
    pub fn with_glue_label<S: AsRef<str>>(mut self, label: S) -> Self {
        self.glue_labels.push(normalize_label(label.as_ref()));
        self
    }

    fn is_status(&self, label: &str) -> bool {
        self.status_labels.contains(&normalize_label(label))
    }

    fn is_date(&self, label: &str, value: &str) -> bool {
        self.date_labels.is_match(label) && value.chars().any(|c| c.is_ascii_digit())
    }

    fn is_nameserver(&self, label: &str) -> bool {
        self.nameserver_labels.contains(&normalize_label(label))
    }

    fn is_glue(&self, label: &str) -> bool {
        self.glue_labels.contains(&normalize_label(label))
    }
}

impl Default for LineRules {
    fn default() -> Self {
        Self::icann()
    }
}

/// A [`RegistryFormat`] driven by [`LineRules`].
#[derive(Debug, Clone)]
pub struct RuleFormat {
    name: String,
    tlds: Vec<String>,
    /// Raw labels (case-sensitive) that must all appear for shape inference
    signature: Vec<String>,
    rules: LineRules,
}

impl RuleFormat {
    /// Create a format with the given rules.
    ///
    /// Without a signature the format never claims a response by shape; it
    /// is still used when selected by TLD or by name.
    pub fn new<N: Into<String>>(name: N, rules: LineRules) -> Self {
        Self {
            name: name.into(),
            tlds: Vec::new(),
            signature: Vec::new(),
            rules,
        }
    }

    /// Serve these TLDs.
    pub fn with_tlds<I, S>(mut self, tlds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tlds.extend(tlds.into_iter().map(Into::into));
        self
    }

    /// Claim responses in which all of these labels occur, matched
    /// exactly as printed.
    pub fn with_signature<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.signature.extend(labels.into_iter().map(Into::into));
        self
    }

    /// The ICANN gTLD format, used as the fallback.
    pub fn icann() -> Self {
        Self::new("icann", LineRules::icann()).with_signature(["Domain Name"])
    }

    /// RIPE-style lower-case format.
    pub fn ripe() -> Self {
        Self::new("ripe", LineRules::ripe())
            .with_tlds(["ru", "su", "xn--p1ai", "fr"])
            .with_signature(["domain", "nserver"])
    }

    /// DENIC format.
    pub fn denic() -> Self {
        Self::new("denic", LineRules::denic())
            .with_tlds(["de"])
            .with_signature(["Domain", "Nserver"])
    }

    /// The rules this format applies.
    pub fn rules(&self) -> &LineRules {
        &self.rules
    }
}

impl RegistryFormat for RuleFormat {
    fn name(&self) -> &str {
        &self.name
    }

    fn supported_tlds(&self) -> &[String] {
        &self.tlds
    }

    fn matches(&self, text: &str) -> bool {
        if self.signature.is_empty() {
            return false;
        }
        self.signature.iter().all(|wanted| {
            text.lines()
                .filter_map(split_field)
                .any(|(label, _)| label == wanted)
        })
    }

    fn extract_statuses(&self, text: &str) -> Vec<String> {
        text.lines()
            .filter_map(split_field)
            .filter(|(label, value)| {
                !value.is_empty() && self.rules.is_status(label)
            })
            .flat_map(|(_, value)| self.rules.status_style.split(value))
            .collect()
    }

    fn extract_dates(&self, text: &str) -> DateFields {
        let mut dates = DateFields::new();
        for (label, value) in text.lines().filter_map(split_field) {
            if self.rules.is_date(label, value) {
                dates
                    .entry(label.to_string())
                    .or_insert_with(|| value.to_string());
            }
        }
        dates
    }

    fn extract_nameservers(&self, text: &str) -> Vec<Nameserver> {
        let mut collector = NameserverCollector::new();
        for (label, value) in text.lines().filter_map(split_field) {
            if value.is_empty() {
                continue;
            }
            if self.rules.is_nameserver(label) {
                collector.add_line(value);
            } else if self.rules.is_glue(label) {
                collector.add_glue(value);
            }
        }
        collector.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERISIGN_RESPONSE: &str = r#"   Domain Name: EXAMPLE.COM
   Registry Domain ID: 2336799_DOMAIN_COM-VRSN
   Registrar WHOIS Server: whois.iana.org
   Registrar URL: http://res-dom.iana.org
   Updated Date: 2024-08-14T07:01:34Z
   Creation Date: 1995-08-14T04:00:00Z
   Registry Expiry Date: 2025-08-13T04:00:00Z
   Registrar: RESERVED-Internet Assigned Numbers Authority
   Registrar IANA ID: 376
   Registrar Abuse Contact Email:
   Registrar Abuse Contact Phone:
   Domain Status: clientDeleteProhibited https://icann.org/epp#clientDeleteProhibited
   Domain Status: clientTransferProhibited https://icann.org/epp#clientTransferProhibited
   Domain Status: clientUpdateProhibited https://icann.org/epp#clientUpdateProhibited
   Name Server: A.IANA-SERVERS.NET
   Name Server: B.IANA-SERVERS.NET
   DNSSEC: signedDelegation
   DNSSEC DS Data: 370 13 2 BE74359954660069D5C63D200C39F5603827D7DD02B56F120EE9F3A86764247C
   URL of the ICANN Whois Inaccuracy Complaint Form: https://www.icann.org/wicf/
>>> Last update of whois database: 2024-11-20T11:21:31Z <<<
"#;

    const REGISTRAR_GLUE_RESPONSE: &str = "Domain Name: example.test
Registrar Registration Expiration Date:
Name Server: NS1.EXAMPLE.TEST
IP Address: 192.0.2.53
IP Address: 2001:db8::53
Name Server: ns2.example.test
Domain Status: ok https://icann.org/epp#ok
";

    const RU_RESPONSE: &str = "% TCI Whois Service. Terms of use:
% https://tcinet.ru/documents/whois_ru_rf.pdf (in Russian)

domain:        EXAMPLE.RU
nserver:       ns1.example.ru. 192.0.2.1, 2001:db8::53
nserver:       ns2.example.ru.
state:         REGISTERED, DELEGATED, VERIFIED
org:           Example LLC
registrar:     RU-CENTER-RU
admin-contact: https://www.nic.ru/whois
created:       2004-06-23T20:00:00Z
paid-till:     2025-06-24T21:00:00Z
free-date:     2025-07-26
source:        TCI

Last updated on 2024-11-20T11:21:31Z
";

    const DENIC_RESPONSE: &str = "Domain: example.de
Nserver: ns1.example.de 192.0.2.1
Nserver: ns2.example.de
Status: connect
Changed: 2023-01-15T10:30:00+01:00
";

    #[test]
    fn test_icann_statuses_drop_epp_url() {
        let format = RuleFormat::icann();
        assert_eq!(
            format.extract_statuses(VERISIGN_RESPONSE),
            vec![
                "clientDeleteProhibited",
                "clientTransferProhibited",
                "clientUpdateProhibited"
            ]
        );
    }

    #[test]
    fn test_icann_dates_are_verbatim() {
        let dates = RuleFormat::icann().extract_dates(VERISIGN_RESPONSE);
        assert_eq!(dates.len(), 3);
        assert_eq!(dates["Updated Date"], "2024-08-14T07:01:34Z");
        assert_eq!(dates["Creation Date"], "1995-08-14T04:00:00Z");
        assert_eq!(dates["Registry Expiry Date"], "2025-08-13T04:00:00Z");
    }

    #[test]
    fn test_icann_nameservers_lowercased() {
        let nameservers = RuleFormat::icann().extract_nameservers(VERISIGN_RESPONSE);
        let hosts: Vec<&str> = nameservers.iter().map(|ns| ns.host.as_str()).collect();
        assert_eq!(hosts, vec!["a.iana-servers.net", "b.iana-servers.net"]);
    }

    #[test]
    fn test_icann_glue_lines_follow_host() {
        let format = RuleFormat::icann();
        let nameservers = format.extract_nameservers(REGISTRAR_GLUE_RESPONSE);
        assert_eq!(nameservers.len(), 2);
        assert_eq!(nameservers[0].host, "ns1.example.test");
        assert_eq!(
            nameservers[0].ipv4,
            vec!["192.0.2.53".parse::<std::net::Ipv4Addr>().unwrap()]
        );
        assert_eq!(
            nameservers[0].ipv6,
            vec!["2001:db8::53".parse::<std::net::Ipv6Addr>().unwrap()]
        );
        assert!(!nameservers[1].has_glue());

        // empty expiration value is not a date
        assert!(format.extract_dates(REGISTRAR_GLUE_RESPONSE).is_empty());
        assert_eq!(format.extract_statuses(REGISTRAR_GLUE_RESPONSE), vec!["ok"]);
    }

    #[test]
    fn test_ripe_format() {
        let format = RuleFormat::ripe();
        assert!(format.matches(RU_RESPONSE));

        assert_eq!(
            format.extract_statuses(RU_RESPONSE),
            vec!["REGISTERED", "DELEGATED", "VERIFIED"]
        );

        let dates = format.extract_dates(RU_RESPONSE);
        assert_eq!(dates.len(), 3);
        assert_eq!(dates["created"], "2004-06-23T20:00:00Z");
        assert_eq!(dates["paid-till"], "2025-06-24T21:00:00Z");
        assert_eq!(dates["free-date"], "2025-07-26");

        let nameservers = format.extract_nameservers(RU_RESPONSE);
        assert_eq!(nameservers.len(), 2);
        assert_eq!(nameservers[0].host, "ns1.example.ru");
        assert_eq!(nameservers[0].ipv4.len(), 1);
        assert_eq!(nameservers[0].ipv6.len(), 1);
        assert_eq!(nameservers[1].host, "ns2.example.ru");
    }

    #[test]
    fn test_denic_format() {
        let format = RuleFormat::denic();
        assert!(format.matches(DENIC_RESPONSE));
        assert!(!format.matches(RU_RESPONSE));

        assert_eq!(format.extract_statuses(DENIC_RESPONSE), vec!["connect"]);
        let dates = format.extract_dates(DENIC_RESPONSE);
        assert_eq!(
            dates.get("Changed").map(String::as_str),
            Some("2023-01-15T10:30:00+01:00")
        );

        let nameservers = format.extract_nameservers(DENIC_RESPONSE);
        assert_eq!(nameservers.len(), 2);
        assert_eq!(nameservers[0].ipv4.len(), 1);
    }

    #[test]
    fn test_duplicate_date_label_keeps_first() {
        let text = "Updated Date: 2020-01-01\nUpdated Date: 2021-01-01\n";
        let dates = RuleFormat::icann().extract_dates(text);
        assert_eq!(dates["Updated Date"], "2020-01-01");
    }

    #[test]
    fn test_icann_glue_from_ip_version_labels() {
        let text = "Name Server: ns1.example.test\n\
                    IPv4 Address: 192.0.2.53\n\
                    IPv6 Address: 2001:db8::53\n";
        let nameservers = RuleFormat::icann().extract_nameservers(text);
        assert_eq!(nameservers.len(), 1);
        assert_eq!(
            nameservers[0].ipv4,
            vec!["192.0.2.53".parse::<std::net::Ipv4Addr>().unwrap()]
        );
        assert_eq!(
            nameservers[0].ipv6,
            vec!["2001:db8::53".parse::<std::net::Ipv6Addr>().unwrap()]
        );
    }

    #[test]
    fn test_custom_rules_extend_a_format() {
        let rules = LineRules::new()
            .with_status_label("Estado")
            .with_status_style(StatusStyle::WholeValue)
            .with_date_labels(Regex::new(r"(?i)\bfecha\b").unwrap())
            .with_nameserver_label("Servidor DNS");
        let format = RuleFormat::new("custom", rules).with_tlds(["test"]);

        let text = "Estado: Activo hasta renovar\n\
                    Servidor DNS: ns1.example.test\n\
                    Fecha de Creación: 2001-01-01\n";
        assert_eq!(
            format.extract_statuses(text),
            vec!["Activo hasta renovar"]
        );
        assert_eq!(format.extract_nameservers(text).len(), 1);

        let dates = format.extract_dates(text);
        assert_eq!(dates.len(), 1);
        assert_eq!(dates["Fecha de Creación"], "2001-01-01");
        assert!(!format.matches(text));
    }

    #[test]
    fn test_non_ascii_status_label() {
        let rules = LineRules::new().with_status_label("Situación");
        let format = RuleFormat::new("custom", rules);
        assert_eq!(
            format.extract_statuses("Situación: activo\n"),
            vec!["activo"]
        );
    }

    #[test]
    fn test_status_styles() {
        assert_eq!(
            StatusStyle::FirstToken.split("ok https://icann.org/epp#ok"),
            vec!["ok"]
        );
        assert_eq!(StatusStyle::CommaList.split("A, B,,C"), vec!["A", "B", "C"]);
        assert_eq!(
            StatusStyle::WholeValue.split("Registered until expiry date."),
            vec!["Registered until expiry date."]
        );
    }
}
