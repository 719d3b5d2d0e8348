//! Parser for .uk domains (Nominet format).
//!
//! Nominet prints section headers on their own line and the values
//! indented below them, so the `Label: value` rules do not apply.
//!
//! Example Nominet response:
//! ```text
//!     Relevant dates:
//!         Registered on: 26-Aug-2020
//!         Expiry date:  26-Aug-2025
//!
//!     Registration status:
//!         Registered until expiry date.
//!
//!     Name servers:
//!         ns1.example.co.uk         192.0.2.1
//!         ns2.example.co.uk
//! ```

use super::{split_field, NameserverCollector, RegistryFormat};
use crate::types::{DateFields, Nameserver};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Section {
    Other,
    Status,
    Dates,
    NameServers,
}

/// Section-based format of the .uk registry.
#[derive(Debug, Clone)]
pub struct NominetFormat {
    tlds: Vec<String>,
}

impl NominetFormat {
    /// Covers `uk` and the second-level suffixes Nominet runs under it.
    pub fn new() -> Self {
        Self {
            tlds: [
                "uk", "co.uk", "org.uk", "me.uk", "ltd.uk", "plc.uk", "net.uk", "sch.uk",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }

    /// Walk the text, handing each value line to `visit` with its section.
    fn walk<F: FnMut(Section, &str)>(text: &str, mut visit: F) {
        let mut section = Section::Other;

        for line in text.lines() {
            let trimmed = line.trim();

            if trimmed.is_empty() {
                section = Section::Other;
                continue;
            }

            if let Some(header) = section_header(trimmed) {
                section = header;
                continue;
            }

            if section != Section::Other {
                visit(section, trimmed);
            }
        }
    }
}

impl Default for NominetFormat {
    fn default() -> Self {
        Self::new()
    }
}

/// Recognise a header line: text ending in a colon with nothing after it.
fn section_header(line: &str) -> Option<Section> {
    let name = line.strip_suffix(':')?;
    if name.contains(':') {
        return None;
    }
    Some(match name.trim().to_lowercase().as_str() {
        "registration status" => Section::Status,
        "relevant dates" => Section::Dates,
        "name servers" => Section::NameServers,
        _ => Section::Other,
    })
}

impl RegistryFormat for NominetFormat {
    fn name(&self) -> &str {
        "nominet"
    }

    fn supported_tlds(&self) -> &[String] {
        &self.tlds
    }

    fn matches(&self, text: &str) -> bool {
        text.lines().any(|line| {
            matches!(
                section_header(line.trim()),
                Some(Section::Dates) | Some(Section::Status)
            )
        })
    }

    fn extract_statuses(&self, text: &str) -> Vec<String> {
        let mut statuses = Vec::new();
        Self::walk(text, |section, line| {
            if section == Section::Status {
                statuses.push(line.to_string());
            }
        });
        statuses
    }

    fn extract_dates(&self, text: &str) -> DateFields {
        let mut dates = DateFields::new();
        Self::walk(text, |section, line| {
            if section != Section::Dates {
                return;
            }
            if let Some((label, value)) = split_field(line) {
                if !value.is_empty() {
                    dates
                        .entry(label.to_string())
                        .or_insert_with(|| value.to_string());
                }
            }
        });
        dates
    }

    fn extract_nameservers(&self, text: &str) -> Vec<Nameserver> {
        let mut collector = NameserverCollector::new();
        Self::walk(text, |section, line| {
            if section == Section::NameServers {
                collector.add_line(line);
            }
        });
        collector.finish()
    }
}
