//! Domain encoding for the WHOIS wire.
//!
//! WHOIS servers expect the ASCII-compatible form of a domain, so Unicode
//! labels are converted with IDNA before the query line is written.

use crate::error::WhoisError;

/// Convert a domain to its ASCII-compatible form.
///
/// Surrounding whitespace is ignored. Labels that are already ASCII are
/// lower-cased, which makes the function idempotent on its own output.
/// STD3 host rules apply: empty labels, labels with a leading or trailing
/// hyphen, and characters outside letters, digits, and hyphens are
/// rejected.
///
/// # Errors
///
/// Returns `WhoisError::Encoding` if the domain is empty or IDNA rejects
/// it (disallowed code points, broken punycode, over-long labels).
///
/// # Example
///
/// ```rust
/// use whois_getter_lib::encode_domain;
///
/// assert_eq!(encode_domain("bücher.example").unwrap(), "xn--bcher-kva.example");
/// ```
pub fn encode_domain(domain: &str) -> Result<String, WhoisError> {
    let trimmed = domain.trim();

    if trimmed.is_empty() {
        return Err(WhoisError::encoding(domain, "Domain name cannot be empty"));
    }

    let ascii = idna::domain_to_ascii_strict(trimmed).map_err(|e| {
        WhoisError::encoding(domain, format!("IDNA conversion failed: {:?}", e))
    })?;

    if ascii.is_empty() {
        return Err(WhoisError::encoding(
            domain,
            "Domain name encodes to nothing",
        ));
    }

    Ok(ascii)
}
