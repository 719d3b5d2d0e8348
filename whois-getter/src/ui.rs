//! Text-mode display logic for the whois-getter CLI.
//!
//! Raw responses go to stdout untouched; headers, extracted fields, and
//! the summary are styled with `console`. Errors go to stderr.

use console::{pad_str, style, Alignment};
use std::time::Duration;
use whois_getter_lib::{Nameserver, WhoisError, WhoisRecord};

use crate::ErrorStats;

const LABEL_WIDTH: usize = 24;

// ── Headers ──────────────────────────────────────────────────────────────────

/// Print the banner above one domain's output.
pub fn print_domain_header(domain: &str, source: Option<&str>) {
    let source = source
        .map(|s| format!("  {}", style(format!("via {}", s)).dim()))
        .unwrap_or_default();
    let banner = style(format!("── {} ", domain)).cyan().bold();
    println!("{}{}", banner, source);
}

// ── Raw text ─────────────────────────────────────────────────────────────────

/// Print a raw response exactly as received.
pub fn print_raw(domain: &str, server: Option<&str>, text: &str) {
    print_domain_header(domain, server);
    print!("{}", text);
    if !text.ends_with('\n') {
        println!();
    }
    println!();
}

// ── Extracted fields ─────────────────────────────────────────────────────────

/// Print the extracted statuses, dates, and nameservers of one response.
pub fn print_record(domain: &str, format_name: &str, record: &WhoisRecord) {
    print_domain_header(domain, Some(format_name));

    if record.is_empty() {
        println!("  {}", style("No registration fields found").yellow());
        println!();
        return;
    }

    if !record.statuses.is_empty() {
        println!("  {}", style("Status").bold());
        for status in &record.statuses {
            println!("    {}", style(status).green());
        }
    }

    if !record.dates.is_empty() {
        println!("  {}", style("Dates").bold());
        for (label, value) in &record.dates {
            println!(
                "    {}  {}",
                pad_str(label, LABEL_WIDTH, Alignment::Left, Some("..")),
                value
            );
        }
    }

    if !record.nameservers.is_empty() {
        println!("  {}", style("Nameservers").bold());
        for nameserver in &record.nameservers {
            println!("    {}", format_nameserver(nameserver));
        }
    }

    println!();
}

/// One line per nameserver: host followed by any glue, dimmed.
pub fn format_nameserver(nameserver: &Nameserver) -> String {
    let addresses: Vec<String> = nameserver
        .ipv4
        .iter()
        .map(|a| a.to_string())
        .chain(nameserver.ipv6.iter().map(|a| a.to_string()))
        .collect();

    if addresses.is_empty() {
        nameserver.host.clone()
    } else {
        format!("{}  {}", nameserver.host, style(addresses.join(", ")).dim())
    }
}

// ── Referral ─────────────────────────────────────────────────────────────────

/// Print the authoritative server found for a domain.
pub fn print_referral(domain: &str, server: &str) {
    println!(
        "  {}  {}",
        pad_str(domain, 30, Alignment::Left, Some("..")),
        style(server).green().bold()
    );
}

// ── Errors ───────────────────────────────────────────────────────────────────

/// Print one domain's failure to stderr.
pub fn print_error(domain: &str, error: &WhoisError) {
    eprintln!(
        "  {}  {}  {}",
        pad_str(domain, 30, Alignment::Left, Some("..")),
        style(brief_error(error)).red().bold(),
        style(error).dim()
    );
}

fn brief_error(error: &WhoisError) -> &'static str {
    match error {
        WhoisError::ConnectTimeout { .. } => "TIMEOUT",
        WhoisError::Connection { .. } => "UNREACHABLE",
        WhoisError::NoAuthorityServer { .. } => "NO REFERRAL",
        WhoisError::Encoding { .. } => "INVALID",
        WhoisError::ResponseTooLarge { .. } => "TOO LARGE",
        _ => "ERROR",
    }
}

// ── Summary ──────────────────────────────────────────────────────────────────

/// Print the final summary bar for a batch.
pub fn print_summary(total: usize, error_stats: &ErrorStats, duration: Duration) {
    let failed = error_stats.total();
    eprintln!(
        "  {}",
        style("────────────────────────────────────────────────────").dim()
    );
    eprintln!(
        "  {} domain{} in {:.1}s  {}  {}  {}  {}",
        style(total).bold(),
        if total == 1 { "" } else { "s" },
        duration.as_secs_f64(),
        style("|").dim(),
        style(format!("{} ok", total - failed)).green(),
        style("|").dim(),
        style(format!("{} failed", failed)).red(),
    );

    if error_stats.has_errors() {
        for line in error_stats.format_lines() {
            eprintln!("  {}", style(line).yellow());
        }
    }
}
