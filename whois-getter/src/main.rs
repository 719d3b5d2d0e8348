//! whois-getter CLI Application
//!
//! A command-line interface for querying WHOIS servers. By default each
//! domain is resolved through the IANA root registry and its authoritative
//! server is queried; the raw response or the extracted registration
//! fields are printed.

mod ui;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::Parser;
use serde::Serialize;
use std::collections::HashMap;
use std::process;
use std::time::Instant;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;
use whois_getter_lib::{
    decode_response, load_env_config, parse_timeout, ClientConfig, ConcurrentProcessor,
    ConfigManager, FileConfig, OutputConfig, QueryOutcome, WhoisClient, WhoisError, WhoisQuery,
    WhoisRecord, WhoisTextParser, FORMAT_REGISTRY, MAX_CONCURRENCY,
};

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// CLI arguments for whois-getter
#[derive(Parser, Debug)]
#[command(name = "whois-getter")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Query WHOIS servers and extract registration fields")]
#[command(
    long_about = "Query WHOIS servers over RFC 3912.\n\nBy default the authoritative server is found through whois.iana.org; use --server to query a known server directly. Responses can be printed raw or parsed into statuses, dates, and nameservers."
)]
#[command(styles = STYLES)]
pub struct Args {
    /// Domain names to query
    #[arg(value_name = "DOMAINS", help_heading = "Query")]
    pub domains: Vec<String>,

    /// Query this server directly instead of resolving the authority
    #[arg(
        short = 's',
        long = "server",
        value_name = "HOST",
        help_heading = "Query"
    )]
    pub server: Option<String>,

    /// WHOIS port (default: 43)
    #[arg(
        short = 'p',
        long = "port",
        value_name = "PORT",
        help_heading = "Query"
    )]
    pub port: Option<u16>,

    /// Only print the authoritative server for each domain
    #[arg(long = "refer-only", help_heading = "Query")]
    pub refer_only: bool,

    /// Parse a saved WHOIS response instead of querying
    #[arg(long = "raw-file", value_name = "FILE", help_heading = "Query")]
    pub raw_file: Option<String>,

    /// Print extracted statuses, dates, and nameservers
    #[arg(long = "parse", help_heading = "Output Format")]
    pub parse: bool,

    /// Registry format to parse with (icann, ripe, denic, nominet)
    #[arg(long = "format", value_name = "NAME", help_heading = "Output Format")]
    pub format: Option<String>,

    /// Output results in JSON format
    #[arg(short = 'j', long = "json", help_heading = "Output Format")]
    pub json: bool,

    /// Max concurrent queries (default: 10, max: 100)
    #[arg(
        short = 'c',
        long = "concurrency",
        value_name = "N",
        help_heading = "Performance"
    )]
    pub concurrency: Option<usize>,

    /// Timeout for connect and each read, e.g. "5s", "500ms"
    #[arg(
        short = 't',
        long = "timeout",
        value_name = "DURATION",
        help_heading = "Performance"
    )]
    pub timeout: Option<String>,

    /// Use specific config file instead of automatic discovery
    #[arg(long = "config", value_name = "FILE", help_heading = "Configuration")]
    pub config: Option<String>,

    /// Verbose logging
    #[arg(short = 'v', long = "verbose", help_heading = "Configuration")]
    pub verbose: bool,
}

/// Output settings after file, environment, and CLI have been merged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct OutputSettings {
    json: bool,
    parse: bool,
    format: Option<String>,
}

/// Error statistics for aggregated reporting
#[derive(Debug, Default)]
pub(crate) struct ErrorStats {
    pub(crate) timeouts: Vec<String>,
    pub(crate) connection_errors: Vec<String>,
    pub(crate) no_referral: Vec<String>,
    pub(crate) other_errors: Vec<String>,
}

impl ErrorStats {
    fn add_error(&mut self, domain: &str, error: &WhoisError) {
        match error {
            WhoisError::ConnectTimeout { .. } => self.timeouts.push(domain.to_string()),
            WhoisError::Connection { .. } => self.connection_errors.push(domain.to_string()),
            WhoisError::NoAuthorityServer { .. } => self.no_referral.push(domain.to_string()),
            _ => self.other_errors.push(domain.to_string()),
        }
    }

    pub(crate) fn total(&self) -> usize {
        self.timeouts.len()
            + self.connection_errors.len()
            + self.no_referral.len()
            + self.other_errors.len()
    }

    pub(crate) fn has_errors(&self) -> bool {
        self.total() > 0
    }

    pub(crate) fn format_lines(&self) -> Vec<String> {
        // Show max 5 domains, then "and X more"
        let format_domain_list = |domains: &[String]| -> String {
            if domains.len() <= 5 {
                domains.join(", ")
            } else {
                format!(
                    "{}, ... and {} more",
                    domains[..5].join(", "),
                    domains.len() - 5
                )
            }
        };

        [
            ("timeouts", &self.timeouts),
            ("unreachable servers", &self.connection_errors),
            ("without referral", &self.no_referral),
            ("other errors", &self.other_errors),
        ]
        .iter()
        .filter(|(_, domains)| !domains.is_empty())
        .map(|(label, domains)| {
            format!(
                "• {} {}: {}",
                domains.len(),
                label,
                format_domain_list(domains)
            )
        })
        .collect()
    }
}

/// One domain's result, in input order.
#[derive(Debug, Serialize)]
struct DomainReport {
    domain: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    server: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    record: Option<WhoisRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip)]
    failure: Option<WhoisError>,
}

impl DomainReport {
    fn new(domain: &str) -> Self {
        Self {
            domain: domain.to_string(),
            server: None,
            format: None,
            record: None,
            text: None,
            error: None,
            failure: None,
        }
    }

    fn failed(domain: &str, error: WhoisError) -> Self {
        let mut report = Self::new(domain);
        report.error = Some(error.to_string());
        report.failure = Some(error);
        report
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    init_logging(args.verbose);

    // Validate arguments
    if let Err(e) = validate_args(&args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    match run(args).await {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

/// Log to stderr; `RUST_LOG` wins over `--verbose`.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Validate command line arguments
fn validate_args(args: &Args) -> Result<(), String> {
    if args.domains.is_empty() && args.raw_file.is_none() {
        return Err(
            "You must specify domain names or a saved response with --raw-file".to_string(),
        );
    }

    if args.raw_file.is_some() && args.domains.len() > 1 {
        return Err(
            "--raw-file accepts at most one domain (used to pick the format)".to_string(),
        );
    }

    if args.raw_file.is_some() && (args.server.is_some() || args.refer_only) {
        return Err(
            "Cannot combine --raw-file with --server or --refer-only".to_string(),
        );
    }

    if args.refer_only && args.server.is_some() {
        return Err("Cannot combine --refer-only with --server".to_string());
    }

    if let Some(concurrency) = args.concurrency {
        if concurrency == 0 || concurrency > MAX_CONCURRENCY {
            return Err("Concurrency must be between 1 and 100".to_string());
        }
    }

    if let Some(name) = &args.format {
        check_format_name(name)?;
    }

    Ok(())
}

fn check_format_name(name: &str) -> Result<(), String> {
    if FORMAT_REGISTRY.by_name(name).is_some() {
        Ok(())
    } else {
        Err(format!(
            "Unknown format '{}'. Available formats: {}",
            name,
            FORMAT_REGISTRY.names().join(", ")
        ))
    }
}

/// Dispatch to the selected mode. Returns whether every domain succeeded.
async fn run(args: Args) -> Result<bool, Box<dyn std::error::Error>> {
    let (config, output) = build_config(&args)?;

    if let Some(path) = &args.raw_file {
        let domain = args.domains.first().map(String::as_str);
        let report = parse_raw_file(path, domain, &output)?;
        display_reports(std::slice::from_ref(&report), &output)?;
        return Ok(true);
    }

    let domains = unique_domains(&args.domains);
    let client = WhoisClient::with_config(config);
    debug!(
        domains = domains.len(),
        concurrency = client.config().concurrency,
        "Starting WHOIS batch"
    );

    let started = Instant::now();
    let reports = if args.refer_only {
        run_refer_only(&client, &domains).await
    } else {
        run_queries(&client, args.server.as_deref(), &domains, &output).await
    };

    let mut error_stats = ErrorStats::default();
    for report in &reports {
        if let Some(error) = &report.failure {
            error_stats.add_error(&report.domain, error);
        }
    }

    display_reports(&reports, &output)?;
    if !output.json && domains.len() > 1 {
        ui::print_summary(domains.len(), &error_stats, started.elapsed());
    }

    Ok(!error_stats.has_errors())
}

/// Trim, drop empties, and remove repeats while keeping first-seen order.
fn unique_domains(domains: &[String]) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(domains.len());
    for domain in domains.iter().map(|d| d.trim()).filter(|d| !d.is_empty()) {
        if !unique.iter().any(|d| d == domain) {
            unique.push(domain.to_string());
        }
    }
    unique
}

/// Resolve only the authoritative server for each domain.
async fn run_refer_only(client: &WhoisClient, domains: &[String]) -> Vec<DomainReport> {
    let processor = ConcurrentProcessor::new(client.config().concurrency);
    let mut found = processor
        .collect_all(domains, |domain| {
            (domain.clone(), client.find_authority(domain))
        })
        .await;

    domains
        .iter()
        .filter_map(|domain| {
            let report = match found.remove(domain)? {
                Ok(server) => {
                    let mut report = DomainReport::new(domain);
                    report.server = Some(server);
                    report
                }
                Err(e) => DomainReport::failed(domain, e),
            };
            Some(report)
        })
        .collect()
}

/// Query either the given server or each domain's authority.
async fn run_queries(
    client: &WhoisClient,
    server: Option<&str>,
    domains: &[String],
    output: &OutputSettings,
) -> Vec<DomainReport> {
    let mut outcomes: HashMap<String, QueryOutcome> = match server {
        Some(server) => {
            let requests: Vec<WhoisQuery> = domains
                .iter()
                .map(|domain| WhoisQuery::new(domain.as_str(), server))
                .collect();
            client.query_many_settled(&requests).await
        }
        None => client.query_authority_many_settled(domains).await,
    };

    domains
        .iter()
        .filter_map(|domain| {
            let report = match outcomes.remove(domain)? {
                QueryOutcome::Success(text) => {
                    build_report(domain, Some(domain), server, text, output)
                }
                QueryOutcome::Failure(e) => DomainReport::failed(domain, e),
            };
            Some(report)
        })
        .collect()
}

/// Parse a saved response from disk; no network access.
fn parse_raw_file(
    path: &str,
    domain: Option<&str>,
    output: &OutputSettings,
) -> Result<DomainReport, Box<dyn std::error::Error>> {
    let bytes = std::fs::read(path).map_err(|e| {
        WhoisError::file_error(path, format!("Failed to read response file: {}", e))
    })?;
    let text = decode_response(&bytes);

    let parse_output = OutputSettings {
        parse: true,
        ..output.clone()
    };
    let name = domain.unwrap_or(path);
    Ok(build_report(name, domain, None, text, &parse_output))
}

fn build_report(
    label: &str,
    domain: Option<&str>,
    server: Option<&str>,
    text: String,
    output: &OutputSettings,
) -> DomainReport {
    let mut report = DomainReport::new(label);
    report.server = server.map(str::to_string);

    if !output.parse {
        report.text = Some(text);
        return report;
    }

    let parser = select_parser(domain, &text, output.format.as_deref());
    report.format = Some(parser.format_name().to_string());
    report.record = Some(parser.record());
    report
}

/// A forced format wins; otherwise pick by TLD, then by response shape.
///
/// Format names are checked during validation, so an unknown name only
/// reaches here from a config file and falls back to inference.
fn select_parser<'a>(
    domain: Option<&str>,
    text: &'a str,
    format: Option<&str>,
) -> WhoisTextParser<'a> {
    if let Some(format) = format.and_then(|name| FORMAT_REGISTRY.by_name(name)) {
        return WhoisTextParser::with_format(text, format);
    }
    match domain {
        Some(domain) => WhoisTextParser::for_domain(domain, text),
        None => WhoisTextParser::new(text),
    }
}

fn display_reports(
    reports: &[DomainReport],
    output: &OutputSettings,
) -> Result<(), Box<dyn std::error::Error>> {
    if output.json {
        println!("{}", serde_json::to_string_pretty(reports)?);
        return Ok(());
    }

    for report in reports {
        if let Some(error) = &report.failure {
            ui::print_error(&report.domain, error);
        } else if let Some(record) = &report.record {
            let format_name = report.format.as_deref().unwrap_or("-");
            ui::print_record(&report.domain, format_name, record);
        } else if let Some(text) = &report.text {
            ui::print_raw(&report.domain, report.server.as_deref(), text);
        } else if let Some(server) = &report.server {
            ui::print_referral(&report.domain, server);
        }
    }

    Ok(())
}

/// Merge configuration sources.
///
/// Precedence: CLI args > environment variables > config file > defaults.
fn build_config(
    args: &Args,
) -> Result<(ClientConfig, OutputSettings), Box<dyn std::error::Error>> {
    let config_manager = ConfigManager::new(args.verbose);
    let env_config = load_env_config();

    // Step 1: explicit file (CLI, then WG_CONFIG) or automatic discovery
    let explicit_path = args.config.as_ref().or(env_config.config.as_ref());
    let file_config = if let Some(path) = explicit_path {
        debug!(path = %path, "Using explicit config file");
        config_manager
            .load_file(path)
            .map_err(|e| format!("Failed to load config file '{}': {}", path, e))?
    } else {
        match config_manager.discover_and_load() {
            Ok(file_config) => file_config,
            Err(e) => {
                warn!(error = %e, "Config discovery failed, using defaults");
                FileConfig::default()
            }
        }
    };

    let mut config = file_config.apply_to(ClientConfig::default())?;

    // Step 2: environment variables (WG_*)
    config = env_config.apply_to(config);

    // Step 3: CLI arguments (highest precedence)
    config = apply_cli_args_to_config(config, args)?;

    let output = resolve_output(file_config.output.as_ref(), args);
    if let Some(name) = &output.format {
        check_format_name(name)?;
    }

    Ok((config, output))
}

/// Apply CLI arguments to config. Only flags the user passed override.
fn apply_cli_args_to_config(
    mut config: ClientConfig,
    args: &Args,
) -> Result<ClientConfig, Box<dyn std::error::Error>> {
    if let Some(timeout) = &args.timeout {
        config = config.with_timeout(parse_timeout(timeout)?);
    }
    if let Some(concurrency) = args.concurrency {
        config = config.with_concurrency(concurrency);
    }
    if let Some(port) = args.port {
        config = config.with_default_port(port);
    }
    Ok(config)
}

/// Flags can only switch output modes on; a forced format implies parsing.
fn resolve_output(file_output: Option<&OutputConfig>, args: &Args) -> OutputSettings {
    let file_output = file_output.cloned().unwrap_or_default();
    OutputSettings {
        json: args.json || file_output.json.unwrap_or(false),
        parse: args.parse || args.format.is_some() || file_output.parse.unwrap_or(false),
        format: args.format.clone().or(file_output.format),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;
    use tempfile::NamedTempFile;

    // Helper function with all required fields
    fn create_test_args() -> Args {
        Args {
            domains: vec!["example.com".to_string()],
            server: None,
            port: None,
            refer_only: false,
            raw_file: None,
            parse: false,
            format: None,
            json: false,
            concurrency: None,
            timeout: None,
            config: None,
            verbose: false,
        }
    }

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_validate_requires_input() {
        let mut args = create_test_args();
        args.domains.clear();
        assert!(validate_args(&args).is_err());

        args.raw_file = Some("saved.txt".to_string());
        assert!(validate_args(&args).is_ok());
    }

    #[test]
    fn test_validate_conflicting_modes() {
        let mut args = create_test_args();
        args.refer_only = true;
        args.server = Some("whois.example.test".to_string());
        assert!(validate_args(&args).is_err());

        let mut args = create_test_args();
        args.raw_file = Some("saved.txt".to_string());
        args.domains.push("second.com".to_string());
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_validate_concurrency_and_format() {
        let mut args = create_test_args();
        args.concurrency = Some(0);
        assert!(validate_args(&args).is_err());
        args.concurrency = Some(101);
        assert!(validate_args(&args).is_err());
        args.concurrency = Some(100);
        assert!(validate_args(&args).is_ok());

        args.format = Some("nominet".to_string());
        assert!(validate_args(&args).is_ok());
        args.format = Some("bogus".to_string());
        let err = validate_args(&args).unwrap_err();
        assert!(err.contains("icann"));
    }

    #[test]
    fn test_cli_overrides_config_file() {
        let file = write_config(
            "[client]\ntimeout = \"9s\"\nconcurrency = 3\nport = 4343\n\n\
             [output]\njson = true\nformat = \"ripe\"\n",
        );

        let mut args = create_test_args();
        args.config = Some(file.path().to_string_lossy().to_string());
        args.timeout = Some("2s".to_string());

        let (config, output) = build_config(&args).unwrap();
        assert_eq!(config.timeout, Duration::from_secs(2)); // CLI wins
        assert_eq!(config.concurrency, 3); // file value kept
        assert_eq!(config.default_port, 4343);
        assert!(output.json);
        assert_eq!(output.format.as_deref(), Some("ripe"));
        assert!(!output.parse);
    }

    #[test]
    fn test_missing_explicit_config_is_an_error() {
        let mut args = create_test_args();
        args.config = Some("/nonexistent/whois-getter.toml".to_string());
        assert!(build_config(&args).is_err());
    }

    #[test]
    fn test_resolve_output_format_implies_parse() {
        let mut args = create_test_args();
        args.format = Some("denic".to_string());
        let output = resolve_output(None, &args);
        assert!(output.parse);
        assert!(!output.json);
    }

    #[test]
    fn test_unique_domains_keeps_first_order() {
        let domains: Vec<String> = ["b.test", " a.test ", "b.test", "", "c.test"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(
            unique_domains(&domains),
            vec!["b.test", "a.test", "c.test"]
        );
    }

    #[test]
    fn test_select_parser() {
        let text = "Domain Status: ok\n";
        assert_eq!(
            select_parser(Some("example.de"), text, None).format_name(),
            "denic"
        );
        assert_eq!(select_parser(None, text, None).format_name(), "icann");
        let forced = select_parser(None, text, Some("RIPE"));
        assert_eq!(forced.format_name(), "ripe");
        let unknown = select_parser(None, text, Some("bogus"));
        assert_eq!(unknown.format_name(), "icann");
    }

    #[test]
    fn test_build_report_raw_and_parsed() {
        let text = "Domain Status: ok\n".to_string();

        let raw = build_report(
            "example.com",
            Some("example.com"),
            Some("whois.example.test"),
            text.clone(),
            &OutputSettings::default(),
        );
        assert_eq!(raw.text.as_deref(), Some("Domain Status: ok\n"));
        assert!(raw.record.is_none());

        let settings = OutputSettings {
            parse: true,
            ..Default::default()
        };
        let parsed = build_report(
            "example.com",
            Some("example.com"),
            None,
            text,
            &settings,
        );
        assert_eq!(parsed.format.as_deref(), Some("icann"));
        assert_eq!(parsed.record.unwrap().statuses, vec!["ok"]);
        assert!(parsed.text.is_none());
    }

    #[test]
    fn test_error_stats() {
        let mut stats = ErrorStats::default();
        assert!(!stats.has_errors());

        stats.add_error(
            "a.test",
            &WhoisError::connect_timeout("whois.example.test", 43, "read", Duration::from_secs(5)),
        );
        stats.add_error(
            "b.test",
            &WhoisError::no_authority_server("b.test", "whois.iana.org"),
        );
        stats.add_error("c.test", &WhoisError::encoding("c.test", "bad"));

        assert_eq!(stats.total(), 3);
        let lines = stats.format_lines();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("1 timeouts: a.test"));
        assert!(lines[1].contains("without referral"));
    }

    #[test]
    fn test_failed_report_serializes_message() {
        let report = DomainReport::failed(
            "x.test",
            WhoisError::no_authority_server("x.test", "whois.iana.org"),
        );
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["domain"], "x.test");
        assert!(json["error"].as_str().unwrap().contains("x.test"));
        assert!(json.get("failure").is_none());
    }
}
