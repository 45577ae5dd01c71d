//! Configuration loading, merging and validation.
//!
//! Precedence: CLI flags and environment > config file > built-in defaults.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::cli::{Args, ConfigFormat};
use crate::error::ExporterError;
use crate::hcloud::client::DEFAULT_ENDPOINT;

// Default configuration constants
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_FETCH_INTERVAL: &str = "1m";
pub const DEFAULT_API_TIMEOUT: &str = "30s";
pub const DEFAULT_HTTP_TIMEOUT: &str = "5s";
/// Price list invalidation interval as a multiple of the fetch interval.
pub const INVALIDATION_FACTOR: u32 = 10;
/// Upper bound for every configured interval and timeout.
pub const MAX_INTERVAL: Duration = Duration::from_secs(365 * 24 * 3600);

const DEFAULT_LOCATIONS: &[&str] = &[
    "/etc/hcloud-pricing-exporter/config.yaml",
    "/etc/hcloud-pricing-exporter/config.yml",
    "/etc/hcloud-pricing-exporter/config.json",
    "/etc/hcloud-pricing-exporter/config.toml",
    "./hcloud-pricing-exporter.yaml",
    "./hcloud-pricing-exporter.yml",
    "./hcloud-pricing-exporter.json",
    "./hcloud-pricing-exporter.toml",
];

/// Configuration as read from a file and merged with CLI arguments.
///
/// Durations are kept as strings (`30s`, `1m`, `1h30m`) and parsed by
/// [`Settings::from_config`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    // HCloud API
    pub hcloud_token: Option<String>,
    pub api_endpoint: Option<String>,
    pub api_timeout: Option<String>,

    // Server configuration
    pub bind: Option<String>,
    pub port: Option<u16>,
    pub http_timeout: Option<String>,

    // Fetching
    pub fetch_interval: Option<String>,
    /// Defaults to ten times the fetch interval when unset.
    pub cache_invalidation_interval: Option<String>,
    pub additional_labels: Option<Vec<String>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hcloud_token: None,
            api_endpoint: Some(DEFAULT_ENDPOINT.to_string()),
            api_timeout: Some(DEFAULT_API_TIMEOUT.to_string()),
            bind: Some(DEFAULT_BIND_ADDR.to_string()),
            port: Some(DEFAULT_PORT),
            http_timeout: Some(DEFAULT_HTTP_TIMEOUT.to_string()),
            fetch_interval: Some(DEFAULT_FETCH_INTERVAL.to_string()),
            cache_invalidation_interval: None,
            additional_labels: Some(Vec::new()),
        }
    }
}

impl Config {
    /// Copy of the config safe for printing.
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if config.hcloud_token.is_some() {
            config.hcloud_token = Some("<redacted>".to_string());
        }
        config
    }

    /// Serializes the config in the requested format.
    pub fn render(&self, format: &ConfigFormat) -> anyhow::Result<String> {
        Ok(match format {
            ConfigFormat::Json => serde_json::to_string_pretty(self)?,
            ConfigFormat::Toml => toml::to_string_pretty(self)?,
            ConfigFormat::Yaml => serde_yaml::to_string(self)?,
        })
    }
}

/// Validated, fully resolved runtime settings.
#[derive(Clone)]
pub struct Settings {
    pub token: String,
    pub api_endpoint: String,
    pub api_timeout: Duration,
    pub listen: SocketAddr,
    pub http_timeout: Duration,
    pub fetch_interval: Duration,
    pub cache_invalidation_interval: Duration,
    pub additional_labels: Vec<String>,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("token", &"<redacted>")
            .field("api_endpoint", &self.api_endpoint)
            .field("api_timeout", &self.api_timeout)
            .field("listen", &self.listen)
            .field("http_timeout", &self.http_timeout)
            .field("fetch_interval", &self.fetch_interval)
            .field("cache_invalidation_interval", &self.cache_invalidation_interval)
            .field("additional_labels", &self.additional_labels)
            .finish()
    }
}

impl Settings {
    /// Resolves defaults and validates `config`.
    pub fn from_config(config: &Config) -> Result<Self, ExporterError> {
        let token = config
            .hcloud_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                ExporterError::Config(
                    "no API token for HCloud specified, but required (--hcloud-token or HCLOUD_TOKEN)"
                        .to_string(),
                )
            })?
            .to_string();

        let api_endpoint = config
            .api_endpoint
            .clone()
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        if !(api_endpoint.starts_with("http://") || api_endpoint.starts_with("https://")) {
            return Err(ExporterError::Config(format!(
                "api_endpoint '{api_endpoint}' must be an http(s) URL"
            )));
        }

        let bind = config.bind.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        let ip: IpAddr = bind
            .parse()
            .map_err(|_| ExporterError::Config(format!("invalid bind address '{bind}'")))?;
        let listen = SocketAddr::new(ip, config.port.unwrap_or(DEFAULT_PORT));

        let api_timeout = duration_setting("api_timeout", &config.api_timeout, DEFAULT_API_TIMEOUT)?;
        let http_timeout =
            duration_setting("http_timeout", &config.http_timeout, DEFAULT_HTTP_TIMEOUT)?;
        let fetch_interval = duration_setting(
            "fetch_interval",
            &config.fetch_interval,
            DEFAULT_FETCH_INTERVAL,
        )?;

        let cache_invalidation_interval = match &config.cache_invalidation_interval {
            Some(raw) => parse_setting("cache_invalidation_interval", raw)?,
            None => fetch_interval
                .checked_mul(INVALIDATION_FACTOR)
                .filter(|d| *d <= MAX_INTERVAL)
                .ok_or_else(|| {
                    ExporterError::Config(format!(
                        "fetch_interval too large to derive cache_invalidation_interval (max {})",
                        format_duration(MAX_INTERVAL)
                    ))
                })?,
        };
        if cache_invalidation_interval < fetch_interval {
            return Err(ExporterError::Config(
                "cache_invalidation_interval must not be shorter than fetch_interval".to_string(),
            ));
        }

        let additional_labels = config.additional_labels.clone().unwrap_or_default();
        if let Some(bad) = additional_labels.iter().find(|l| !is_valid_label_name(l)) {
            return Err(ExporterError::Config(format!(
                "invalid additional label name '{bad}'"
            )));
        }

        Ok(Self {
            token,
            api_endpoint,
            api_timeout,
            listen,
            http_timeout,
            fetch_interval,
            cache_invalidation_interval,
            additional_labels,
        })
    }
}

fn duration_setting(
    name: &str,
    value: &Option<String>,
    default: &str,
) -> Result<Duration, ExporterError> {
    parse_setting(name, value.as_deref().unwrap_or(default))
}

fn parse_setting(name: &str, raw: &str) -> Result<Duration, ExporterError> {
    let duration = parse_duration(raw).map_err(|e| ExporterError::Config(format!("{name}: {e}")))?;
    if duration.is_zero() {
        return Err(ExporterError::Config(format!("{name} must be greater than zero")));
    }
    if duration > MAX_INTERVAL {
        return Err(ExporterError::Config(format!(
            "{name} must not exceed {}",
            format_duration(MAX_INTERVAL)
        )));
    }
    Ok(duration)
}

/// Prometheus label names: `[a-zA-Z_][a-zA-Z0-9_]*`, `__` prefix reserved.
fn is_valid_label_name(name: &str) -> bool {
    let mut chars = name.chars();
    let valid_start = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_');
    valid_start
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !name.starts_with("__")
}

/// Validate effective config (used by --check-config and at startup)
pub fn validate_effective_config(config: &Config) -> Result<(), ExporterError> {
    Settings::from_config(config).map(|_| ())
}

/// Parses a duration such as `500ms`, `30s`, `1m`, `2h` or `1h30m`.
///
/// A bare number is read as seconds.
pub fn parse_duration(raw: &str) -> Result<Duration, String> {
    let input = raw.trim();
    if input.is_empty() {
        return Err("empty duration".to_string());
    }
    if let Ok(secs) = input.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }

    let invalid = || format!("invalid duration '{raw}', expected e.g. 30s, 1m or 1h30m");
    let too_large = || format!("duration '{raw}' is too large");
    let mut total = Duration::ZERO;
    let mut rest = input;

    while !rest.is_empty() {
        let digits = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        if digits == 0 {
            return Err(invalid());
        }
        let value: u64 = rest[..digits].parse().map_err(|_| invalid())?;
        rest = &rest[digits..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit())
            .unwrap_or(rest.len());
        let unit = &rest[..unit_len];
        rest = &rest[unit_len..];

        let secs_per_unit = match unit {
            "ms" => None,
            "s" => Some(1),
            "m" => Some(60),
            "h" => Some(3600),
            _ => return Err(invalid()),
        };
        let part = match secs_per_unit {
            None => Duration::from_millis(value),
            Some(factor) => Duration::from_secs(value.checked_mul(factor).ok_or_else(too_large)?),
        };
        total = total.checked_add(part).ok_or_else(too_large)?;
    }

    Ok(total)
}

/// Splits a comma separated label list, trimming whitespace and dropping empty entries.
pub fn parse_additional_labels(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Renders a duration in the format accepted by [`parse_duration`].
pub fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis % 1000 != 0 {
        return format!("{millis}ms");
    }
    let secs = duration.as_secs();
    if secs % 3600 == 0 {
        format!("{}h", secs / 3600)
    } else if secs % 60 == 0 {
        format!("{}m", secs / 60)
    } else {
        format!("{secs}s")
    }
}

/// Resolves configuration from CLI args, config file, and defaults
pub fn resolve_config(args: &Args) -> anyhow::Result<Config> {
    let mut config = if args.no_config {
        Config::default()
    } else {
        merge_defaults(load_config(args.config.as_deref())?)
    };

    if let Some(token) = &args.hcloud_token {
        config.hcloud_token = Some(token.clone());
    }
    if let Some(endpoint) = &args.api_endpoint {
        config.api_endpoint = Some(endpoint.clone());
    }
    if let Some(timeout) = args.api_timeout {
        config.api_timeout = Some(format_duration(timeout));
    }
    if let Some(bind_ip) = args.bind {
        config.bind = Some(bind_ip.to_string());
    }
    if let Some(port) = args.port {
        config.port = Some(port);
    }
    if let Some(timeout) = args.http_timeout {
        config.http_timeout = Some(format_duration(timeout));
    }
    if let Some(interval) = args.fetch_interval {
        config.fetch_interval = Some(format_duration(interval));
    }
    if let Some(interval) = args.cache_invalidation_interval {
        config.cache_invalidation_interval = Some(format_duration(interval));
    }
    if let Some(labels) = &args.additional_labels {
        config.additional_labels = Some(parse_additional_labels(labels));
    }

    Ok(config)
}

/// Fills fields left out of a config file with the built-in defaults.
fn merge_defaults(file: Config) -> Config {
    let defaults = Config::default();
    Config {
        hcloud_token: file.hcloud_token.or(defaults.hcloud_token),
        api_endpoint: file.api_endpoint.or(defaults.api_endpoint),
        api_timeout: file.api_timeout.or(defaults.api_timeout),
        bind: file.bind.or(defaults.bind),
        port: file.port.or(defaults.port),
        http_timeout: file.http_timeout.or(defaults.http_timeout),
        fetch_interval: file.fetch_interval.or(defaults.fetch_interval),
        cache_invalidation_interval: file
            .cache_invalidation_interval
            .or(defaults.cache_invalidation_interval),
        additional_labels: file.additional_labels.or(defaults.additional_labels),
    }
}

/// Loads a config file from `path` or the first existing default location.
///
/// Returns an all-empty config when no file is found.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let path = match path {
        Some(p) => {
            if !p.exists() {
                anyhow::bail!("config file not found: {}", p.display());
            }
            p.to_path_buf()
        }
        None => match DEFAULT_LOCATIONS
            .iter()
            .map(PathBuf::from)
            .find(|p| p.exists())
        {
            Some(p) => p,
            None => return Ok(empty_config()),
        },
    };

    let content = fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;

    let config: Config = match path.extension().and_then(|s| s.to_str()) {
        Some("json") => serde_json::from_str(&content)
            .with_context(|| format!("invalid JSON config {}", path.display()))?,
        Some("toml") => toml::from_str(&content)
            .with_context(|| format!("invalid TOML config {}", path.display()))?,
        _ => serde_yaml::from_str(&content)
            .with_context(|| format!("invalid YAML config {}", path.display()))?,
    };

    info!("Loaded configuration from: {}", path.display());
    Ok(config)
}

fn empty_config() -> Config {
    Config {
        hcloud_token: None,
        api_endpoint: None,
        api_timeout: None,
        bind: None,
        port: None,
        http_timeout: None,
        fetch_interval: None,
        cache_invalidation_interval: None,
        additional_labels: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    fn with_token() -> Config {
        Config {
            hcloud_token: Some("token".into()),
            ..Config::default()
        }
    }

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration("90"), Ok(Duration::from_secs(90)));
        assert_eq!(parse_duration("500ms"), Ok(Duration::from_millis(500)));
        assert_eq!(parse_duration("30s"), Ok(Duration::from_secs(30)));
        assert_eq!(parse_duration("1m"), Ok(Duration::from_secs(60)));
        assert_eq!(parse_duration(" 1h30m "), Ok(Duration::from_secs(5400)));
        assert!(parse_duration("").is_err());
        assert!(parse_duration("1d").is_err());
        assert!(parse_duration("m").is_err());
        assert!(parse_duration("5x3s").is_err());
    }

    #[test]
    fn test_parse_duration_overflow_is_an_error() {
        assert!(parse_duration("18446744073709551615h1h").is_err());
        assert!(parse_duration("18446744073709551615h").is_err());
        assert!(parse_duration("18446744073709551615s18446744073709551615s").is_err());
    }

    #[test]
    fn test_oversized_intervals_are_config_errors() {
        let huge_fetch = Config {
            fetch_interval: Some("18446744073709551615s".into()),
            ..with_token()
        };
        assert!(matches!(
            Settings::from_config(&huge_fetch),
            Err(ExporterError::Config(_))
        ));

        // Within bounds itself, but ten times it is not.
        let derived_too_large = Config {
            fetch_interval: Some("4800h".into()),
            ..with_token()
        };
        assert!(matches!(
            Settings::from_config(&derived_too_large),
            Err(ExporterError::Config(_))
        ));

        let huge_timeout = Config {
            http_timeout: Some("9000h".into()),
            ..with_token()
        };
        assert!(Settings::from_config(&huge_timeout).is_err());

        let at_limit = Config {
            fetch_interval: Some("1h".into()),
            cache_invalidation_interval: Some("8760h".into()),
            ..with_token()
        };
        assert_eq!(
            Settings::from_config(&at_limit).unwrap().cache_invalidation_interval,
            MAX_INTERVAL
        );
    }

    #[test]
    fn test_format_duration_round_trips_common_values() {
        for raw in ["1m", "10m", "2h", "45s", "250ms"] {
            assert_eq!(format_duration(parse_duration(raw).unwrap()), raw);
        }
    }

    #[test]
    fn test_parse_additional_labels() {
        assert_eq!(parse_additional_labels(""), Vec::<String>::new());
        assert_eq!(parse_additional_labels("  "), Vec::<String>::new());
        assert_eq!(
            parse_additional_labels("owner, env ,,service"),
            vec!["owner", "env", "service"]
        );
    }

    #[test]
    fn test_missing_token_is_config_error() {
        let err = Settings::from_config(&Config::default()).unwrap_err();
        assert!(matches!(err, ExporterError::Config(_)));

        let blank = Config {
            hcloud_token: Some("   ".into()),
            ..Config::default()
        };
        assert!(Settings::from_config(&blank).is_err());
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::from_config(&with_token()).unwrap();
        assert_eq!(settings.listen, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(settings.fetch_interval, Duration::from_secs(60));
        assert_eq!(settings.cache_invalidation_interval, Duration::from_secs(600));
        assert_eq!(settings.http_timeout, Duration::from_secs(5));
        assert_eq!(settings.api_endpoint, DEFAULT_ENDPOINT);
        assert!(settings.additional_labels.is_empty());
    }

    #[test]
    fn test_invalid_settings_are_rejected() {
        let zero = Config {
            fetch_interval: Some("0s".into()),
            ..with_token()
        };
        assert!(Settings::from_config(&zero).is_err());

        let short_invalidation = Config {
            fetch_interval: Some("5m".into()),
            cache_invalidation_interval: Some("1m".into()),
            ..with_token()
        };
        assert!(Settings::from_config(&short_invalidation).is_err());

        let bad_label = Config {
            additional_labels: Some(vec!["team-name".into()]),
            ..with_token()
        };
        assert!(Settings::from_config(&bad_label).is_err());

        let bad_bind = Config {
            bind: Some("localhost".into()),
            ..with_token()
        };
        assert!(Settings::from_config(&bad_bind).is_err());
    }

    #[test]
    fn test_settings_debug_redacts_token() {
        let settings = Settings::from_config(&with_token()).unwrap();
        let debug = format!("{settings:?}");
        assert!(!debug.contains("\"token\""));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_redacted_config() {
        let rendered = with_token().redacted().render(&ConfigFormat::Yaml).unwrap();
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("hcloud_token: token"));
    }

    #[test]
    fn test_cli_overrides_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "hcloud_token: from-file\nport: 9000\nfetch_interval: 5m\nadditional_labels: [team]"
        )
        .unwrap();

        let args = Args::try_parse_from([
            "hcloud-pricing-exporter",
            "--config",
            file.path().to_str().unwrap(),
            "--hcloud-token",
            "from-cli",
            "--fetch-interval",
            "2m",
        ])
        .unwrap();

        let config = resolve_config(&args).unwrap();
        assert_eq!(config.hcloud_token.as_deref(), Some("from-cli"));
        assert_eq!(config.port, Some(9000));
        assert_eq!(config.fetch_interval.as_deref(), Some("2m"));
        assert_eq!(config.additional_labels, Some(vec!["team".to_string()]));
        // Not in the file, filled from defaults.
        assert_eq!(config.http_timeout.as_deref(), Some(DEFAULT_HTTP_TIMEOUT));
    }

    #[test]
    fn test_load_toml_and_json() {
        let mut toml_file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(toml_file, "port = 9001\nadditional_labels = [\"env\"]").unwrap();
        let config = load_config(Some(toml_file.path())).unwrap();
        assert_eq!(config.port, Some(9001));
        assert_eq!(config.additional_labels, Some(vec!["env".to_string()]));

        let mut json_file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        writeln!(json_file, r#"{{"bind": "127.0.0.1"}}"#).unwrap();
        let config = load_config(Some(json_file.path())).unwrap();
        assert_eq!(config.bind.as_deref(), Some("127.0.0.1"));
        assert_eq!(config.port, None);
    }

    #[test]
    fn test_missing_explicit_config_file_is_an_error() {
        assert!(load_config(Some(Path::new("/nonexistent/hcloud.yaml"))).is_err());
    }

    #[derive(Clone, Default)]
    struct LogBuffer(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_loaded_config_location_is_logged() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "port: 9101").unwrap();

        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let args = Args::parse_from([
            "hcloud-pricing-exporter",
            "--config",
            file.path().to_str().unwrap(),
        ]);

        let config =
            tracing::subscriber::with_default(subscriber, || resolve_config(&args)).unwrap();

        assert_eq!(config.port, Some(9101));
        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("Loaded configuration from"));
        assert!(output.contains(&file.path().display().to_string()));
    }
}
