//! CLI arguments and subcommands for hcloud-pricing-exporter.
//!
//! This module defines the command-line interface structure using the clap library,
//! including all flags, options, and subcommands.

use clap::{Parser, Subcommand, ValueEnum};
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::parse_duration;

/// Log level options for CLI parsing
#[derive(Debug, Clone, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Configuration format options for output
#[derive(Debug, Clone, ValueEnum)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

/// Main CLI arguments structure
#[derive(Parser, Debug)]
#[command(
    name = "hcloud-pricing-exporter",
    about = "Prometheus exporter for the cost of Hetzner Cloud resources",
    long_about = "Prometheus exporter for the cost of Hetzner Cloud resources.\n\n\
                  Periodically lists floating IPs, primary IPs, servers, load balancers, \
                  snapshots and volumes, prices them against the current HCloud price list \
                  and exposes hourly and monthly cost gauges per resource.",
    version,
    propagate_version = true
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Token to authenticate against the HCloud API
    #[arg(long, env = "HCLOUD_TOKEN", hide_env_values = true)]
    pub hcloud_token: Option<String>,

    /// HTTP listen port
    #[arg(short = 'p', long)]
    pub port: Option<u16>,

    /// Bind to specific interface/IP
    #[arg(long)]
    pub bind: Option<IpAddr>,

    /// Interval between fetch cycles, e.g. 30s, 1m, 1h30m
    #[arg(long, value_parser = parse_duration)]
    pub fetch_interval: Option<Duration>,

    /// Interval between price list invalidations (default: 10x the fetch interval)
    #[arg(long, value_parser = parse_duration)]
    pub cache_invalidation_interval: Option<Duration>,

    /// Comma separated resource labels exported on every metric, e.g. 'service,environment,owner'
    #[arg(long)]
    pub additional_labels: Option<String>,

    /// HCloud API endpoint
    #[arg(long)]
    pub api_endpoint: Option<String>,

    /// Timeout for HCloud API requests
    #[arg(long, value_parser = parse_duration)]
    pub api_timeout: Option<Duration>,

    /// Timeout for serving HTTP requests
    #[arg(long, value_parser = parse_duration)]
    pub http_timeout: Option<Duration>,

    /// Log level
    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,

    /// Config file (YAML/JSON/TOML)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Disable all config file loading
    #[arg(long)]
    pub no_config: bool,

    /// Print effective merged config (token redacted) and exit
    #[arg(long)]
    pub show_config: bool,

    /// Output format for --show-config
    #[arg(long, value_enum, default_value = "yaml")]
    pub config_format: ConfigFormat,

    /// Validate config and exit (return code 1 on error)
    #[arg(long)]
    pub check_config: bool,
}

/// Subcommands for additional functionality
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch the price list and every resource kind once and print a summary
    Check,

    /// Generate a configuration file with default values
    Config {
        /// Output file path (stdout if omitted)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "yaml")]
        format: ConfigFormat,
    },
}
