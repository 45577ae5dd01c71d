//! hcloud-pricing-exporter binary.
//!
//! Resolves the configuration, runs the first fetch cycle, then serves
//! `/metrics` and `/health` while the fetch and invalidation loops run in
//! the background.

use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, Level};

use hcloud_pricing_exporter::cli::{Args, Commands, ConfigFormat, LogLevel};
use hcloud_pricing_exporter::commands::{command_check, command_config};
use hcloud_pricing_exporter::config::{resolve_config, validate_effective_config, Config, Settings};
use hcloud_pricing_exporter::hcloud::HcloudClient;
use hcloud_pricing_exporter::scheduler::Scheduler;
use hcloud_pricing_exporter::Exporter;

fn setup_logging(args: &Args) {
    let log_level = match args.log_level {
        LogLevel::Off => return,
        LogLevel::Error => Level::ERROR,
        LogLevel::Warn => Level::WARN,
        LogLevel::Info => Level::INFO,
        LogLevel::Debug => Level::DEBUG,
        LogLevel::Trace => Level::TRACE,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {e}");
        return;
    }

    info!("Logging initialized with level: {:?}", args.log_level);
}

fn show_config(config: &Config, format: &ConfigFormat) -> anyhow::Result<()> {
    println!("{}", config.redacted().render(format)?);
    Ok(())
}

/// Validates the merged config or exits with status 1.
fn settings_or_exit(config: &Config) -> Settings {
    match Settings::from_config(config) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("❌ Configuration invalid: {e}");
            std::process::exit(1);
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C), shutting down gracefully...");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully...");
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Early config resolution for show/check modes
    if args.show_config || args.check_config {
        let config = resolve_config(&args)?;

        if args.check_config {
            if let Err(e) = validate_effective_config(&config) {
                eprintln!("❌ Configuration invalid: {e}");
                std::process::exit(1);
            }
            println!("✅ Configuration is valid");
            return Ok(());
        }

        return show_config(&config, &args.config_format);
    }

    // Handle subcommands
    if let Some(command) = &args.command {
        return match command {
            Commands::Config { output, format } => command_config(output.clone(), format.clone()),
            Commands::Check => {
                setup_logging(&args);
                let settings = settings_or_exit(&resolve_config(&args)?);
                command_check(&settings).await
            }
        };
    }

    // Before resolving the config so the file location gets logged.
    setup_logging(&args);

    let config = resolve_config(&args)?;
    let settings = settings_or_exit(&config);

    info!("Starting hcloud-pricing-exporter");
    info!("Effective settings: {:?}", settings);

    let client = Arc::new(
        HcloudClient::new(&settings.api_endpoint, &settings.token, settings.api_timeout)
            .context("failed to build HCloud API client")?,
    );
    let exporter = Arc::new(
        Exporter::new(client.clone(), client, &settings.additional_labels)
            .context("failed to register metrics")?,
    );

    exporter
        .run_initial_cycle()
        .await
        .context("initial fetch cycle failed")?;

    let scheduler = Scheduler::spawn(
        Arc::clone(&exporter),
        settings.fetch_interval,
        settings.cache_invalidation_interval,
    );

    let app = exporter.router(settings.http_timeout);
    let listener = TcpListener::bind(settings.listen)
        .await
        .with_context(|| format!("failed to bind {}", settings.listen))?;
    info!(
        "hcloud-pricing-exporter listening on http://{}",
        settings.listen
    );

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    scheduler.shutdown().await;

    if let Err(e) = served {
        error!("Server error: {}", e);
        return Err(e.into());
    }

    info!("hcloud-pricing-exporter stopped gracefully");
    Ok(())
}
