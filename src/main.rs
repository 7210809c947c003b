use anyhow::{Context, Result};
use clap::Parser;
use plugwatch::config::Config;
use plugwatch::driver::Driver;
use plugwatch::logging::init_logging;
use plugwatch::notify::{LogOnlyDispatcher, NotificationDispatcher, Notifier};
use plugwatch::vehicle::{TeslaClient, VehicleTelemetryClient};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// Geofence plug-in reminder for electric vehicles
#[derive(Debug, Parser)]
#[command(name = "plugwatch", version = env!("APP_VERSION"), about)]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the configured log level
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Log alerts instead of sending email and SMS
    #[arg(long)]
    dry_run: bool,

    /// Validate the configuration and exit
    #[arg(long)]
    check_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    config.validate().context("Invalid configuration")?;

    if cli.check_config {
        println!(
            "Configuration OK: vehicle #{} within {} m of {}, checked every {}s, alert below {}%",
            config.tesla.vehicle_index,
            config.geofence.radius_meters,
            config.geofence.center(),
            config.monitor.check_interval_secs,
            config.monitor.alert_threshold_percent
        );
        return Ok(());
    }

    init_logging(&config.logging).context("Failed to initialize logging")?;
    info!("Plugwatch {} starting up", env!("APP_VERSION"));

    let telemetry: Arc<dyn VehicleTelemetryClient> =
        Arc::new(TeslaClient::new(&config.tesla).context("Failed to create vehicle client")?);

    let dispatcher: Arc<dyn NotificationDispatcher> = if cli.dry_run {
        info!("Dry run: alerts are logged, not sent");
        Arc::new(LogOnlyDispatcher::new())
    } else {
        let timeout = Duration::from_secs(config.tesla.request_timeout_secs);
        Arc::new(
            Notifier::from_config(&config.mail, &config.sms, timeout)
                .context("Failed to create notifier")?,
        )
    };

    let driver = Driver::new(config, telemetry, dispatcher);
    match driver.run_until(shutdown_signal()).await {
        Ok(_) => {
            info!("Driver shutdown complete");
            Ok(())
        }
        Err(e) => {
            error!("Driver failed with error: {}", e);
            Err(anyhow::anyhow!("Driver error: {}", e))
        }
    }
}

/// Resolves on Ctrl-C or, on Unix, SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
