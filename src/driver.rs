//! Startup and run loop for Plugwatch
//!
//! The driver authenticates against the vehicle API, selects the configured
//! vehicle and then hands a [`GeofenceMonitor`] to a [`PeriodicTask`].
//! Failures during startup are fatal; failures during a tick are not.

use crate::config::Config;
use crate::error::{PlugwatchError, Result};
use crate::logging::get_logger;
use crate::monitor::{GeofenceMonitor, MonitorSettings};
use crate::notify::NotificationDispatcher;
use crate::scheduler::{PeriodicTask, TaskHandle, TaskStats};
use crate::vehicle::{VehicleTelemetryClient, select_vehicle};
use std::future::Future;
use std::sync::Arc;

/// Main driver for Plugwatch
pub struct Driver {
    config: Config,
    telemetry: Arc<dyn VehicleTelemetryClient>,
    dispatcher: Arc<dyn NotificationDispatcher>,
    logger: crate::logging::StructuredLogger,
}

impl Driver {
    pub fn new(
        config: Config,
        telemetry: Arc<dyn VehicleTelemetryClient>,
        dispatcher: Arc<dyn NotificationDispatcher>,
    ) -> Self {
        Self {
            config,
            telemetry,
            dispatcher,
            logger: get_logger("driver"),
        }
    }

    /// Authenticate, enumerate vehicles and build the monitor
    pub async fn start(&self) -> Result<GeofenceMonitor> {
        self.telemetry.authenticate().await.map_err(|e| {
            self.logger.error(&format!("Login failed: {}", e));
            e
        })?;

        let vehicles = self.telemetry.list_vehicles().await.map_err(|e| {
            self.logger.error(&format!("Listing vehicles failed: {}", e));
            e
        })?;
        for (i, v) in vehicles.iter().enumerate() {
            self.logger.debug(&format!(
                "Vehicle {}: {} (id {}, state {})",
                i,
                v.display_name,
                v.id,
                v.state.as_deref().unwrap_or("unknown")
            ));
        }

        let vehicle = select_vehicle(&vehicles, self.config.tesla.vehicle_index)?;
        let geofence = self.config.geofence;
        self.logger.info(&format!(
            "Watching {} within {} meters of {}; alert below {} percent",
            vehicle.display_name,
            geofence.radius_meters,
            geofence.center(),
            self.config.monitor.alert_threshold_percent
        ));

        Ok(GeofenceMonitor::new(
            vehicle,
            MonitorSettings::from_config(&self.config),
            self.telemetry.clone(),
            self.dispatcher.clone(),
        ))
    }

    /// Start and spawn the periodic check
    pub async fn spawn(&self) -> Result<TaskHandle> {
        let monitor = self.start().await?;
        let task = PeriodicTask::new(self.config.monitor.check_interval())
            .run_immediately(self.config.monitor.check_on_startup);
        Ok(task.spawn(monitor))
    }

    /// Run until `shutdown` resolves, then stop after any in-flight check
    ///
    /// A periodic task that ends before `shutdown` is an error.
    pub async fn run_until<F>(self, shutdown: F) -> Result<TaskStats>
    where
        F: Future<Output = ()>,
    {
        let mut handle = self.spawn().await?;
        let ended_early = tokio::select! {
            () = shutdown => None,
            result = handle.stopped() => Some(result),
        };

        if let Some(result) = ended_early {
            let stats = result?;
            self.logger.error(&format!(
                "Monitoring stopped unexpectedly after {} checks",
                stats.ticks
            ));
            return Err(PlugwatchError::generic(format!(
                "Monitoring task ended after {} checks without a shutdown request",
                stats.ticks
            )));
        }

        self.logger.info("Shutdown signal received");
        let stats = handle.shutdown().await?;
        self.logger.info(&format!(
            "Driver stopped after {} checks ({} failed, {} overran)",
            stats.ticks, stats.failures, stats.overruns
        ));
        Ok(stats)
    }
}
