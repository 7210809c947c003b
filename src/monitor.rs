//! Geofence plug-in monitor
//!
//! Each tick reads the vehicle location, decides whether the vehicle is
//! parked inside the geofence, and if so checks the charge port. A vehicle
//! that is parked in the zone, unplugged and below the battery threshold
//! triggers a single alert. The alert is not repeated until the vehicle has
//! been observed outside the radius again.
//!
//! Phases per tick:
//!
//! ```text
//! distance > radius           -> Outside              (alert flag cleared)
//! inside, already alerted     -> InsideStoppedAlerted
//! inside, not stopped         -> InsideMoving         (charge state not read)
//! inside, stopped             -> InsideStoppedPending -> read charge state
//!     unplugged, below threshold -> alert, InsideStoppedAlerted
//! ```

use crate::config::{Config, GeofenceConfig};
use crate::error::Result;
use crate::geo;
use crate::logging::{LogContext, get_logger_with_context};
use crate::notify::{self, AlertMessage, NotificationDispatcher};
use crate::scheduler::PeriodicJob;
use crate::vehicle::{ChargingState, VehicleInfo, VehicleTelemetryClient};
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Where the vehicle stands relative to the geofence after a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MonitorPhase {
    #[default]
    Outside,
    InsideMoving,
    /// Parked in the zone; alert conditions not (yet) met
    InsideStoppedPending,
    /// Alert sent for the current dwell
    InsideStoppedAlerted,
}

impl fmt::Display for MonitorPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MonitorPhase::Outside => "outside",
            MonitorPhase::InsideMoving => "inside-moving",
            MonitorPhase::InsideStoppedPending => "inside-stopped-pending",
            MonitorPhase::InsideStoppedAlerted => "inside-stopped-alerted",
        };
        f.write_str(s)
    }
}

/// State carried from one tick to the next
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MonitorState {
    /// Set when an alert is dispatched; cleared only when the vehicle is
    /// observed outside the radius
    pub already_alerted_in_this_dwell: bool,
}

/// Fixed inputs of the alert decision
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonitorSettings {
    pub geofence: GeofenceConfig,
    /// Battery levels at or above this suppress the alert
    pub alert_threshold_percent: u8,
}

impl MonitorSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            geofence: config.geofence,
            alert_threshold_percent: config.monitor.alert_threshold_percent,
        }
    }
}

/// What a completed tick did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickAction {
    Outside,
    AlreadyAlerted,
    Moving,
    PluggedIn {
        charging_state: ChargingState,
    },
    BatteryAboveThreshold {
        battery_level_percent: u8,
    },
    Alerted {
        battery_level_percent: u8,
        email_delivered: bool,
        sms_delivered: bool,
    },
}

/// Outcome of one successful evaluation
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub phase: MonitorPhase,
    pub distance_meters: f64,
    pub action: TickAction,
}

/// State machine tying telemetry to alert dispatch for one vehicle
pub struct GeofenceMonitor {
    telemetry: Arc<dyn VehicleTelemetryClient>,
    dispatcher: Arc<dyn NotificationDispatcher>,
    vehicle: VehicleInfo,
    settings: MonitorSettings,
    state: MonitorState,
    phase: MonitorPhase,
    dwell_id: Option<Uuid>,
    alerts_sent: u64,
    last_alert_at: Option<DateTime<Utc>>,
    logger: crate::logging::StructuredLogger,
}

impl GeofenceMonitor {
    pub fn new(
        vehicle: VehicleInfo,
        settings: MonitorSettings,
        telemetry: Arc<dyn VehicleTelemetryClient>,
        dispatcher: Arc<dyn NotificationDispatcher>,
    ) -> Self {
        let logger = get_logger_with_context(
            LogContext::new("monitor")
                .with_vehicle(vehicle.display_name.clone())
                .with_field("vehicle_id", vehicle.id.to_string()),
        );
        Self {
            telemetry,
            dispatcher,
            vehicle,
            settings,
            state: MonitorState::default(),
            phase: MonitorPhase::default(),
            dwell_id: None,
            alerts_sent: 0,
            last_alert_at: None,
            logger,
        }
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    pub fn phase(&self) -> MonitorPhase {
        self.phase
    }

    pub fn vehicle(&self) -> &VehicleInfo {
        &self.vehicle
    }

    /// Correlation id of the current dwell, if the vehicle is inside
    pub fn dwell_id(&self) -> Option<Uuid> {
        self.dwell_id
    }

    /// Alerts dispatched since startup
    pub fn alerts_sent(&self) -> u64 {
        self.alerts_sent
    }

    pub fn last_alert_at(&self) -> Option<DateTime<Utc>> {
        self.last_alert_at
    }

    /// Run one evaluation
    ///
    /// A failed location read leaves phase and state untouched. A failed
    /// charge-state read leaves the monitor in `InsideStoppedPending` with
    /// the alert flag clear, so the next tick retries it.
    pub async fn evaluate_tick(&mut self) -> Result<TickReport> {
        let sample = match self.telemetry.location(self.vehicle.id).await {
            Ok(sample) => sample,
            Err(e) => {
                self.logger
                    .warn(&format!("Location unavailable, skipping this check: {}", e));
                return Err(e);
            }
        };

        let distance = geo::distance(self.settings.geofence.center(), sample.coordinate);
        self.logger.debug(&format!(
            "Location {} shift={} speed={} distance={:.1}m",
            sample.coordinate, sample.shift_state, sample.speed, distance
        ));

        if distance > f64::from(self.settings.geofence.radius_meters) {
            self.leave_zone();
            return Ok(self.report(distance, TickAction::Outside));
        }
        self.enter_zone();

        if self.state.already_alerted_in_this_dwell {
            self.phase = MonitorPhase::InsideStoppedAlerted;
            if let Some(at) = self.last_alert_at {
                self.logger.debug(&format!(
                    "Alert already sent at {} during this stay, not checking charge state",
                    at.to_rfc3339()
                ));
            }
            return Ok(self.report(distance, TickAction::AlreadyAlerted));
        }

        if !sample.is_stopped() {
            self.phase = MonitorPhase::InsideMoving;
            return Ok(self.report(distance, TickAction::Moving));
        }

        self.phase = MonitorPhase::InsideStoppedPending;
        let charge = match self.telemetry.charge_state(self.vehicle.id).await {
            Ok(charge) => charge,
            Err(e) => {
                self.logger.warn(&format!(
                    "Charge state unavailable, retrying next check: {}",
                    e
                ));
                return Err(e);
            }
        };

        self.logger.info(&format!(
            "Vehicle {} is within {} meters of the geofence with a battery level of {} percent and charging state of {}",
            self.vehicle.display_name,
            distance.trunc() as u64,
            charge.battery_level_percent,
            charge.charging_state
        ));

        if charge.charging_state != ChargingState::Disconnected {
            return Ok(self.report(
                distance,
                TickAction::PluggedIn {
                    charging_state: charge.charging_state,
                },
            ));
        }

        if charge.battery_level_percent >= self.settings.alert_threshold_percent {
            self.logger.info(&format!(
                "Battery level {} is at or above the {} percent alert threshold, not sending alert",
                charge.battery_level_percent, self.settings.alert_threshold_percent
            ));
            return Ok(self.report(
                distance,
                TickAction::BatteryAboveThreshold {
                    battery_level_percent: charge.battery_level_percent,
                },
            ));
        }

        let alert = AlertMessage::plug_in_reminder(
            &self.vehicle.display_name,
            distance,
            charge.battery_level_percent,
        );
        self.logger.warn(&alert.body);

        // Attempted counts as sent; delivery failures are not retried this dwell
        self.state.already_alerted_in_this_dwell = true;
        self.phase = MonitorPhase::InsideStoppedAlerted;
        self.alerts_sent = self.alerts_sent.saturating_add(1);
        self.last_alert_at = Some(Utc::now());

        let outcome = notify::dispatch(self.dispatcher.as_ref(), &alert).await;
        if let Err(e) = &outcome.email {
            self.logger.error(&format!("Email alert failed: {}", e));
        }
        if let Err(e) = &outcome.sms {
            self.logger.error(&format!("SMS alert failed: {}", e));
        }

        Ok(self.report(
            distance,
            TickAction::Alerted {
                battery_level_percent: charge.battery_level_percent,
                email_delivered: outcome.email.is_ok(),
                sms_delivered: outcome.sms.is_ok(),
            },
        ))
    }

    fn enter_zone(&mut self) {
        if self.dwell_id.is_none() {
            let id = Uuid::new_v4();
            self.dwell_id = Some(id);
            self.logger.set_dwell_id(Some(id.to_string()));
            self.logger.info("Vehicle entered the geofence");
        }
    }

    fn leave_zone(&mut self) {
        if self.dwell_id.take().is_some() {
            self.logger.info("Vehicle left the geofence");
            self.logger.set_dwell_id(None);
        }
        self.state.already_alerted_in_this_dwell = false;
        self.phase = MonitorPhase::Outside;
    }

    fn report(&self, distance_meters: f64, action: TickAction) -> TickReport {
        TickReport {
            phase: self.phase,
            distance_meters,
            action,
        }
    }
}

#[async_trait::async_trait]
impl PeriodicJob for GeofenceMonitor {
    fn name(&self) -> &str {
        &self.vehicle.display_name
    }

    async fn run_once(&mut self) -> Result<()> {
        let report = self.evaluate_tick().await?;
        self.logger.debug(&format!(
            "Check complete: phase={} action={:?}",
            report.phase, report.action
        ));
        Ok(())
    }
}
