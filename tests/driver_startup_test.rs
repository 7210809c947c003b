use plugwatch::config::{Config, GeofenceConfig};
use plugwatch::driver::Driver;
use plugwatch::error::{PlugwatchError, Result};
use plugwatch::geo::Coordinate;
use plugwatch::notify::NotificationDispatcher;
use plugwatch::vehicle::{
    ChargeStateSample, ChargingState, ShiftState, VehicleInfo, VehicleLocationSample,
    VehicleTelemetryClient,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

/// Vehicle parked at the zone center, unplugged at 30 percent
#[derive(Default)]
struct ParkedVehicle {
    fail_login: bool,
    vehicles: Vec<VehicleInfo>,
    location_calls: AtomicU32,
    charge_calls: AtomicU32,
}

impl ParkedVehicle {
    fn with_vehicles(n: u64) -> Self {
        Self {
            vehicles: (0..n)
                .map(|i| VehicleInfo {
                    id: 100 + i,
                    display_name: format!("Car {}", i),
                    vin: None,
                    state: None,
                })
                .collect(),
            ..Self::default()
        }
    }
}

#[async_trait::async_trait]
impl VehicleTelemetryClient for ParkedVehicle {
    async fn authenticate(&self) -> Result<()> {
        if self.fail_login {
            return Err(PlugwatchError::auth("bad password"));
        }
        Ok(())
    }

    async fn list_vehicles(&self) -> Result<Vec<VehicleInfo>> {
        Ok(self.vehicles.clone())
    }

    async fn location(&self, _vehicle_id: u64) -> Result<VehicleLocationSample> {
        self.location_calls.fetch_add(1, Ordering::SeqCst);
        Ok(VehicleLocationSample {
            coordinate: Coordinate::new(52.0, 5.0),
            shift_state: ShiftState::Park,
            speed: 0.0,
        })
    }

    async fn charge_state(&self, _vehicle_id: u64) -> Result<ChargeStateSample> {
        self.charge_calls.fetch_add(1, Ordering::SeqCst);
        Ok(ChargeStateSample {
            battery_level_percent: 30,
            charging_state: ChargingState::Disconnected,
        })
    }
}

#[derive(Default)]
struct CountingDispatcher {
    emails: AtomicU32,
    sms: AtomicU32,
}

#[async_trait::async_trait]
impl NotificationDispatcher for CountingDispatcher {
    async fn send_email(&self, _subject: &str, _body: &str) -> Result<()> {
        self.emails.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn send_sms(&self, _body: &str) -> Result<()> {
        self.sms.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn config() -> Config {
    let mut config = Config::default();
    config.geofence = GeofenceConfig {
        latitude: 52.0,
        longitude: 5.0,
        radius_meters: 200,
    };
    config.monitor.check_interval_secs = 300;
    config
}

#[tokio::test]
async fn login_failure_is_fatal() {
    let telemetry = Arc::new(ParkedVehicle {
        fail_login: true,
        ..ParkedVehicle::with_vehicles(1)
    });
    let driver = Driver::new(config(), telemetry.clone(), Arc::new(CountingDispatcher::default()));

    let err = driver.run_until(async {}).await.unwrap_err();
    assert!(matches!(err, PlugwatchError::Auth { .. }));
    assert_eq!(telemetry.location_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn empty_vehicle_list_is_fatal() {
    let driver = Driver::new(
        config(),
        Arc::new(ParkedVehicle::with_vehicles(0)),
        Arc::new(CountingDispatcher::default()),
    );
    let err = driver.start().await.err().unwrap();
    assert!(matches!(err, PlugwatchError::Api { .. }));
}

#[tokio::test]
async fn vehicle_index_out_of_range_is_fatal() {
    let mut cfg = config();
    cfg.tesla.vehicle_index = 2;
    let driver = Driver::new(
        cfg,
        Arc::new(ParkedVehicle::with_vehicles(2)),
        Arc::new(CountingDispatcher::default()),
    );
    let err = driver.start().await.err().unwrap();
    assert!(err.to_string().contains("tesla.vehicle_index"));
}

#[tokio::test]
async fn selects_configured_vehicle() {
    let mut cfg = config();
    cfg.tesla.vehicle_index = 1;
    let driver = Driver::new(
        cfg,
        Arc::new(ParkedVehicle::with_vehicles(3)),
        Arc::new(CountingDispatcher::default()),
    );
    let monitor = driver.start().await.unwrap();
    assert_eq!(monitor.vehicle().id, 101);
    assert_eq!(monitor.vehicle().display_name, "Car 1");
    assert_eq!(monitor.alerts_sent(), 0);
}

#[tokio::test(start_paused = true)]
async fn one_alert_per_dwell_across_ticks() {
    let telemetry = Arc::new(ParkedVehicle::with_vehicles(1));
    let dispatcher = Arc::new(CountingDispatcher::default());
    let driver = Driver::new(config(), telemetry.clone(), dispatcher.clone());

    let stats = driver
        .run_until(tokio::time::sleep(Duration::from_secs(650)))
        .await
        .unwrap();

    // First check after one interval, then every interval
    assert_eq!(stats.ticks, 2);
    assert_eq!(stats.failures, 0);
    assert_eq!(telemetry.location_calls.load(Ordering::SeqCst), 2);
    assert_eq!(telemetry.charge_calls.load(Ordering::SeqCst), 1);
    assert_eq!(dispatcher.emails.load(Ordering::SeqCst), 1);
    assert_eq!(dispatcher.sms.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn check_on_startup_runs_first_tick_immediately() {
    let mut cfg = config();
    cfg.monitor.check_on_startup = true;
    let telemetry = Arc::new(ParkedVehicle::with_vehicles(1));
    let dispatcher = Arc::new(CountingDispatcher::default());
    let driver = Driver::new(cfg, telemetry.clone(), dispatcher.clone());

    let stats = driver
        .run_until(tokio::time::sleep(Duration::from_secs(10)))
        .await
        .unwrap();

    assert_eq!(stats.ticks, 1);
    assert_eq!(dispatcher.emails.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn monitoring_that_cannot_be_scheduled_is_an_error() {
    let mut cfg = config();
    cfg.monitor.check_interval_secs = u64::MAX;
    let telemetry = Arc::new(ParkedVehicle::with_vehicles(1));
    let driver = Driver::new(cfg, telemetry.clone(), Arc::new(CountingDispatcher::default()));

    let err = driver
        .run_until(std::future::pending::<()>())
        .await
        .unwrap_err();
    assert!(matches!(err, PlugwatchError::Generic { .. }));
    assert!(err.to_string().contains("without a shutdown request"));
    assert_eq!(telemetry.location_calls.load(Ordering::SeqCst), 0);
}
