//! Vehicle telemetry for Plugwatch
//!
//! This module defines the read-only telemetry contract the monitor depends
//! on, the samples it produces, and the owner-API implementation.

use crate::error::{PlugwatchError, Result};
use crate::geo::Coordinate;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod tesla;

pub use tesla::TeslaClient;

/// A vehicle listed on the account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleInfo {
    pub id: u64,
    pub display_name: String,
    pub vin: Option<String>,
    /// Online state as reported by the API ("online", "asleep", ...)
    pub state: Option<String>,
}

/// Gear selector position
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShiftState {
    Park,
    Other(String),
    /// Not reported; the API omits it while the vehicle is parked and idle
    Unknown,
}

impl ShiftState {
    pub fn from_label(label: Option<&str>) -> Self {
        match label.map(str::trim) {
            None | Some("") => ShiftState::Unknown,
            Some("P") => ShiftState::Park,
            Some(other) => ShiftState::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ShiftState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShiftState::Park => write!(f, "P"),
            ShiftState::Other(s) => write!(f, "{}", s),
            ShiftState::Unknown => write!(f, "unknown"),
        }
    }
}

/// Charge port connection state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChargingState {
    Disconnected,
    Charging,
    /// Connected but not charging ("Stopped", "Complete", "NoPower", ...)
    Other(String),
}

impl ChargingState {
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "Disconnected" => ChargingState::Disconnected,
            "Charging" => ChargingState::Charging,
            other => ChargingState::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ChargingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChargingState::Disconnected => write!(f, "Disconnected"),
            ChargingState::Charging => write!(f, "Charging"),
            ChargingState::Other(s) => write!(f, "{}", s),
        }
    }
}

/// Location reading taken once per tick
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleLocationSample {
    pub coordinate: Coordinate,
    pub shift_state: ShiftState,
    pub speed: f64,
}

impl VehicleLocationSample {
    /// In park (or gear not reported) and not moving
    pub fn is_stopped(&self) -> bool {
        matches!(self.shift_state, ShiftState::Park | ShiftState::Unknown) && self.speed == 0.0
    }
}

/// Charge reading, only taken while parked in the zone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChargeStateSample {
    pub battery_level_percent: u8,
    pub charging_state: ChargingState,
}

/// Read-only telemetry contract
#[async_trait::async_trait]
pub trait VehicleTelemetryClient: Send + Sync {
    /// Obtain credentials for subsequent calls
    async fn authenticate(&self) -> Result<()>;

    /// Vehicles on the account, in API order
    async fn list_vehicles(&self) -> Result<Vec<VehicleInfo>>;

    async fn location(&self, vehicle_id: u64) -> Result<VehicleLocationSample>;

    async fn charge_state(&self, vehicle_id: u64) -> Result<ChargeStateSample>;
}

/// Pick the configured vehicle out of the account listing
pub fn select_vehicle(vehicles: &[VehicleInfo], index: usize) -> Result<VehicleInfo> {
    if vehicles.is_empty() {
        return Err(PlugwatchError::api("No vehicles on this account"));
    }
    vehicles.get(index).cloned().ok_or_else(|| {
        PlugwatchError::validation(
            "tesla.vehicle_index".to_string(),
            format!(
                "Index {} out of range; account has {} vehicle(s)",
                index,
                vehicles.len()
            ),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vehicle(id: u64, name: &str) -> VehicleInfo {
        VehicleInfo {
            id,
            display_name: name.to_string(),
            vin: None,
            state: None,
        }
    }

    #[test]
    fn shift_state_labels() {
        assert_eq!(ShiftState::from_label(None), ShiftState::Unknown);
        assert_eq!(ShiftState::from_label(Some("")), ShiftState::Unknown);
        assert_eq!(ShiftState::from_label(Some("P")), ShiftState::Park);
        assert_eq!(
            ShiftState::from_label(Some("D")),
            ShiftState::Other("D".to_string())
        );
    }

    #[test]
    fn charging_state_labels() {
        assert_eq!(
            ChargingState::from_label("Disconnected"),
            ChargingState::Disconnected
        );
        assert_eq!(ChargingState::from_label("Charging"), ChargingState::Charging);
        assert_eq!(
            ChargingState::from_label("Complete"),
            ChargingState::Other("Complete".to_string())
        );
    }

    #[test]
    fn stopped_requires_zero_speed_and_park_or_unknown() {
        let mut sample = VehicleLocationSample {
            coordinate: Coordinate::new(0.0, 0.0),
            shift_state: ShiftState::Park,
            speed: 0.0,
        };
        assert!(sample.is_stopped());

        sample.shift_state = ShiftState::Unknown;
        assert!(sample.is_stopped());

        sample.speed = 3.0;
        assert!(!sample.is_stopped());

        sample.speed = 0.0;
        sample.shift_state = ShiftState::Other("D".to_string());
        assert!(!sample.is_stopped());
    }

    #[test]
    fn select_vehicle_by_index() {
        let list = vec![vehicle(1, "First"), vehicle(2, "Second")];
        assert_eq!(select_vehicle(&list, 1).unwrap().display_name, "Second");

        let err = select_vehicle(&list, 2).unwrap_err();
        assert!(matches!(err, PlugwatchError::Validation { .. }));

        let err = select_vehicle(&[], 0).unwrap_err();
        assert!(matches!(err, PlugwatchError::Api { .. }));
    }
}
