//! # Plugwatch - Geofence plug-in reminder for electric vehicles
//!
//! Polls the vehicle owner API on a fixed interval and sends an email and
//! an SMS when the vehicle is parked inside a configured geofence, is not
//! plugged in, and its battery is below a threshold. One alert per stay in
//! the zone; leaving the radius re-arms it.
//!
//! ## Architecture
//!
//! - `config`: YAML configuration, environment overrides and validation
//! - `logging`: Structured logging and tracing
//! - `geo`: Great-circle distance
//! - `vehicle`: Vehicle API client and telemetry samples
//! - `notify`: Email and SMS dispatch
//! - `monitor`: Per-tick geofence state machine
//! - `scheduler`: Fixed-interval task runner
//! - `driver`: Startup sequence and run loop

pub mod config;
pub mod driver;
pub mod error;
pub mod geo;
pub mod logging;
pub mod monitor;
pub mod notify;
pub mod scheduler;
pub mod vehicle;

// Re-export commonly used types
pub use config::Config;
pub use driver::Driver;
pub use error::{PlugwatchError, Result};
pub use monitor::GeofenceMonitor;
