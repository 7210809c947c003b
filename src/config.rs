//! Configuration management for Plugwatch
//!
//! This module handles loading, validation, and management of the application
//! configuration from YAML files with support for environment variable
//! overrides of secrets.

use crate::error::{PlugwatchError, Result};
use crate::geo::Coordinate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

mod defaults;

/// Environment variable overriding `tesla.password`
pub const ENV_TESLA_PASSWORD: &str = "PLUGWATCH_TESLA_PASSWORD";
/// Environment variable overriding `mail.password`
pub const ENV_MAIL_PASSWORD: &str = "PLUGWATCH_MAIL_PASSWORD";
/// Environment variable overriding `sms.auth_token`
pub const ENV_TWILIO_TOKEN: &str = "PLUGWATCH_TWILIO_TOKEN";

/// Locations searched when no explicit path is given
pub const DEFAULT_CONFIG_PATHS: [&str; 2] = ["plugwatch.yaml", "/etc/plugwatch/config.yaml"];

/// Longest accepted check interval (one day)
pub const MAX_CHECK_INTERVAL_SECS: u64 = 86_400;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Vehicle API account and vehicle selection
    pub tesla: TeslaConfig,

    /// Zone to watch
    pub geofence: GeofenceConfig,

    /// Polling and alert policy
    #[serde(default)]
    pub monitor: MonitorConfig,

    /// SMTP settings for email alerts
    pub mail: MailConfig,

    /// Twilio settings for SMS alerts
    pub sms: SmsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Vehicle API account configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TeslaConfig {
    /// Account login email
    pub email: String,

    /// Account password
    pub password: String,

    /// OAuth client id used for the password grant
    pub client_id: String,

    /// OAuth client secret used for the password grant
    pub client_secret: String,

    /// Owner API base URL
    pub base_url: String,

    /// Index into the account's vehicle list (0 when there is one vehicle)
    pub vehicle_index: usize,

    /// Upper bound for any single API call
    pub request_timeout_secs: u64,
}

/// Circular zone definition
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeofenceConfig {
    /// Latitude of the zone center in degrees
    pub latitude: f64,

    /// Longitude of the zone center in degrees
    pub longitude: f64,

    /// Radius around the center in meters (typically 200)
    pub radius_meters: u32,
}

impl GeofenceConfig {
    pub fn center(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

/// Polling and alert policy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Seconds between location checks
    pub check_interval_secs: u64,

    /// Battery percentage at or above which no alert is sent
    pub alert_threshold_percent: u8,

    /// Evaluate once immediately instead of waiting a full interval
    pub check_on_startup: bool,
}

impl MonitorConfig {
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }
}

/// Transport security for the SMTP connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MailSecurity {
    /// Upgrade with STARTTLS when the server offers it
    #[default]
    Opportunistic,
    /// Require STARTTLS
    Starttls,
    /// Implicit TLS from the first byte
    Tls,
    /// Plain text
    None,
}

/// SMTP configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    /// SMTP server hostname
    pub server: String,

    /// SMTP server port
    pub port: u16,

    /// Login username; authentication is skipped when empty
    pub login: String,

    /// Login password
    pub password: String,

    /// Connection security
    pub security: MailSecurity,

    /// Sender address
    pub from_address: String,

    /// Recipient address
    pub to_address: String,
}

/// Twilio SMS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmsConfig {
    /// Twilio account SID
    pub account_sid: String,

    /// Twilio auth token
    pub auth_token: String,

    /// Sender phone number
    pub from_number: String,

    /// Recipient phone number
    pub to_number: String,

    /// API base URL
    pub base_url: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    pub level: String,

    /// Path to log file; its directory receives the rolling files
    pub file: String,

    /// Number of rotated files to keep
    pub backup_count: u32,

    /// Whether to log to console
    pub console_output: bool,

    /// Whether to use JSON format
    pub json_format: bool,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Locate, load and apply environment overrides
    ///
    /// An explicit path must exist. Without one the default locations are
    /// tried in order; credentials are mandatory so there is no fallback to
    /// built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(p) => p.to_path_buf(),
            None => DEFAULT_CONFIG_PATHS
                .iter()
                .map(PathBuf::from)
                .find(|p| p.exists())
                .ok_or_else(|| {
                    PlugwatchError::config(format!(
                        "No configuration file found (looked in {})",
                        DEFAULT_CONFIG_PATHS.join(", ")
                    ))
                })?,
        };

        let mut config = Self::from_file(&path).map_err(|e| {
            PlugwatchError::config(format!("Failed to load {}: {}", path.display(), e))
        })?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Replace secrets with values from the environment when present
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());
        if let Some(v) = non_empty(ENV_TESLA_PASSWORD) {
            self.tesla.password = v;
        }
        if let Some(v) = non_empty(ENV_MAIL_PASSWORD) {
            self.mail.password = v;
        }
        if let Some(v) = non_empty(ENV_TWILIO_TOKEN) {
            self.sms.auth_token = v;
        }
    }

    /// Save configuration to a YAML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        // Vehicle account
        require_non_empty("tesla.email", &self.tesla.email)?;
        require_non_empty("tesla.password", &self.tesla.password)?;
        require_non_empty("tesla.client_id", &self.tesla.client_id)?;
        require_non_empty("tesla.client_secret", &self.tesla.client_secret)?;
        require_non_empty("tesla.base_url", &self.tesla.base_url)?;
        if self.tesla.request_timeout_secs == 0 {
            return Err(PlugwatchError::validation(
                "tesla.request_timeout_secs",
                "Must be greater than 0",
            ));
        }

        // Geofence
        if !(-90.0..=90.0).contains(&self.geofence.latitude) {
            return Err(PlugwatchError::validation(
                "geofence.latitude",
                "Must be within [-90, 90]",
            ));
        }
        if !(-180.0..=180.0).contains(&self.geofence.longitude) {
            return Err(PlugwatchError::validation(
                "geofence.longitude",
                "Must be within [-180, 180]",
            ));
        }
        if self.geofence.radius_meters == 0 {
            return Err(PlugwatchError::validation(
                "geofence.radius_meters",
                "Must be greater than 0",
            ));
        }

        // Monitor policy
        if self.monitor.check_interval_secs == 0 {
            return Err(PlugwatchError::validation(
                "monitor.check_interval_secs",
                "Must be greater than 0",
            ));
        }
        if self.monitor.check_interval_secs > MAX_CHECK_INTERVAL_SECS {
            return Err(PlugwatchError::validation(
                "monitor.check_interval_secs".to_string(),
                format!("Must be at most {} seconds", MAX_CHECK_INTERVAL_SECS),
            ));
        }
        if self.monitor.alert_threshold_percent > 100 {
            return Err(PlugwatchError::validation(
                "monitor.alert_threshold_percent",
                "Must be within [0, 100]",
            ));
        }

        // Notification channels
        require_non_empty("mail.server", &self.mail.server)?;
        if self.mail.port == 0 {
            return Err(PlugwatchError::validation(
                "mail.port",
                "Port must be greater than 0",
            ));
        }
        require_non_empty("mail.from_address", &self.mail.from_address)?;
        require_non_empty("mail.to_address", &self.mail.to_address)?;
        require_non_empty("sms.account_sid", &self.sms.account_sid)?;
        require_non_empty("sms.auth_token", &self.sms.auth_token)?;
        require_non_empty("sms.from_number", &self.sms.from_number)?;
        require_non_empty("sms.to_number", &self.sms.to_number)?;
        require_non_empty("sms.base_url", &self.sms.base_url)?;

        crate::logging::parse_log_level(&self.logging.level)
            .map_err(|_| PlugwatchError::validation("logging.level", "Unknown log level"))?;

        Ok(())
    }
}

fn require_non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(PlugwatchError::validation(field, "Cannot be empty"));
    }
    Ok(())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
