//! Owner REST API client
//!
//! Implements [`VehicleTelemetryClient`] against the vehicle owner API using
//! the password grant, bearer-token requests and the `drive_state` /
//! `charge_state` data endpoints. Every request is bounded by the configured
//! timeout.

use super::{
    ChargeStateSample, ChargingState, ShiftState, VehicleInfo, VehicleLocationSample,
    VehicleTelemetryClient,
};
use crate::config::TeslaConfig;
use crate::error::{PlugwatchError, Result};
use crate::geo::Coordinate;
use crate::logging::get_logger;
use reqwest::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::sync::RwLock;

#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    response: T,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawVehicle {
    id: u64,
    display_name: Option<String>,
    vin: Option<String>,
    state: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawDriveState {
    latitude: Option<f64>,
    longitude: Option<f64>,
    shift_state: Option<String>,
    speed: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawChargeState {
    battery_level: Option<i64>,
    charging_state: Option<String>,
}

fn parse_envelope<T: DeserializeOwned>(body: &str) -> Result<T> {
    let envelope: ApiEnvelope<T> = serde_json::from_str(body)?;
    Ok(envelope.response)
}

/// Parse a `/api/1/vehicles` response body
pub fn parse_vehicle_list(body: &str) -> Result<Vec<VehicleInfo>> {
    let raw: Vec<RawVehicle> = parse_envelope(body)?;
    Ok(raw
        .into_iter()
        .map(|v| VehicleInfo {
            display_name: v
                .display_name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| format!("Vehicle {}", v.id)),
            id: v.id,
            vin: v.vin,
            state: v.state,
        })
        .collect())
}

/// Parse a `drive_state` response body
pub fn parse_drive_state(body: &str) -> Result<VehicleLocationSample> {
    let raw: RawDriveState = parse_envelope(body)?;
    let (Some(latitude), Some(longitude)) = (raw.latitude, raw.longitude) else {
        return Err(PlugwatchError::api("Drive state has no location"));
    };
    Ok(VehicleLocationSample {
        coordinate: Coordinate::new(latitude, longitude),
        shift_state: ShiftState::from_label(raw.shift_state.as_deref()),
        // Speed is null while parked
        speed: raw.speed.unwrap_or(0.0),
    })
}

/// Parse a `charge_state` response body
pub fn parse_charge_state(body: &str) -> Result<ChargeStateSample> {
    let raw: RawChargeState = parse_envelope(body)?;
    let level = raw
        .battery_level
        .ok_or_else(|| PlugwatchError::api("Charge state has no battery level"))?;
    let label = raw
        .charging_state
        .ok_or_else(|| PlugwatchError::api("Charge state has no charging state"))?;
    Ok(ChargeStateSample {
        battery_level_percent: u8::try_from(level.clamp(0, 100)).unwrap_or(0),
        charging_state: ChargingState::from_label(&label),
    })
}

/// Owner API client holding the bearer token obtained by [`authenticate`]
///
/// [`authenticate`]: VehicleTelemetryClient::authenticate
pub struct TeslaClient {
    http: reqwest::Client,
    config: TeslaConfig,
    token: RwLock<Option<String>>,
    logger: crate::logging::StructuredLogger,
}

impl TeslaClient {
    /// Create a client; no network traffic happens until `authenticate`
    pub fn new(config: &TeslaConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(concat!("plugwatch/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            config: config.clone(),
            token: RwLock::new(None),
            logger: get_logger("tesla"),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn get_body(&self, path: &str) -> Result<String> {
        let token = self
            .token
            .read()
            .await
            .clone()
            .ok_or_else(|| PlugwatchError::auth("Not authenticated"))?;

        self.logger.debug(&format!("GET {}", path));
        let resp = self.http.get(self.url(path)).bearer_auth(token).send().await?;

        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(PlugwatchError::auth(format!("{} rejected the access token", path)));
        }
        if status == StatusCode::REQUEST_TIMEOUT {
            return Err(PlugwatchError::api("Vehicle unavailable (asleep or offline)"));
        }
        if !status.is_success() {
            return Err(PlugwatchError::api(format!("{} returned {}", path, status)));
        }
        Ok(resp.text().await?)
    }
}

#[async_trait::async_trait]
impl VehicleTelemetryClient for TeslaClient {
    async fn authenticate(&self) -> Result<()> {
        let payload = serde_json::json!({
            "grant_type": "password",
            "client_id": self.config.client_id,
            "client_secret": self.config.client_secret,
            "email": self.config.email,
            "password": self.config.password,
        });

        self.logger
            .info(&format!("Logging in as {}", self.config.email));
        let resp = self
            .http
            .post(self.url("/oauth/token"))
            .json(&payload)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(PlugwatchError::auth(format!(
                "Login failed with status {}",
                resp.status()
            )));
        }

        let body: TokenResponse = resp.json().await?;
        let token = body
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| PlugwatchError::auth("Login response has no access token"))?;

        *self.token.write().await = Some(token);
        self.logger.info("Authenticated with vehicle API");
        Ok(())
    }

    async fn list_vehicles(&self) -> Result<Vec<VehicleInfo>> {
        let body = self.get_body("/api/1/vehicles").await?;
        parse_vehicle_list(&body)
    }

    async fn location(&self, vehicle_id: u64) -> Result<VehicleLocationSample> {
        let path = format!("/api/1/vehicles/{}/data_request/drive_state", vehicle_id);
        let body = self.get_body(&path).await?;
        parse_drive_state(&body)
    }

    async fn charge_state(&self, vehicle_id: u64) -> Result<ChargeStateSample> {
        let path = format!("/api/1/vehicles/{}/data_request/charge_state", vehicle_id);
        let body = self.get_body(&path).await?;
        parse_charge_state(&body)
    }
}
