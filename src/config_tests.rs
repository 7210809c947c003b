use super::*;

/// A configuration that passes validation
pub(super) fn valid_config() -> Config {
    let mut config = Config::default();
    config.tesla.email = "owner@example.com".to_string();
    config.tesla.password = "secret".to_string();
    config.tesla.client_id = "client".to_string();
    config.tesla.client_secret = "client-secret".to_string();
    config.geofence = GeofenceConfig {
        latitude: 37.0,
        longitude: -122.0,
        radius_meters: 200,
    };
    config.mail.server = "smtp.example.com".to_string();
    config.mail.from_address = "plugwatch@example.com".to_string();
    config.mail.to_address = "owner@example.com".to_string();
    config.sms.account_sid = "AC123".to_string();
    config.sms.auth_token = "token".to_string();
    config.sms.from_number = "+15550001".to_string();
    config.sms.to_number = "+15550002".to_string();
    config
}

#[test]
fn rejects_out_of_range_coordinates() {
    let mut config = valid_config();
    config.geofence.latitude = 90.5;
    assert!(config.validate().is_err());

    config = valid_config();
    config.geofence.longitude = -180.1;
    assert!(config.validate().is_err());
}

#[test]
fn rejects_empty_credentials_and_endpoints() {
    let mut config = valid_config();
    config.tesla.password = "  ".to_string();
    assert!(config.validate().is_err());

    config = valid_config();
    config.mail.server.clear();
    assert!(config.validate().is_err());

    config = valid_config();
    config.sms.to_number.clear();
    assert!(config.validate().is_err());
}

#[test]
fn rejects_zero_interval_and_unknown_log_level() {
    let mut config = valid_config();
    config.monitor.check_interval_secs = 0;
    assert!(config.validate().is_err());

    config = valid_config();
    config.logging.level = "LOUD".to_string();
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("logging.level"));
}

#[test]
fn rejects_interval_longer_than_a_day() {
    let mut config = valid_config();
    config.monitor.check_interval_secs = MAX_CHECK_INTERVAL_SECS;
    assert!(config.validate().is_ok());

    config.monitor.check_interval_secs = MAX_CHECK_INTERVAL_SECS + 1;
    assert!(config.validate().is_err());

    config.monitor.check_interval_secs = u64::MAX;
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("monitor.check_interval_secs"));
}

#[test]
fn env_overrides_replace_secrets() {
    let mut config = valid_config();
    config.apply_env_overrides(|key| match key {
        ENV_TESLA_PASSWORD => Some("from-env".to_string()),
        ENV_TWILIO_TOKEN => Some(String::new()),
        _ => None,
    });
    assert_eq!(config.tesla.password, "from-env");
    // Empty values are ignored
    assert_eq!(config.sms.auth_token, "token");
    assert_eq!(config.mail.password, "");
}

#[test]
fn minimal_yaml_fills_defaults() {
    let yaml = r#"
tesla:
  email: owner@example.com
  password: secret
  client_id: id
  client_secret: sec
geofence:
  latitude: 37.0
  longitude: -122.0
  radius_meters: 150
mail:
  server: smtp.example.com
  from_address: a@example.com
  to_address: b@example.com
  security: tls
sms:
  account_sid: AC1
  auth_token: tok
  from_number: "+1555"
  to_number: "+1556"
"#;
    let config: Config = serde_yaml::from_str(yaml).unwrap();
    assert!(config.validate().is_ok());
    assert_eq!(config.tesla.vehicle_index, 0);
    assert_eq!(config.monitor.check_interval_secs, 300);
    assert_eq!(config.monitor.alert_threshold_percent, 50);
    assert_eq!(config.mail.port, 25);
    assert_eq!(config.mail.security, MailSecurity::Tls);
    assert_eq!(config.sms.base_url, "https://api.twilio.com");
    assert_eq!(config.geofence.radius_meters, 150);
}
