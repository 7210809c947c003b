use super::*;

impl Default for TeslaConfig {
    fn default() -> Self {
        Self {
            email: String::new(),
            password: String::new(),
            client_id: String::new(),
            client_secret: String::new(),
            base_url: "https://owner-api.teslamotors.com".to_string(),
            vehicle_index: 0,
            request_timeout_secs: 30,
        }
    }
}

impl Default for GeofenceConfig {
    fn default() -> Self {
        Self {
            latitude: 0.0,
            longitude: 0.0,
            radius_meters: 200,
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            check_interval_secs: 300,
            alert_threshold_percent: 50,
            check_on_startup: false,
        }
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            server: String::new(),
            port: 25,
            login: String::new(),
            password: String::new(),
            security: MailSecurity::default(),
            from_address: String::new(),
            to_address: String::new(),
        }
    }
}

impl Default for SmsConfig {
    fn default() -> Self {
        Self {
            account_sid: String::new(),
            auth_token: String::new(),
            from_number: String::new(),
            to_number: String::new(),
            base_url: "https://api.twilio.com".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            file: "/tmp/plugwatch.log".to_string(),
            backup_count: 5,
            console_output: true,
            json_format: false,
        }
    }
}
