use crate::config::SmsConfig;
use crate::error::{PlugwatchError, Result};
use crate::logging::get_logger;
use std::time::Duration;

/// SMS through the Twilio Messages REST API
pub struct TwilioSms {
    http: reqwest::Client,
    config: SmsConfig,
    logger: crate::logging::StructuredLogger,
}

impl TwilioSms {
    pub fn new(config: &SmsConfig, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            config: config.clone(),
            logger: get_logger("sms"),
        })
    }

    pub fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.config.base_url.trim_end_matches('/'),
            self.config.account_sid
        )
    }

    pub async fn send(&self, body: &str) -> Result<()> {
        let form = [
            ("From", self.config.from_number.as_str()),
            ("To", self.config.to_number.as_str()),
            ("Body", body),
        ];

        self.logger
            .info(&format!("Sending SMS to {}", self.config.to_number));
        let resp = self
            .http
            .post(self.messages_url())
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&form)
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }

        // Twilio error bodies carry a human-readable "message"
        let detail = resp
            .json::<serde_json::Value>()
            .await
            .ok()
            .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
            .unwrap_or_else(|| "no details".to_string());
        Err(PlugwatchError::notification(format!(
            "SMS gateway returned {}: {}",
            status, detail
        )))
    }
}
