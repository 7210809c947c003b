//! Alert delivery for Plugwatch
//!
//! Alerts go out over two independent channels, email and SMS. Both are
//! always attempted; a failure on one never blocks or retries the other.

use crate::config::{MailConfig, SmsConfig};
use crate::error::Result;
use crate::logging::get_logger;
use std::time::Duration;

pub mod mail;
pub mod sms;

pub use mail::SmtpMailer;
pub use sms::TwilioSms;

/// Outbound notification contract
#[async_trait::async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn send_email(&self, subject: &str, body: &str) -> Result<()>;

    async fn send_sms(&self, body: &str) -> Result<()>;
}

/// Subject and body of a plug-in reminder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertMessage {
    pub subject: String,
    pub body: String,
}

impl AlertMessage {
    /// Reminder for a vehicle parked unplugged inside the zone
    pub fn plug_in_reminder(vehicle_name: &str, distance_meters: f64, battery_percent: u8) -> Self {
        Self {
            subject: format!("Plug-in reminder - {}", vehicle_name),
            body: format!(
                "Vehicle {} is within {} meters of the geofence with a battery level of {} percent. Please plug in.",
                vehicle_name,
                distance_meters.max(0.0).trunc() as u64,
                battery_percent
            ),
        }
    }
}

/// Per-channel result of one dispatch
#[derive(Debug)]
pub struct DispatchOutcome {
    pub email: Result<()>,
    pub sms: Result<()>,
}

/// Send `alert` on both channels concurrently and report each result
pub async fn dispatch(
    dispatcher: &dyn NotificationDispatcher,
    alert: &AlertMessage,
) -> DispatchOutcome {
    let (email, sms) = tokio::join!(
        dispatcher.send_email(&alert.subject, &alert.body),
        dispatcher.send_sms(&alert.body)
    );
    DispatchOutcome { email, sms }
}

/// Email through SMTP and SMS through Twilio
pub struct Notifier {
    mail: SmtpMailer,
    sms: TwilioSms,
}

impl Notifier {
    pub fn new(mail: SmtpMailer, sms: TwilioSms) -> Self {
        Self { mail, sms }
    }

    pub fn from_config(mail: &MailConfig, sms: &SmsConfig, timeout: Duration) -> Result<Self> {
        Ok(Self::new(
            SmtpMailer::new(mail, timeout)?,
            TwilioSms::new(sms, timeout)?,
        ))
    }
}

#[async_trait::async_trait]
impl NotificationDispatcher for Notifier {
    async fn send_email(&self, subject: &str, body: &str) -> Result<()> {
        self.mail.send(subject, body).await
    }

    async fn send_sms(&self, body: &str) -> Result<()> {
        self.sms.send(body).await
    }
}

/// Dry-run dispatcher that only logs
pub struct LogOnlyDispatcher {
    logger: crate::logging::StructuredLogger,
}

impl LogOnlyDispatcher {
    pub fn new() -> Self {
        Self {
            logger: get_logger("notify"),
        }
    }
}

impl Default for LogOnlyDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl NotificationDispatcher for LogOnlyDispatcher {
    async fn send_email(&self, subject: &str, body: &str) -> Result<()> {
        self.logger
            .warn(&format!("[dry-run] email '{}': {}", subject, body));
        Ok(())
    }

    async fn send_sms(&self, body: &str) -> Result<()> {
        self.logger.warn(&format!("[dry-run] sms: {}", body));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlugwatchError;

    struct HalfBroken;

    #[async_trait::async_trait]
    impl NotificationDispatcher for HalfBroken {
        async fn send_email(&self, _subject: &str, _body: &str) -> Result<()> {
            Err(PlugwatchError::notification("smtp unreachable"))
        }

        async fn send_sms(&self, _body: &str) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn reminder_text_truncates_distance() {
        let alert = AlertMessage::plug_in_reminder("Blue", 123.9, 40);
        assert_eq!(alert.subject, "Plug-in reminder - Blue");
        assert_eq!(
            alert.body,
            "Vehicle Blue is within 123 meters of the geofence with a battery level of 40 percent. Please plug in."
        );
    }

    #[tokio::test]
    async fn email_failure_does_not_block_sms() {
        let alert = AlertMessage::plug_in_reminder("Blue", 0.0, 10);
        let outcome = dispatch(&HalfBroken, &alert).await;
        assert!(outcome.email.is_err());
        assert!(outcome.sms.is_ok());
    }

    #[tokio::test]
    async fn log_only_dispatcher_succeeds() {
        let alert = AlertMessage::plug_in_reminder("Blue", 5.0, 10);
        let outcome = dispatch(&LogOnlyDispatcher::new(), &alert).await;
        assert!(outcome.email.is_ok());
        assert!(outcome.sms.is_ok());
    }
}
