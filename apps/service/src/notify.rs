//! Outbound notification channels.
//!
//! Both channels are fire-and-forget: the dispatcher already guarantees at
//! most one escalation per outage episode, and a delivery failure here is
//! logged upstream and never retried. A channel with missing credentials
//! logs the would-be message and reports success so that monitoring never
//! blocks on configuration.

use std::time::{Duration, SystemTime};

use anyhow::{Result, anyhow, bail};
use chrono::{DateTime, Local};
use serde_json::json;
use tracing::info;

use portwatch::{EscalationAlert, Notifier};

use crate::config::Notify;

fn format_timestamp(at: SystemTime) -> String {
    DateTime::<Local>::from(at).format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Instant-message gateway channel.
pub struct MessageChannel {
    client: reqwest::Client,
    url: Option<String>,
    destination: Option<String>,
}

impl MessageChannel {
    pub fn new(url: Option<String>, destination: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self { client, url, destination })
    }

    fn body(alert: &EscalationAlert) -> String {
        format!(
            "ALERT {brand}: port {port} on {host} ({role}) closed since {since}",
            brand = alert.brand,
            port = alert.port,
            host = alert.host,
            role = alert.role,
            since = format_timestamp(alert.closed_since),
        )
    }

    pub async fn send(&self, alert: &EscalationAlert) -> Result<()> {
        let body = Self::body(alert);

        let (Some(url), Some(destination)) = (&self.url, &self.destination) else {
            info!(message = %body, "message channel not configured, logging instead of sending");
            return Ok(());
        };

        let response = self
            .client
            .post(url)
            .json(&json!({ "phone": destination, "text": body }))
            .send()
            .await
            .map_err(|e| anyhow!("message gateway request failed: {}", e))?;

        if !response.status().is_success() {
            bail!("message gateway returned status {}", response.status());
        }

        Ok(())
    }
}

/// Email API channel with a fixed recipient list.
pub struct EmailChannel {
    client: reqwest::Client,
    url: Option<String>,
    from: Option<String>,
    recipients: Vec<String>,
}

impl EmailChannel {
    pub fn new(url: Option<String>, from: Option<String>, recipients: Vec<String>) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self { client, url, from, recipients })
    }

    fn subject(alert: &EscalationAlert) -> String {
        format!("[portwatch] {} {} unreachable", alert.brand, alert.role)
    }

    fn body(alert: &EscalationAlert) -> String {
        format!(
            "The {role} endpoint of {brand} ({host}:{port}) has been unreachable since {since}.",
            role = alert.role,
            brand = alert.brand,
            host = alert.host,
            port = alert.port,
            since = format_timestamp(alert.closed_since),
        )
    }

    pub async fn send(&self, alert: &EscalationAlert) -> Result<()> {
        let subject = Self::subject(alert);
        let body = Self::body(alert);

        let (Some(url), Some(from)) = (&self.url, &self.from) else {
            info!(subject = %subject, "email channel not configured, logging instead of sending");
            return Ok(());
        };
        if self.recipients.is_empty() {
            info!(subject = %subject, "email channel has no recipients, logging instead of sending");
            return Ok(());
        }

        let response = self
            .client
            .post(url)
            .json(&json!({
                "from": from,
                "to": self.recipients,
                "subject": subject,
                "body": body,
            }))
            .send()
            .await
            .map_err(|e| anyhow!("email API request failed: {}", e))?;

        if !response.status().is_success() {
            bail!("email API returned status {}", response.status());
        }

        Ok(())
    }
}

/// Fans one escalation out to both channels. A failing channel never
/// prevents the other from sending; the combined error only surfaces so
/// the dispatcher can log it.
pub struct ServiceNotifier {
    message: MessageChannel,
    email: EmailChannel,
}

impl ServiceNotifier {
    pub fn from_config(notify: &Notify) -> Result<Self> {
        Ok(Self {
            message: MessageChannel::new(
                notify.message_url.clone(),
                notify.message_destination.clone(),
            )?,
            email: EmailChannel::new(
                notify.email_url.clone(),
                notify.email_from.clone(),
                notify.email_recipients.clone(),
            )?,
        })
    }
}

#[async_trait::async_trait]
impl Notifier for ServiceNotifier {
    async fn notify_outage(&self, alert: &EscalationAlert) -> Result<()> {
        let mut failures: Vec<String> = Vec::new();

        if let Err(e) = self.message.send(alert).await {
            failures.push(format!("message: {e:#}"));
        }
        if let Err(e) = self.email.send(alert).await {
            failures.push(format!("email: {e:#}"));
        }

        if failures.is_empty() {
            Ok(())
        } else {
            bail!("notification failures: {}", failures.join("; "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portwatch::Role;

    fn alert() -> EscalationAlert {
        EscalationAlert {
            brand: "acme".to_string(),
            role: Role::Secondary,
            host: "10.0.0.2".to_string(),
            port: 443,
            closed_since: SystemTime::now(),
        }
    }

    #[tokio::test]
    async fn test_unconfigured_message_channel_degrades_to_ok() {
        let channel = MessageChannel::new(None, None).unwrap();
        channel.send(&alert()).await.unwrap();
    }

    #[tokio::test]
    async fn test_unconfigured_email_channel_degrades_to_ok() {
        let channel = EmailChannel::new(None, None, Vec::new()).unwrap();
        channel.send(&alert()).await.unwrap();
    }

    #[tokio::test]
    async fn test_fully_unconfigured_notifier_succeeds() {
        let notifier = ServiceNotifier::from_config(&Notify::default()).unwrap();
        notifier.notify_outage(&alert()).await.unwrap();
    }

    #[test]
    fn test_message_body_names_endpoint() {
        let body = MessageChannel::body(&alert());
        assert!(body.contains("acme"));
        assert!(body.contains("443"));
        assert!(body.contains("10.0.0.2"));
        assert!(body.contains("secondary"));
    }

    #[test]
    fn test_email_subject_and_body() {
        let a = alert();
        assert_eq!(EmailChannel::subject(&a), "[portwatch] acme secondary unreachable");
        assert!(EmailChannel::body(&a).contains("10.0.0.2:443"));
    }
}
