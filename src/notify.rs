//! Email notification when a run finds nothing for the watched routes.

use chrono::{DateTime, Utc};
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

use crate::config::SmtpConfig;
use crate::error::NotifyError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub subject: String,
    pub body: String,
}

impl Notification {
    pub fn no_alerts(route_ids: &[String], feed_url: &str, checked_at: DateTime<Utc>) -> Self {
        let routes = route_ids.join("/");
        Self {
            subject: format!("No GTFS-RT alerts found for routes {routes}"),
            body: format!(
                "No active alerts were found for routes {routes}.\n\n\
                 Checked at: {}\n\
                 Source: {feed_url}\n",
                checked_at.format("%Y-%m-%d %H:%M:%S UTC")
            ),
        }
    }
}

/// Delivers a notification. Implementations block until delivery completes.
pub trait Notifier {
    fn send(&self, notification: &Notification) -> Result<(), NotifyError>;
}

pub struct SmtpNotifier {
    config: SmtpConfig,
}

impl SmtpNotifier {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    fn transport(&self) -> Result<SmtpTransport, NotifyError> {
        let creds = Credentials::new(self.config.username.clone(), self.config.password.clone());

        let builder = if self.config.implicit_tls() {
            SmtpTransport::relay(&self.config.server)?
        } else {
            SmtpTransport::starttls_relay(&self.config.server)?
        };

        Ok(builder.port(self.config.port).credentials(creds).build())
    }

    fn message(&self, notification: &Notification) -> Result<Message, NotifyError> {
        let mut builder = Message::builder()
            .from(parse_mailbox(&self.config.from)?)
            .subject(notification.subject.clone());
        for recipient in &self.config.to {
            builder = builder.to(parse_mailbox(recipient)?);
        }
        Ok(builder.body(notification.body.clone())?)
    }
}

impl Notifier for SmtpNotifier {
    fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let email = self.message(notification)?;
        self.transport()?.send(&email)?;
        tracing::info!(
            "Notification sent to {} via {}:{}",
            self.config.to.join(", "),
            self.config.server,
            self.config.port
        );
        Ok(())
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, NotifyError> {
    address.parse().map_err(|source| NotifyError::Address {
        address: address.to_string(),
        source,
    })
}
