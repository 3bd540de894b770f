use std::sync::Arc;
use std::time::Duration;

use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::{
        authentication::Credentials,
        client::{Tls, TlsParameters},
    },
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::{debug, error, info};

use crate::config::EmailSettings;
use crate::models::{DealerContact, Enquiry};

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("SMTP configuration error: {0}")]
    Config(String),

    #[error("Invalid email address '{0}'")]
    Address(String),
}

struct Mailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
    receivers: Vec<Mailbox>,
    error_group: Vec<Mailbox>,
}

/// Outcome notifier: one email per handled request, success or failure, to a
/// fixed recipient set.
///
/// Delivery is fire-and-forget — the send runs on a spawned task and a
/// failure is only logged, never surfaced into the HTTP response. When no
/// SMTP settings are configured the service is disabled and every dispatch
/// is a logged no-op.
#[derive(Clone, Default)]
pub struct NotificationService {
    mailer: Option<Arc<Mailer>>,
}

impl NotificationService {
    /// A notifier that drops everything; used when SMTP is not configured
    /// and in tests.
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn new(settings: &EmailSettings) -> Result<Self, NotificationError> {
        let sender = parse_mailbox(&settings.sender_email)?;
        let receivers = parse_mailboxes(&settings.receiver_emails)?;
        let error_group = parse_mailboxes(&settings.error_group_emails)?;

        let mut builder =
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&settings.smtp_host)
                .port(settings.smtp_port)
                .timeout(Some(Duration::from_secs(settings.connection_timeout_secs)));

        if settings.use_starttls {
            let tls = TlsParameters::new(settings.smtp_host.clone())
                .map_err(|e| NotificationError::Config(format!("TLS setup failed: {}", e)))?;
            builder = builder.tls(Tls::Required(tls));
        } else {
            builder = builder.tls(Tls::None);
        }

        if !settings.smtp_username.is_empty() {
            builder = builder.credentials(Credentials::new(
                settings.smtp_username.clone(),
                settings.smtp_password.clone(),
            ));
        }

        info!(
            "Outcome notifications enabled via {}:{}",
            settings.smtp_host, settings.smtp_port
        );

        Ok(Self {
            mailer: Some(Arc::new(Mailer {
                transport: builder.build(),
                sender,
                receivers,
                error_group,
            })),
        })
    }

    pub fn notify_success(&self, subject: &str, body: String) {
        match &self.mailer {
            Some(mailer) => mailer.dispatch(mailer.receivers.clone(), subject, body),
            None => debug!("Notifications disabled; skipping success email '{}'", subject),
        }
    }

    pub fn notify_failure(&self, subject: &str, body: String) {
        match &self.mailer {
            Some(mailer) => mailer.dispatch(mailer.error_group.clone(), subject, body),
            None => debug!("Notifications disabled; skipping failure email '{}'", subject),
        }
    }
}

impl Mailer {
    fn dispatch(&self, recipients: Vec<Mailbox>, subject: &str, body: String) {
        let mut builder = Message::builder()
            .from(self.sender.clone())
            .subject(subject)
            .header(ContentType::TEXT_PLAIN);
        for recipient in recipients {
            builder = builder.to(recipient);
        }

        let message = match builder.body(body) {
            Ok(message) => message,
            Err(e) => {
                error!("Failed to build notification email '{}': {}", subject, e);
                return;
            }
        };

        let transport = self.transport.clone();
        let subject = subject.to_string();
        tokio::spawn(async move {
            match transport.send(message).await {
                Ok(_) => debug!("Notification email '{}' sent", subject),
                Err(e) => error!("Failed to send notification email '{}': {}", subject, e),
            }
        });
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, NotificationError> {
    address
        .parse::<Mailbox>()
        .map_err(|_| NotificationError::Address(address.to_string()))
}

fn parse_mailboxes(addresses: &[String]) -> Result<Vec<Mailbox>, NotificationError> {
    addresses.iter().map(|a| parse_mailbox(a)).collect()
}

/// `key: value` lines for one record, in the transport field order.
pub fn format_record(record: &Enquiry) -> String {
    let value = serde_json::to_value(record).unwrap_or(serde_json::Value::Null);
    let Some(map) = value.as_object() else {
        return String::new();
    };
    map.iter()
        .map(|(key, value)| format!("{}: {}", key, display_value(value)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Numbered record blocks for multi-record notification bodies.
pub fn format_records(records: &[Enquiry]) -> String {
    records
        .iter()
        .enumerate()
        .map(|(i, record)| format!("Record {}:\n\n{}", i + 1, format_record(record)))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Dealer code/name table for the dealer-listing notification.
pub fn format_dealers(dealers: &[DealerContact]) -> String {
    if dealers.is_empty() {
        return "No dealer data available.".to_string();
    }

    let mut formatted = String::from("Dealer Code | Dealer Name\n");
    formatted.push_str(&"-".repeat(40));
    formatted.push('\n');
    for dealer in dealers {
        let code = dealer
            .dealercode
            .map_or_else(|| "N/A".to_string(), |c| c.to_string());
        let name = dealer.dealername.as_deref().unwrap_or("N/A");
        formatted.push_str(&format!("{:<15} |       {}\n", code, name));
    }
    formatted
}

fn display_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample() -> Enquiry {
        Enquiry {
            customer_name: Some("Ravi Kumar".into()),
            gender: Some("Male".into()),
            age: Some(34),
            occupation: Some("Engineer".into()),
            mobile_no: 9876543210,
            email: Some("ravi@example.com".into()),
            vehicle_model: Some("Thar-4X".into()),
            state: Some("Karnataka".into()),
            district: Some("Bengaluru Urban".into()),
            city: Some("Bengaluru".into()),
            existing_vehicle: Some("Alto".into()),
            dealer_state: Some("Karnataka".into()),
            dealer_town: Some("Whitefield".into()),
            dealer_name: Some("Prime Motors".into()),
            brief_about_enquiry: Some("Test drive".into()),
            expected_date_of_purchase: NaiveDate::from_ymd_opt(2024, 3, 15),
            sent_to_dealer: Some(false),
            dealer_code: Some(101),
            lead_id: Some(5001),
            created_date: NaiveDate::from_ymd_opt(2024, 1, 10),
            is_purchased: Some(false),
        }
    }

    #[test]
    fn record_formatting_lists_every_field() {
        let body = format_record(&sample());
        assert!(body.contains("CustomerName: Ravi Kumar"));
        assert!(body.contains("MobileNo: 9876543210"));
        assert!(body.contains("ExpectedDateofPurchase: 2024-03-15"));
        assert!(body.contains("SentToDealer: false"));
    }

    #[test]
    fn records_are_numbered_from_one() {
        let body = format_records(&[sample(), sample()]);
        assert!(body.starts_with("Record 1:"));
        assert!(body.contains("Record 2:"));
    }

    #[test]
    fn dealer_table_handles_missing_values() {
        let dealers = vec![
            DealerContact {
                dealercode: Some(101),
                dealername: Some("Prime Motors".into()),
            },
            DealerContact {
                dealercode: None,
                dealername: None,
            },
        ];
        let table = format_dealers(&dealers);
        assert!(table.contains("Prime Motors"));
        assert!(table.contains("N/A"));

        assert_eq!(format_dealers(&[]), "No dealer data available.");
    }

    #[test]
    fn disabled_notifier_is_a_no_op() {
        let notifier = NotificationService::disabled();
        notifier.notify_success("Subject", "body".to_string());
        notifier.notify_failure("Subject", "body".to_string());
    }
}
