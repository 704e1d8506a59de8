//! Outbound notifications (welcome mails, OTP codes, order confirmations).
//!
//! Delivery is behind the [`Notifier`] trait so the SMTP transport can be
//! swapped for the log-only sender in development and tests.

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::header::ContentType,
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use thiserror::Error;

use crate::config::{AppConfig, SmtpConfig};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    #[error("Notification rejected: {0}")]
    Rejected(String),
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: Notification) -> Result<(), NotifyError>;
}

/// Sends plain-text mail over SMTP with STARTTLS.
#[derive(Clone)]
pub struct SmtpNotifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl SmtpNotifier {
    pub fn new(config: &SmtpConfig, from_address: &str) -> Result<Self, NotifyError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            .port(config.port);
        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            mailer: builder.build(),
            from_address: from_address.to_string(),
        })
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, notification: Notification) -> Result<(), NotifyError> {
        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| NotifyError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(notification
                .to
                .parse()
                .map_err(|_| NotifyError::InvalidAddress(notification.to.clone()))?)
            .subject(notification.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(notification.body)?;

        self.mailer.send(email).await?;
        Ok(())
    }
}

/// Writes notifications to the log instead of delivering them.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, notification: Notification) -> Result<(), NotifyError> {
        tracing::info!(
            to = %notification.to,
            subject = %notification.subject,
            body = %notification.body,
            "notification (not delivered: SMTP not configured)"
        );
        Ok(())
    }
}

/// Choose the SMTP sender when configured, the log sender otherwise.
pub fn notifier_from_config(config: &AppConfig) -> Result<std::sync::Arc<dyn Notifier>, NotifyError> {
    match &config.smtp {
        Some(smtp) => Ok(std::sync::Arc::new(SmtpNotifier::new(smtp, &config.mail_from)?)),
        None => Ok(std::sync::Arc::new(LogNotifier)),
    }
}

/// Format a minor-unit amount as `123.45`.
pub fn format_amount(amount: i64) -> String {
    let sign = if amount < 0 { "-" } else { "" };
    let abs = amount.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}

pub fn welcome(to: &str, username: &str) -> Notification {
    Notification {
        to: to.to_string(),
        subject: "Welcome to the store!".to_string(),
        body: format!("Hi {username},\n\nThanks for signing up. We're excited to have you."),
    }
}

pub fn otp_code(to: &str, code: &str) -> Notification {
    Notification {
        to: to.to_string(),
        subject: "Your login code".to_string(),
        body: format!("Your OTP is: {code}\n\nIt expires in 5 minutes."),
    }
}

pub struct ConfirmationLine<'a> {
    pub product_name: &'a str,
    pub quantity: i32,
    pub total_price: i64,
}

pub fn order_confirmation(
    to: &str,
    username: &str,
    order_id: uuid::Uuid,
    lines: &[ConfirmationLine<'_>],
    total: i64,
) -> Notification {
    let mut body = format!("Hi {username}, your order has been placed.\n\n");
    for line in lines {
        body.push_str(&format!(
            "  {} x {}  {}\n",
            line.product_name,
            line.quantity,
            format_amount(line.total_price)
        ));
    }
    body.push_str(&format!("\nTotal: {}\n", format_amount(total)));

    Notification {
        to: to.to_string(),
        subject: format!("Your order #{order_id} confirmation"),
        body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_minor_units() {
        assert_eq!(format_amount(4000), "40.00");
        assert_eq!(format_amount(5), "0.05");
        assert_eq!(format_amount(-1250), "-12.50");
    }

    #[test]
    fn confirmation_lists_every_line_and_total() {
        let lines = [
            ConfirmationLine {
                product_name: "Mango Stick",
                quantity: 2,
                total_price: 2000,
            },
            ConfirmationLine {
                product_name: "Waffle Cone",
                quantity: 1,
                total_price: 2000,
            },
        ];
        let note = order_confirmation("a@b.c", "ann", uuid::Uuid::nil(), &lines, 4000);
        assert_eq!(note.to, "a@b.c");
        assert!(note.body.contains("Mango Stick x 2  20.00"));
        assert!(note.body.contains("Waffle Cone x 1  20.00"));
        assert!(note.body.contains("Total: 40.00"));
    }

    #[tokio::test]
    async fn log_notifier_never_fails() {
        let result = LogNotifier.send(welcome("a@b.c", "ann")).await;
        assert!(result.is_ok());
    }
}
