use std::sync::Arc;
use std::time::Duration;

use axum::async_trait;
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials, Message,
    SmtpTransport, Transport,
};
use tokio::sync::Mutex;

use crate::config::SmtpConfig;
use crate::error::AppError;

/// A rendered notification email, ready for any provider to deliver.
#[derive(Debug, Clone)]
pub struct EmailNotification {
    pub to: String,
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
}

impl EmailNotification {
    pub fn email_confirmation(to: &str, username: &str, code: &str, ttl_minutes: i64) -> Self {
        let html_body = format!(
            r###"            <html>
                <body style="font-family: Arial, sans-serif;">
                    <h2>Email Verification</h2>
                    <p>Hi {},</p>
                    <p>Thank you for registering. Your verification code is:</p>
                    <p style="font-size: 24px; font-weight: bold; letter-spacing: 4px;">{}</p>
                    <p style="color: #666; font-size: 12px;">
                        The code expires in {} minutes. If you didn't sign up, please ignore this email.
                    </p>
                </body>
            </html>
            "###,
            username, code, ttl_minutes
        );

        let text_body = format!(
            "Hi {},\n\nThank you for registering. Your verification code is: {}\n\nThe code expires in {} minutes. If you didn't sign up, please ignore this email.",
            username, code, ttl_minutes
        );

        Self {
            to: to.to_string(),
            subject: "Verify Your Email Address".to_string(),
            text_body,
            html_body,
        }
    }

    pub fn password_reset(to: &str, username: &str, code: &str, ttl_minutes: i64) -> Self {
        let html_body = format!(
            r###"            <html>
                <body style="font-family: Arial, sans-serif;">
                    <h2>Password Reset Request</h2>
                    <p>Hi {},</p>
                    <p>We received a request to reset your password. Your reset code is:</p>
                    <p style="font-size: 24px; font-weight: bold; letter-spacing: 4px;">{}</p>
                    <p style="color: #666; font-size: 12px;">
                        The code expires in {} minutes. If you didn't request this, please ignore this email.
                    </p>
                </body>
            </html>
            "###,
            username, code, ttl_minutes
        );

        let text_body = format!(
            "Hi {},\n\nWe received a request to reset your password. Your reset code is: {}\n\nThe code expires in {} minutes. If you didn't request this, please ignore this email.",
            username, code, ttl_minutes
        );

        Self {
            to: to.to_string(),
            subject: "Reset Your Password".to_string(),
            text_body,
            html_body,
        }
    }
}

#[async_trait]
pub trait EmailProvider: Send + Sync {
    async fn send(&self, notification: &EmailNotification) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct SmtpEmailService {
    mailer: SmtpTransport,
    from_address: String,
}

impl SmtpEmailService {
    pub fn new(config: &SmtpConfig) -> Result<Self, AppError> {
        let creds = Credentials::new(config.username.clone(), config.password.clone());

        let mailer = SmtpTransport::relay(&config.host)
            .map_err(|e| AppError::InternalError(anyhow::anyhow!(e.to_string())))?
            .credentials(creds)
            .port(config.port)
            .timeout(Some(Duration::from_secs(10)))
            .build();

        tracing::info!(host = %config.host, "Email service initialized");

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
        })
    }
}

#[async_trait]
impl EmailProvider for SmtpEmailService {
    async fn send(&self, notification: &EmailNotification) -> Result<(), AppError> {
        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|e: lettre::address::AddressError| {
                        AppError::InternalError(e.into())
                    })?,
            )
            .to(notification
                .to
                .parse()
                .map_err(|e: lettre::address::AddressError| AppError::InternalError(e.into()))?)
            .subject(&notification.subject)
            .multipart(
                lettre::message::MultiPart::alternative()
                    .singlepart(
                        lettre::message::SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(notification.text_body.clone()),
                    )
                    .singlepart(
                        lettre::message::SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(notification.html_body.clone()),
                    ),
            )?;

        // Send email in blocking thread pool to avoid blocking async runtime
        let mailer = self.mailer.clone();
        let result = tokio::task::spawn_blocking(move || mailer.send(&email))
            .await
            .map_err(|e| AppError::InternalError(e.into()))?;

        match result {
            Ok(_) => {
                tracing::info!(
                    to = %notification.to,
                    subject = %notification.subject,
                    "Email sent successfully"
                );
                Ok(())
            }
            Err(e) => {
                tracing::error!(
                    error = %e.to_string(),
                    to = %notification.to,
                    "Failed to send email"
                );
                Err(AppError::EmailError(e.to_string()))
            }
        }
    }
}

/// Test double that records every notification instead of delivering it.
#[derive(Clone, Default)]
pub struct MockEmailService {
    pub sent: Arc<Mutex<Vec<EmailNotification>>>,
}

impl MockEmailService {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EmailProvider for MockEmailService {
    async fn send(&self, notification: &EmailNotification) -> Result<(), AppError> {
        self.sent.lock().await.push(notification.clone());
        Ok(())
    }
}
