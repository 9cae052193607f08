//! Email Service
//!
//! Outbound mail for password reset links. Message bodies are rendered with
//! tera; delivery goes through the `Mailer` seam so that SMTP can be swapped
//! out.

use async_trait::async_trait;
use chrono::Datelike;
use lettre::{
    message::{header, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use log::{error, info, warn};
use tera::{Context, Tera};

use crate::config::EmailConfig;
use crate::utils::error::{AppError, AppResult};

/// A rendered email ready for delivery
#[derive(Debug, Clone, PartialEq)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: Option<String>,
}

/// Delivery seam for outbound mail
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: MailMessage) -> AppResult<()>;
}

const RESET_HTML: &str = r#"
<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Password Reset</title>
</head>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
    <p>Hello {{ user_name }},</p>
    <p>You are receiving this email because you (or someone else) has requested the reset of a password.</p>
    <p>Please make a POST request to:</p>
    <p><a href="{{ reset_url }}">{{ reset_url }}</a></p>
    <p>This link expires in <strong>{{ expires_in_minutes }} minutes</strong>.</p>
    <p>&copy; {{ current_year }} {{ app_name }}</p>
</body>
</html>
"#;

const RESET_TEXT: &str = r#"Hello {{ user_name }},

You are receiving this email because you (or someone else) has requested the reset of a password. Please make a POST request to:

{{ reset_url }}

This link expires in {{ expires_in_minutes }} minutes.

(c) {{ current_year }} {{ app_name }}
"#;

/// Embedded message templates
pub struct EmailTemplates {
    tera: Tera,
    app_name: String,
}

impl EmailTemplates {
    pub fn new(app_name: &str) -> AppResult<Self> {
        let mut tera = Tera::default();
        tera.add_raw_template("password_reset.html", RESET_HTML)
            .map_err(|e| AppError::Configuration(format!("Failed to add HTML template: {}", e)))?;
        tera.add_raw_template("password_reset.txt", RESET_TEXT)
            .map_err(|e| AppError::Configuration(format!("Failed to add text template: {}", e)))?;

        Ok(Self {
            tera,
            app_name: app_name.to_string(),
        })
    }

    /// Render the password reset message carrying the reset link
    pub fn password_reset(
        &self,
        to_email: &str,
        user_name: &str,
        reset_url: &str,
        expires_in_minutes: i64,
    ) -> AppResult<MailMessage> {
        let mut context = Context::new();
        context.insert("user_name", user_name);
        context.insert("reset_url", reset_url);
        context.insert("expires_in_minutes", &expires_in_minutes);
        context.insert("app_name", &self.app_name);
        context.insert("current_year", &chrono::Utc::now().year());

        let html = self
            .tera
            .render("password_reset.html", &context)
            .map_err(|e| AppError::Internal(format!("Failed to render HTML template: {}", e)))?;
        let text = self
            .tera
            .render("password_reset.txt", &context)
            .map_err(|e| AppError::Internal(format!("Failed to render text template: {}", e)))?;

        Ok(MailMessage {
            to: to_email.to_string(),
            subject: "Password reset token".to_string(),
            text,
            html: Some(html),
        })
    }
}

/// SMTP delivery through lettre
pub struct EmailService {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    config: EmailConfig,
}

impl EmailService {
    /// Create a new email service
    pub fn new(config: EmailConfig) -> AppResult<Self> {
        let creds = Credentials::new(config.smtp_username.clone(), config.smtp_password.clone());

        let builder = if config.smtp_use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host).map_err(|e| {
                AppError::Configuration(format!("Failed to configure SMTP relay: {}", e))
            })?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.smtp_host)
        };

        let transport = builder.port(config.smtp_port).credentials(creds).build();

        Ok(Self { transport, config })
    }
}

#[async_trait]
impl Mailer for EmailService {
    async fn send(&self, message: MailMessage) -> AppResult<()> {
        info!("Sending '{}' email to: {}", message.subject, message.to);

        let body = match message.html {
            Some(html) => MultiPart::alternative()
                .singlepart(
                    SinglePart::builder()
                        .header(header::ContentType::TEXT_PLAIN)
                        .body(message.text),
                )
                .singlepart(
                    SinglePart::builder()
                        .header(header::ContentType::TEXT_HTML)
                        .body(html),
                ),
            None => MultiPart::mixed().singlepart(
                SinglePart::builder()
                    .header(header::ContentType::TEXT_PLAIN)
                    .body(message.text),
            ),
        };

        let email = Message::builder()
            .from(
                format!("{} <{}>", self.config.from_name, self.config.from_email)
                    .parse()
                    .map_err(|e| AppError::Configuration(format!("Invalid from address: {}", e)))?,
            )
            .to(message
                .to
                .parse()
                .map_err(|e| AppError::Validation(format!("Invalid recipient email: {}", e)))?)
            .subject(message.subject)
            .multipart(body)
            .map_err(|e| AppError::Internal(format!("Failed to build email message: {}", e)))?;

        match self.transport.send(email).await {
            Ok(_) => {
                info!("Email sent successfully to: {}", message.to);
                Ok(())
            }
            Err(e) => {
                error!("Failed to send email to {}: {}", message.to, e);
                Err(AppError::UpstreamFailure(format!("Failed to send email: {}", e)))
            }
        }
    }
}

/// Mailer used when no SMTP server is configured; every send fails
pub struct DisabledMailer;

#[async_trait]
impl Mailer for DisabledMailer {
    async fn send(&self, message: MailMessage) -> AppResult<()> {
        warn!(
            "Dropping '{}' email to {}: SMTP is not configured",
            message.subject, message.to
        );
        Err(AppError::UpstreamFailure(
            "Email delivery is not configured".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_reset_rendering() {
        let templates = EmailTemplates::new("Restaurant Directory").unwrap();
        let url = "http://localhost:5000/api/v1/auth/resetpassword/abc123";

        let message = templates
            .password_reset("ada@example.com", "Ada", url, 10)
            .unwrap();

        assert_eq!(message.to, "ada@example.com");
        assert!(message.text.contains(url));
        assert!(message.text.contains("10 minutes"));
        assert!(message.html.unwrap().contains("Hello Ada"));
    }

    #[tokio::test]
    async fn test_disabled_mailer_fails() {
        let message = MailMessage {
            to: "ada@example.com".to_string(),
            subject: "Subject".to_string(),
            text: "Body".to_string(),
            html: None,
        };

        assert!(matches!(
            DisabledMailer.send(message).await,
            Err(AppError::UpstreamFailure(_))
        ));
    }
}
