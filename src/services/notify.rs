// src/services/notify.rs

//! Outbound notification transports.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::models::NotifyConfig;
use crate::services::credentials::CredentialProvider;

/// A rendered report ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub subject: String,
    pub html_body: String,
    pub recipients: Vec<String>,
}

/// Delivers a message to its recipients.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: &Message) -> Result<()>;
}

/// JSON payload accepted by the mail API.
#[derive(Debug, Serialize)]
struct MailRequest<'a> {
    from: &'a str,
    to: &'a [String],
    subject: &'a str,
    html: &'a str,
}

/// Sends mail through an authenticated HTTP API.
///
/// The API token is looked up on every send, so runs that never mail
/// do not need it.
pub struct HttpMailer {
    client: Client,
    api_url: String,
    from: String,
    credential_name: String,
    credentials: Box<dyn CredentialProvider>,
}

impl HttpMailer {
    pub fn new(
        config: &NotifyConfig,
        credentials: impl CredentialProvider + 'static,
    ) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            from: config.from.clone(),
            credential_name: config.credential_name.clone(),
            credentials: Box::new(credentials),
        })
    }
}

#[async_trait]
impl Notifier for HttpMailer {
    async fn send(&self, message: &Message) -> Result<()> {
        if message.recipients.is_empty() {
            return Err(AppError::notify("no recipients configured"));
        }
        let token = self.credentials.credential(&self.credential_name)?;

        let request = MailRequest {
            from: &self.from,
            to: &message.recipients,
            subject: &message.subject,
            html: &message.html_body,
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&token)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AppError::notify(format!(
                "mail API returned {}: {}",
                status.as_u16(),
                detail.trim()
            )));
        }

        log::info!(
            "Sent '{}' to {} recipient(s)",
            message.subject,
            message.recipients.len()
        );
        Ok(())
    }
}

/// Logs messages instead of sending them.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, message: &Message) -> Result<()> {
        log::info!(
            "Dry run: would send '{}' to [{}] ({} bytes)",
            message.subject,
            message.recipients.join(", "),
            message.html_body.len()
        );
        log::debug!("{}", message.html_body);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::credentials::StaticCredentials;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> NotifyConfig {
        NotifyConfig {
            api_url: format!("{}/emails", server.uri()),
            from: "kalender@example.org".into(),
            recipients: vec!["eltern@example.org".into()],
            credential_name: "mail-api-token".into(),
        }
    }

    fn message() -> Message {
        Message {
            subject: "ALS Kalender Update - 14.03.2025".into(),
            html_body: "<p>Hallo</p>".into(),
            recipients: vec!["eltern@example.org".into()],
        }
    }

    #[tokio::test]
    async fn test_posts_authenticated_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/emails"))
            .and(header("authorization", "Bearer secret-token"))
            .and(body_partial_json(serde_json::json!({
                "from": "kalender@example.org",
                "to": ["eltern@example.org"],
                "subject": "ALS Kalender Update - 14.03.2025",
                "html": "<p>Hallo</p>"
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let credentials = StaticCredentials::new([("mail-api-token", "secret-token")]);
        let mailer = HttpMailer::new(&config_for(&server), credentials).unwrap();
        mailer.send(&message()).await.unwrap();
    }

    #[tokio::test]
    async fn test_api_error_is_notify_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(422).set_body_string("invalid from"))
            .mount(&server)
            .await;

        let credentials = StaticCredentials::new([("mail-api-token", "secret-token")]);
        let mailer = HttpMailer::new(&config_for(&server), credentials).unwrap();
        let err = mailer.send(&message()).await.unwrap_err();
        assert!(err.to_string().contains("422"));
    }

    #[tokio::test]
    async fn test_missing_credential_fails_on_send() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let mailer = HttpMailer::new(&config_for(&server), StaticCredentials::default()).unwrap();
        let err = mailer.send(&message()).await.unwrap_err();
        assert!(matches!(err, AppError::Credential { .. }));
    }

    #[tokio::test]
    async fn test_no_recipients() {
        let server = MockServer::start().await;
        let credentials = StaticCredentials::new([("mail-api-token", "t")]);
        let mailer = HttpMailer::new(&config_for(&server), credentials).unwrap();
        let mut msg = message();
        msg.recipients.clear();
        assert!(matches!(mailer.send(&msg).await, Err(AppError::Notify(_))));
    }

    #[tokio::test]
    async fn test_log_notifier_succeeds() {
        assert!(LogNotifier.send(&message()).await.is_ok());
    }
}
