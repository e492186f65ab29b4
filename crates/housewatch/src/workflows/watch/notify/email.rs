use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::render::{render_digest, subject_line};
use super::{Notifier, NotifyError};
use crate::workflows::watch::domain::Listing;

pub const BREVO_API_URL: &str = "https://api.brevo.com/v3/smtp/email";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailSettings {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub sender_email: String,
    #[serde(default = "default_sender_name")]
    pub sender_name: String,
    #[serde(default)]
    pub recipients: Vec<String>,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Upper bound on one delivery request, connect through response body.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl EmailSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

fn default_sender_name() -> String {
    "HouseWatch".to_string()
}

fn default_api_url() -> String {
    BREVO_API_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

#[derive(Serialize)]
struct Sender<'a> {
    name: &'a str,
    email: &'a str,
}

#[derive(Serialize)]
struct Recipient<'a> {
    email: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Payload<'a> {
    sender: Sender<'a>,
    to: Vec<Recipient<'a>>,
    subject: String,
    html_content: String,
}

/// Sends the match digest through a transactional e-mail HTTP API.
#[derive(Debug, Clone)]
pub struct EmailNotifier {
    settings: EmailSettings,
    client: Client,
}

impl EmailNotifier {
    pub fn new(settings: EmailSettings) -> Result<Self, NotifyError> {
        let client = Client::builder().timeout(settings.timeout()).build()?;
        Ok(Self { settings, client })
    }

    pub fn with_client(settings: EmailSettings, client: Client) -> Self {
        Self { settings, client }
    }

    fn check_credentials(&self) -> Result<(), NotifyError> {
        if self.settings.api_key.trim().is_empty() {
            return Err(NotifyError::MissingCredentials("api_key"));
        }
        if self.settings.sender_email.trim().is_empty() {
            return Err(NotifyError::MissingCredentials("sender_email"));
        }
        if self.settings.recipients.iter().all(|r| r.trim().is_empty()) {
            return Err(NotifyError::MissingCredentials("recipients"));
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn notify(&self, matches: &[Listing]) -> Result<(), NotifyError> {
        self.check_credentials()?;

        let payload = Payload {
            sender: Sender {
                name: &self.settings.sender_name,
                email: &self.settings.sender_email,
            },
            to: self
                .settings
                .recipients
                .iter()
                .filter(|email| !email.trim().is_empty())
                .map(|email| Recipient {
                    email: email.as_str(),
                })
                .collect(),
            subject: subject_line(matches.len()),
            html_content: render_digest(matches),
        };

        let response = self
            .client
            .post(&self.settings.api_url)
            .header("api-key", &self.settings.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        info!(count = matches.len(), recipients = payload.to.len(), "match digest e-mailed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::watch::domain::ListingId;

    #[tokio::test]
    async fn missing_api_key_fails_before_any_request() {
        let notifier = EmailNotifier::new(EmailSettings {
            api_key: String::new(),
            sender_email: "watch@example.com".to_string(),
            sender_name: default_sender_name(),
            recipients: vec!["buyer@example.com".to_string()],
            api_url: "http://127.0.0.1:9/unreachable".to_string(),
            timeout_secs: 1,
        })
        .expect("client builds");

        let err = notifier
            .notify(&[Listing::new(ListingId::new("a"), 1)])
            .await
            .expect_err("credentials missing");
        assert!(matches!(err, NotifyError::MissingCredentials("api_key")));
    }

    #[test]
    fn settings_default_to_brevo_endpoint() {
        let settings: EmailSettings =
            serde_yaml::from_str("api_key: k\nsender_email: a@b.c\nrecipients: [x@y.z]\n")
                .expect("settings parse");
        assert_eq!(settings.api_url, BREVO_API_URL);
        assert_eq!(settings.sender_name, "HouseWatch");
        assert_eq!(settings.timeout(), Duration::from_secs(15));
    }

    #[tokio::test]
    async fn silent_endpoint_times_out() {
        // The kernel completes the handshake from the backlog; nothing ever answers.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind listener");
        let addr = listener.local_addr().expect("local addr");

        let notifier = EmailNotifier::new(EmailSettings {
            api_key: "key".to_string(),
            sender_email: "watch@example.com".to_string(),
            sender_name: default_sender_name(),
            recipients: vec!["buyer@example.com".to_string()],
            api_url: format!("http://{addr}/v3/smtp/email"),
            timeout_secs: 1,
        })
        .expect("client builds");

        let outcome = tokio::time::timeout(
            Duration::from_secs(10),
            notifier.notify(&[Listing::new(ListingId::new("a"), 1)]),
        )
        .await
        .expect("notify returns instead of hanging");

        match outcome {
            Err(NotifyError::Transport(err)) => assert!(err.is_timeout()),
            other => panic!("expected a transport timeout, got {other:?}"),
        }
        drop(listener);
    }
}
