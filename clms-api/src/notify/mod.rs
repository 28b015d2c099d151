//! Notification dispatcher. The core depends only on the two-outcome
//! `send` contract; the real transport is whatever sits behind the
//! configured webhook.

use crate::config::NotifyConfig;
use serde::Serialize;

const DEFAULT_RECIPIENT: &str = "sales-team";

#[derive(Debug)]
pub enum DispatchOutcome {
    Delivered,
    Failed(String),
}

pub enum Notifier {
    /// No transport configured: no network I/O, the digest is only logged
    /// and delivery is reported trivially.
    Simulated { recipient: String },
    Webhook {
        client: reqwest::Client,
        url: String,
        recipient: String,
    },
    #[cfg(test)]
    Recording(std::sync::Arc<std::sync::Mutex<Vec<SentNotification>>>),
}

#[cfg(test)]
#[derive(Debug, Clone)]
pub struct SentNotification {
    pub subject: String,
    pub body: String,
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    recipient: &'a str,
    subject: &'a str,
    body: &'a str,
}

impl Notifier {
    pub fn from_config(cfg: Option<&NotifyConfig>) -> Self {
        let recipient = cfg
            .and_then(|c| c.recipient.clone())
            .unwrap_or_else(|| DEFAULT_RECIPIENT.to_string());

        match cfg.and_then(|c| c.webhook_url.clone()) {
            Some(url) => {
                tracing::info!("Notification dispatcher posting to {}", url);
                Notifier::Webhook {
                    client: reqwest::Client::new(),
                    url,
                    recipient,
                }
            }
            None => {
                tracing::info!("No notification transport configured, running in simulated mode");
                Notifier::Simulated { recipient }
            }
        }
    }

    /// Single delivery attempt, no retry. Transport problems come back as
    /// `Failed`; callers log and move on.
    pub async fn send(&self, subject: &str, body: &str) -> DispatchOutcome {
        match self {
            Notifier::Simulated { recipient } => {
                tracing::info!(
                    "Simulated notification to {}: [{}] {}",
                    recipient,
                    subject,
                    body
                );
                DispatchOutcome::Delivered
            }
            Notifier::Webhook {
                client,
                url,
                recipient,
            } => {
                let payload = WebhookPayload {
                    recipient,
                    subject,
                    body,
                };
                match client.post(url).json(&payload).send().await {
                    Ok(resp) if resp.status().is_success() => DispatchOutcome::Delivered,
                    Ok(resp) => DispatchOutcome::Failed(format!(
                        "notification webhook returned {}",
                        resp.status()
                    )),
                    Err(e) => DispatchOutcome::Failed(e.to_string()),
                }
            }
            #[cfg(test)]
            Notifier::Recording(sent) => {
                sent.lock().unwrap().push(SentNotification {
                    subject: subject.to_string(),
                    body: body.to_string(),
                });
                DispatchOutcome::Delivered
            }
        }
    }
}
