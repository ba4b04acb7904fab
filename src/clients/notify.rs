//! Slack status notifications

use crate::error::{MagicBucketError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

/// Default Slack channel for status messages
pub const DEFAULT_CHANNEL: &str = "#magic-bucket-notify";

/// Default bot username
pub const DEFAULT_USERNAME: &str = "bucketbot";

const POST_MESSAGE_URL: &str = "https://slack.com/api/chat.postMessage";

/// Status channel for task lifecycle events.
///
/// Delivery is best effort: implementations log their own failures and
/// never report them back to the dispatcher.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn info(&self, text: &str);
    async fn success(&self, text: &str);
    async fn fail(&self, text: &str);
}

/// Posts to a Slack channel through `chat.postMessage`
pub struct SlackNotifier {
    client: reqwest::Client,
    token: String,
    channel: String,
    username: String,
}

#[derive(Debug, Deserialize)]
struct SlackResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

impl SlackNotifier {
    /// Create a notifier for the default channel and username
    pub fn new(token: &str) -> Self {
        Self::with_channel(token, DEFAULT_CHANNEL, DEFAULT_USERNAME)
    }

    /// Create a notifier for a custom channel and username
    pub fn with_channel(token: &str, channel: &str, username: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            token: token.to_string(),
            channel: channel.to_string(),
            username: username.to_string(),
        }
    }

    /// Post a message to the configured channel
    pub async fn post_message(&self, text: &str, emoji: Option<&str>) -> Result<()> {
        let text = match emoji {
            Some(emoji) => format!("{} {}", emoji, text),
            None => text.to_string(),
        };

        let response = self
            .client
            .post(POST_MESSAGE_URL)
            .bearer_auth(&self.token)
            .json(&serde_json::json!({
                "channel": self.channel,
                "username": self.username,
                "text": text,
            }))
            .send()
            .await
            .map_err(|e| MagicBucketError::Notify(e.to_string()))?;

        let body: SlackResponse = response
            .json()
            .await
            .map_err(|e| MagicBucketError::Notify(e.to_string()))?;

        if !body.ok {
            return Err(MagicBucketError::Notify(
                body.error.unwrap_or_else(|| "unknown slack error".to_string()),
            ));
        }

        debug!("Posted to {}: {}", self.channel, text);
        Ok(())
    }

    async fn post_best_effort(&self, text: &str, emoji: &str) {
        if let Err(e) = self.post_message(text, Some(emoji)).await {
            warn!("Slack notification failed ({}): {}", e, text);
        }
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    async fn info(&self, text: &str) {
        self.post_best_effort(text, ":information_desk_person:").await;
    }

    async fn success(&self, text: &str) {
        self.post_best_effort(text, ":the_horns:").await;
    }

    async fn fail(&self, text: &str) {
        self.post_best_effort(text, ":sadpanda:").await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slack_response_parsing() {
        let ok: SlackResponse = serde_json::from_str(r#"{"ok": true, "ts": "1.2"}"#).unwrap();
        assert!(ok.ok);

        let failed: SlackResponse =
            serde_json::from_str(r#"{"ok": false, "error": "channel_not_found"}"#).unwrap();
        assert!(!failed.ok);
        assert_eq!(failed.error.as_deref(), Some("channel_not_found"));
    }

    #[tokio::test]
    #[ignore] // Requires SLACK_TOKEN
    async fn test_post_messages() {
        dotenvy::dotenv().ok();
        let token = std::env::var("SLACK_TOKEN").unwrap();
        let slack = SlackNotifier::new(&token);
        slack.info("Information message").await;
        slack.success("Success message").await;
        slack.fail("Failure message").await;
    }
}
