//! Environment settings

use crate::clients::notify::{DEFAULT_CHANNEL, DEFAULT_USERNAME};
use crate::error::{MagicBucketError, Result};

/// Settings read from the environment at startup
#[derive(Debug, Clone)]
pub struct Settings {
    /// AWS region of the bucket and queue
    pub region: String,
    /// SQS queue carrying S3 event records
    pub queue_url: Option<String>,
    /// Slack bot token
    pub slack_token: Option<String>,
    pub slack_channel: String,
    pub slack_username: String,
}

impl Settings {
    /// Read settings from the process environment
    ///
    /// Only `AWS_REGION` is needed by every command. `SQS_QUEUE_URL` and
    /// `SLACK_TOKEN` are checked by the commands that use them.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read settings through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        Ok(Self {
            region: required("AWS_REGION", optional("AWS_REGION"))?,
            queue_url: optional("SQS_QUEUE_URL"),
            slack_token: optional("SLACK_TOKEN"),
            slack_channel: optional("SLACK_CHANNEL").unwrap_or_else(|| DEFAULT_CHANNEL.to_string()),
            slack_username: optional("SLACK_USERNAME")
                .unwrap_or_else(|| DEFAULT_USERNAME.to_string()),
        })
    }

    /// `SQS_QUEUE_URL`, or a config error when unset
    pub fn require_queue_url(&self) -> Result<&str> {
        required_ref("SQS_QUEUE_URL", &self.queue_url)
    }

    /// `SLACK_TOKEN`, or a config error when unset
    pub fn require_slack_token(&self) -> Result<&str> {
        required_ref("SLACK_TOKEN", &self.slack_token)
    }
}

fn required(name: &str, value: Option<String>) -> Result<String> {
    value.ok_or_else(|| MagicBucketError::Config(format!("{} not set", name)))
}

fn required_ref<'a>(name: &str, value: &'a Option<String>) -> Result<&'a str> {
    value
        .as_deref()
        .ok_or_else(|| MagicBucketError::Config(format!("{} not set", name)))
}
