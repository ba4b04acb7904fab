//! SQS work queue

use crate::error::{MagicBucketError, Result};
use crate::model::QueueMessage;
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_sqs::error::DisplayErrorContext;
use aws_sdk_sqs::Client;
use tracing::warn;

/// The work queue between the event trigger and the worker
#[async_trait]
pub trait MessageQueue: Send + Sync {
    /// Receive at most one message without waiting for new ones.
    ///
    /// The message stays on the queue until `delete` is called.
    async fn receive_one(&self) -> Result<Option<QueueMessage>>;

    /// Remove a received message from the queue
    async fn delete(&self, message: &QueueMessage) -> Result<()>;

    /// Enqueue a new message body
    async fn send(&self, body: &str) -> Result<()>;

    /// Identifier for log lines
    fn url(&self) -> &str;
}

/// SQS-backed work queue
#[derive(Debug, Clone)]
pub struct SqsQueue {
    client: Client,
    queue_url: String,
}

impl SqsQueue {
    /// Create a queue with a pre-built SQS client
    pub fn new(client: Client, queue_url: impl Into<String>) -> Self {
        Self {
            client,
            queue_url: queue_url.into(),
        }
    }

    /// Create a queue from shared SDK configuration
    pub fn from_config(config: &SdkConfig, queue_url: impl Into<String>) -> Self {
        Self::new(Client::new(config), queue_url)
    }
}

#[async_trait]
impl MessageQueue for SqsQueue {
    async fn receive_one(&self) -> Result<Option<QueueMessage>> {
        let output = self
            .client
            .receive_message()
            .queue_url(&self.queue_url)
            .max_number_of_messages(1)
            .send()
            .await
            .map_err(|e| {
                MagicBucketError::Queue(format!(
                    "ReceiveMessage on {} failed: {}",
                    self.queue_url,
                    DisplayErrorContext(&e)
                ))
            })?;

        let Some(message) = output.messages.unwrap_or_default().into_iter().next() else {
            return Ok(None);
        };

        let receipt_handle = message.receipt_handle.ok_or_else(|| {
            MagicBucketError::Queue(format!(
                "Message from {} has no receipt handle",
                self.queue_url
            ))
        })?;
        let body = message.body.unwrap_or_else(|| {
            warn!("Message from {} has an empty body", self.queue_url);
            String::new()
        });

        Ok(Some(QueueMessage {
            receipt_handle,
            body,
        }))
    }

    async fn delete(&self, message: &QueueMessage) -> Result<()> {
        self.client
            .delete_message()
            .queue_url(&self.queue_url)
            .receipt_handle(&message.receipt_handle)
            .send()
            .await
            .map_err(|e| {
                MagicBucketError::Queue(format!(
                    "DeleteMessage on {} failed: {}",
                    self.queue_url,
                    DisplayErrorContext(&e)
                ))
            })?;
        Ok(())
    }

    async fn send(&self, body: &str) -> Result<()> {
        self.client
            .send_message()
            .queue_url(&self.queue_url)
            .message_body(body)
            .send()
            .await
            .map_err(|e| {
                MagicBucketError::Queue(format!(
                    "SendMessage on {} failed: {}",
                    self.queue_url,
                    DisplayErrorContext(&e)
                ))
            })?;
        Ok(())
    }

    fn url(&self) -> &str {
        &self.queue_url
    }
}
