//! Destructive queue consumption

use crate::clients::MessageQueue;
use crate::error::Result;
use crate::model::{EventRecord, ObjectRef};
use std::sync::Arc;
use tracing::info;

/// Pulls the objects announced on the queue, one message at a time.
///
/// Each message is deleted *before* its object is handed out, so a crash
/// while processing loses that item (at-most-once delivery). Once the queue
/// reports no message the consumer is exhausted for good; it never waits for
/// new messages.
pub struct QueueConsumer {
    queue: Arc<dyn MessageQueue>,
    exhausted: bool,
}

impl QueueConsumer {
    pub fn new(queue: Arc<dyn MessageQueue>) -> Self {
        Self {
            queue,
            exhausted: false,
        }
    }

    /// The next object, or `None` once the queue has run dry
    pub async fn next_object(&mut self) -> Result<Option<ObjectRef>> {
        if self.exhausted {
            return Ok(None);
        }

        let Some(message) = self.queue.receive_one().await? else {
            self.exhausted = true;
            return Ok(None);
        };

        self.queue.delete(&message).await?;
        info!(
            "Deleted message {} from queue {}",
            message.receipt_handle,
            self.queue.url()
        );

        let object = EventRecord::parse_object(&message.body)?;
        Ok(Some(object))
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}
