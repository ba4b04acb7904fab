//! Fan-out of S3 event notifications onto the work queue
//!
//! Results are uploaded back into the bucket, so without filtering every
//! upload would trigger another run. Keys inside an `output` directory and
//! configuration or documentation files are never enqueued.

use crate::clients::MessageQueue;
use crate::error::{MagicBucketError, Result};
use crate::model::{basename, dirname, split_extension, EventRecord};
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

/// Parent directory name whose contents are never enqueued
pub const OUTPUT_DIRNAME: &str = "output";

/// Extensions that are never enqueued
pub const KEY_EXTENSION_BLACKLIST: &[&str] = &[".json", ".md"];

/// An S3 event notification as delivered to the trigger
#[derive(Debug, Deserialize)]
pub struct S3Event {
    #[serde(rename = "Records", default)]
    pub records: Vec<Value>,
}

impl S3Event {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| MagicBucketError::InvalidMessage(format!("Invalid S3 event: {}", e)))
    }
}

/// Whether an object with this key should be processed
pub fn should_enqueue(key: &str) -> bool {
    if basename(key).is_empty() {
        info!("Key {} is a folder, not sending message", key);
        return false;
    }
    if basename(dirname(key)) == OUTPUT_DIRNAME {
        info!(
            "Key parent directory is {}, not sending message",
            OUTPUT_DIRNAME
        );
        return false;
    }
    let (_, extension) = split_extension(key);
    if KEY_EXTENSION_BLACKLIST.contains(&extension) {
        info!("Key extension {} is blacklisted, not sending message", extension);
        return false;
    }
    true
}

/// Send every eligible record of `event` to the queue as its own message.
///
/// Returns the number of messages sent.
pub async fn fan_out(queue: &dyn MessageQueue, event: &S3Event) -> Result<usize> {
    let mut sent = 0;
    for record in &event.records {
        let body = serde_json::to_string(record)?;
        let object = match EventRecord::parse_object(&body) {
            Ok(object) => object,
            Err(e) => {
                warn!("Skipping record: {}", e);
                continue;
            }
        };
        if !should_enqueue(&object.key) {
            continue;
        }
        info!("Sending message to {}: {}", queue.url(), body);
        queue.send(&body).await?;
        sent += 1;
    }
    Ok(sent)
}
