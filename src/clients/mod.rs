//! Clients for the services the worker talks to
//!
//! Each service sits behind a small trait so the dispatcher and runner can be
//! driven by in-memory fakes in tests:
//! - `ObjectStore`: S3 object download/upload
//! - `MessageQueue`: SQS receive/delete/send
//! - `Notifier`: Slack status messages

pub mod notify;
pub mod queue;
pub mod storage;

pub use notify::{Notifier, SlackNotifier};
pub use queue::{MessageQueue, SqsQueue};
pub use storage::{ObjectStore, S3Store};

use aws_config::{BehaviorVersion, SdkConfig};
use aws_sdk_s3::config::Region;

/// Load the shared AWS SDK configuration for a region
///
/// Credentials come from the standard provider chain.
pub async fn load_aws_config(region: &str) -> SdkConfig {
    aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(region.to_string()))
        .load()
        .await
}
