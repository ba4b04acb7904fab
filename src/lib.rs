//! Magic Bucket - run point-cloud tools on files dropped into S3
//!
//! An S3 upload event is fanned out onto an SQS queue. The worker drains the
//! queue; for every announced object it picks a task from the key's topmost
//! directory, downloads (and unpacks) the file into a scratch directory, runs
//! the task's external tool and uploads the result into a sibling `output/`
//! directory. Progress is reported to Slack.
//!
//! | Key prefix            | Tool                         | Output               |
//! |-----------------------|------------------------------|----------------------|
//! | `pdal-translate/`     | `pdal translate` + config    | `output/<name><ext>` |
//! | `pdal-info/`          | `pdal info --all`            | `<name>.json`        |
//! | `rimtatls/`           | `rimtatls`                   | `<stem>.mta.rxp`     |
//! | `ape-near-field-prcs/`| `pdal translate` + `ape cpd` | `<stem>.dat`         |
//!
//! # Example
//! ```ignore
//! use magic_bucket::{Dispatcher, TaskRegistry, WorkerConfig};
//!
//! let dispatcher = Dispatcher::new(queue, store, commands, notifier,
//!     TaskRegistry::default(), WorkerConfig::default());
//! let summary = dispatcher.run().await?;
//! ```

pub mod clients;
pub mod config;
pub mod error;
pub mod model;
pub mod tasks;
pub mod trigger;
pub mod worker;

pub use config::Settings;
pub use error::{MagicBucketError, Result};
pub use model::{ObjectRef, QueueMessage, ResultRef};
pub use tasks::{Task, TaskContext, TaskRegistry};
pub use worker::{DispatchSummary, Dispatcher, ItemOutcome, QueueConsumer, WorkItemRunner, WorkerConfig};
