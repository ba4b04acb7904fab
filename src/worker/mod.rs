//! Worker module for draining the queue and processing objects
//!
//! This module provides:
//! - Dispatcher: Main loop that turns queue messages into task runs
//! - QueueConsumer: Destructive, pull-based reader of queue messages
//! - WorkItemRunner: Download, extract, process and upload for one object
//! - WorkerConfig: Configuration for the worker

pub mod config;
pub mod consumer;
pub mod dispatcher;
pub mod extract;
pub mod runner;
pub mod workdir;

pub use config::WorkerConfig;
pub use consumer::QueueConsumer;
pub use dispatcher::{DispatchSummary, Dispatcher, ItemOutcome};
pub use runner::WorkItemRunner;
pub use workdir::WorkingDirectory;
