//! Error types for magic-bucket

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MagicBucketError {
    #[error("Unknown task: {task_name}")]
    UnknownTask { task_name: String },

    #[error("Missing s3 file: {bucket}/{key}")]
    MissingS3File { bucket: String, key: String },

    /// A key ending in `/`, as created by the S3 console's "Create folder"
    #[error("Not a file: {bucket}/{key}")]
    NotAFile { bucket: String, key: String },

    #[error("Missing configuration file for pdal translate")]
    MissingConfigFile,

    #[error("Invalid JSON configuration: {0}")]
    InvalidConfig(String),

    #[error("Missing fixed reference file: {bucket}/{key}")]
    MissingFixedFile { bucket: String, key: String },

    /// `exit_code` is -1 when the process was killed by a signal or never started.
    #[error("Subprocess error: `{program}` exited with code {exit_code} with output {output}")]
    Subprocess {
        program: String,
        exit_code: i32,
        output: String,
    },

    #[error("Archive error: {0}")]
    Archive(String),

    #[error("Invalid queue message: {0}")]
    InvalidMessage(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Queue error: {0}")]
    Queue(String),

    #[error("Notification error: {0}")]
    Notify(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File system error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MagicBucketError {
    /// Whether this error belongs to a single work item.
    ///
    /// Item errors are reported and the dispatcher moves on to the next
    /// message. Everything else (client failures, local I/O) aborts the loop.
    pub fn is_task_error(&self) -> bool {
        matches!(
            self,
            MagicBucketError::UnknownTask { .. }
                | MagicBucketError::MissingS3File { .. }
                | MagicBucketError::NotAFile { .. }
                | MagicBucketError::MissingConfigFile
                | MagicBucketError::InvalidConfig(_)
                | MagicBucketError::MissingFixedFile { .. }
                | MagicBucketError::Subprocess { .. }
                | MagicBucketError::Archive(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, MagicBucketError>;
